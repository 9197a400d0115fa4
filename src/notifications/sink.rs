//! Desktop notification side effect
//!
//! One-way: the session layer fires a notification and never hears back.

use std::path::PathBuf;
use std::process::Stdio;

/// Receiver of surfaced notifications
pub trait NotificationSink: Send + Sync {
    /// Show a notification. Must not block.
    fn notify(&self, title: &str, body: &str);
}

/// Discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl NotificationSink for NullNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}

/// Shows notifications through `notify-send`, if installed
#[derive(Debug, Clone, Default)]
pub struct DesktopNotifier {
    program: Option<PathBuf>,
}

impl DesktopNotifier {
    /// Locate `notify-send` on the PATH. Without it, notifications are only logged.
    #[must_use]
    pub fn detect() -> Self {
        let program = which::which("notify-send").ok();
        if program.is_none() {
            log::info!("notify-send not found; desktop notifications disabled");
        }
        Self { program }
    }

    /// Whether a notifier program was found
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.program.is_some()
    }
}

impl NotificationSink for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        let Some(program) = &self.program else {
            log::debug!("notification: {title}: {body}");
            return;
        };

        // Fire-and-forget; the runtime reaps the child
        let spawned = tokio::process::Command::new(program)
            .arg(title)
            .arg(body)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        if let Err(e) = spawned {
            log::warn!("failed to run {}: {e}", program.display());
        }
    }
}
