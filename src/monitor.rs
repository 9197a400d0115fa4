//! Background liveness, memory and latency sampling
//!
//! A periodic sample of session uptime, the process's resident memory and
//! the round-trip time of one HTTP probe against the server. Samples are
//! advisory; a failed reading is reported as a missing value, never as an
//! error.

use std::future::Future;
use std::time::Duration;

use async_stream::stream;
use chrono::{DateTime, Utc};
use futures::Stream;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::time::{Instant, MissedTickBehavior};

/// One monitor reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSample {
    /// Time since sampling started
    pub uptime: Duration,
    /// Probe round-trip, `None` if the probe failed or is disabled
    pub latency: Option<Duration>,
    /// Resident set size of this process, `None` where it cannot be read
    pub memory_bytes: Option<u64>,
    /// Wall-clock time of the reading
    pub sampled_at: DateTime<Utc>,
}

impl MonitorSample {
    /// Latency in whole milliseconds, if known
    #[must_use]
    pub fn latency_ms(&self) -> Option<u128> {
        self.latency.map(|d| d.as_millis())
    }

    /// Resident memory in whole mebibytes, if known
    #[must_use]
    pub fn memory_mib(&self) -> Option<u64> {
        self.memory_bytes.map(|bytes| bytes / (1024 * 1024))
    }
}

/// Reads this process's resident memory
pub struct MemoryGauge {
    system: System,
    pid: Option<Pid>,
}

impl MemoryGauge {
    /// Gauge for the current process
    #[must_use]
    pub fn current_process() -> Self {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| log::debug!("memory sampling unavailable: {e}"))
            .ok();
        Self {
            system: System::new(),
            pid,
        }
    }

    /// Refresh and return the resident set size in bytes
    pub fn resident_bytes(&mut self) -> Option<u64> {
        let pid = self.pid?;
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        self.system.process(pid).map(sysinfo::Process::memory)
    }
}

impl std::fmt::Debug for MemoryGauge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGauge")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

/// Measures one round-trip to the server
pub trait LatencyProbe: Send + Sync + 'static {
    /// Perform one probe
    fn probe(&self) -> impl Future<Output = Option<Duration>> + Send;
}

/// Probe that never measures anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl LatencyProbe for NoProbe {
    async fn probe(&self) -> Option<Duration> {
        None
    }
}

/// `HEAD` request against the server's base URL
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    target: url::Url,
}

#[cfg(feature = "http")]
impl HttpProbe {
    /// Probe `target` with a fresh client
    #[must_use]
    pub fn new(target: url::Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            target,
        }
    }
}

#[cfg(feature = "http")]
impl LatencyProbe for HttpProbe {
    async fn probe(&self) -> Option<Duration> {
        let started = Instant::now();
        match self.client.head(self.target.clone()).send().await {
            Ok(_) => Some(started.elapsed()),
            Err(e) => {
                log::debug!("latency probe failed: {e}");
                None
            }
        }
    }
}

/// Endless stream of samples, one per `interval`, the first immediately
pub fn samples<P: LatencyProbe>(
    interval: Duration,
    probe: P,
) -> impl Stream<Item = MonitorSample> + Send {
    let started = Instant::now();
    stream! {
        let mut gauge = MemoryGauge::current_process();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let memory_bytes = gauge.resident_bytes();
            let latency = probe.probe().await;
            yield MonitorSample {
                uptime: started.elapsed(),
                latency,
                memory_bytes,
                sampled_at: Utc::now(),
            };
        }
    }
}
