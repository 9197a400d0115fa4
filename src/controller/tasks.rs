//! Background tasks spawned by the controller
//!
//! None of these touch controller state; each one posts its outcome back
//! into the queue as a [`SessionEvent`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Result;
use crate::monitor::{LatencyProbe, samples};
use crate::rest::ChatApi;
use crate::transport::{Connector, StreamConnection};
use crate::types::channel::Channel;
use crate::types::identifiers::ChatId;
use crate::types::message::ArrivalSource;

use super::ChatSessionController;
use super::events::{SessionEvent, UserAction};

impl<A: ChatApi, C: Connector> ChatSessionController<A, C> {
    /// Connect a fresh transport for `channel`; the result comes back as
    /// `SessionEvent::Connected` tagged with `tag`.
    ///
    /// Cancelling `cancel` abandons the handshake: the transport is dropped
    /// unconnected and nothing is posted.
    pub(super) fn spawn_connect(
        &self,
        channel: Channel,
        tag: u64,
        endpoint: &Url,
        cancel: CancellationToken,
    ) {
        let transport = self.connector.transport(channel, endpoint, &self.session);
        let sink = self.dispatcher.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    log::debug!("{channel} connect {tag} abandoned");
                    return;
                }
                result = StreamConnection::connect(channel, tag, transport, sink.clone()) => result,
            };
            sink.post(SessionEvent::Connected {
                channel,
                tag,
                result,
            });
        });
    }

    pub(super) fn spawn_history(&self, token: u64, chat_id: ChatId) {
        let api = Arc::clone(&self.api);
        let dispatcher = self.dispatcher.clone();

        tokio::spawn(async move {
            let result = api.get_history(chat_id).await.map(|mut messages| {
                for message in &mut messages {
                    message.source = ArrivalSource::History;
                }
                messages
            });
            dispatcher.post(SessionEvent::HistoryLoaded {
                token,
                chat_id,
                result,
            });
        });
    }

    pub(super) fn spawn_list_chats(&self) {
        let api = Arc::clone(&self.api);
        let dispatcher = self.dispatcher.clone();

        tokio::spawn(async move {
            let result = api.list_chats().await;
            dispatcher.post(SessionEvent::ChatsLoaded(result));
        });
    }

    /// Run one REST user action and report its outcome
    pub(super) fn spawn_action<F, Fut>(&self, action: UserAction, call: F)
    where
        F: FnOnce(Arc<A>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let dispatcher = self.dispatcher.clone();

        tokio::spawn(async move {
            let result = call(api).await;
            dispatcher.post(SessionEvent::ActionFinished { action, result });
        });
    }

    /// Post `event` after `delay` unless the controller shuts down first
    pub(super) fn schedule(&self, delay: Duration, event: SessionEvent) {
        let dispatcher = self.dispatcher.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    dispatcher.post(event);
                }
            }
        });
    }

    pub(super) fn spawn_monitor<P: LatencyProbe>(&self, probe: P) {
        let dispatcher = self.dispatcher.clone();
        let cancel = self.cancel.clone();
        let interval = self.options.monitor_interval;

        tokio::spawn(async move {
            let stream = samples(interval, probe);
            futures::pin_mut!(stream);

            loop {
                let sample = tokio::select! {
                    () = cancel.cancelled() => break,
                    sample = stream.next() => sample,
                };
                let Some(sample) = sample else {
                    break;
                };
                if !dispatcher.post(SessionEvent::Monitor(sample)) {
                    break;
                }
            }
            log::debug!("monitor stopped");
        });
    }
}
