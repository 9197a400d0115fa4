//! Handling of stream events and task results

use crate::error::Result;
use crate::notifications::Notification;
use crate::protocol::{InboundFrame, parse_frame};
use crate::rest::ChatApi;
use crate::transport::{ChannelEvent, Connector, StreamConnection, StreamEvent};
use crate::types::channel::Channel;
use crate::types::chat::Chat;
use crate::types::identifiers::ChatId;
use crate::types::message::Message;

use super::events::{SessionEvent, UiUpdate, UserAction};
use super::{ChatSessionController, ControllerState};

impl<A: ChatApi, C: Connector> ChatSessionController<A, C> {
    pub(super) fn on_stream_event(&mut self, event: ChannelEvent) {
        let ChannelEvent {
            channel,
            tag,
            event,
        } = event;

        match channel {
            Channel::Chat => {
                if !self.switches.is_current(tag) {
                    log::trace!("stale chat event dropped (switch {tag})");
                    return;
                }
                self.on_chat_event(event);
            }
            Channel::Notifications => {
                if tag != self.notification_generation {
                    log::trace!("stale notification event dropped");
                    return;
                }
                self.on_notification_event(event);
            }
            Channel::Search => {
                if !self.search.accepts(tag) {
                    log::trace!("stale search event dropped");
                    return;
                }
                self.on_search_event(event);
            }
        }
    }

    pub(super) fn on_connected(
        &mut self,
        channel: Channel,
        tag: u64,
        result: Result<StreamConnection>,
    ) {
        match channel {
            Channel::Chat => self.on_chat_connected(tag, result),
            Channel::Notifications => {
                if tag != self.notification_generation {
                    return;
                }
                match result {
                    Ok(stream) if stream.is_open() => self.notification_stream = Some(stream),
                    Ok(_) => log::debug!("notification stream ended before it was adopted"),
                    Err(e) => log::warn!("notification stream unavailable: {e}"),
                }
            }
            Channel::Search => match result {
                Ok(stream) => {
                    if stream.is_open() {
                        self.search.attach(stream);
                    }
                }
                Err(e) => {
                    if self.search.accepts(tag) {
                        log::warn!("search stream unavailable: {e}");
                    }
                }
            },
        }
    }

    // ========================================================================
    // Chat stream
    // ========================================================================

    fn on_chat_connected(&mut self, tag: u64, result: Result<StreamConnection>) {
        if !self.switches.is_current(tag) {
            // A newer selection won; the connection drops and closes here
            log::debug!("chat stream for superseded switch {tag} discarded");
            return;
        }

        self.state = ControllerState::Active;
        match result {
            Ok(stream) if stream.is_open() => {
                self.chat_stream = Some(stream);
                self.set_online(true);
            }
            Ok(_) => self.set_online(false),
            Err(e) => {
                log::warn!("chat stream failed to connect: {e}");
                self.set_online(false);
            }
        }
    }

    fn on_chat_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Opened => log::trace!("chat stream opened"),
            StreamEvent::Frame(text) => self.on_chat_frame(&text),
            StreamEvent::Closed(reason) | StreamEvent::Error(reason) => {
                log::warn!("chat stream down: {reason}");
                self.chat_stream = None;
                if self.state == ControllerState::SwitchingChat {
                    self.state = ControllerState::Active;
                }
                self.set_online(false);
            }
        }
    }

    fn on_chat_frame(&mut self, text: &str) {
        let frame = match parse_frame(text) {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("chat frame discarded: {e}");
                return;
            }
        };

        let InboundFrame::Message(payload) = frame else {
            log::debug!("unexpected frame on chat stream ignored");
            return;
        };

        if self.log.chat_id() != self.active_chat_id() {
            return;
        }

        let message = Message::from(payload);
        if self.log.append_live(message) && !self.log.is_history_pending() {
            self.emit(UiUpdate::MessagesChanged);
        }
    }

    pub(super) fn on_history(&mut self, token: u64, chat_id: ChatId, result: Result<Vec<Message>>) {
        if !self.switches.is_current(token) || self.log.chat_id() != Some(chat_id) {
            log::trace!("stale history for chat {chat_id} dropped");
            return;
        }

        match result {
            Ok(history) => {
                log::debug!("chat {chat_id}: {} history messages", history.len());
                self.log.load_history(history);
            }
            Err(e) => {
                log::warn!("chat {chat_id}: history failed: {e}");
                self.log.load_history(Vec::new());
                self.alert(format!("Could not load history: {e}"));
            }
        }
        self.emit(UiUpdate::MessagesChanged);
    }

    // ========================================================================
    // Notification stream
    // ========================================================================

    fn on_notification_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Opened => log::debug!("notification stream opened"),
            StreamEvent::Frame(text) => self.on_notification_frame(&text),
            StreamEvent::Closed(reason) | StreamEvent::Error(reason) => {
                log::warn!("notification stream down: {reason}");
                self.notification_stream = None;
            }
        }
    }

    fn on_notification_frame(&mut self, text: &str) {
        let frame = match parse_frame(text) {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("notification frame discarded: {e}");
                return;
            }
        };

        match frame {
            InboundFrame::OnlineList { ids } => {
                if self.presence.apply_snapshot(ids) {
                    self.emit(UiUpdate::ChatListChanged);
                }
            }
            InboundFrame::Presence { user_id, is_online } => {
                if self.presence.apply_delta(user_id, is_online) {
                    self.emit(UiUpdate::ChatListChanged);
                }
            }
            InboundFrame::Notification(payload) => {
                self.deliver_notification(&Notification::from(payload));
            }
            InboundFrame::Ping { .. } | InboundFrame::Message(_) | InboundFrame::Unknown => {
                log::debug!("unexpected frame on notification stream ignored");
            }
        }
    }

    fn deliver_notification(&mut self, notification: &Notification) {
        let active = self.active_chat_id();
        if let Some(seq) = self.notifications.deliver(notification, active) {
            self.emit(UiUpdate::Banner(Some(notification.body.clone())));
            self.schedule(self.notifications.duration(), SessionEvent::BannerExpired(seq));
        }
    }

    // ========================================================================
    // Search stream
    // ========================================================================

    fn on_search_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Opened => log::debug!("search stream opened"),
            StreamEvent::Frame(text) => match self.search.apply_frame(&text) {
                Ok(results) => {
                    log::trace!("{} search results", results.len());
                    self.emit(UiUpdate::SearchResults);
                }
                Err(e) => log::debug!("search frame discarded: {e}"),
            },
            StreamEvent::Closed(reason) | StreamEvent::Error(reason) => {
                log::debug!("search stream down: {reason}");
                self.search.detach();
            }
        }
    }

    // ========================================================================
    // REST results
    // ========================================================================

    pub(super) fn on_chats(&mut self, result: Result<Vec<Chat>>) {
        match result {
            Ok(chats) => {
                if let Some(active) = self.active.as_mut()
                    && let Some(fresh) = chats.iter().find(|c| c.id == active.id)
                {
                    *active = fresh.clone();
                }
                self.chats = chats;
                self.emit(UiUpdate::ChatListChanged);
                // Participant names may have changed
                if self.active.is_some() {
                    self.emit(UiUpdate::MessagesChanged);
                }
            }
            Err(e) => {
                log::warn!("chat list failed: {e}");
                self.alert(format!("Could not load chats: {e}"));
            }
        }
    }

    pub(super) fn on_action(&mut self, action: UserAction, result: Result<()>) {
        if let Err(e) = result {
            log::warn!("{action} failed: {e}");
            self.alert(format!("Could not {action}: {e}"));
            return;
        }

        log::debug!("{action} succeeded");
        match action {
            UserAction::DeleteMessage {
                chat_id,
                message_id,
            } => {
                if self.log.chat_id() == Some(chat_id) && self.log.remove(message_id) {
                    self.emit(UiUpdate::MessagesChanged);
                }
            }
            UserAction::DeleteChat(chat_id) => {
                if self.active_chat_id() == Some(chat_id) {
                    self.leave_active_chat();
                }
                self.spawn_list_chats();
            }
            UserAction::CreateDirectChat(username) => {
                self.emit(UiUpdate::Info(format!("Chat with {username} active")));
                self.spawn_list_chats();
            }
            UserAction::CreateGroup(_) | UserAction::RenameGroup(_) => self.spawn_list_chats(),
        }
    }

    fn leave_active_chat(&mut self) {
        self.switches.invalidate();
        if let Some(mut stream) = self.chat_stream.take() {
            stream.close();
        }
        self.log.clear();
        self.active = None;
        self.state = ControllerState::Idle;
        self.set_online(false);
        self.emit(UiUpdate::MessagesChanged);
    }
}
