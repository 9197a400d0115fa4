//! Command handling: chat switching, sending, search and user actions

use crate::error::{ChatError, Result};
use crate::protocol::OutboundFrame;
use crate::rest::ChatApi;
use crate::search::QueryAction;
use crate::transport::Connector;
use crate::types::channel::Channel;
use crate::types::identifiers::{ChatId, MessageId, UserId};

use super::events::{Command, SessionEvent, UiUpdate, UserAction};
use super::{ChatSessionController, ControllerState, rearm};

impl<A: ChatApi, C: Connector> ChatSessionController<A, C> {
    pub(super) fn on_command(&mut self, command: Command) {
        log::trace!("command: {command:?}");
        let result = match command {
            Command::SelectChat(chat_id) => self.select_chat(chat_id),
            Command::SetCompose(text) => {
                self.compose = text;
                Ok(())
            }
            Command::SendMessage => self.send_message(),
            Command::ConnectNotifications => self.connect_notifications(),
            Command::OpenSearch => self.open_search(),
            Command::CloseSearch => {
                self.search_connect.cancel();
                self.search.close();
                self.emit(UiUpdate::SearchResults);
                Ok(())
            }
            Command::SetSearchQuery(text) => {
                self.set_search_query(text);
                Ok(())
            }
            Command::Refresh => self.refresh(),
            Command::DeleteMessage(id) => {
                self.delete_message(id);
                Ok(())
            }
            Command::DeleteActiveChat => {
                self.delete_active_chat();
                Ok(())
            }
            Command::CreateDirectChat(username) => {
                self.create_direct_chat(username);
                Ok(())
            }
            Command::CreateGroup { name, member_ids } => {
                self.create_group(name, member_ids);
                Ok(())
            }
            Command::RenameActiveGroup(name) => {
                self.rename_active_group(name);
                Ok(())
            }
        };

        if let Err(e) = result {
            self.alert(e.to_string());
        }
    }

    // ========================================================================
    // Chat switching
    // ========================================================================

    /// Switch to `chat_id`: invalidate the previous switch, close its stream,
    /// clear the view, then load history and connect concurrently.
    fn select_chat(&mut self, chat_id: ChatId) -> Result<()> {
        let chat = self
            .chats
            .iter()
            .find(|c| c.id == chat_id)
            .cloned()
            .ok_or(ChatError::ChatNotFound(chat_id))?;

        let token = self.switches.next(&self.cancel);
        log::info!("switching to chat {chat_id} (switch {})", token.get());

        if let Some(mut previous) = self.chat_stream.take() {
            previous.close();
        }
        self.set_online(false);

        self.log.arm(chat_id);
        self.active = Some(chat);
        self.state = ControllerState::SwitchingChat;
        self.emit(UiUpdate::MessagesChanged);

        self.spawn_history(token.get(), chat_id);

        match self.options.chat_endpoint(chat_id) {
            Ok(endpoint) => {
                self.spawn_connect(Channel::Chat, token.get(), &endpoint, token.cancellation());
            }
            Err(e) => {
                log::warn!("chat {chat_id}: no stream endpoint: {e}");
                self.state = ControllerState::Active;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Send the compose field. The field is cleared before the stream is
    /// checked, so an offline send still loses the text.
    fn send_message(&mut self) -> Result<()> {
        if self.compose.trim().is_empty() || self.active.is_none() {
            return Ok(());
        }

        let text = std::mem::take(&mut self.compose);
        self.emit(UiUpdate::ComposeChanged);

        let Some(stream) = self.chat_stream.as_ref().filter(|s| s.is_open()) else {
            log::debug!("send refused: chat stream offline");
            return Err(ChatError::Offline);
        };
        stream.send(&OutboundFrame::message(text))
    }

    // ========================================================================
    // Notification and search streams
    // ========================================================================

    fn connect_notifications(&mut self) -> Result<()> {
        self.notifications_wanted = true;
        if let Some(mut previous) = self.notification_stream.take() {
            previous.close();
        }
        self.notification_generation += 1;
        let cancel = rearm(&self.cancel, &mut self.notification_connect);

        let endpoint = self.options.stream_endpoint(Channel::Notifications)?;
        self.spawn_connect(
            Channel::Notifications,
            self.notification_generation,
            &endpoint,
            cancel,
        );
        Ok(())
    }

    fn open_search(&mut self) -> Result<()> {
        let tag = self.search.begin_open();
        let cancel = rearm(&self.cancel, &mut self.search_connect);
        self.emit(UiUpdate::SearchResults);

        let endpoint = self.options.stream_endpoint(Channel::Search)?;
        self.spawn_connect(Channel::Search, tag, &endpoint, cancel);
        Ok(())
    }

    fn set_search_query(&mut self, text: String) {
        match self.search.set_query(text) {
            QueryAction::Schedule { seq, delay } => {
                self.schedule(delay, SessionEvent::SearchFlush(seq));
            }
            QueryAction::Sent | QueryAction::Dropped => {}
        }
    }

    pub(super) fn on_search_flush(&mut self, seq: u64) {
        match self.search.flush(seq) {
            Some(QueryAction::Sent) => log::trace!("search query {seq} sent"),
            Some(QueryAction::Dropped) => log::debug!("search query {seq} dropped: stream closed"),
            Some(QueryAction::Schedule { .. }) | None => {}
        }
    }

    // ========================================================================
    // Refresh and user actions
    // ========================================================================

    /// Reload the chat list and reopen whatever dropped.
    ///
    /// This is the only retry path: a chat stream that failed is reopened by
    /// reselecting the active chat.
    fn refresh(&mut self) -> Result<()> {
        self.spawn_list_chats();

        if self.notifications_wanted && self.notification_stream.is_none() {
            self.connect_notifications()?;
        }

        if self.state == ControllerState::Active
            && !self.online
            && let Some(chat_id) = self.active_chat_id()
        {
            log::info!("refresh: reconnecting chat {chat_id}");
            self.select_chat(chat_id)?;
        }
        Ok(())
    }

    fn delete_message(&mut self, message_id: MessageId) {
        let Some(chat_id) = self.active_chat_id() else {
            log::debug!("delete message {message_id}: no active chat");
            return;
        };
        let action = UserAction::DeleteMessage {
            chat_id,
            message_id,
        };
        self.spawn_action(action, move |api| async move {
            api.delete_message(message_id).await
        });
    }

    fn delete_active_chat(&mut self) {
        let Some(chat_id) = self.active_chat_id() else {
            return;
        };
        self.spawn_action(UserAction::DeleteChat(chat_id), move |api| async move {
            api.delete_chat(chat_id).await
        });
    }

    fn create_direct_chat(&mut self, username: String) {
        let username = username.trim().to_string();
        if username.is_empty() {
            return;
        }
        let action = UserAction::CreateDirectChat(username.clone());
        self.spawn_action(action, move |api| async move {
            api.create_direct_chat(&username).await
        });
    }

    fn create_group(&mut self, name: String, member_ids: Vec<UserId>) {
        let action = UserAction::CreateGroup(name.clone());
        self.spawn_action(action, move |api| async move {
            api.create_group(&name, &member_ids).await
        });
    }

    fn rename_active_group(&mut self, new_name: String) {
        let Some(chat) = self.active.as_ref().filter(|c| c.is_group) else {
            log::debug!("rename ignored: active chat is not a group");
            return;
        };
        let chat_id = chat.id;
        self.spawn_action(UserAction::RenameGroup(chat_id), move |api| async move {
            api.rename_group(chat_id, &new_name).await
        });
    }
}
