//! REST collaborator
//!
//! The session layer treats chat-list and history CRUD as opaque calls. It
//! never looks at how they are carried; tests substitute a scripted
//! implementation of [`ChatApi`].

#[cfg(feature = "http")]
mod http;

use std::future::Future;

use crate::error::Result;
use crate::types::chat::Chat;
use crate::types::identifiers::{ChatId, MessageId, UserId};
use crate::types::message::Message;

#[cfg(feature = "http")]
pub use http::HttpChatApi;

/// Chat-list and history operations consumed by the controller
pub trait ChatApi: Send + Sync + 'static {
    /// Every chat the current user belongs to
    ///
    /// # Errors
    /// Returns error if the request fails or is rejected
    fn list_chats(&self) -> impl Future<Output = Result<Vec<Chat>>> + Send;

    /// History of `chat_id`, oldest first
    ///
    /// # Errors
    /// Returns error if the request fails or is rejected
    fn get_history(&self, chat_id: ChatId) -> impl Future<Output = Result<Vec<Message>>> + Send;

    /// Delete one message
    ///
    /// # Errors
    /// Returns error if the request fails or is rejected
    fn delete_message(&self, id: MessageId) -> impl Future<Output = Result<()>> + Send;

    /// Delete a whole chat
    ///
    /// # Errors
    /// Returns error if the request fails or is rejected
    fn delete_chat(&self, id: ChatId) -> impl Future<Output = Result<()>> + Send;

    /// Open (or reuse) a direct chat with `username`
    ///
    /// # Errors
    /// Returns error if the request fails or is rejected
    fn create_direct_chat(&self, username: &str) -> impl Future<Output = Result<()>> + Send;

    /// Create a group chat
    ///
    /// # Errors
    /// Returns error if the request fails or is rejected
    fn create_group(
        &self,
        name: &str,
        member_ids: &[UserId],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Rename a group chat
    ///
    /// # Errors
    /// Returns error if the request fails or is rejected
    fn rename_group(&self, id: ChatId, new_name: &str) -> impl Future<Output = Result<()>> + Send;
}
