//! `ChatApi` over HTTP

use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use url::Url;

use crate::error::{ChatError, Result};
use crate::types::chat::Chat;
use crate::types::identifiers::{ChatId, MessageId, UserId};
use crate::types::message::Message;
use crate::types::options::SessionOptions;
use crate::types::session::Session;

use super::ChatApi;

#[derive(Debug, Serialize)]
struct CreateGroupRequest<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "MemberIds")]
    member_ids: &'a [UserId],
}

#[derive(Debug, Serialize)]
struct RenameGroupRequest<'a> {
    #[serde(rename = "NewName")]
    new_name: &'a str,
}

/// REST client for the chat server
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: Url,
    credential_header: String,
    credential: String,
}

impl HttpChatApi {
    /// Create a client for `options.base_url`, authenticating as `session`
    #[must_use]
    pub fn new(options: &SessionOptions, session: &Session) -> Self {
        Self::with_client(Client::new(), options, session)
    }

    /// Create a client reusing an existing `reqwest::Client`
    #[must_use]
    pub fn with_client(client: Client, options: &SessionOptions, session: &Session) -> Self {
        Self {
            client,
            base_url: options.base_url.clone(),
            credential_header: options.credential_header.clone(),
            credential: session.credential().expose().to_string(),
        }
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.credential.is_empty() {
            request
        } else {
            request.header(self.credential_header.as_str(), self.credential.as_str())
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            body
        };
        Err(ChatError::api(status.as_u16(), message))
    }
}

impl ChatApi for HttpChatApi {
    async fn list_chats(&self) -> Result<Vec<Chat>> {
        let url = self.url("/api/Chat/chats")?;
        let response = self.execute(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    async fn get_history(&self, chat_id: ChatId) -> Result<Vec<Message>> {
        let mut url = self.url("/api/Chat/history")?;
        url.query_pairs_mut()
            .append_pair("chatId", &chat_id.to_string());
        let response = self.execute(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    async fn delete_message(&self, id: MessageId) -> Result<()> {
        let url = self.url(&format!("/api/Chat/message/{id}"))?;
        self.execute(self.client.delete(url)).await?;
        Ok(())
    }

    async fn delete_chat(&self, id: ChatId) -> Result<()> {
        let url = self.url(&format!("/api/Chat/{id}"))?;
        self.execute(self.client.delete(url)).await?;
        Ok(())
    }

    async fn create_direct_chat(&self, username: &str) -> Result<()> {
        let mut url = self.url("/api/Chat/create_chat")?;
        url.query_pairs_mut().append_pair("username", username);
        self.execute(self.client.post(url)).await?;
        Ok(())
    }

    async fn create_group(&self, name: &str, member_ids: &[UserId]) -> Result<()> {
        let url = self.url("/api/Chat/create_group")?;
        let body = CreateGroupRequest { name, member_ids };
        self.execute(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    async fn rename_group(&self, id: ChatId, new_name: &str) -> Result<()> {
        let url = self.url(&format!("/api/Chat/group/{id}/rename"))?;
        let body = RenameGroupRequest { new_name };
        self.execute(self.client.put(url).json(&body)).await?;
        Ok(())
    }
}
