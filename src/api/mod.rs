//! REST client for the chat server.
//!
//! Thin request/response wrappers over `reqwest`. The request-forgery
//! token is captured from the `_xsrf` cookie the server sets and replayed
//! as an `X-XSRFToken` header on every call.

use std::sync::{OnceLock, RwLock};

use serde::Deserialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ParlorError, Result};
use crate::types::{ChatMessage, Conversation, ConversationSettings, ModelInfo, NewConversation};

const XSRF_HEADER: &str = "X-XSRFToken";
const XSRF_COOKIE: &str = "_xsrf";

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Map a non-2xx HTTP status to an error.
fn status_to_error(status: u16, body: &str) -> ParlorError {
    ParlorError::api(status, body)
}

#[derive(Deserialize)]
struct ConversationsPayload {
    conversations: Vec<Conversation>,
}

#[derive(Deserialize)]
struct ConversationPayload {
    conversation: Conversation,
}

#[derive(Deserialize)]
struct MessagesPayload {
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ModelsPayload {
    models: Vec<ModelInfo>,
}

/// Client for the conversation/message/model endpoints.
pub struct ApiClient {
    base_url: String,
    xsrf_token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            xsrf_token: RwLock::new(None),
        }
    }

    /// Fetch all conversations. Order is server-defined; callers sort.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let url = format!("{}/api/conversations", self.base_url);
        let payload: ConversationsPayload = self.request(shared_client().get(&url)).await?;
        Ok(payload.conversations)
    }

    /// Fetch a single conversation's detail.
    pub async fn get_conversation(&self, id: &str) -> Result<Conversation> {
        let url = format!("{}/api/conversations/{id}", self.base_url);
        let payload: ConversationPayload = self.request(shared_client().get(&url)).await?;
        Ok(payload.conversation)
    }

    /// Create a conversation.
    pub async fn create_conversation(&self, new: &NewConversation) -> Result<Conversation> {
        let url = format!("{}/api/conversations", self.base_url);
        let payload: ConversationPayload =
            self.request(shared_client().post(&url).json(new)).await?;
        Ok(payload.conversation)
    }

    /// Update a conversation's model/prompt; the server returns the full
    /// updated object, which is the source of truth.
    pub async fn update_conversation(
        &self,
        id: &str,
        settings: &ConversationSettings,
    ) -> Result<Conversation> {
        let url = format!("{}/api/conversations/{id}", self.base_url);
        let payload: ConversationPayload =
            self.request(shared_client().put(&url).json(settings)).await?;
        Ok(payload.conversation)
    }

    /// Delete a conversation.
    pub async fn delete_conversation(&self, id: &str) -> Result<()> {
        let url = format!("{}/api/conversations/{id}", self.base_url);
        self.request_value(shared_client().delete(&url)).await?;
        Ok(())
    }

    /// Fetch one page of a conversation's messages, newest page first.
    pub async fn fetch_messages(
        &self,
        conversation_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<ChatMessage>> {
        let url = format!(
            "{}/api/conversations/{conversation_id}/messages",
            self.base_url
        );
        let payload: MessagesPayload = self
            .request(
                shared_client()
                    .get(&url)
                    .query(&[("page", page), ("page_size", page_size)]),
            )
            .await?;
        Ok(payload.messages)
    }

    /// Fetch the model catalog.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/models", self.base_url);
        let payload: ModelsPayload = self.request(shared_client().get(&url)).await?;
        Ok(payload.models)
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T> {
        let body = self.request_value(builder).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Send a request, returning the JSON body after the shared checks:
    /// xsrf header attach, token capture, non-2xx mapping, and the
    /// `{"success": false, "error": ...}` envelope the server uses for
    /// application-level failures.
    async fn request_value(
        &self,
        mut builder: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value> {
        if let Some(token) = self.xsrf_token.read().ok().and_then(|t| t.clone()) {
            builder = builder.header(XSRF_HEADER, token);
        }
        let resp = builder.send().await?;
        self.capture_xsrf(&resp);

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body));
        }

        let body: serde_json::Value = resp.json().await?;
        if body.get("success").and_then(|v| v.as_bool()) == Some(false) {
            let message = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("request failed")
                .to_string();
            return Err(ParlorError::api(status, message));
        }
        Ok(body)
    }

    fn capture_xsrf(&self, resp: &reqwest::Response) {
        for value in resp.headers().get_all(reqwest::header::SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let Some(rest) = raw.strip_prefix(&format!("{XSRF_COOKIE}=")) else {
                continue;
            };
            let token = rest.split(';').next().unwrap_or(rest).to_string();
            debug!("captured xsrf token");
            if let Ok(mut slot) = self.xsrf_token.write() {
                *slot = Some(token);
            }
        }
    }

    /// The current request-forgery token, if one has been captured.
    pub fn xsrf_token(&self) -> Option<String> {
        self.xsrf_token.read().ok().and_then(|t| t.clone())
    }
}
