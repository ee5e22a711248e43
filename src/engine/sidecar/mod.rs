// wweb Engine: Sidecar Driver (headless browser bridge)
//
// The browser automation runs in a sidecar process exposing a small REST API.
// Commands go out as `POST /client/<clientId>/<op>`; session events come back
// as webhooks to a local listener and are forwarded onto the event channel.
//
// Module layout:
//   api    : SidecarApi (REST calls, result decoding)
//   webhook: run_webhook_listener (raw TCP HTTP server), parse_webhook_event

pub(crate) mod api;
pub(crate) mod webhook;

pub use webhook::parse_webhook_event;

use super::config::{BrowserConfig, SidecarConfig};
use super::driver::{DriverSession, SessionDriver};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{
    Chat, ChatAction, ClientInfo, Contact, Content, Event, Message, MessageMedia, SendOptions,
};
use api::SidecarApi;
use async_trait::async_trait;
use log::{info, warn};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

pub struct SidecarDriver {
    api: SidecarApi,
    browser: BrowserConfig,
    webhook_port: u16,
    /// Set by `initialize`; every client call needs it.
    client_id: Mutex<Option<String>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    stop: Arc<AtomicBool>,
}

impl SidecarDriver {
    /// Every REST call is bounded by `sidecar.request_timeout_secs`.
    pub fn new(sidecar: &SidecarConfig, browser: &BrowserConfig) -> EngineResult<Self> {
        Ok(SidecarDriver {
            api: SidecarApi::new(sidecar)?,
            browser: browser.clone(),
            webhook_port: sidecar.webhook_port,
            client_id: Mutex::new(None),
            listener: Mutex::new(None),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    fn client_id(&self, op: &str) -> EngineResult<String> {
        self.client_id.lock().clone()
            .ok_or_else(|| EngineError::driver(op, "session not started"))
    }

    async fn call<T: serde::de::DeserializeOwned>(&self, op: &str, args: serde_json::Value) -> EngineResult<T> {
        let client_id = self.client_id(op)?;
        self.api.call(&client_id, op, args).await
    }

    fn stop_listener(&self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(task) = self.listener.lock().take() {
            task.abort();
        }
    }
}

#[async_trait]
impl SessionDriver for SidecarDriver {
    async fn initialize(&self, session: DriverSession, events: UnboundedSender<Event>) -> EngineResult<()> {
        self.stop_listener();
        self.stop.store(false, Ordering::Relaxed);

        // Fresh per start; the listener only accepts this path.
        let token = format!("wweb-{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
        let path = format!("/webhook/{}", token);
        let listener = webhook::bind_webhook(self.webhook_port).await?;
        let task = tokio::spawn(webhook::run_webhook_listener(listener, path.clone(), events, self.stop.clone()));
        *self.listener.lock() = Some(task);
        *self.client_id.lock() = Some(session.client_id.clone());

        let body = json!({
            "clientId": session.client_id,
            "authDataPath": session.auth_path,
            "browser": {
                "executablePath": self.browser.executable,
                "args": self.browser.args,
            },
            "webhookUrl": format!("http://127.0.0.1:{}{}", self.webhook_port, path),
        });

        info!("[sidecar] Starting session '{}'", session.client_id);
        if let Err(e) = self.api.start_session(&body).await {
            self.stop_listener();
            return Err(e);
        }
        Ok(())
    }

    async fn destroy(&self) -> EngineResult<()> {
        let client_id = self.client_id.lock().clone();
        let result = match client_id {
            Some(client_id) => self.api.call::<()>(&client_id, "destroy", json!({})).await,
            None => Ok(()),
        };
        if let Err(e) = &result {
            warn!("[sidecar] destroy failed: {}", e);
        }
        self.stop_listener();
        result
    }

    async fn info(&self) -> EngineResult<ClientInfo> {
        self.call("info", json!({})).await
    }

    async fn send_message(&self, chat_id: &str, content: Content, options: SendOptions) -> EngineResult<Message> {
        self.call("sendMessage", json!({ "chatId": chat_id, "content": content, "options": options })).await
    }

    async fn react(&self, message_id: &str, reaction: &str) -> EngineResult<()> {
        self.call("react", json!({ "messageId": message_id, "reaction": reaction })).await
    }

    async fn delete_message(&self, message_id: &str, for_everyone: bool) -> EngineResult<()> {
        self.call("deleteMessage", json!({ "messageId": message_id, "everyone": for_everyone })).await
    }

    async fn quoted_message(&self, message_id: &str) -> EngineResult<Option<Message>> {
        self.call("getQuotedMessage", json!({ "messageId": message_id })).await
    }

    async fn download_media(&self, message_id: &str) -> EngineResult<MessageMedia> {
        self.call("downloadMedia", json!({ "messageId": message_id })).await
    }

    async fn chats(&self) -> EngineResult<Vec<Chat>> {
        self.call("getChats", json!({})).await
    }

    async fn chat(&self, chat_id: &str) -> EngineResult<Chat> {
        self.call("getChatById", json!({ "chatId": chat_id })).await
    }

    async fn contact(&self, contact_id: &str) -> EngineResult<Contact> {
        self.call("getContactById", json!({ "contactId": contact_id })).await
    }

    async fn set_status(&self, status: &str) -> EngineResult<()> {
        self.call("setStatus", json!({ "status": status })).await
    }

    async fn accept_invite(&self, code: &str) -> EngineResult<String> {
        self.call("acceptInvite", json!({ "inviteCode": code })).await
    }

    async fn open_chat_window_at(&self, message_id: &str) -> EngineResult<()> {
        self.call("openChatWindowAt", json!({ "messageId": message_id })).await
    }

    async fn update_chat(&self, chat_id: &str, action: ChatAction) -> EngineResult<()> {
        self.call("updateChat", json!({ "chatId": chat_id, "action": action })).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn calls_before_start_fail_cleanly() {
        let driver = SidecarDriver::new(&SidecarConfig::default(), &BrowserConfig::default()).unwrap();
        let err = driver.chats().await.unwrap_err();
        assert!(matches!(err, EngineError::Driver { .. }));
        assert!(driver.destroy().await.is_ok());
    }
}
