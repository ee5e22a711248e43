// wweb Engine: Session Driver
//
// Boundary to the external browser-automation / web messaging library.
// The core never speaks the protocol itself: it starts the driver, receives
// events on a channel, and calls these primitives for outbound work.

use crate::atoms::error::EngineResult;
use crate::atoms::types::{
    Chat, ChatAction, ClientInfo, Contact, Content, Event, Message, MessageMedia, SendOptions,
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

/// What the driver needs to bring a session up.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverSession {
    pub client_id: String,
    /// Persistent local auth store keyed by client id.
    pub auth_path: PathBuf,
}

#[async_trait]
pub trait SessionDriver: Send + Sync {
    /// Issues the connect/authenticate sequence and returns once it is under
    /// way. Events arrive on `events` for the life of the session.
    async fn initialize(&self, session: DriverSession, events: UnboundedSender<Event>) -> EngineResult<()>;

    /// Tears the session down. Auth data stays on disk.
    async fn destroy(&self) -> EngineResult<()>;

    async fn info(&self) -> EngineResult<ClientInfo>;

    /// Outbound-send primitive.
    async fn send_message(&self, chat_id: &str, content: Content, options: SendOptions) -> EngineResult<Message>;

    async fn react(&self, message_id: &str, reaction: &str) -> EngineResult<()>;

    async fn delete_message(&self, message_id: &str, for_everyone: bool) -> EngineResult<()>;

    /// Message quoted by `message_id`, if any.
    async fn quoted_message(&self, message_id: &str) -> EngineResult<Option<Message>>;

    async fn download_media(&self, message_id: &str) -> EngineResult<MessageMedia>;

    async fn chats(&self) -> EngineResult<Vec<Chat>>;

    async fn chat(&self, chat_id: &str) -> EngineResult<Chat>;

    async fn contact(&self, contact_id: &str) -> EngineResult<Contact>;

    async fn set_status(&self, status: &str) -> EngineResult<()>;

    /// Accepts a group invite, returning the joined chat id.
    async fn accept_invite(&self, code: &str) -> EngineResult<String>;

    async fn open_chat_window_at(&self, message_id: &str) -> EngineResult<()>;

    async fn update_chat(&self, chat_id: &str, action: ChatAction) -> EngineResult<()>;

    /// Sends `content` into the message's chat, quoting it.
    async fn reply(&self, message: &Message, content: Content) -> EngineResult<Message> {
        let options = SendOptions {
            quoted_message_id: Some(message.id.clone()),
            ..Default::default()
        };
        self.send_message(message.chat_id(), content, options).await
    }
}
