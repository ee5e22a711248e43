//! Handlers selectable by name from the config's `handler` key.

use async_trait::async_trait;
use std::sync::Arc;
use wweb_plugin::{EngineResult, GroupNotification, Message, PassthroughHandler, SessionHandler};

pub const HANDLER_NAMES: &[&str] = &["default", "silent"];

/// Logs lifecycle events as usual but never runs commands or group replies.
#[derive(Debug, Default)]
pub struct SilentHandler;

#[async_trait]
impl SessionHandler for SilentHandler {
    async fn on_message(&self, _message: &Message) -> EngineResult<bool> {
        Ok(false)
    }

    async fn on_user_joined(&self, _notification: &GroupNotification) -> EngineResult<bool> {
        Ok(false)
    }

    async fn on_user_left(&self, _notification: &GroupNotification) -> EngineResult<bool> {
        Ok(false)
    }

    async fn on_group_update(&self, _notification: &GroupNotification) -> EngineResult<bool> {
        Ok(false)
    }
}

pub fn resolve(name: &str) -> Option<Arc<dyn SessionHandler>> {
    match name {
        "default" => Some(Arc::new(PassthroughHandler)),
        "silent" => Some(Arc::new(SilentHandler)),
        _ => None,
    }
}
