// wweb Engine: Session Handler
//
// The pluggable set of callbacks invoked for every session event. Each
// callback answers "propagate": true lets the built-in default behavior run
// afterwards, false suppresses it. Unimplemented callbacks propagate.
//
// All callbacks go through `invoke_handler_or_default`, which turns handler
// errors and panics into propagate=true so a broken handler never silences
// the defaults.

use crate::atoms::error::EngineResult;
use crate::atoms::types::{GroupNotification, Message, MessageAck};
use async_trait::async_trait;
use futures::FutureExt;
use log::{error, warn};
use std::future::Future;
use std::panic::AssertUnwindSafe;

#[async_trait]
pub trait SessionHandler: Send + Sync {
    /// Called once before any event is wired. Failures are logged only.
    async fn prepare(&self) -> EngineResult<()> {
        Ok(())
    }

    // ── Connection state ───────────────────────────────────────────────

    async fn on_loading(&self, _percent: u8, _message: &str) -> EngineResult<bool> {
        Ok(true)
    }

    async fn on_qr(&self, _qr: &str) -> EngineResult<bool> {
        Ok(true)
    }

    async fn on_authenticated(&self) -> EngineResult<bool> {
        Ok(true)
    }

    async fn on_authentication_failure(&self, _reason: &str) -> EngineResult<bool> {
        Ok(true)
    }

    async fn on_ready(&self) -> EngineResult<bool> {
        Ok(true)
    }

    async fn on_state_changed(&self, _state: &str) -> EngineResult<bool> {
        Ok(true)
    }

    async fn on_disconnected(&self, _reason: &str) -> EngineResult<bool> {
        Ok(true)
    }

    // ── Messages ───────────────────────────────────────────────────────

    async fn on_message(&self, _message: &Message) -> EngineResult<bool> {
        Ok(true)
    }

    async fn on_message_created(&self, _message: &Message) -> EngineResult<bool> {
        Ok(true)
    }

    async fn on_message_revoked_by_everyone(
        &self,
        _after: &Message,
        _before: Option<&Message>,
    ) -> EngineResult<bool> {
        Ok(true)
    }

    async fn on_message_revoked_by_me(&self, _message: &Message) -> EngineResult<bool> {
        Ok(true)
    }

    async fn on_message_acknowledged(&self, _message: &Message, _ack: MessageAck) -> EngineResult<bool> {
        Ok(true)
    }

    // ── Groups ─────────────────────────────────────────────────────────

    async fn on_user_joined(&self, _notification: &GroupNotification) -> EngineResult<bool> {
        Ok(true)
    }

    async fn on_user_left(&self, _notification: &GroupNotification) -> EngineResult<bool> {
        Ok(true)
    }

    async fn on_group_update(&self, _notification: &GroupNotification) -> EngineResult<bool> {
        Ok(true)
    }
}

/// Handler that lets every default run.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughHandler;

#[async_trait]
impl SessionHandler for PassthroughHandler {}

/// Runs one handler callback and resolves its propagate decision.
/// `Err` and panics both resolve to true.
pub async fn invoke_handler_or_default<F>(callback: &str, fut: F) -> bool
where
    F: Future<Output = EngineResult<bool>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(propagate)) => propagate,
        Ok(Err(e)) => {
            warn!("[handler] {} failed, running default: {}", callback, e);
            true
        }
        Err(_) => {
            error!("[handler] {} panicked, running default", callback);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::error::EngineError;

    #[tokio::test]
    async fn ok_value_is_returned() {
        assert!(!invoke_handler_or_default("onQr", async { Ok(false) }).await);
        assert!(invoke_handler_or_default("onQr", async { Ok(true) }).await);
    }

    #[tokio::test]
    async fn error_defaults_to_propagate() {
        let propagate = invoke_handler_or_default("onReady", async {
            Err(EngineError::Handler("boom".into()))
        }).await;
        assert!(propagate);
    }

    #[tokio::test]
    async fn panic_defaults_to_propagate() {
        let propagate = invoke_handler_or_default("onMessage", async {
            if true {
                panic!("handler bug");
            }
            Ok(false)
        }).await;
        assert!(propagate);
    }

    #[tokio::test]
    async fn passthrough_propagates_everything() {
        let h = PassthroughHandler;
        assert!(h.on_qr("x").await.unwrap());
        assert!(h.on_message(&Message::default()).await.unwrap());
        assert!(h.on_group_update(&GroupNotification::default()).await.unwrap());
        assert!(h.prepare().await.is_ok());
    }
}
