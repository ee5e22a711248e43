// wweb Engine: Connection Lifecycle
//
// Owns the Session. For every connection-state event the session is updated
// first, then the handler decides whether the default behavior runs:
// structured log, terminal QR, and on Ready the optional test message.
// The latest snapshot is published on a watch channel after each event.

use super::gateway::SendGateway;
use super::handler::{invoke_handler_or_default, SessionHandler};
use super::qr::print_qr;
use super::session::{Session, SessionSnapshot};
use crate::atoms::types::{Event, SendOptions};
use crate::engine::config::PluginConfig;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Message sent once per Ready event.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyMessage {
    pub msisdn: String,
    pub text: String,
    pub delay: Duration,
}

impl ReadyMessage {
    pub fn from_config(config: &PluginConfig) -> Option<Self> {
        let (msisdn, text) = config.test_message()?;
        let delay_ms = config.test.as_ref().map(|t| t.delay_ms).unwrap_or(0);
        Some(ReadyMessage { msisdn, text, delay: Duration::from_millis(delay_ms) })
    }
}

pub struct ConnectionLifecycle {
    session: Session,
    handler: Arc<dyn SessionHandler>,
    gateway: SendGateway,
    ready_message: Option<ReadyMessage>,
    status: watch::Sender<SessionSnapshot>,
}

impl ConnectionLifecycle {
    pub fn new(session: Session, handler: Arc<dyn SessionHandler>, gateway: SendGateway) -> Self {
        let (status, _) = watch::channel(session.snapshot());
        ConnectionLifecycle { session, handler, gateway, ready_message: None, status }
    }

    pub fn with_ready_message(mut self, message: Option<ReadyMessage>) -> Self {
        self.ready_message = message;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.status.subscribe()
    }

    /// Handles one connection-state event and returns the propagate decision.
    /// A QR arriving after authentication is dropped before the handler.
    pub async fn handle(&mut self, event: &Event) -> bool {
        let stale_qr = matches!(event, Event::QrReceived(_)) && self.session.is_authenticated();
        self.session.apply(event);
        self.status.send_replace(self.session.snapshot());
        if stale_qr {
            return false;
        }

        let id = self.session.client_id().to_string();
        let h = &self.handler;
        match event {
            Event::Loading { percent, message } => {
                let propagate = invoke_handler_or_default("on_loading", h.on_loading(*percent, message)).await;
                if propagate {
                    info!("[lifecycle] {} LOADING SCREEN {}% {}", id, percent, message);
                }
                propagate
            }
            Event::QrReceived(qr) => {
                let propagate = invoke_handler_or_default("on_qr", h.on_qr(qr)).await;
                if propagate {
                    info!("[lifecycle] {} QR RECEIVED, scan it with the phone app", id);
                    print_qr(qr);
                }
                propagate
            }
            Event::Authenticated => {
                let propagate = invoke_handler_or_default("on_authenticated", h.on_authenticated()).await;
                if propagate {
                    info!("[lifecycle] {} AUTHENTICATED", id);
                }
                propagate
            }
            Event::AuthenticationFailed(reason) => {
                let propagate = invoke_handler_or_default(
                    "on_authentication_failure",
                    h.on_authentication_failure(reason),
                ).await;
                if propagate {
                    error!("[lifecycle] {} AUTHENTICATION FAILURE: {}", id, reason);
                }
                propagate
            }
            Event::Ready => {
                let propagate = invoke_handler_or_default("on_ready", h.on_ready()).await;
                if propagate {
                    info!("[lifecycle] {} READY", id);
                    self.spawn_ready_message();
                }
                propagate
            }
            Event::StateChanged(state) => {
                let propagate = invoke_handler_or_default("on_state_changed", h.on_state_changed(state)).await;
                if propagate {
                    info!("[lifecycle] {} CHANGE STATE {}", id, state);
                }
                propagate
            }
            Event::Disconnected(reason) => {
                let propagate = invoke_handler_or_default("on_disconnected", h.on_disconnected(reason)).await;
                if propagate {
                    warn!("[lifecycle] {} was logged out: {}", id, reason);
                }
                propagate
            }
            other => {
                warn!("[lifecycle] {} is not a lifecycle event", other.name());
                false
            }
        }
    }

    fn spawn_ready_message(&self) {
        let Some(message) = self.ready_message.clone() else {
            return;
        };
        let gateway = self.gateway.clone();
        tokio::spawn(async move {
            if !message.delay.is_zero() {
                tokio::time::sleep(message.delay).await;
            }
            match gateway.send(&message.msisdn, message.text.as_str(), SendOptions::default()).await {
                Ok(outcome) => info!("[lifecycle] Test message to {:?}: {}", message.msisdn, outcome.as_str()),
                Err(e) => error!("[lifecycle] Test message to {:?} failed: {}", message.msisdn, e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::TestDirective;

    #[test]
    fn ready_message_from_config() {
        let config = PluginConfig {
            client_id: "shop".into(),
            test: Some(TestDirective { msisdn: "0812".into(), message: None, delay_ms: 1500 }),
            ..Default::default()
        };
        let msg = ReadyMessage::from_config(&config).unwrap();
        assert_eq!(msg.msisdn, "0812");
        assert_eq!(msg.delay, Duration::from_millis(1500));
        assert!(msg.text.contains("shop"));
    }

    #[test]
    fn no_ready_message_without_directive() {
        assert!(ReadyMessage::from_config(&PluginConfig::default()).is_none());
    }
}
