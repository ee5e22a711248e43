// wweb Engine: Message Dispatcher
//
// Message and group events. The handler runs first; when it propagates, the
// default behavior runs: inbound text is matched against the command table,
// group events are acknowledged into the originating chat. Driver work for
// the defaults is spawned; the pump only waits for the handler.

use super::commands::{Command, CommandTable};
use super::driver::SessionDriver;
use super::handler::{invoke_handler_or_default, SessionHandler};
use crate::atoms::constants::{GROUP_UPDATED_REPLY, USER_JOINED_REPLY, USER_LEFT_REPLY};
use crate::atoms::error::EngineError;
use crate::atoms::types::{Event, GroupNotification, Message, SendOptions};
use log::{debug, error, info, warn};
use std::sync::Arc;

pub struct MessageDispatcher {
    handler: Arc<dyn SessionHandler>,
    driver: Arc<dyn SessionDriver>,
    commands: CommandTable,
}

impl MessageDispatcher {
    pub fn new(handler: Arc<dyn SessionHandler>, driver: Arc<dyn SessionDriver>) -> Self {
        Self::with_commands(handler, driver, CommandTable::default())
    }

    pub fn with_commands(
        handler: Arc<dyn SessionHandler>,
        driver: Arc<dyn SessionDriver>,
        commands: CommandTable,
    ) -> Self {
        MessageDispatcher { handler, driver, commands }
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    /// Handles one message or group event. Returns the propagate decision;
    /// lifecycle events are not ours and return false untouched.
    pub async fn handle(&self, event: &Event) -> bool {
        let h = &self.handler;
        match event {
            Event::InboundMessage(msg) => {
                let propagate = invoke_handler_or_default("on_message", h.on_message(msg)).await;
                if propagate {
                    self.on_inbound(msg).await;
                }
                propagate
            }
            Event::MessageCreated(msg) => {
                let propagate =
                    invoke_handler_or_default("on_message_created", h.on_message_created(msg)).await;
                if propagate {
                    // Own outgoing messages are frequent; keep them out of info.
                    debug!("[dispatch] Message created: {}", msg);
                }
                propagate
            }
            Event::MessageRevokedByEveryone { after, before } => {
                let propagate = invoke_handler_or_default(
                    "on_message_revoked_by_everyone",
                    h.on_message_revoked_by_everyone(after, before.as_ref()),
                ).await;
                if propagate {
                    match before {
                        Some(before) => info!("[dispatch] Message revoked for everyone: {} (was: {})", after, before.body),
                        None => info!("[dispatch] Message revoked for everyone: {}", after),
                    }
                }
                propagate
            }
            Event::MessageRevokedByMe(msg) => {
                let propagate =
                    invoke_handler_or_default("on_message_revoked_by_me", h.on_message_revoked_by_me(msg)).await;
                if propagate {
                    info!("[dispatch] Message revoked by me: {}", msg);
                }
                propagate
            }
            Event::MessageAcknowledged { message, ack } => {
                let propagate = invoke_handler_or_default(
                    "on_message_acknowledged",
                    h.on_message_acknowledged(message, *ack),
                ).await;
                if propagate {
                    debug!("[dispatch] Ack {:?} for {}", ack, message.id);
                }
                propagate
            }
            Event::UserJoined(n) => {
                let propagate = invoke_handler_or_default("on_user_joined", h.on_user_joined(n)).await;
                if propagate {
                    self.acknowledge_group(n, USER_JOINED_REPLY).await;
                }
                propagate
            }
            Event::UserLeft(n) => {
                let propagate = invoke_handler_or_default("on_user_left", h.on_user_left(n)).await;
                if propagate {
                    self.acknowledge_group(n, USER_LEFT_REPLY).await;
                }
                propagate
            }
            Event::GroupUpdated(n) => {
                let propagate = invoke_handler_or_default("on_group_update", h.on_group_update(n)).await;
                if propagate {
                    self.acknowledge_group(n, GROUP_UPDATED_REPLY).await;
                }
                propagate
            }
            other => {
                warn!("[dispatch] {} is not a message event", other.name());
                false
            }
        }
    }

    /// Matched commands run on a spawned task.
    async fn on_inbound(&self, msg: &Message) {
        info!("[dispatch] Message received: {}", msg);
        if !msg.has_body() {
            return;
        }

        let driver = self.driver.clone();
        let msg = msg.clone();
        match self.commands.find(&msg.body).copied() {
            Some(command) => {
                tokio::spawn(async move { run_command(command, driver.as_ref(), &msg).await });
            }
            None => {
                // Shared locations are echoed back.
                if let Some(location) = msg.location.clone() {
                    tokio::spawn(async move {
                        if let Err(e) = driver.reply(&msg, location.into()).await {
                            error!("[dispatch] Location echo to {} failed: {}", msg.id, e);
                        }
                    });
                }
            }
        }
    }

    async fn acknowledge_group(&self, notification: &GroupNotification, reply: &'static str) {
        info!("[dispatch] {}", notification);
        let driver = self.driver.clone();
        let chat_id = notification.chat_id.clone();
        tokio::spawn(async move {
            let sent = driver.send_message(&chat_id, reply.into(), SendOptions::default()).await;
            if let Err(e) = sent {
                error!("[dispatch] Group reply to {} failed: {}", chat_id, e);
            }
        });
    }
}

async fn run_command(command: Command, driver: &dyn SessionDriver, msg: &Message) {
    match command.run(driver, msg).await {
        Ok(()) => {}
        Err(EngineError::Precondition(explanation)) => {
            if let Err(e) = driver.reply(msg, explanation.into()).await {
                error!("[dispatch] Reply to {} failed: {}", msg.id, e);
            }
        }
        Err(e) => error!("[dispatch] {} failed: {}", command.matcher.literal(), e),
    }
}
