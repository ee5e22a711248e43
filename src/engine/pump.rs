// wweb Engine: Event Pump
//
// Drains the driver's event channel in arrival order on a single task.
// Lifecycle events go to the ConnectionLifecycle, everything else to the
// MessageDispatcher. Each event is fully handled before the next is read.

use super::dispatcher::MessageDispatcher;
use super::lifecycle::ConnectionLifecycle;
use crate::atoms::types::Event;
use log::{debug, info};
use tokio::sync::mpsc::UnboundedReceiver;

pub struct EventPump {
    lifecycle: ConnectionLifecycle,
    dispatcher: MessageDispatcher,
}

impl EventPump {
    pub fn new(lifecycle: ConnectionLifecycle, dispatcher: MessageDispatcher) -> Self {
        EventPump { lifecycle, dispatcher }
    }

    /// Runs until every sender is dropped.
    pub async fn run(mut self, mut events: UnboundedReceiver<Event>) {
        let client_id = self.lifecycle.session().client_id().to_string();
        info!("[pump] Event pump started for {}", client_id);

        while let Some(event) = events.recv().await {
            let propagate = if event.is_lifecycle() {
                self.lifecycle.handle(&event).await
            } else {
                self.dispatcher.handle(&event).await
            };
            debug!("[pump] {} handled (propagate={})", event.name(), propagate);
        }

        info!("[pump] Event channel closed for {}", client_id);
    }
}
