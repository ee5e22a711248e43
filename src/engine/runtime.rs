// wweb Engine: Session Runtime
// initialize, bootstrap, SessionHandle
//
// Wires one session: Session, handler, gateway, lifecycle, dispatcher, pump,
// watchdog, then starts the driver. `bootstrap` is the host-facing entry
// point that never fails the host process.

use super::config::{validate_config, PluginConfig};
use super::dispatcher::MessageDispatcher;
use super::driver::{DriverSession, SessionDriver};
use super::gateway::{SendGateway, SendOutcome};
use super::handler::SessionHandler;
use super::lifecycle::{ConnectionLifecycle, ReadyMessage};
use super::phone::PhoneNormalizer;
use super::pump::EventPump;
use super::session::{Session, SessionSnapshot};
use super::watchdog::{self, WatchdogAction};
use crate::atoms::error::EngineResult;
use crate::atoms::types::{Content, SendOptions};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// A running session. Dropping it leaves the tasks running; call `shutdown`.
pub struct SessionHandle {
    client_id: String,
    driver: Arc<dyn SessionDriver>,
    gateway: SendGateway,
    status: watch::Receiver<SessionSnapshot>,
    pump: JoinHandle<()>,
    watchdog: Option<JoinHandle<bool>>,
}

impl SessionHandle {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn gateway(&self) -> &SendGateway {
        &self.gateway
    }

    /// Sends to an MSISDN; see `SendGateway::send`.
    pub async fn send(
        &self,
        msisdn: &str,
        content: impl Into<Content>,
        options: SendOptions,
    ) -> EngineResult<SendOutcome> {
        self.gateway.send(msisdn, content, options).await
    }

    pub fn status(&self) -> SessionSnapshot {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.status.clone()
    }

    /// Destroys the driver session, then stops the pump and the watchdog.
    /// Auth data stays on disk.
    pub async fn shutdown(self) -> EngineResult<()> {
        info!("[runtime] Shutting down WhatsApp web {}", self.client_id);
        let result = self.driver.destroy().await;
        if let Err(e) = &result {
            warn!("[runtime] Driver destroy failed for {}: {}", self.client_id, e);
        }
        self.pump.abort();
        if let Some(w) = self.watchdog {
            w.abort();
        }
        result
    }
}

/// Brings up one session. Resolves once the driver's connect sequence has
/// been issued, not when the session becomes ready.
pub async fn initialize(
    config: &PluginConfig,
    handler: Arc<dyn SessionHandler>,
    driver: Arc<dyn SessionDriver>,
) -> EngineResult<SessionHandle> {
    let session = Session::new(config.client_id.as_str(), &config.auth_data_path);
    let driver_session = DriverSession {
        client_id: session.client_id().to_string(),
        auth_path: session.auth_path().to_path_buf(),
    };

    if let Err(e) = handler.prepare().await {
        warn!("[runtime] Handler prepare failed for {}: {}", config.client_id, e);
    }

    let gateway = SendGateway::new(driver.clone(), PhoneNormalizer::new(&config.region)?);
    let lifecycle = ConnectionLifecycle::new(session, handler.clone(), gateway.clone())
        .with_ready_message(ReadyMessage::from_config(config));
    let status = lifecycle.subscribe();
    let dispatcher = MessageDispatcher::new(handler, driver.clone());

    let (tx, rx) = mpsc::unbounded_channel();
    let pump = tokio::spawn(EventPump::new(lifecycle, dispatcher).run(rx));

    let watchdog = config.watchdog.enabled.then(|| {
        let action = if config.watchdog.exit_process { WatchdogAction::Exit } else { WatchdogAction::LogOnly };
        watchdog::arm(Duration::from_secs(config.watchdog.timeout_secs), status.clone(), action)
    });

    info!("[runtime] Initializing WhatsApp web {}..", config.client_id);
    if let Err(e) = driver.initialize(driver_session, tx).await {
        pump.abort();
        if let Some(w) = watchdog {
            w.abort();
        }
        return Err(e);
    }

    Ok(SessionHandle {
        client_id: config.client_id.clone(),
        driver,
        gateway,
        status,
        pump,
        watchdog,
    })
}

/// Host entry point. Returns `None` when the plugin is disabled or anything
/// fails; failures are logged and never reach the host.
pub async fn bootstrap(
    config: &PluginConfig,
    known_handlers: &[&str],
    handler: Arc<dyn SessionHandler>,
    driver: Arc<dyn SessionDriver>,
) -> Option<SessionHandle> {
    if !config.enabled {
        info!("[runtime] WhatsApp web plugin disabled");
        return None;
    }

    let started = match validate_config(config, known_handlers) {
        Ok(()) => initialize(config, handler, driver).await,
        Err(e) => Err(e),
    };
    match started {
        Ok(handle) => {
            info!("[runtime] Bootstrapped WhatsApp web: {}", config.client_id);
            Some(handle)
        }
        Err(e) => {
            error!("[runtime] WhatsApp web not bootstrapped: {}", e);
            None
        }
    }
}
