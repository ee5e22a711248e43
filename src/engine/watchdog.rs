// wweb Engine: Startup Watchdog
//
// One-shot timer armed at initialization. When it fires and the session is
// neither waiting on a QR scan nor authenticated+ready, the startup is
// declared failed; in exit mode the process terminates so an external
// supervisor restarts it. Advisory: never renewed, fires at most once.

use super::session::SessionSnapshot;
use crate::atoms::error::EngineError;
use log::{error, info};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogAction {
    /// Log the timeout and keep running.
    LogOnly,
    /// Log the timeout and exit the process with status 1.
    Exit,
}

/// True when the snapshot counts as a failed startup.
pub fn startup_failed(snapshot: &SessionSnapshot) -> bool {
    snapshot.qr.is_none() && !(snapshot.authenticated && snapshot.ready)
}

/// Arms the watchdog. The task resolves to whether the timeout was declared.
pub fn arm(
    timeout: Duration,
    status: watch::Receiver<SessionSnapshot>,
    action: WatchdogAction,
) -> JoinHandle<bool> {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;

        let snapshot = status.borrow().clone();
        if !startup_failed(&snapshot) {
            info!("[watchdog] {} healthy ({:?})", snapshot.client_id, snapshot.state);
            return false;
        }

        let err = EngineError::LifecycleTimeout(timeout.as_secs());
        error!("[watchdog] WhatsApp web client {}: {}", snapshot.client_id, err);
        if action == WatchdogAction::Exit {
            error!("[watchdog] Restarting..");
            std::process::exit(1);
        }
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::session::SessionState;

    fn snapshot(authenticated: bool, ready: bool, qr: Option<&str>) -> SessionSnapshot {
        SessionSnapshot {
            client_id: "t".into(),
            state: SessionState::Unauthenticated,
            authenticated,
            ready,
            qr: qr.map(String::from),
        }
    }

    #[test]
    fn pending_qr_is_not_a_failure() {
        assert!(!startup_failed(&snapshot(false, false, Some("qr"))));
    }

    #[test]
    fn ready_session_is_healthy() {
        assert!(!startup_failed(&snapshot(true, true, None)));
    }

    #[test]
    fn authenticated_but_not_ready_fails() {
        assert!(startup_failed(&snapshot(true, false, None)));
        assert!(startup_failed(&snapshot(false, false, None)));
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_timeout() {
        let (_tx, rx) = watch::channel(snapshot(false, false, None));
        let handle = arm(Duration::from_secs(60), rx, WatchdogAction::LogOnly);
        assert!(handle.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn sees_state_published_before_firing() {
        let (tx, rx) = watch::channel(snapshot(false, false, None));
        let handle = arm(Duration::from_secs(60), rx, WatchdogAction::LogOnly);
        tx.send_replace(snapshot(true, true, None));
        assert!(!handle.await.unwrap());
    }
}
