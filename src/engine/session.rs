// wweb Engine: Session State
//
// The one logical connection to the messaging service. Owned by the
// lifecycle; everyone else reads `SessionSnapshot`s published after each event.
//
// State machine:
//   Unauthenticated -> (QrPending)* -> Authenticated -> Ready -> Disconnected
//   Disconnected behaves like Unauthenticated for the next pairing round.
//   AuthenticationFailed resets to Unauthenticated from anywhere.

use crate::atoms::types::Event;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    QrPending,
    Authenticated,
    Ready,
    Disconnected,
}

#[derive(Debug)]
pub struct Session {
    client_id: String,
    /// Local auth store for this client id; handed to the driver.
    auth_path: PathBuf,
    state: SessionState,
    authenticated: bool,
    ready: bool,
    qr: Option<String>,
}

/// Read-only view of a session, cheap to clone and publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub client_id: String,
    pub state: SessionState,
    pub authenticated: bool,
    pub ready: bool,
    pub qr: Option<String>,
}

impl Session {
    /// Binds a new session to `client_id`, with its auth store under `auth_root`.
    pub fn new(client_id: impl Into<String>, auth_root: &Path) -> Self {
        let client_id = client_id.into();
        let auth_path = auth_root.join(format!("session-{}", client_id));
        Session {
            client_id,
            auth_path,
            state: SessionState::Unauthenticated,
            authenticated: false,
            ready: false,
            qr: None,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn auth_path(&self) -> &Path {
        &self.auth_path
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn qr(&self) -> Option<&str> {
        self.qr.as_deref()
    }

    /// Applies a lifecycle event. Returns true when the state changed.
    /// Message and group events never touch the session.
    pub fn apply(&mut self, event: &Event) -> bool {
        let before = self.state;
        match event {
            Event::QrReceived(qr) => {
                // A restored or freshly paired session never needs a QR again.
                if self.authenticated {
                    warn!("[session] {} ignoring QR after authentication", self.client_id);
                    return false;
                }
                self.qr = Some(qr.clone());
                self.state = SessionState::QrPending;
                return true;
            }
            Event::Authenticated => {
                // Re-authentication drops ready until the next ready event.
                self.authenticated = true;
                self.ready = false;
                self.qr = None;
                self.state = SessionState::Authenticated;
            }
            Event::AuthenticationFailed(_) => {
                self.authenticated = false;
                self.ready = false;
                self.qr = None;
                self.state = SessionState::Unauthenticated;
            }
            Event::Ready => {
                // The library only reaches ready on an authenticated session,
                // even when the authenticated event was missed.
                self.authenticated = true;
                self.ready = true;
                self.qr = None;
                self.state = SessionState::Ready;
            }
            Event::Disconnected(_) => {
                self.authenticated = false;
                self.ready = false;
                self.qr = None;
                self.state = SessionState::Disconnected;
            }
            _ => return false,
        }
        before != self.state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            client_id: self.client_id.clone(),
            state: self.state,
            authenticated: self.authenticated,
            ready: self.ready,
            qr: self.qr.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("test", Path::new("/tmp/wweb"))
    }

    #[test]
    fn auth_path_keyed_by_client_id() {
        let s = Session::new("shop", Path::new("/data/auth"));
        assert_eq!(s.auth_path(), Path::new("/data/auth/session-shop"));
    }

    #[test]
    fn qr_then_auth_then_ready() {
        let mut s = session();
        s.apply(&Event::QrReceived("qr-1".into()));
        assert_eq!(s.state(), SessionState::QrPending);
        assert_eq!(s.qr(), Some("qr-1"));

        s.apply(&Event::Authenticated);
        s.apply(&Event::Ready);
        assert!(s.is_authenticated());
        assert!(s.is_ready());
        assert_eq!(s.qr(), None);
        assert_eq!(s.state(), SessionState::Ready);
    }

    #[test]
    fn qr_self_loop_replaces_payload() {
        let mut s = session();
        s.apply(&Event::QrReceived("qr-1".into()));
        assert!(s.apply(&Event::QrReceived("qr-2".into())));
        assert_eq!(s.qr(), Some("qr-2"));
        assert_eq!(s.state(), SessionState::QrPending);
    }

    #[test]
    fn qr_ignored_once_authenticated() {
        let mut s = session();
        s.apply(&Event::Authenticated);
        assert!(!s.apply(&Event::QrReceived("late".into())));
        assert_eq!(s.qr(), None);
        assert_eq!(s.state(), SessionState::Authenticated);
    }

    #[test]
    fn disconnected_clears_flags_from_any_state() {
        for prior in [vec![], vec![Event::Authenticated], vec![Event::Authenticated, Event::Ready]] {
            let mut s = session();
            for ev in &prior {
                s.apply(ev);
            }
            s.apply(&Event::Disconnected("LOGOUT".into()));
            assert!(!s.is_authenticated());
            assert!(!s.is_ready());
            assert_eq!(s.state(), SessionState::Disconnected);
        }
    }

    #[test]
    fn disconnected_loops_back_to_pairing() {
        let mut s = session();
        s.apply(&Event::Authenticated);
        s.apply(&Event::Ready);
        s.apply(&Event::Disconnected("NAVIGATION".into()));
        s.apply(&Event::QrReceived("again".into()));
        assert_eq!(s.state(), SessionState::QrPending);
        assert_eq!(s.qr(), Some("again"));
    }

    #[test]
    fn auth_failure_resets_to_unauthenticated() {
        let mut s = session();
        s.apply(&Event::QrReceived("qr".into()));
        s.apply(&Event::AuthenticationFailed("restore failed".into()));
        assert_eq!(s.state(), SessionState::Unauthenticated);
        assert_eq!(s.qr(), None);
        assert!(!s.is_authenticated());
    }

    #[test]
    fn ready_never_without_authentication() {
        let mut s = session();
        s.apply(&Event::Ready);
        assert!(s.is_ready());
        assert!(s.is_authenticated());
    }

    #[test]
    fn authenticated_after_ready_clears_ready() {
        let mut s = session();
        s.apply(&Event::Ready);
        assert!(s.apply(&Event::Authenticated));
        assert!(!s.is_ready());
        assert!(s.is_authenticated());
        assert_eq!(s.state(), SessionState::Authenticated);
    }

    #[test]
    fn non_lifecycle_events_leave_state_alone() {
        let mut s = session();
        assert!(!s.apply(&Event::StateChanged("CONNECTED".into())));
        assert!(!s.apply(&Event::Loading { percent: 10, message: "x".into() }));
        assert_eq!(s.state(), SessionState::Unauthenticated);
    }
}
