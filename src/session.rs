//! Session identity and authentication state changes.
//!
//! The authentication provider itself (sign-in flows, token refresh) lives in
//! the host application. The stores only need to know who the current owner is
//! and to hear about transitions, which they receive over a `watch` channel.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

/// Opaque id of the signed-in user that owns remote rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for OwnerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who the stores are acting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Session {
    Authenticated(OwnerId),
    #[default]
    Anonymous,
}

impl Session {
    pub fn owner(&self) -> Option<OwnerId> {
        match self {
            Session::Authenticated(owner) => Some(*owner),
            Session::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }
}

impl From<Option<Uuid>> for Session {
    fn from(owner: Option<Uuid>) -> Self {
        match owner {
            Some(id) => Session::Authenticated(OwnerId(id)),
            None => Session::Anonymous,
        }
    }
}

/// Source of the current session and of session change events.
pub trait AuthProvider: Send + Sync {
    /// The session as of now.
    fn current(&self) -> Session;

    /// A receiver that yields every subsequent session transition.
    fn subscribe(&self) -> watch::Receiver<Session>;
}

/// `watch`-backed provider that the host drives from its auth callbacks.
#[derive(Debug)]
pub struct SessionBroadcaster {
    tx: watch::Sender<Session>,
}

impl SessionBroadcaster {
    pub fn new(initial: Session) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn sign_in(&self, owner: OwnerId) {
        self.publish(Session::Authenticated(owner));
    }

    pub fn sign_out(&self) {
        self.publish(Session::Anonymous);
    }

    /// Publishes `session` if it differs from the current one.
    ///
    /// Token refreshes that keep the same owner do not wake subscribers.
    pub fn publish(&self, session: Session) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == session {
                false
            } else {
                *current = session;
                true
            }
        });
        if changed {
            tracing::info!(authenticated = session.is_authenticated(), "Session changed");
        }
    }
}

impl Default for SessionBroadcaster {
    fn default() -> Self {
        Self::new(Session::Anonymous)
    }
}

impl AuthProvider for SessionBroadcaster {
    fn current(&self) -> Session {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_option() {
        let id = Uuid::new_v4();
        assert_eq!(
            Session::from(Some(id)),
            Session::Authenticated(OwnerId::new(id))
        );
        assert_eq!(Session::from(None), Session::Anonymous);
        assert_eq!(Session::from(Some(id)).owner(), Some(OwnerId::new(id)));
        assert!(Session::Anonymous.owner().is_none());
    }

    #[test]
    fn test_owner_id_serializes_as_uuid_string() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(OwnerId::new(id)).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }

    #[tokio::test]
    async fn test_broadcaster_publishes_transitions() {
        let auth = SessionBroadcaster::default();
        let mut rx = auth.subscribe();
        let owner = OwnerId::new(Uuid::new_v4());

        auth.sign_in(owner);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Session::Authenticated(owner));
        assert_eq!(auth.current(), Session::Authenticated(owner));

        auth.sign_out();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Session::Anonymous);
    }

    #[test]
    fn test_same_session_does_not_notify() {
        let owner = OwnerId::new(Uuid::new_v4());
        let auth = SessionBroadcaster::new(Session::Authenticated(owner));
        let rx = auth.subscribe();

        auth.sign_in(owner);

        assert!(!rx.has_changed().unwrap());
    }
}
