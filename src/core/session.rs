//! Signed-in identity

use super::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tokio::sync::watch;
use tracing::debug;

/// Stable opaque identifier of an account. Scopes every document collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Result<Self, ValidationError> {
        let id = id.trim();
        if id.is_empty() || id.contains('/') {
            return Err(ValidationError::InvalidUserId(id.to_string()));
        }
        Ok(UserId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserId::new(&value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Holds the current user, or none when signed out, and notifies subscribers on change.
pub struct Session {
    current: watch::Sender<Option<UserId>>,
}

impl Session {
    pub fn new(user: Option<UserId>) -> Self {
        let (current, _) = watch::channel(user);
        Self { current }
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.current.borrow().clone()
    }

    pub fn sign_in(&self, user: UserId) {
        debug!("Signing in as {}", user);
        self.set(Some(user));
    }

    pub fn sign_out(&self) {
        debug!("Signing out");
        self.set(None);
    }

    /// A receiver that wakes whenever the signed-in user changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.current.subscribe()
    }

    fn set(&self, user: Option<UserId>) {
        self.current.send_if_modified(|current| {
            if *current == user {
                return false;
            }
            *current = user;
            true
        });
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_validation() {
        assert_eq!(UserId::new(" alice ").unwrap().as_str(), "alice");
        assert!(UserId::new("").is_err());
        assert!(UserId::new("a/b").is_err());
    }

    #[tokio::test]
    async fn test_session_notifies_on_change() {
        let session = Session::default();
        let mut rx = session.subscribe();
        assert!(session.current_user().is_none());

        let alice = UserId::new("alice").unwrap();
        session.sign_in(alice.clone());
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(alice.clone()));

        // Signing in again as the same user is not a change.
        session.sign_in(alice);
        assert!(!rx.has_changed().unwrap());

        session.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }
}
