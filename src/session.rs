//! Signed-in user state, owned by the application root and handed to every
//! component that needs it.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use crate::error::AppError;
use crate::models::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    pub email: String,
}

pub struct SessionContext {
    tx: watch::Sender<Option<Session>>,
}

impl SessionContext {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn sign_in(&self, session: Session) {
        info!(user_id = %session.user_id, role = ?session.role, "signed in");
        self.tx.send_replace(Some(session));
    }

    pub fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            info!("signed out");
        }
    }

    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// The signed-in session, provided it has `role`.
    pub fn require(&self, role: Role) -> Result<Session, AppError> {
        match self.current() {
            Some(session) if session.role == role => Ok(session),
            Some(_) => Err(AppError::Unauthorized(
                match role {
                    Role::Artist => "This needs an artist account",
                    Role::Fan => "This needs a fan account",
                }
                .to_string(),
            )),
            None => Err(AppError::Unauthorized("Please sign in first".to_string())),
        }
    }

    /// Ends the lifecycle; live subscriptions observe the close.
    pub fn shutdown(self) {
        info!(subscribers = self.tx.receiver_count(), "session context closed");
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Dropping the subscription unsubscribes.
pub struct SessionSubscription {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionSubscription {
    pub fn current(&self) -> Option<Session> {
        self.rx.borrow().clone()
    }

    /// Waits for the next change. `None` once the context is gone.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
