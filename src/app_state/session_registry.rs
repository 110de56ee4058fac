/// Process-wide registry of logged-in remote sessions
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::app_state::SessionKey;
use crate::remote::RemoteSession;

/// A registered session that owns connections which must be released
#[async_trait]
pub trait ManagedSession: Send + Sync + 'static {
    async fn close(&self);
}

#[async_trait]
impl ManagedSession for RemoteSession {
    async fn close(&self) {
        RemoteSession::close(self).await
    }
}

/// Map from [`SessionKey`] to live session.
///
/// Entries never expire on their own; they leave through [`remove`](Self::remove),
/// replacement by a newer login, or [`shutdown`](Self::shutdown).
pub struct SessionRegistry<S: ManagedSession = RemoteSession> {
    sessions: Arc<Mutex<HashMap<SessionKey, Arc<S>>>>,
}

impl<S: ManagedSession> Clone for SessionRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<S: ManagedSession> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ManagedSession> SessionRegistry<S> {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register `session` under `key`. A session it replaces is closed, so two
    /// logins racing on one key never leak connections. Returns whether a
    /// previous session was replaced.
    pub async fn insert(&self, key: SessionKey, session: Arc<S>) -> bool {
        let previous = {
            let mut sessions = self.sessions.lock().await;
            sessions.insert(key.clone(), session)
        };
        match previous {
            Some(previous) => {
                info!("Replacing existing session for {}", key);
                previous.close().await;
                true
            }
            None => {
                info!("Registered session for {}", key);
                false
            }
        }
    }

    /// Live session for `key`; `None` means "not logged in".
    pub async fn get(&self, key: &SessionKey) -> Option<Arc<S>> {
        let sessions = self.sessions.lock().await;
        sessions.get(key).cloned()
    }

    /// Remove and close the session for `key`.
    pub async fn remove(&self, key: &SessionKey) -> bool {
        let removed = {
            let mut sessions = self.sessions.lock().await;
            sessions.remove(key)
        };
        match removed {
            Some(session) => {
                session.close().await;
                info!("Removed session for {}", key);
                true
            }
            None => false,
        }
    }

    /// Get the number of registered sessions
    pub async fn len(&self) -> usize {
        let sessions = self.sessions.lock().await;
        sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Close every session and return the number of sessions closed
    pub async fn shutdown(&self) -> usize {
        let drained: Vec<Arc<S>> = {
            let mut sessions = self.sessions.lock().await;
            sessions.drain().map(|(_, session)| session).collect()
        };
        let count = drained.len();
        for session in drained {
            session.close().await;
        }
        info!("Closed {} remote sessions", count);
        count
    }
}
