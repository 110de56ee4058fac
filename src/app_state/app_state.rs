/// Application state implementation for rs_webssh
use std::sync::Arc;

use tracing::{error, info};

use crate::app_state::{SessionKey, SessionRegistry};
use crate::config::AppConfig;
use crate::pty::ShellConnector;
use crate::remote::{ConnectParams, RemoteError, RemoteResult, RemoteSession};
use crate::store::CredentialStore;

/// Application state containing shared data across handlers
#[derive(Clone)]
pub struct AppState {
    /// Logged-in file sessions
    pub registry: SessionRegistry,
    /// Durable credential bookkeeping
    pub store: CredentialStore,
    /// Opens shells for terminal connections
    pub shell_connector: Arc<dyn ShellConnector>,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create a new instance of AppState with configuration
    pub fn new(
        config: AppConfig,
        store: CredentialStore,
        shell_connector: Arc<dyn ShellConnector>,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            store,
            shell_connector,
            config: Arc::new(config),
        }
    }

    /// Connect a remote session, register it and record the credentials.
    pub async fn login(
        &self,
        host_and_port: &str,
        username: &str,
        password: &str,
    ) -> RemoteResult<SessionKey> {
        let key = SessionKey::from_request(host_and_port, username)
            .ok_or_else(|| RemoteError::Other(format!("Invalid host: {}", host_and_port)))?;
        let params = ConnectParams {
            host: key.host.clone(),
            port: key.port,
            username: key.username.clone(),
            password: password.to_string(),
        };

        let session = RemoteSession::connect(&params, &self.config.ssh).await?;
        self.registry.insert(key.clone(), Arc::new(session)).await;

        let store = self.store.clone();
        let store_key = key.to_string();
        let saved = tokio::task::spawn_blocking(move || {
            store.save(
                &store_key,
                &params.host,
                params.port,
                &params.username,
                &params.password,
            )
        })
        .await
        .unwrap_or(false);
        if !saved {
            // The live session is usable without the durable record
            error!("Credentials for {} were not persisted", key);
        }

        info!("Login successful for {}", key);
        Ok(key)
    }

    /// Close the session for `key` and forget its credentials.
    pub async fn logout(&self, key: &SessionKey) -> bool {
        let closed = self.registry.remove(key).await;
        let store = self.store.clone();
        let store_key = key.to_string();
        let forgotten = tokio::task::spawn_blocking(move || store.remove(&store_key))
            .await
            .unwrap_or(false);
        closed || forgotten
    }

    /// Live session for `key`
    pub async fn session(&self, key: &SessionKey) -> Option<Arc<RemoteSession>> {
        self.registry.get(key).await
    }
}
