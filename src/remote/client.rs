/// russh client plumbing shared by remote sessions and the terminal relay
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::keys::key::PublicKey;
use russh::{Limits, Preferred};
use tracing::{debug, info};

use crate::config::SshConfig;
use crate::remote::{RemoteError, RemoteResult};

/// Largest re-key byte threshold russh accepts
const REKEY_BYTE_LIMIT: usize = 1 << 30;

/// Time based re-keying pushed far beyond any session lifetime
const REKEY_TIME_LIMIT: Duration = Duration::from_secs(u32::MAX as u64);

/// Host, port and credentials of one SSH login
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// russh client handler.
///
/// Every server key is accepted without verification.
pub struct ClientHandler {
    host: String,
}

impl ClientHandler {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
        }
    }
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!(
            "Accepting host key {} for {}",
            server_public_key.fingerprint(),
            self.host
        );
        Ok(true)
    }
}

/// Transport tuning for the file-transfer connection: wide receive window,
/// re-keying effectively disabled and compression preferred.
pub fn transfer_config(ssh: &SshConfig) -> client::Config {
    // zlib first, none as fallback
    let preferred = if ssh.compression {
        Preferred::COMPRESSED
    } else {
        Preferred::default()
    };
    client::Config {
        window_size: ssh.window_size,
        limits: Limits::new(REKEY_BYTE_LIMIT, REKEY_BYTE_LIMIT, REKEY_TIME_LIMIT),
        preferred,
        ..Default::default()
    }
}

/// Open a connection to `params.host` and authenticate with the password.
pub async fn connect_authenticated(
    config: Arc<client::Config>,
    params: &ConnectParams,
) -> RemoteResult<Handle<ClientHandler>> {
    info!(
        "Attempting SSH connection to {}:{} as {}",
        params.host, params.port, params.username
    );
    let handler = ClientHandler::new(&params.host);
    let mut handle = client::connect(config, (params.host.as_str(), params.port), handler).await?;

    let authenticated = handle
        .authenticate_password(params.username.as_str(), params.password.as_str())
        .await?;
    if !authenticated {
        return Err(RemoteError::AuthenticationFailed {
            host: params.host.clone(),
            username: params.username.clone(),
        });
    }
    Ok(handle)
}
