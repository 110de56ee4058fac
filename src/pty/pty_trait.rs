use async_trait::async_trait;
use thiserror::Error;

use crate::remote::{ConnectParams, RemoteError};

// ================ 配置与错误类型 ================

/// Pseudo-terminal requested when a remote shell is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtyConfig {
    pub term: String,
    pub cols: u16,
    pub rows: u16,
}

#[derive(Debug, Error)]
pub enum PtyError {
    #[error("{0}")]
    Connect(#[from] RemoteError),
    #[error("SSH channel error: {0}")]
    Channel(#[from] russh::Error),
    #[error("Shell already closed")]
    Closed,
    #[error("Resize failed: {0}")]
    ResizeFailed(String),
}

// ================ 核心Trait定义 ================

/// Interactive shell running on a remote host behind a pseudo-terminal
#[async_trait]
pub trait RemoteShell: Send {
    /// Next chunk of shell output, `None` once the remote side has closed.
    /// Must be cancel safe: it is polled inside `select!`.
    async fn read(&mut self) -> Result<Option<Vec<u8>>, PtyError>;

    /// Send keyboard input to the shell
    async fn write(&mut self, data: &[u8]) -> Result<(), PtyError>;

    /// Change the size of the remote pseudo-terminal
    async fn resize(&mut self, cols: u16, rows: u16) -> Result<(), PtyError>;

    /// Release the channel and its connection; tolerant of repeated calls
    async fn close(&mut self);
}

/// Authenticates against a host and opens a [`RemoteShell`] there
#[async_trait]
pub trait ShellConnector: Send + Sync {
    async fn connect(
        &self,
        params: &ConnectParams,
        config: &PtyConfig,
    ) -> Result<Box<dyn RemoteShell>, PtyError>;

    /// Connector name
    fn name(&self) -> &'static str;
}
