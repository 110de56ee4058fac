/// Error types for the terminal relay
use thiserror::Error;

use crate::protocol::ConnectionError;
use crate::pty::PtyError;

/// Terminal relay error type
#[derive(Error, Debug)]
pub enum RelayError {
    /// Query string lacked host, username or password
    #[error("Missing connection parameters. Need host, username, and password.")]
    MissingParameters,

    /// Port parameter was not a valid TCP port
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    /// Authentication or shell open failed
    #[error("Failed to connect: {0}")]
    Connect(PtyError),

    /// Client connection error
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Remote shell error after the session started
    #[error("Shell error: {0}")]
    Shell(#[from] PtyError),
}

pub type RelayResult<T> = Result<T, RelayError>;
