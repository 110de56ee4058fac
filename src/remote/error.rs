/// Error types for remote sessions
use thiserror::Error;

/// Remote session error type
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Local IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SSH transport or channel error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// SFTP subsystem error
    #[error("SFTP error: {0}")]
    Sftp(#[from] russh_sftp::client::error::Error),

    /// The remote host rejected the credentials
    #[error("Authentication failed for {username}@{host}")]
    AuthenticationFailed { host: String, username: String },

    /// Refused to delete a protected path
    #[error("Cannot delete protected path: {0}")]
    ProtectedPath(String),

    /// A remote command ran but reported failure
    #[error("Remote command failed (exit status {status:?}): {stderr}")]
    CommandFailed { status: Option<u32>, stderr: String },

    /// The path still exists after deletion
    #[error("Path still exists after deletion attempt: {0}")]
    StillExists(String),

    /// Operation on a session that was already closed
    #[error("Session closed")]
    Closed,

    /// Any other failure
    #[error("{0}")]
    Other(String),
}

/// Result type for remote operations
pub type RemoteResult<T> = Result<T, RemoteError>;
