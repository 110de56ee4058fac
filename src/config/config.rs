/// Configuration data structures for rs_webssh
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP/WebSocket listener
    pub server: ServerConfig,

    /// Browser terminal defaults
    pub terminal: TerminalConfig,

    /// Credential store persistence and expiry
    pub store: StoreConfig,

    /// Temp directories used by uploads and downloads
    pub transfer: TransferConfig,

    /// SSH transport tuning
    pub ssh: SshConfig,

    /// Log output
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Port serving both the file API and the terminal WebSocket
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Terminal size configuration
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TerminalSize {
    /// Number of columns
    pub columns: u16,

    /// Number of rows
    pub rows: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self {
            columns: 100,
            rows: 24,
        }
    }
}

/// Browser terminal configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TerminalConfig {
    /// TERM value requested for the remote pty
    pub term: String,

    /// Size of the pty when the shell is opened
    pub size: TerminalSize,

    /// Largest chunk of shell output sent in one message
    pub read_chunk_size: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            term: "xterm-256color".to_string(),
            size: TerminalSize::default(),
            read_chunk_size: 4096,
        }
    }
}

/// Credential store configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database holding the credential records
    pub path: PathBuf,

    /// Records older than this many seconds are swept
    pub max_age_secs: u64,

    /// Seconds between two sweeps
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./state/client_db.sqlite3"),
            max_age_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

/// Upload/download staging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TransferConfig {
    /// Where downloaded remote files are staged before being streamed back
    pub download_dir: PathBuf,

    /// Where uploaded files are staged before being pushed to the remote host
    pub upload_dir: PathBuf,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("./dtmp/"),
            upload_dir: PathBuf::from("./utmp/"),
        }
    }
}

/// SSH transport configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SshConfig {
    /// Receive window of the file-transfer transport, in bytes
    pub window_size: u32,

    /// Negotiate zlib compression on the file-transfer transport
    pub compression: bool,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            window_size: 3 * 1024 * 1024,
            compression: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by RUST_LOG
    pub level: String,

    /// Emit JSON lines instead of human readable output
    pub json: bool,

    /// Also write daily rotated log files into this directory
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: None,
        }
    }
}
