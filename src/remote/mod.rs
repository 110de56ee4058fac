/// Authenticated SSH sessions to remote hosts and the file operations built on them
mod client;
mod command;
mod entry;
mod error;
mod paths;
mod session;

pub use client::{ClientHandler, ConnectParams, connect_authenticated, transfer_config};
pub use command::{CommandOutput, CommandRunner, parse_history};
pub use entry::{DirectoryEntry, EntryKind, format_mtime};
pub use error::{RemoteError, RemoteResult};
pub use paths::{
    PROTECTED_DIRS, check_removable, child_path, download_destination, is_protected, normalize_dir,
    shell_quote,
};
pub use session::RemoteSession;
