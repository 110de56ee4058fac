/// A logged-in remote session: SFTP for file work, a second connection for commands
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_sftp::client::SftpSession;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::config::SshConfig;
use crate::remote::command::guarded_remove;
use crate::remote::{
    ClientHandler, CommandOutput, CommandRunner, ConnectParams, DirectoryEntry, RemoteError,
    RemoteResult, connect_authenticated, download_destination, normalize_dir, parse_history,
    transfer_config,
};

/// Runs commands over a dedicated SSH connection, one exec channel per command
struct SshCommandRunner {
    handle: Handle<ClientHandler>,
}

#[async_trait]
impl CommandRunner for SshCommandRunner {
    async fn run(&self, command: &str) -> RemoteResult<CommandOutput> {
        let mut channel = self.handle.channel_open_session().await?;
        channel.exec(true, command).await?;

        let mut output = CommandOutput::default();
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => output.stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => {
                    output.stderr.extend_from_slice(data)
                }
                ChannelMsg::ExitStatus { exit_status } => output.status = Some(exit_status),
                _ => {}
            }
        }
        debug!("Remote command `{}` exited with {:?}", command, output.status);
        Ok(output)
    }
}

/// Authenticated connections to one host under one identity.
///
/// Every operation reports success or failure instead of raising: callers
/// treat the outcome as advisory.
pub struct RemoteSession {
    host: String,
    port: u16,
    username: String,
    transport: Handle<ClientHandler>,
    sftp: SftpSession,
    commands: SshCommandRunner,
    closed: AtomicBool,
}

impl fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSession")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl RemoteSession {
    /// Connect the file-transfer transport, open SFTP on it and connect the
    /// command connection. Nothing stays open when any step fails.
    pub async fn connect(params: &ConnectParams, ssh: &SshConfig) -> RemoteResult<Self> {
        let transport = connect_authenticated(Arc::new(transfer_config(ssh)), params).await?;

        let sftp = match open_sftp(&transport).await {
            Ok(sftp) => sftp,
            Err(e) => {
                disconnect(&transport, "sftp setup failed").await;
                return Err(e);
            }
        };

        let command_handle =
            match connect_authenticated(Arc::new(client::Config::default()), params).await {
                Ok(handle) => handle,
                Err(e) => {
                    disconnect(&transport, "command connection failed").await;
                    return Err(e);
                }
            };

        info!(
            "Remote session ready for {}@{}:{}",
            params.username, params.host, params.port
        );
        Ok(Self {
            host: params.host.clone(),
            port: params.port,
            username: params.username.clone(),
            transport,
            sftp,
            commands: SshCommandRunner {
                handle: command_handle,
            },
            closed: AtomicBool::new(false),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> RemoteResult<()> {
        if self.is_closed() {
            return Err(RemoteError::Closed);
        }
        Ok(())
    }

    /// List one directory level. `""` and `"/"` both list the root.
    pub async fn list_directory(&self, path: &str) -> RemoteResult<Vec<DirectoryEntry>> {
        self.ensure_open()?;
        let dir = normalize_dir(path);
        let listing = self.sftp.read_dir(dir.as_str()).await?;

        let entries = listing
            .into_iter()
            .filter(|entry| {
                let name = entry.file_name();
                name != "." && name != ".."
            })
            .map(|entry| {
                let attrs = entry.metadata();
                DirectoryEntry::new(&dir, &entry.file_name(), attrs.size, attrs.mtime, attrs.permissions)
            })
            .collect();
        Ok(entries)
    }

    /// Stream a local file to `remote_path`, replacing any existing file.
    pub async fn upload(&self, local_path: &Path, remote_path: &str) -> bool {
        match self.try_upload(local_path, remote_path).await {
            Ok(bytes) => {
                info!("Uploaded {} bytes to {}", bytes, remote_path);
                true
            }
            Err(e) => {
                error!("Error uploading file to {}: {}", remote_path, e);
                false
            }
        }
    }

    async fn try_upload(&self, local_path: &Path, remote_path: &str) -> RemoteResult<u64> {
        self.ensure_open()?;
        let mut local_file = tokio::fs::File::open(local_path).await?;
        let mut remote_file = self.sftp.create(remote_path).await?;
        let bytes = tokio::io::copy(&mut local_file, &mut remote_file).await?;
        remote_file.shutdown().await?;
        Ok(bytes)
    }

    /// Copy `remote_path` into `local_dir`, keeping its file name.
    pub async fn download(&self, remote_path: &str, local_dir: &str) -> bool {
        match self.try_download(remote_path, local_dir).await {
            Ok(destination) => {
                info!("Downloaded {} to {}", remote_path, destination);
                true
            }
            Err(e) => {
                error!("Error downloading file {}: {}", remote_path, e);
                false
            }
        }
    }

    async fn try_download(&self, remote_path: &str, local_dir: &str) -> RemoteResult<String> {
        self.ensure_open()?;
        let destination = download_destination(remote_path, local_dir)
            .ok_or_else(|| RemoteError::Other(format!("No file name in {}", remote_path)))?;

        let mut remote_file = self.sftp.open(remote_path).await?;
        let mut local_file = tokio::fs::File::create(&destination).await?;
        tokio::io::copy(&mut remote_file, &mut local_file).await?;
        local_file.flush().await?;
        Ok(destination)
    }

    pub async fn rename(&self, old_path: &str, new_path: &str) -> bool {
        let result = match self.ensure_open() {
            Ok(()) => self.sftp.rename(old_path, new_path).await.map_err(RemoteError::from),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                error!("Error renaming {} to {}: {}", old_path, new_path, e);
                false
            }
        }
    }

    /// Guarded recursive delete; see [`crate::remote::is_protected`].
    pub async fn remove(&self, path: &str) -> bool {
        let result = match self.ensure_open() {
            Ok(()) => guarded_remove(&self.commands, path).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => true,
            Err(RemoteError::ProtectedPath(path)) => {
                warn!("Cannot delete protected directory: {}", path);
                false
            }
            Err(e) => {
                error!("Error removing {}: {}", path, e);
                false
            }
        }
    }

    pub async fn mkdir(&self, path: &str) -> bool {
        let result = match self.ensure_open() {
            Ok(()) => self.sftp.create_dir(path).await.map_err(RemoteError::from),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                error!("Error creating directory {}: {}", path, e);
                false
            }
        }
    }

    /// Lines of the remote user's bash history; empty on any error.
    pub async fn get_history(&self) -> Vec<String> {
        match self.run_checked("cat ~/.bash_history").await {
            Ok(output) => parse_history(&String::from_utf8_lossy(&output.stdout)),
            Err(e) => {
                error!("Error getting history: {}", e);
                Vec::new()
            }
        }
    }

    /// `df -lh` output lines; empty on any error.
    pub async fn get_disk_usage(&self) -> Vec<String> {
        match self.run_checked("df -lh").await {
            Ok(output) => output.stdout_lines(),
            Err(e) => {
                error!("Error getting disk usage: {}", e);
                Vec::new()
            }
        }
    }

    async fn run_checked(&self, command: &str) -> RemoteResult<CommandOutput> {
        self.ensure_open()?;
        self.commands.run(command).await
    }

    /// Release both connections. Safe to call more than once.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        disconnect(&self.transport, "session closed").await;
        disconnect(&self.commands.handle, "session closed").await;
        info!(
            "Closed remote session for {}@{}:{}",
            self.username, self.host, self.port
        );
    }
}

async fn open_sftp(transport: &Handle<ClientHandler>) -> RemoteResult<SftpSession> {
    let channel = transport.channel_open_session().await?;
    channel.request_subsystem(true, "sftp").await?;
    let sftp = SftpSession::new(channel.into_stream()).await?;
    Ok(sftp)
}

async fn disconnect(handle: &Handle<ClientHandler>, reason: &str) {
    if let Err(e) = handle
        .disconnect(Disconnect::ByApplication, reason, "en")
        .await
    {
        debug!("Ignoring error during disconnect: {}", e);
    }
}
