/// Remote shell over a russh session channel
use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use tracing::{debug, info};

use crate::pty::{PtyConfig, PtyError, RemoteShell, ShellConnector};
use crate::remote::{ClientHandler, ConnectParams, connect_authenticated};

/// Shell channel plus the connection that owns it
pub struct SshShell {
    handle: Handle<ClientHandler>,
    channel: Channel<Msg>,
    closed: bool,
}

#[async_trait]
impl RemoteShell for SshShell {
    async fn read(&mut self) -> Result<Option<Vec<u8>>, PtyError> {
        if self.closed {
            return Ok(None);
        }
        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::ExtendedData { data, .. }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    debug!("Remote shell exited with status {}", exit_status);
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => return Ok(None),
                Some(_) => {}
            }
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), PtyError> {
        if self.closed {
            return Err(PtyError::Closed);
        }
        self.channel.data(data).await?;
        Ok(())
    }

    async fn resize(&mut self, cols: u16, rows: u16) -> Result<(), PtyError> {
        if self.closed {
            return Err(PtyError::Closed);
        }
        self.channel
            .window_change(u32::from(cols), u32::from(rows), 0, 0)
            .await
            .map_err(|e| PtyError::ResizeFailed(e.to_string()))
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.channel.close().await {
            debug!("Ignoring error while closing shell channel: {}", e);
        }
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "terminal closed", "en")
            .await
        {
            debug!("Ignoring error while closing SSH connection: {}", e);
        }
    }
}

/// Opens [`SshShell`]s; host keys are accepted without verification
#[derive(Default)]
pub struct SshShellConnector;

#[async_trait]
impl ShellConnector for SshShellConnector {
    async fn connect(
        &self,
        params: &ConnectParams,
        config: &PtyConfig,
    ) -> Result<Box<dyn RemoteShell>, PtyError> {
        let handle = connect_authenticated(Arc::new(client::Config::default()), params).await?;

        let channel = match open_shell(&handle, config).await {
            Ok(channel) => channel,
            Err(e) => {
                let _ = handle
                    .disconnect(Disconnect::ByApplication, "shell request failed", "en")
                    .await;
                return Err(e);
            }
        };

        info!(
            "SSH connection established successfully with terminal size {}x{}",
            config.cols, config.rows
        );
        Ok(Box::new(SshShell {
            handle,
            channel,
            closed: false,
        }))
    }

    fn name(&self) -> &'static str {
        "russh"
    }
}

async fn open_shell(
    handle: &Handle<ClientHandler>,
    config: &PtyConfig,
) -> Result<Channel<Msg>, PtyError> {
    let channel = handle.channel_open_session().await?;
    channel
        .request_pty(
            false,
            &config.term,
            u32::from(config.cols),
            u32::from(config.rows),
            0,
            0,
            &[],
        )
        .await?;
    channel.request_shell(true).await?;
    Ok(channel)
}
