/// In-memory shell and connector used by the relay tests
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::pty::{PtyConfig, PtyError, RemoteShell, ShellConnector};
use crate::remote::{ConnectParams, RemoteError};

/// Shared view of what the relay did to a [`MockShell`]
#[derive(Clone, Default)]
pub struct MockShellProbe {
    pub written: Arc<Mutex<Vec<u8>>>,
    pub sizes: Arc<Mutex<Vec<(u16, u16)>>>,
    pub closed: Arc<AtomicBool>,
}

impl MockShellProbe {
    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    pub fn sizes(&self) -> Vec<(u16, u16)> {
        self.sizes.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Shell whose output is fed through a channel; dropping the sender closes it
pub struct MockShell {
    output: mpsc::UnboundedReceiver<Vec<u8>>,
    probe: MockShellProbe,
}

impl MockShell {
    pub fn new() -> (Self, mpsc::UnboundedSender<Vec<u8>>, MockShellProbe) {
        let (tx, rx) = mpsc::unbounded_channel();
        let probe = MockShellProbe::default();
        let shell = Self {
            output: rx,
            probe: probe.clone(),
        };
        (shell, tx, probe)
    }
}

#[async_trait]
impl RemoteShell for MockShell {
    async fn read(&mut self) -> Result<Option<Vec<u8>>, PtyError> {
        Ok(self.output.recv().await)
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), PtyError> {
        self.probe.written.lock().unwrap().extend_from_slice(data);
        Ok(())
    }

    async fn resize(&mut self, cols: u16, rows: u16) -> Result<(), PtyError> {
        self.probe.sizes.lock().unwrap().push((cols, rows));
        Ok(())
    }

    async fn close(&mut self) {
        self.probe.closed.store(true, Ordering::SeqCst);
    }
}

/// Hands out one prepared [`MockShell`], or refuses every login
#[derive(Default)]
pub struct MockConnector {
    shell: Mutex<Option<MockShell>>,
    calls: AtomicUsize,
    requested: Mutex<Option<(ConnectParams, PtyConfig)>>,
}

impl MockConnector {
    pub fn with_shell(shell: MockShell) -> Self {
        Self {
            shell: Mutex::new(Some(shell)),
            ..Self::default()
        }
    }

    pub fn refusing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Option<(ConnectParams, PtyConfig)> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShellConnector for MockConnector {
    async fn connect(
        &self,
        params: &ConnectParams,
        config: &PtyConfig,
    ) -> Result<Box<dyn RemoteShell>, PtyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.requested.lock().unwrap() = Some((params.clone(), config.clone()));
        match self.shell.lock().unwrap().take() {
            Some(shell) => Ok(Box::new(shell)),
            None => Err(PtyError::Connect(RemoteError::AuthenticationFailed {
                host: params.host.clone(),
                username: params.username.clone(),
            })),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
