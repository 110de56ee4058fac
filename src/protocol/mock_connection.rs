/// In-memory client connection used by the relay tests
use tokio::sync::mpsc;

use crate::protocol::{ConnectionError, ConnectionResult, TerminalConnection, TerminalMessage};

/// What the relay sent towards the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

#[derive(Debug)]
pub struct MockConnection {
    id: String,
    incoming: mpsc::UnboundedReceiver<TerminalMessage>,
    outgoing: mpsc::UnboundedSender<Outbound>,
    closed: bool,
}

/// Test side of a [`MockConnection`]; dropping `to_relay` ends the client stream
pub struct MockClient {
    pub to_relay: mpsc::UnboundedSender<TerminalMessage>,
    pub from_relay: mpsc::UnboundedReceiver<Outbound>,
}

impl MockClient {
    pub fn send_text(&self, text: &str) {
        self.to_relay
            .send(TerminalMessage::Text(text.to_string()))
            .unwrap();
    }

    /// Everything the relay sent so far
    pub fn drain(&mut self) -> Vec<Outbound> {
        let mut sent = Vec::new();
        while let Ok(message) = self.from_relay.try_recv() {
            sent.push(message);
        }
        sent
    }
}

impl MockConnection {
    pub fn new(id: &str) -> (Self, MockClient) {
        let (to_relay, incoming) = mpsc::unbounded_channel();
        let (outgoing, from_relay) = mpsc::unbounded_channel();
        let connection = Self {
            id: id.to_string(),
            incoming,
            outgoing,
            closed: false,
        };
        (connection, MockClient { to_relay, from_relay })
    }

    fn push(&self, message: Outbound) -> ConnectionResult<()> {
        if self.closed {
            return Err(ConnectionError::ConnectionClosed);
        }
        self.outgoing
            .send(message)
            .map_err(|_| ConnectionError::ConnectionClosed)
    }
}

#[async_trait::async_trait]
impl TerminalConnection for MockConnection {
    async fn send_text(&mut self, message: &str) -> ConnectionResult<()> {
        self.push(Outbound::Text(message.to_string()))
    }

    async fn send_binary(&mut self, data: &[u8]) -> ConnectionResult<()> {
        self.push(Outbound::Binary(data.to_vec()))
    }

    async fn receive(&mut self) -> Option<ConnectionResult<TerminalMessage>> {
        self.incoming.recv().await.map(Ok)
    }

    async fn close(&mut self) -> ConnectionResult<()> {
        self.push(Outbound::Close)?;
        self.closed = true;
        Ok(())
    }

    fn id(&self) -> &str {
        &self.id
    }
}
