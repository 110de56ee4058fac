/// WebSocket connection implementation for TerminalConnection trait
use std::fmt::Debug;
use tracing::{debug, error};

use axum::extract::ws::Message::{Binary, Close, Ping, Pong, Text};
use axum::extract::ws::WebSocket;
use futures_util::{SinkExt, StreamExt};

use crate::protocol::{ConnectionError, ConnectionResult, TerminalConnection, TerminalMessage};

/// WebSocket connection implementation that implements TerminalConnection trait
pub struct WebSocketConnection {
    pub socket: WebSocket,
    pub id: String,
    closed: bool,
}

impl WebSocketConnection {
    pub fn new(socket: WebSocket, id: String) -> Self {
        Self {
            socket,
            id,
            closed: false,
        }
    }
}

impl Debug for WebSocketConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketConnection")
            .field("id", &self.id)
            .field("closed", &self.closed)
            .finish()
    }
}

#[async_trait::async_trait]
impl TerminalConnection for WebSocketConnection {
    async fn send_text(&mut self, message: &str) -> ConnectionResult<()> {
        if self.closed {
            return Err(ConnectionError::ConnectionClosed);
        }
        self.socket
            .send(Text(message.to_string()))
            .await
            .map_err(|e| ConnectionError::WebSocket(e.to_string()))?;
        Ok(())
    }

    async fn send_binary(&mut self, data: &[u8]) -> ConnectionResult<()> {
        if self.closed {
            return Err(ConnectionError::ConnectionClosed);
        }
        debug!("Sending binary data to client {}, size: {}", self.id, data.len());
        self.socket.send(Binary(data.to_vec())).await.map_err(|e| {
            error!("Failed to send binary data to client {}: {}", self.id, e);
            ConnectionError::WebSocket(e.to_string())
        })
    }

    async fn receive(&mut self) -> Option<ConnectionResult<TerminalMessage>> {
        match self.socket.next().await {
            Some(Ok(Text(text))) => {
                debug!("WebSocket received text message: {:?}", text);
                Some(Ok(TerminalMessage::Text(text)))
            }
            Some(Ok(Binary(bin))) => {
                debug!("WebSocket received binary message, length: {}", bin.len());
                Some(Ok(TerminalMessage::Binary(bin)))
            }
            Some(Ok(Ping(ping))) => {
                debug!("WebSocket received ping message");
                Some(Ok(TerminalMessage::Ping(ping)))
            }
            Some(Ok(Pong(pong))) => {
                debug!("WebSocket received pong message");
                Some(Ok(TerminalMessage::Pong(pong)))
            }
            Some(Ok(Close(_))) => {
                debug!("WebSocket received close message");
                Some(Ok(TerminalMessage::Close))
            }
            Some(Err(e)) => {
                error!("WebSocket receive error: {}", e);
                Some(Err(ConnectionError::WebSocket(e.to_string())))
            }
            None => {
                debug!("WebSocket connection closed");
                None
            }
        }
    }

    async fn close(&mut self) -> ConnectionResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.socket
            .send(Close(None))
            .await
            .map_err(|e| ConnectionError::WebSocket(e.to_string()))?;
        Ok(())
    }

    fn id(&self) -> &str {
        &self.id
    }
}
