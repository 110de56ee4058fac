/// Protocol abstraction for rs_webssh
mod connection;
#[cfg(test)]
pub(crate) mod mock_connection;
mod websocket_connection;

pub use connection::{ConnectionError, ConnectionResult, TerminalConnection, TerminalMessage};
pub use websocket_connection::WebSocketConnection;
