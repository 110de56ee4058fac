/// Terminal relay service
/// Bridges a client connection to a remote shell and interprets resize signals
mod error;
mod message_handler;
mod session_handler;
mod terminal_session;

// Re-export public types and functions
pub use error::{RelayError, RelayResult};
pub use message_handler::{Inbound, classify, parse_escape_resize, parse_structured_resize};
pub use session_handler::{RelayState, connect_params, handle_terminal_session};
pub use terminal_session::{COLS_RANGE, ROWS_RANGE, TerminalSession};
