/// Application state management for rs_webssh
mod app_state;
mod session;
mod session_registry;

pub use app_state::AppState;
pub use session::{DEFAULT_SSH_PORT, SessionKey, parse_host_port};
pub use session_registry::{ManagedSession, SessionRegistry};
