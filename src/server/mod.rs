/// Server management for rs_webssh
mod server;

pub use server::{build_router, run_server_with_graceful_shutdown};
