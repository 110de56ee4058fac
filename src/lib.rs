/// Remote file management and a browser terminal over SSH
pub mod api;
pub mod app_state;
pub mod config;
pub mod handlers;
pub mod protocol;
pub mod pty;
pub mod remote;
pub mod server;
pub mod service;
pub mod store;
