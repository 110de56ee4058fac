/// Remote pseudo-terminals for the browser terminal
/// This module provides a trait abstraction over the shell a terminal
/// connection is relayed to, with the russh implementation used in production
mod pty_trait;
mod ssh_pty_impl;
#[cfg(test)]
pub(crate) mod mock_pty;

// Export all public types and traits
pub use pty_trait::*;
pub use ssh_pty_impl::{SshShell, SshShellConnector};
