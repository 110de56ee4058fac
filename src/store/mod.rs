/// Durable credential bookkeeping shared by every server process
mod credential_store;
mod error;
mod sweeper;

pub use credential_store::{CredentialRecord, CredentialStore};
pub use error::{StoreError, StoreResult};
pub use sweeper::spawn_sweeper;
