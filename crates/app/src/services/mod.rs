//! External service clients.

pub mod sync;

pub use sync::{SyncClient, SyncError, SyncReport};
