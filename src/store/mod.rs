//! Local state store: durable snapshot + offline completion queue.

pub mod kv;
pub mod session_store;

pub use kv::{KeyValueStore, MemoryKeyValueStore, StoreError};
pub use session_store::SessionStore;

/// Storage key names as constants.
pub mod keys {
    pub const ACTIVE_SNAPSHOT: &str = "active_session_snapshot";
    /// Epoch milliseconds of the most recent snapshot write; kept separate
    /// so recovery checks avoid full snapshot deserialization.
    pub const LAST_SAVE_MILLIS: &str = "active_session_last_save_ms";
    pub const OFFLINE_QUEUE: &str = "offline_completed_sessions";
}
