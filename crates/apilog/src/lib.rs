//! Bounded, persisted log of outbound API calls.
//!
//! The log lives in a [`KeyValueStore`] under a single key as a JSON array,
//! newest entry first. Every change is published on a [`LogEventBus`] owned
//! by the [`ApiLogStore`].

pub mod bus;
pub mod entry;
pub mod storage;
pub mod store;

pub use bus::{LogEventBus, Subscription};
pub use entry::{payload_size_label, LogEntry, LogStatus, NewLogEntry};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{ApiLogStore, LogStats};
