// Declare modules within this crate
pub mod logging; // Logging utilities
pub mod services; // Service abstractions
pub mod storage; // Durable key-value storage

// Re-export the service abstraction types for easier access
pub use services::{BoxFuture, BoxedError};

// Re-export storage types for easier access
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};

// Re-export logging utilities for easier access
pub use logging::{init, init_with_level};
