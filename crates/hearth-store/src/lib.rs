//! SQLite-backed reminder store: persistence, mutations, change
//! notification, configuration and the JSON import/export bridge.

pub mod config;
pub mod error;
pub mod json_bridge;
pub mod retry;
pub mod schema;
pub mod store;

pub use config::{Config, default_base_dir};
pub use error::{Result, StoreError};
pub use json_bridge::ImportSummary;
pub use retry::RetryPolicy;
pub use store::{ChangeEvent, ChangeKind, DeleteMode, ReminderStore, Store};
