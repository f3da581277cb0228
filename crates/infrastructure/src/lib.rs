//! Infrastructure layer - Adapters for external systems
//!
//! Implements the ports defined in the application layer: key-value stores
//! and the system clock. Also hosts configuration loading, logging setup and
//! background tasks.

pub mod adapters;
pub mod config;
pub mod scheduled_tasks;
pub mod storage;
pub mod telemetry;

pub use adapters::SystemClock;
pub use config::{AppConfig, AutosaveConfig, StorageBackend, StorageConfig};
pub use scheduled_tasks::{DRAFT_CLEANUP_TASK, create_draft_cleanup_task, spawn_periodic_task};
pub use storage::{InMemoryKeyValueStore, RedbKeyValueStore, open_store};
pub use telemetry::{TelemetryConfig, TelemetryError, init_telemetry};
