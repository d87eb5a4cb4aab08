// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod broker;
pub mod config;
pub mod error;
pub mod form;
pub mod metrics;
pub mod target;
pub mod time;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::broker::{AlertStream, FinkBroker, GenericAlert, QueryMode, RawAlert};
pub use crate::config::FinkConfig;
pub use crate::error::{FinkError, Result};
pub use crate::form::{QueryForm, QueryParameters};
pub use crate::target::{InMemoryTargetStore, NewTarget, TargetHandle, TargetStore};
