//! User-facing error notifications
//!
//! This module provides:
//! - `ErrorRegistry`, the ordered notification list with auto-dismiss policy
//! - the static message table in `messages`
//! - `classify` for turning failed API calls into notifications
//! - `ErrorHandler` with per-category reporting helpers

pub mod classifier;
pub mod handler;
pub mod messages;
pub mod registry;
pub mod types;

pub use classifier::{ApiFailure, Classification, Resolution, classify};
pub use handler::ErrorHandler;
pub use registry::{ErrorRegistry, RegistryConfig};
pub use types::{AlertLevel, ErrorCategory, ErrorEvent, ErrorId, ErrorSnapshot};
