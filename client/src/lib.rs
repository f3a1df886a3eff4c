//! Taskboard client library
//!
//! Session management and user-facing error notifications for the Taskboard
//! task API. The binary in `main.rs` is a thin command-line front end over it.

pub mod config;
pub mod errors;
pub mod http;
pub mod session;
pub mod store;
pub mod time;

// Re-export commonly used types
pub use config::Config;
pub use errors::{ApiFailure, ErrorCategory, ErrorHandler, ErrorRegistry, classify};
pub use http::{HttpClient, HttpError, ReqwestClient};
pub use session::{AuthError, Credentials, RouteAccess, SessionManager, SessionSnapshot};
pub use store::{FileStore, KeyValueStore, MemoryStore};
