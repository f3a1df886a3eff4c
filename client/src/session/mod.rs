//! Client-side session lifecycle
//!
//! This module provides:
//! - `token` for decoding and judging bearer tokens
//! - `SessionManager` owning login state, persistence and periodic revalidation
//! - `RouteAccess` for guarding views that need an authenticated session

pub mod guard;
pub mod manager;
pub mod state;
pub mod token;

pub use guard::RouteAccess;
pub use manager::{AuthError, SessionManager};
pub use state::{AuthHeaders, Credentials, SessionConfig, SessionSnapshot};
pub use token::{Identity, TokenError};
