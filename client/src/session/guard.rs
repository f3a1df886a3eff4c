//! Route protection
//!
//! Decides what a protected view should do given the current session.

use super::state::SessionSnapshot;

/// Where unauthenticated visitors are sent
pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    /// Startup check still running; show a placeholder, do not redirect yet
    Pending,
    /// Send the visitor to `to`, remembering the page they asked for
    Redirect {
        to: &'static str,
        from: String,
    },
    Allow,
}

impl RouteAccess {
    pub fn evaluate(snapshot: &SessionSnapshot, requested_path: &str) -> Self {
        if snapshot.initializing {
            RouteAccess::Pending
        } else if !snapshot.is_authenticated {
            RouteAccess::Redirect {
                to: LOGIN_ROUTE,
                from: requested_path.to_string(),
            }
        } else {
            RouteAccess::Allow
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, RouteAccess::Allow)
    }
}
