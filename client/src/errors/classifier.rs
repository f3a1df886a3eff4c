//! Classification of failed API calls into error notifications

use crate::errors::messages::CUSTOM_ACTION;
use crate::errors::types::ErrorCategory;
use crate::http::HttpError;

/// Message used when a failure carries no text of its own
pub const FALLBACK_MESSAGE: &str = "Une erreur est survenue";

/// What is known about a failed API interaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiFailure {
    /// HTTP status, if a response was received
    pub status: Option<u16>,
    /// Transport-level error code, e.g. `NETWORK_ERROR`
    pub code: Option<String>,
    pub message: Option<String>,
    /// The request went out but nothing came back
    pub no_response: bool,
}

impl ApiFailure {
    pub fn from_status(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn no_response(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            no_response: true,
            ..Self::default()
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    fn is_connectivity_problem(&self) -> bool {
        self.no_response
            || self.code.as_deref() == Some("NETWORK_ERROR")
            || self
                .message
                .as_deref()
                .is_some_and(|m| m.contains("Network Error"))
    }
}

impl From<&HttpError> for ApiFailure {
    fn from(error: &HttpError) -> Self {
        match error {
            HttpError::Transport { .. } => ApiFailure {
                code: Some("NETWORK_ERROR".to_string()),
                message: Some(error.to_string()),
                no_response: true,
                ..ApiFailure::default()
            },
            HttpError::Status { status, body } => {
                // Prefer the server's own explanation when it sends one
                let message = serde_json::from_slice::<serde_json::Value>(body)
                    .ok()
                    .and_then(|v| v.get("message")?.as_str().map(str::to_string))
                    .unwrap_or_else(|| error.to_string());
                ApiFailure {
                    status: Some(*status),
                    message: Some(message),
                    ..ApiFailure::default()
                }
            }
            HttpError::Decode(_) => ApiFailure::with_message(error.to_string()),
        }
    }
}

/// How the notification text is obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Look the text up in the message table
    Action(&'static str),
    /// Use this text verbatim
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub resolution: Resolution,
}

impl Classification {
    fn action(category: ErrorCategory, action: &'static str) -> Self {
        Self {
            category,
            resolution: Resolution::Action(action),
        }
    }

    pub fn action_key(&self) -> &str {
        match &self.resolution {
            Resolution::Action(action) => action,
            Resolution::Custom(_) => CUSTOM_ACTION,
        }
    }

    pub fn custom_message(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Action(_) => None,
            Resolution::Custom(message) => Some(message),
        }
    }
}

/// Map a failure to a category and message source. First match wins; the
/// response body never influences the category.
pub fn classify(failure: &ApiFailure) -> Classification {
    match failure.status {
        Some(401) => Classification::action(ErrorCategory::Auth, "unauthorized"),
        Some(403) => Classification::action(ErrorCategory::Permission, "access_denied"),
        Some(404) => Classification::action(ErrorCategory::NotFound, "resource_not_found"),
        Some(status) if status >= 500 => {
            Classification::action(ErrorCategory::Network, "server_error")
        }
        None if failure.is_connectivity_problem() => {
            Classification::action(ErrorCategory::Network, "connection_failed")
        }
        _ => Classification {
            category: ErrorCategory::Network,
            resolution: Resolution::Custom(
                failure
                    .message
                    .clone()
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
            ),
        },
    }
}
