//! Error notification types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Notification identifier
pub type ErrorId = Uuid;

/// Fixed error classification, driving message lookup and expiry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Auth,
    Task,
    Network,
    Validation,
    Permission,
    NotFound,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 6] = [
        ErrorCategory::Auth,
        ErrorCategory::Task,
        ErrorCategory::Network,
        ErrorCategory::Validation,
        ErrorCategory::Permission,
        ErrorCategory::NotFound,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Auth => "auth",
            ErrorCategory::Task => "task",
            ErrorCategory::Network => "network",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Permission => "permission",
            ErrorCategory::NotFound => "not-found",
        }
    }

    /// Auth and permission notifications stay until dismissed
    pub fn auto_dismisses(&self) -> bool {
        !matches!(self, ErrorCategory::Auth | ErrorCategory::Permission)
    }

    /// Heading shown above the notification
    pub fn title(&self) -> &'static str {
        match self {
            ErrorCategory::Auth => "Erreur d'authentification",
            ErrorCategory::Task => "Erreur de tâche",
            ErrorCategory::Network => "Erreur réseau",
            ErrorCategory::Validation => "Erreur de validation",
            ErrorCategory::Permission => "Erreur de permission",
            ErrorCategory::NotFound => "Ressource non trouvée",
        }
    }

    pub fn alert_level(&self) -> AlertLevel {
        match self {
            ErrorCategory::Validation => AlertLevel::Warning,
            _ => AlertLevel::Error,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown error category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for ErrorCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Visual severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Error,
    Warning,
}

/// A display-ready error notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEvent {
    pub id: ErrorId,
    pub category: ErrorCategory,
    pub message: String,
    /// Originating UI region, informational only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Action key the message was resolved from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Milliseconds since the epoch
    pub created_at: u64,
}

/// Read-only view of the registry for rendering layers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorSnapshot {
    /// In insertion order
    pub events: Vec<ErrorEvent>,
    pub visible: bool,
}

impl ErrorSnapshot {
    /// Whether anything should be drawn at all
    pub fn is_displayed(&self) -> bool {
        self.visible && !self.events.is_empty()
    }
}
