//! Convenience layer used by call sites to report errors

use std::sync::Arc;

use tracing::info;

use crate::errors::classifier::{ApiFailure, classify};
use crate::errors::messages::CUSTOM_ACTION;
use crate::errors::registry::ErrorRegistry;
use crate::errors::types::{ErrorCategory, ErrorId};
use crate::http::HttpError;
use crate::session::SessionManager;

/// Reports errors into an `ErrorRegistry`
///
/// With a session attached, an API answer of 401 also ends the local session.
#[derive(Clone)]
pub struct ErrorHandler {
    registry: Arc<ErrorRegistry>,
    session: Option<Arc<SessionManager>>,
}

impl ErrorHandler {
    pub fn new(registry: Arc<ErrorRegistry>) -> Self {
        Self {
            registry,
            session: None,
        }
    }

    pub fn with_session(mut self, session: Arc<SessionManager>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn registry(&self) -> &Arc<ErrorRegistry> {
        &self.registry
    }

    pub async fn auth_error(&self, action: &str, component: Option<&str>) -> ErrorId {
        self.report(ErrorCategory::Auth, action, component).await
    }

    pub async fn task_error(&self, action: &str, component: Option<&str>) -> ErrorId {
        self.report(ErrorCategory::Task, action, component).await
    }

    pub async fn network_error(&self, action: &str, component: Option<&str>) -> ErrorId {
        self.report(ErrorCategory::Network, action, component).await
    }

    pub async fn validation_error(&self, action: &str, component: Option<&str>) -> ErrorId {
        self.report(ErrorCategory::Validation, action, component).await
    }

    pub async fn permission_error(&self, action: &str, component: Option<&str>) -> ErrorId {
        self.report(ErrorCategory::Permission, action, component).await
    }

    pub async fn not_found_error(&self, action: &str, component: Option<&str>) -> ErrorId {
        self.report(ErrorCategory::NotFound, action, component).await
    }

    /// Report with a caller-supplied message instead of a table entry
    pub async fn custom_error(
        &self,
        category: ErrorCategory,
        message: &str,
        component: Option<&str>,
    ) -> ErrorId {
        self.registry
            .add_error(category, CUSTOM_ACTION, component, Some(message))
            .await
    }

    /// Classify a failed API call and report it
    pub async fn handle_api_error(&self, failure: &ApiFailure, component: Option<&str>) -> ErrorId {
        let classification = classify(failure);

        if classification.category == ErrorCategory::Auth
            && let Some(ref session) = self.session
        {
            info!("API rejected the session credential, logging out");
            session.logout().await;
        }

        self.registry
            .add_error(
                classification.category,
                classification.action_key(),
                component,
                classification.custom_message(),
            )
            .await
    }

    pub async fn handle_http_error(&self, error: &HttpError, component: Option<&str>) -> ErrorId {
        self.handle_api_error(&ApiFailure::from(error), component).await
    }

    async fn report(
        &self,
        category: ErrorCategory,
        action: &str,
        component: Option<&str>,
    ) -> ErrorId {
        self.registry
            .add_error(category, action, component, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpClient, HttpRequest, HttpResponse, TransportErrorKind};
    use crate::session::SessionConfig;
    use crate::store::{KeyValueStore, MemoryStore};
    use async_trait::async_trait;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use bytes::Bytes;

    struct Offline;

    #[async_trait]
    impl HttpClient for Offline {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, HttpError> {
            Err(HttpError::transport(TransportErrorKind::Connect, "offline"))
        }
    }

    #[tokio::test]
    async fn test_helpers_resolve_table_messages() {
        let handler = ErrorHandler::new(Arc::new(ErrorRegistry::new()));
        handler
            .task_error("create_failed", Some("CreateTask"))
            .await;
        handler.validation_error("password_too_short", None).await;
        handler.not_found_error("page_not_found", None).await;

        let messages: Vec<_> = handler
            .registry()
            .snapshot()
            .await
            .events
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Erreur lors de la création de la tâche",
                "Le mot de passe doit contenir au moins 6 caractères",
                "Page non trouvée",
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_error_records_custom_action() {
        let handler = ErrorHandler::new(Arc::new(ErrorRegistry::new()));
        handler
            .custom_error(ErrorCategory::Task, "Quota atteint", None)
            .await;

        let event = handler.registry().snapshot().await.events.remove(0);
        assert_eq!(event.message, "Quota atteint");
        assert_eq!(event.action.as_deref(), Some(CUSTOM_ACTION));
    }

    #[tokio::test]
    async fn test_handle_http_error() {
        let handler = ErrorHandler::new(Arc::new(ErrorRegistry::new()));
        let error = HttpError::Status {
            status: 404,
            body: Bytes::new(),
        };
        handler.handle_http_error(&error, Some("TaskDetail")).await;

        let event = handler.registry().snapshot().await.events.remove(0);
        assert_eq!(event.category, ErrorCategory::NotFound);
        assert_eq!(event.message, "Ressource non trouvée");
        assert_eq!(event.component.as_deref(), Some("TaskDetail"));
    }

    #[tokio::test]
    async fn test_unauthorized_api_error_logs_out() {
        let claims = serde_json::json!({ "sub": "student@example.com" }).to_string();
        let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode(claims));
        let store = Arc::new(MemoryStore::with_entries([("auth_token", token)]));
        let session = Arc::new(SessionManager::new(
            store.clone(),
            Arc::new(Offline),
            SessionConfig::default(),
        ));
        assert!(session.initialize().await.is_authenticated);

        let handler =
            ErrorHandler::new(Arc::new(ErrorRegistry::new())).with_session(session.clone());
        handler
            .handle_api_error(&ApiFailure::from_status(401), Some("TasksList"))
            .await;

        assert!(!session.snapshot().await.is_authenticated);
        assert_eq!(store.get("auth_token").await.unwrap(), None);

        let snapshot = handler.registry().snapshot().await;
        assert_eq!(snapshot.events[0].category, ErrorCategory::Auth);
        assert_eq!(
            snapshot.events[0].message,
            "Vous devez être connecté pour accéder à cette page"
        );
    }

    #[tokio::test]
    async fn test_forbidden_keeps_session() {
        let claims = serde_json::json!({ "sub": "student@example.com" }).to_string();
        let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode(claims));
        let session = Arc::new(SessionManager::new(
            Arc::new(MemoryStore::with_entries([("auth_token", token)])),
            Arc::new(Offline),
            SessionConfig::default(),
        ));
        session.initialize().await;

        let handler =
            ErrorHandler::new(Arc::new(ErrorRegistry::new())).with_session(session.clone());
        handler
            .handle_api_error(&ApiFailure::from_status(403), None)
            .await;

        assert!(session.snapshot().await.is_authenticated);
    }
}
