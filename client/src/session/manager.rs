use crate::http::{HttpClient, HttpRequest};
use crate::session::state::{
    AuthHeaders, Credential, Credentials, INCORRECT_CREDENTIALS_MESSAGE, LoginResponse,
    SERVER_UNREACHABLE_MESSAGE, SessionConfig, SessionSnapshot, SessionState,
};
use crate::session::token::{self, Identity, TokenError, TokenStatus};
use crate::store::{KeyValueStore, StoreError};
use crate::time::{Clock, SystemClock};
use metrics::{counter, histogram};
use std::sync::{Arc, Weak};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{OnceCell, RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    DecodeFailure(#[from] TokenError),

    #[error("Token has expired")]
    Expired,

    #[error("Email ou mot de passe incorrect")]
    CredentialsRejected,

    #[error("Erreur de connexion au serveur")]
    ServerUnreachable(String),

    #[error("Token invalide reçu du serveur: {0}")]
    InvalidCredentialResponse(String),

    #[error("Login superseded by a logout")]
    Superseded,

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Text shown to the user through `last_error`
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::CredentialsRejected => INCORRECT_CREDENTIALS_MESSAGE,
            _ => SERVER_UNREACHABLE_MESSAGE,
        }
    }
}

struct Inner {
    session: SessionState,
    revalidation: Option<JoinHandle<()>>,
}

struct Shared {
    inner: RwLock<Inner>,
    updates: watch::Sender<SessionSnapshot>,
    initialized: OnceCell<()>,
    store: Arc<dyn KeyValueStore>,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl Shared {
    fn check(&self, token: &str) -> Result<Identity, AuthError> {
        match token::inspect(token, self.clock.now_millis())? {
            TokenStatus::Valid(identity) => Ok(identity),
            TokenStatus::Expired(_) => Err(AuthError::Expired),
        }
    }

    fn publish(&self, inner: &Inner) {
        self.updates
            .send_replace(inner.session.snapshot(self.clock.now_millis()));
    }

    async fn purge_token(&self) {
        if let Err(e) = self.store.remove(&self.config.token_key).await {
            warn!("Failed to purge persisted token: {}", e);
        }
    }

    /// Shared by explicit and expiry-driven logouts. Returns the revalidation
    /// task so the caller decides whether to abort it.
    async fn reset(&self, inner: &mut Inner) -> Option<JoinHandle<()>> {
        inner.session.logged_out();
        self.purge_token().await;
        inner.revalidation.take()
    }

    /// `from_task` is set when the revalidation task itself is calling, which
    /// must not abort its own handle.
    async fn revalidate(&self, from_task: bool) -> bool {
        let mut inner = self.inner.write().await;
        let Some(token) = inner.session.token().map(str::to_string) else {
            return false;
        };

        match self.check(&token) {
            Ok(_) => true,
            Err(e) => {
                info!("Session ended: {}", e);
                if let Some(handle) = self.reset(&mut inner).await
                    && !from_task
                {
                    handle.abort();
                }
                self.publish(&inner);
                counter!("taskboard_logouts_total", "reason" => "expired").increment(1);
                false
            }
        }
    }

    fn start_revalidation(self: &Arc<Self>, inner: &mut Inner) {
        if let Some(previous) = inner.revalidation.take() {
            previous.abort();
        }

        let weak: Weak<Shared> = Arc::downgrade(self);
        let period = self.config.revalidate_interval;
        inner.revalidation = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                if !shared.revalidate(true).await {
                    break;
                }
            }
        }));
    }
}

/// Session manager: single source of truth for who is logged in
///
/// Construct once per process and share it as `Arc<SessionManager>`. The periodic
/// expiry check runs on a background task that only lives while a session is
/// authenticated and never outlives the manager.
pub struct SessionManager {
    shared: Arc<Shared>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        http: Arc<dyn HttpClient>,
        config: SessionConfig,
    ) -> Self {
        Self::with_clock(store, http, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        http: Arc<dyn HttpClient>,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let session = SessionState::new();
        let (updates, _) = watch::channel(session.snapshot(clock.now_millis()));

        Self {
            shared: Arc::new(Shared {
                inner: RwLock::new(Inner {
                    session,
                    revalidation: None,
                }),
                updates,
                initialized: OnceCell::new(),
                store,
                http,
                clock,
                config,
            }),
        }
    }

    /// Restore the persisted session. Runs once; later calls wait for the first
    /// run and return the current snapshot.
    pub async fn initialize(&self) -> SessionSnapshot {
        self.shared
            .initialized
            .get_or_init(|| async { self.restore().await })
            .await;
        self.snapshot().await
    }

    async fn restore(&self) {
        let shared = &self.shared;
        let mut inner = shared.inner.write().await;

        let stored = match shared.store.get(&shared.config.token_key).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to read persisted token: {}", e);
                None
            }
        };

        let credential = match stored {
            None => {
                debug!("No persisted token");
                None
            }
            Some(token) => match shared.check(&token) {
                Ok(identity) => {
                    info!("Restored session for {}", identity.subject);
                    Some(Credential { token, identity })
                }
                Err(e) => {
                    // Routine expiry, not a user-visible fault
                    info!("Discarding persisted token: {}", e);
                    shared.purge_token().await;
                    None
                }
            },
        };

        let authenticated = credential.is_some();
        inner.session.restored(credential);
        if authenticated {
            shared.start_revalidation(&mut inner);
        }
        shared.publish(&inner);
    }

    /// Log in against the auth endpoint
    ///
    /// On failure `last_error` is set and the error is returned as well. A logout
    /// issued while the request is in flight wins: the response is discarded and
    /// `AuthError::Superseded` is returned.
    pub async fn login(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let shared = &self.shared;
        let start = Instant::now();
        let epoch = {
            let mut inner = shared.inner.write().await;
            inner.session.login_started();
            shared.publish(&inner);
            inner.session.epoch
        };
        info!("Login attempt for {}", credentials.email);

        let result = self.request_token(credentials).await;

        let mut inner = shared.inner.write().await;
        if inner.session.epoch != epoch {
            warn!(
                "Discarding login response for {}: session was logged out meanwhile",
                credentials.email
            );
            counter!("taskboard_logins_total", "outcome" => "superseded").increment(1);
            return Err(AuthError::Superseded);
        }

        let result = match result {
            Ok(credential) => shared
                .store
                .set(&shared.config.token_key, &credential.token)
                .await
                .map(|_| credential)
                .map_err(AuthError::from),
            Err(e) => Err(e),
        };

        histogram!("taskboard_login_duration_seconds").record(start.elapsed());

        match result {
            Ok(credential) => {
                let identity = credential.identity.clone();
                inner.session.login_succeeded(credential);
                shared.start_revalidation(&mut inner);
                shared.publish(&inner);

                counter!("taskboard_logins_total", "outcome" => "success").increment(1);
                info!("Logged in as {}", identity.subject);
                Ok(identity)
            }
            Err(e) => {
                let had_session = inner.session.credential.is_some();
                inner.session.login_failed(e.user_message());
                if let Some(handle) = inner.revalidation.take() {
                    handle.abort();
                }
                if had_session {
                    shared.purge_token().await;
                }
                shared.publish(&inner);

                counter!("taskboard_logins_total", "outcome" => "failure").increment(1);
                warn!("Login failed for {}: {:?}", credentials.email, e);
                Err(e)
            }
        }
    }

    async fn request_token(&self, credentials: &Credentials) -> Result<Credential, AuthError> {
        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        let request = HttpRequest::post_json(&self.shared.config.login_url, body);

        let response = self
            .shared
            .http
            .send(request)
            .await
            .map_err(|e| AuthError::ServerUnreachable(e.to_string()))?;

        if response.status == 401 {
            return Err(AuthError::CredentialsRejected);
        }
        let response = response
            .error_for_status()
            .map_err(|e| AuthError::ServerUnreachable(e.to_string()))?;

        let LoginResponse { token } = response
            .json()
            .map_err(|e| AuthError::InvalidCredentialResponse(e.to_string()))?;

        let identity = self
            .shared
            .check(&token)
            .map_err(|e| AuthError::InvalidCredentialResponse(e.to_string()))?;
        Ok(Credential { token, identity })
    }

    /// Drop the session and its persisted token. Idempotent.
    pub async fn logout(&self) {
        let mut inner = self.shared.inner.write().await;
        let was_authenticated = inner.session.credential.is_some();
        if let Some(handle) = self.shared.reset(&mut inner).await {
            handle.abort();
        }
        self.shared.publish(&inner);

        if was_authenticated {
            counter!("taskboard_logouts_total", "reason" => "user").increment(1);
            info!("Logged out");
        }
    }

    pub async fn clear_error(&self) {
        let mut inner = self.shared.inner.write().await;
        inner.session.clear_error();
        self.shared.publish(&inner);
    }

    /// Headers authenticating a request as the current session
    pub async fn auth_header(&self) -> AuthHeaders {
        let inner = self.shared.inner.read().await;
        inner
            .session
            .token()
            .map(AuthHeaders::bearer)
            .unwrap_or_default()
    }

    /// Re-check the current token; logs out if it has expired.
    /// Returns whether the session is still authenticated.
    pub async fn revalidate(&self) -> bool {
        self.shared.revalidate(false).await
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.shared.inner.read().await;
        inner.session.snapshot(self.shared.clock.now_millis())
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.updates.subscribe()
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.shared.inner.try_write()
            && let Some(handle) = inner.revalidation.take()
        {
            handle.abort();
        }
    }
}
