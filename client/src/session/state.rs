use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::token::Identity;
use crate::config::Config;

/// `last_error` after the auth endpoint answered 401
pub const INCORRECT_CREDENTIALS_MESSAGE: &str = "Email ou mot de passe incorrect";
/// `last_error` after any other login failure
pub const SERVER_UNREACHABLE_MESSAGE: &str = "Erreur de connexion au serveur";

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Absolute URL of the login endpoint
    pub login_url: String,
    /// Store key holding the bearer token
    pub token_key: String,
    /// Period between expiry checks while authenticated
    pub revalidate_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            login_url: config.login_url(),
            token_key: config.auth.token_key.clone(),
            revalidate_interval: config.auth.revalidate_interval,
        }
    }
}

/// Login form payload, posted as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Body returned by the auth endpoint on success
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// A token together with the identity decoded from it. They are only ever
/// assigned as a pair.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub identity: Identity,
}

/// Session state
#[derive(Debug)]
pub struct SessionState {
    pub credential: Option<Credential>,
    /// True until the startup check has run
    pub initializing: bool,
    /// True while a login request is in flight
    pub loading: bool,
    pub last_error: Option<String>,
    /// Bumped by every logout; in-flight logins compare against it
    pub epoch: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            credential: None,
            initializing: true,
            loading: false,
            last_error: None,
            epoch: 0,
        }
    }

    /// Outcome of the startup check
    pub fn restored(&mut self, credential: Option<Credential>) {
        self.credential = credential;
        self.initializing = false;
        self.loading = false;
    }

    pub fn login_started(&mut self) {
        self.loading = true;
        self.last_error = None;
    }

    pub fn login_succeeded(&mut self, credential: Credential) {
        self.credential = Some(credential);
        self.loading = false;
        self.last_error = None;
    }

    pub fn login_failed(&mut self, message: &str) {
        self.credential = None;
        self.loading = false;
        self.last_error = Some(message.to_string());
    }

    pub fn logged_out(&mut self) {
        self.credential = None;
        self.loading = false;
        self.last_error = None;
        self.epoch += 1;
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.token.as_str())
    }

    pub fn snapshot(&self, now_ms: u64) -> SessionSnapshot {
        let identity = self.credential.as_ref().map(|c| c.identity.clone());
        let is_authenticated = identity
            .as_ref()
            .is_some_and(|identity| !identity.is_expired_at(now_ms));

        SessionSnapshot {
            is_authenticated,
            identity,
            initializing: self.initializing,
            loading: self.loading,
            last_error: self.last_error.clone(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the session for rendering layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub identity: Option<Identity>,
    pub initializing: bool,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    pub fn subject(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.subject.as_str())
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        SessionState::new().snapshot(0)
    }
}

/// Request headers carrying the session credential; empty when logged out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthHeaders(Vec<(String, String)>);

impl AuthHeaders {
    pub fn bearer(token: &str) -> Self {
        Self(vec![(
            "Authorization".to_string(),
            format!("Bearer {}", token),
        )])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl IntoIterator for AuthHeaders {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
