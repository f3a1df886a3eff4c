//! HTTP client capability
//!
//! The session core only needs "send a request, get a status and a body". Transport
//! failures (no response at all) are kept distinct from responses carrying an error
//! status, since the two are classified differently.

mod reqwest_client;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;

pub use reqwest_client::ReqwestClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Outgoing request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON body, if any
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Post, url).with_body(body)
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_headers<I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.headers.extend(headers);
        self
    }
}

/// Response as received, whatever its status
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into `HttpError::Status`
    pub fn error_for_status(self) -> Result<Self, HttpError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(HttpError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(|e| HttpError::Decode(e.to_string()))
    }
}

/// Why no response was received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    Other,
}

#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("Network Error: {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    #[error("Request failed with status code {status}")]
    Status { status: u16, body: Bytes },

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl HttpError {
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        HttpError::Transport {
            kind,
            message: message.into(),
        }
    }

    /// HTTP status, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the request never produced a response
    pub fn is_transport(&self) -> bool {
        matches!(self, HttpError::Transport { .. })
    }
}

/// Trait for HTTP clients (reqwest in production, stubs in tests)
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a request. `Err` is reserved for failures where no response arrived.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}
