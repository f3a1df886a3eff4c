//! Bearer token inspection
//!
//! Tokens are JWT-shaped (`header.claims.signature`). Only the claims segment is
//! decoded; signatures are never verified, the issuing server is trusted.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard decode failures. Expiry is not one of them, see `TokenStatus`.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Malformed token: expected 3 segments, found {0}")]
    Segments(usize),

    #[error("Malformed token: invalid base64 in claims: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Malformed token: invalid claims payload: {0}")]
    Claims(#[from] serde_json::Error),

    #[error("Malformed token: missing subject claim")]
    MissingSubject,
}

/// Claims read from the payload segment
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    /// Seconds since the epoch
    #[serde(default)]
    pub exp: Option<f64>,
}

/// Decoded identity of the token holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    /// Milliseconds since the epoch; `None` means the token never expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<u64>,
}

impl Identity {
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        matches!(self.expires_at_ms, Some(exp) if exp < now_ms)
    }
}

/// Outcome of a structurally successful decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Valid(Identity),
    Expired(Identity),
}

impl TokenStatus {
    pub fn identity(&self) -> &Identity {
        match self {
            TokenStatus::Valid(identity) | TokenStatus::Expired(identity) => identity,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, TokenStatus::Valid(_))
    }
}

/// Decode the claims segment of `token`
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Segments(segments.len()));
    }

    // Some issuers keep the base64 padding
    let payload = segments[1].trim_end_matches('=');
    let decoded = URL_SAFE_NO_PAD.decode(payload)?;
    Ok(serde_json::from_slice(&decoded)?)
}

/// Decode `token` into an identity, without judging expiry
pub fn decode_identity(token: &str) -> Result<Identity, TokenError> {
    let claims = decode_claims(token)?;
    let subject = claims.sub.ok_or(TokenError::MissingSubject)?;
    let expires_at_ms = claims.exp.map(|exp| (exp * 1000.0).max(0.0) as u64);

    Ok(Identity {
        subject,
        expires_at_ms,
    })
}

/// Decode `token` and judge it against `now_ms`, milliseconds since the epoch
pub fn inspect(token: &str, now_ms: u64) -> Result<TokenStatus, TokenError> {
    let identity = decode_identity(token)?;
    if identity.is_expired_at(now_ms) {
        Ok(TokenStatus::Expired(identity))
    } else {
        Ok(TokenStatus::Valid(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_with(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_valid_token() {
        let token = token_with(json!({"sub": "student@example.com", "exp": 2_000}));
        let status = inspect(&token, 1_000_000).unwrap();
        assert_eq!(
            status,
            TokenStatus::Valid(Identity {
                subject: "student@example.com".to_string(),
                expires_at_ms: Some(2_000_000),
            })
        );
    }

    #[test]
    fn test_expired_token_still_decodes() {
        let token = token_with(json!({"sub": "a@b.c", "exp": 999}));
        let status = inspect(&token, 1_000_000).unwrap();
        assert!(!status.is_valid());
        assert_eq!(status.identity().subject, "a@b.c");
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let token = token_with(json!({"sub": "a@b.c", "exp": 1_000}));
        assert!(inspect(&token, 1_000_000).unwrap().is_valid());
        assert!(!inspect(&token, 1_000_001).unwrap().is_valid());
    }

    #[test]
    fn test_expired_within_the_same_second() {
        // exp is a whole second already in the past at 1000.4s
        let token = token_with(json!({"sub": "a@b.c", "exp": 1_000}));
        assert!(!inspect(&token, 1_000_400).unwrap().is_valid());
    }

    #[test]
    fn test_token_without_exp_never_expires() {
        let token = token_with(json!({"sub": "a@b.c"}));
        assert!(inspect(&token, u64::MAX).unwrap().is_valid());
    }

    #[test]
    fn test_fractional_exp() {
        let token = token_with(json!({"sub": "a@b.c", "exp": 1_500.75}));
        assert_eq!(
            decode_identity(&token).unwrap().expires_at_ms,
            Some(1_500_750)
        );
        assert!(inspect(&token, 1_500_750).unwrap().is_valid());
        assert!(!inspect(&token, 1_500_751).unwrap().is_valid());
    }

    #[test]
    fn test_padded_payload_accepted() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"sub":"ab"}"#);
        assert!(payload.ends_with('='));
        let token = format!("{header}.{payload}.sig");
        assert_eq!(decode_identity(&token).unwrap().subject, "ab");
    }

    #[test]
    fn test_wrong_segment_count() {
        assert!(matches!(
            decode_claims("only.two"),
            Err(TokenError::Segments(2))
        ));
        assert!(matches!(
            decode_claims("a.b.c.d"),
            Err(TokenError::Segments(4))
        ));
        assert!(matches!(decode_claims(""), Err(TokenError::Segments(1))));
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(
            decode_claims("x.@@@.z"),
            Err(TokenError::Base64(_))
        ));
    }

    #[test]
    fn test_invalid_claims_payload() {
        let payload = URL_SAFE_NO_PAD.encode("not json");
        let token = format!("h.{payload}.s");
        assert!(matches!(decode_claims(&token), Err(TokenError::Claims(_))));
    }

    #[test]
    fn test_missing_subject() {
        let token = token_with(json!({"exp": 5}));
        assert!(matches!(
            decode_identity(&token),
            Err(TokenError::MissingSubject)
        ));
    }
}
