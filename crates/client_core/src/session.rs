use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::HeaderValue;
use shared::error::GatewayError;
use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("credential token is empty")]
    EmptyToken,
    #[error("credential token contains characters not allowed in an HTTP header")]
    InvalidToken,
}

/// Authenticated connection parameters for one signed-in operator.
///
/// Created on login and handed to the gateway by `Arc`; dropping the last
/// reference wipes the credential from memory.
pub struct Session {
    api_base: String,
    token: Zeroizing<String>,
}

impl Session {
    pub fn new(api_base: &str, token: impl Into<String>) -> Result<Self, SessionError> {
        let api_base = normalize_api_base(api_base)?;
        let token = Zeroizing::new(token.into());
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        HeaderValue::from_str(&format!("Basic {}", token.as_str()))
            .map_err(|_| SessionError::InvalidToken)?;

        Ok(Self { api_base, token })
    }

    /// Builds the Basic credential from a login/password pair.
    pub fn from_login(api_base: &str, login: &str, password: &str) -> Result<Self, SessionError> {
        let raw = Zeroizing::new(format!("{login}:{password}"));
        Self::new(api_base, STANDARD.encode(raw.as_bytes()))
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    pub(crate) fn authorization(&self) -> Result<HeaderValue, GatewayError> {
        let mut value = HeaderValue::from_str(&format!("Basic {}", self.token.as_str()))
            .map_err(|_| GatewayError::network("credential token is not a valid header value"))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_base", &self.api_base)
            .field("token", &"***REDACTED***")
            .finish()
    }
}

fn normalize_api_base(raw: &str) -> Result<String, SessionError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|err| SessionError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SessionError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_pair_becomes_basic_token() {
        let session = Session::from_login("http://localhost:8081/", "admin", "secret")
            .expect("session");
        assert_eq!(session.api_base(), "http://localhost:8081");
        assert_eq!(
            session.endpoint("/api/dictionary/statuses"),
            "http://localhost:8081/api/dictionary/statuses"
        );
        let header = session.authorization().expect("header");
        assert_eq!(header.to_str().expect("ascii"), "Basic YWRtaW46c2VjcmV0");
        assert!(header.is_sensitive());
    }

    #[test]
    fn debug_output_redacts_token() {
        let session = Session::new("https://example.test", "dG9rZW4=").expect("session");
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("dG9rZW4="));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn rejects_bad_base_urls_and_tokens() {
        assert!(matches!(
            Session::new("not a url", "abc"),
            Err(SessionError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            Session::new("ftp://example.test", "abc"),
            Err(SessionError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            Session::new("http://example.test", "  "),
            Err(SessionError::EmptyToken)
        ));
        assert!(matches!(
            Session::new("http://example.test", "bad\ntoken"),
            Err(SessionError::InvalidToken)
        ));
    }
}
