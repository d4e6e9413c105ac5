use crate::config;

use base64::{STANDARD, URL_SAFE_NO_PAD, decode_config, encode_config};
use jwt_simple::algorithms::MACLike;
use jwt_simple::prelude::{
    Claims, Duration as JwtDuration, HS256Key, NoCustomClaims, VerificationOptions,
};
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::warn;

use std::collections::HashSet;

const KEY_BYTES: usize = 32;
const SESSION_ID_BYTES: usize = 24;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid auth key")]
    InvalidKey,
    #[error("auth token ttl must be positive")]
    InvalidTtl,
    #[error("invalid session token")]
    InvalidToken,
    #[error("session token does not name a session")]
    MissingSession,
}

/// The cookie that binds a browser to its server-side session. Its value is
/// an HS256 token whose subject is the session id; the session itself never
/// leaves the server.
#[derive(Debug, Clone)]
pub(crate) struct SessionCookies {
    key: HS256Key,
    issuer: String,
    name: String,
    ttl: time::Duration,
    secure: bool,
}

impl SessionCookies {
    pub(crate) fn from_config(config: &config::AppConfig) -> Result<Self, AuthError> {
        let auth = &config.auth;
        if !auth.token_ttl.is_positive() {
            return Err(AuthError::InvalidTtl);
        }
        let key = match auth.key.as_deref() {
            Some(raw) => decode_key(raw)?,
            None => {
                warn!("no auth key configured; sessions end when the process restarts");
                random_bytes(KEY_BYTES)
            }
        };

        Ok(Self {
            key: HS256Key::from_bytes(&key),
            issuer: config.app_name.clone(),
            name: auth.cookie_name.clone(),
            ttl: auth.token_ttl,
            secure: auth.cookie_secure,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn sign(&self, session_id: &str) -> Result<String, AuthError> {
        let claims = Claims::create(JwtDuration::from_secs(self.ttl.whole_seconds() as u64))
            .with_subject(session_id)
            .with_issuer(&self.issuer);
        self.key
            .authenticate(claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// `Set-Cookie` value handing a new session to the browser.
    pub(crate) fn issue(&self, session_id: &str) -> Result<String, AuthError> {
        let token = self.sign(session_id)?;
        Ok(self.header(&token, self.ttl.whole_seconds()))
    }

    /// `Set-Cookie` value that makes the browser drop its session cookie.
    pub(crate) fn expired(&self) -> String {
        self.header("", 0)
    }

    /// Session id named by a cookie value, if the token is ours and unexpired.
    pub(crate) fn session_id(&self, token: &str) -> Result<String, AuthError> {
        let options = VerificationOptions {
            allowed_issuers: Some(HashSet::from([self.issuer.clone()])),
            ..Default::default()
        };
        let claims = self
            .key
            .verify_token::<NoCustomClaims>(token, Some(options))
            .map_err(|_| AuthError::InvalidToken)?;
        match claims.subject {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(AuthError::MissingSession),
        }
    }

    fn header(&self, value: &str, max_age: i64) -> String {
        let secure = if self.secure { "; Secure" } else { "" };
        format!(
            "{}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}{secure}",
            self.name
        )
    }
}

fn decode_key(raw: &str) -> Result<Vec<u8>, AuthError> {
    let raw = raw.trim();
    let key = decode_config(raw, URL_SAFE_NO_PAD)
        .or_else(|_| decode_config(raw, STANDARD))
        .map_err(|_| AuthError::InvalidKey)?;
    if key.is_empty() {
        return Err(AuthError::InvalidKey);
    }
    Ok(key)
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// A fresh key in the form `--auth-key` accepts.
pub fn generate_auth_key() -> String {
    encode_config(random_bytes(KEY_BYTES), URL_SAFE_NO_PAD)
}

pub(crate) fn new_session_id() -> String {
    encode_config(random_bytes(SESSION_ID_BYTES), URL_SAFE_NO_PAD)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use time::Duration;

    fn cookies(secure: bool) -> SessionCookies {
        let config = config::AppConfig {
            auth: config::AuthConfig {
                key: Some(generate_auth_key()),
                token_ttl: Duration::hours(1),
                cookie_name: "shiftbook_session".to_string(),
                cookie_secure: secure,
            },
            ..Default::default()
        };
        SessionCookies::from_config(&config).expect("session cookies")
    }

    #[test]
    fn session_id__should_return_id_signed_into_token() {
        // Given
        let cookies = cookies(false);
        let token = cookies.sign("session-42").expect("sign");

        // When
        let session_id = cookies.session_id(&token).expect("verify");

        // Then
        assert_eq!(session_id, "session-42");
    }

    #[test]
    fn session_id__should_reject_tokens_from_other_keys() {
        // Given
        let ours = cookies(false);
        let theirs = cookies(false);
        let token = theirs.sign("session-42").expect("sign");

        // Then
        assert!(matches!(
            ours.session_id(&token),
            Err(AuthError::InvalidToken)
        ));
        assert!(ours.session_id("not-a-token").is_err());
    }

    #[test]
    fn issue__should_set_and_expire_cookie_with_flags() {
        // Given
        let cookies = cookies(true);

        // When
        let issued = cookies.issue("session-42").expect("issue");
        let expired = cookies.expired();

        // Then
        assert!(issued.starts_with("shiftbook_session="));
        assert!(issued.contains("HttpOnly; SameSite=Lax; Max-Age=3600"));
        assert!(issued.ends_with("; Secure"));
        assert_eq!(
            expired,
            "shiftbook_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure"
        );
    }

    #[test]
    fn from_config__should_reject_blank_key_and_zero_ttl() {
        // Given
        let blank_key = config::AppConfig {
            auth: config::AuthConfig {
                key: Some("   ".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let zero_ttl = config::AppConfig {
            auth: config::AuthConfig {
                token_ttl: Duration::ZERO,
                ..Default::default()
            },
            ..Default::default()
        };

        // Then
        assert!(matches!(
            SessionCookies::from_config(&blank_key),
            Err(AuthError::InvalidKey)
        ));
        assert!(matches!(
            SessionCookies::from_config(&zero_ttl),
            Err(AuthError::InvalidTtl)
        ));
    }

    #[test]
    fn new_session_id__should_not_repeat() {
        // Then
        assert_ne!(new_session_id(), new_session_id());
        assert_eq!(new_session_id().len(), 32);
    }
}
