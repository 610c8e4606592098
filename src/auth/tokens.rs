//! Token storage and management

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Stored session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    pub expires_at: Option<u64>,
}

impl StoredToken {
    pub fn new(token: String, expires_in_secs: Option<u64>) -> Self {
        // If the backend omits expiresIn, fall back to the JWT exp claim.
        let expires_at = match expires_in_secs {
            Some(secs) => Some(now_unix() + secs),
            None => peek_claims(&token).and_then(|c| c.exp),
        };

        Self { token, expires_at }
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            // Consider expired if less than a minute remaining
            Some(exp) => now_unix() + 60 >= exp,
            None => false,
        }
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Claims we care about from the session JWT. The token is opaque to the
/// client otherwise; no signature verification happens here.
#[derive(Debug, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user id the session belongs to.
    pub sub: Option<String>,
    /// Expiry as unix seconds.
    pub exp: Option<u64>,
}

/// Decode the payload segment of a JWT without verifying it.
pub fn peek_claims(jwt: &str) -> Option<TokenClaims> {
    let payload = jwt.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Token store trait for different storage backends
pub trait TokenStore {
    fn get_access_token(&self) -> Option<StoredToken>;
    fn set_access_token(&mut self, token: String, expires_in: Option<u64>);
    fn get_refresh_token(&self) -> Option<String>;
    fn set_refresh_token(&mut self, token: String);
    fn clear_tokens(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_jwt(payload: serde_json::Value) -> String {
        let enc = |b: &[u8]| base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(b);
        format!(
            "{}.{}.{}",
            enc(br#"{"alg":"HS256","typ":"JWT"}"#),
            enc(payload.to_string().as_bytes()),
            enc(b"sig")
        )
    }

    #[test]
    fn test_peek_claims() {
        let jwt = fake_jwt(serde_json::json!({"sub": "user-42", "exp": 4102444800u64}));
        let claims = peek_claims(&jwt).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user-42"));
        assert_eq!(claims.exp, Some(4102444800));
    }

    #[test]
    fn test_peek_claims_rejects_garbage() {
        assert!(peek_claims("not-a-jwt").is_none());
        assert!(peek_claims("a.!!!.c").is_none());
    }

    #[test]
    fn test_expiry_from_jwt_exp_when_expires_in_missing() {
        // exp far in the future -> not expired
        let jwt = fake_jwt(serde_json::json!({"exp": 4102444800u64}));
        let token = StoredToken::new(jwt, None);
        assert_eq!(token.expires_at, Some(4102444800));
        assert!(!token.is_expired());

        // exp in the past -> expired
        let jwt = fake_jwt(serde_json::json!({"exp": 1000u64}));
        let token = StoredToken::new(jwt, None);
        assert!(token.is_expired());
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let token = StoredToken::new("opaque".to_string(), None);
        assert_eq!(token.expires_at, None);
        assert!(!token.is_expired());
    }
}
