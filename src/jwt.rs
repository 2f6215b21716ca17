//! Session token signing and verification.
//!
//! Tokens are HS256 JWTs carrying only the session id, the principal name and
//! the expiry. No issue time or nonce is embedded, so the same session always
//! yields the same token and the server can regenerate it from the stored
//! record instead of keeping the token itself.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Session id the token was issued for
    pub sid: String,
    /// Principal (account user name)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Decoded, signature-checked content of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub session_id: String,
    pub principal: String,
    pub expiry: u64,
}

/// Signs and verifies session tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    /// Create a codec with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token binding `session_id` and `principal` to `expiry`.
    pub fn issue(&self, session_id: &str, principal: &str, expiry: u64) -> Result<String, TokenError> {
        let claims = SessionClaims {
            sid: session_id.to_string(),
            sub: principal.to_string(),
            exp: expiry,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    /// Verify a token against the current wall clock.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.verify_at(token, unix_now()?)
    }

    /// Verify a token as of `now` (Unix seconds).
    ///
    /// Zero leeway: a token is accepted while `now < exp`.
    pub fn verify_at(&self, token: &str, now: u64) -> Result<VerifiedToken, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;

        let token_data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(e),
            })?;

        let claims = token_data.claims;
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }

        Ok(VerifiedToken {
            session_id: claims.sid,
            principal: claims.sub,
            expiry: claims.exp,
        })
    }
}

/// Current time as whole seconds since the Unix epoch.
pub fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::Clock)
}

/// Errors that can occur while issuing or verifying tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    #[error("Malformed token: {0}")]
    Malformed(jsonwebtoken::errors::Error),
    #[error("Token signature does not match")]
    BadSignature,
    #[error("Token has expired")]
    Expired,
    #[error("System time error")]
    Clock,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-testing-0123456789";

    fn future() -> u64 {
        unix_now().unwrap() + 600
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let codec = TokenCodec::new(SECRET);
        let exp = future();

        let token = codec.issue("session-1", "alice", exp).unwrap();
        let verified = codec.verify(&token).unwrap();

        assert_eq!(verified.session_id, "session-1");
        assert_eq!(verified.principal, "alice");
        assert_eq!(verified.expiry, exp);
    }

    #[test]
    fn test_issue_is_deterministic() {
        let codec = TokenCodec::new(SECRET);
        let exp = future();

        let a = codec.issue("session-1", "alice", exp).unwrap();
        let b = codec.issue("session-1", "alice", exp).unwrap();
        assert_eq!(a, b);

        let c = codec.issue("session-2", "alice", exp).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_expired_token_rejected_despite_valid_signature() {
        let codec = TokenCodec::new(SECRET);
        let now = unix_now().unwrap();

        let token = codec.issue("session-1", "alice", now - 1).unwrap();
        assert!(matches!(codec.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue("session-1", "alice", 1_000).unwrap();

        assert!(codec.verify_at(&token, 999).is_ok());
        assert!(matches!(codec.verify_at(&token, 1_000), Err(TokenError::Expired)));
        assert!(matches!(codec.verify_at(&token, 1_001), Err(TokenError::Expired)));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue("session-1", "alice", future()).unwrap();

        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut sig = signature.as_bytes().to_vec();
        sig[0] = if sig[0] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{}.{}", head, String::from_utf8(sig).unwrap());

        assert!(codec.verify(&tampered).is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        use base64::Engine;
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue("session-1", "alice", future()).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = SessionClaims {
            sid: "session-1".to_string(),
            sub: "admin".to_string(),
            exp: future(),
        };
        let forged_payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(codec.verify(&forged), Err(TokenError::BadSignature)));
    }

    #[test]
    fn test_wrong_secret() {
        let codec1 = TokenCodec::new(b"secret-1");
        let codec2 = TokenCodec::new(b"secret-2");

        let token = codec1.issue("session-1", "alice", future()).unwrap();
        assert!(codec2.verify(&token).is_err());
    }

    #[test]
    fn test_malformed_token() {
        let codec = TokenCodec::new(SECRET);

        assert!(matches!(codec.verify("invalid-token"), Err(TokenError::Malformed(_))));
        assert!(codec.verify("").is_err());
        assert!(codec.verify("a.b.c").is_err());
    }
}
