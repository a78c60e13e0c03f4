//! Identity token verification.
//!
//! Identity is established out of band (OAuth, upstream gateway); this
//! service only checks a signed bearer token and extracts the user id.
//! [`TokenVerifier`] is the seam the session manager and HTTP layer use,
//! with [`HmacTokenVerifier`] as the production implementation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies a bearer token and resolves the owning user.
pub trait TokenVerifier: Send + Sync {
    /// Returns the user id for a valid token, `None` otherwise.
    fn verify(&self, token: &str) -> Option<String>;
}

/// HMAC-SHA256 signed tokens: `base64url(user_id.expiry_unix).base64url(mac)`.
pub struct HmacTokenVerifier {
    secret: String,
}

impl HmacTokenVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issue a token for `user_id` valid for `ttl_secs` seconds.
    pub fn issue(&self, user_id: &str, ttl_secs: i64) -> Option<String> {
        let expiry = Utc::now().timestamp() + ttl_secs;
        let payload = format!("{user_id}.{expiry}");
        let mac = self.sign(payload.as_bytes())?;
        Some(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(mac)
        ))
    }

    fn sign(&self, payload: &[u8]) -> Option<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(payload);
        Some(mac.finalize().into_bytes().to_vec())
    }
}

impl TokenVerifier for HmacTokenVerifier {
    fn verify(&self, token: &str) -> Option<String> {
        let (payload_b64, mac_b64) = token.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let claimed_mac = URL_SAFE_NO_PAD.decode(mac_b64).ok()?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(&payload);
        mac.verify_slice(&claimed_mac).ok()?;

        let payload = String::from_utf8(payload).ok()?;
        let (user_id, expiry) = payload.rsplit_once('.')?;
        let expiry: i64 = expiry.parse().ok()?;
        if expiry < Utc::now().timestamp() {
            return None;
        }

        Some(user_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let verifier = HmacTokenVerifier::new("test-secret");
        let token = verifier.issue("user-42", 3600).unwrap();
        assert_eq!(verifier.verify(&token).as_deref(), Some("user-42"));
    }

    #[test]
    fn rejects_tampered_payload() {
        let verifier = HmacTokenVerifier::new("test-secret");
        let token = verifier.issue("user-42", 3600).unwrap();
        let (_, mac) = token.split_once('.').unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(format!(
            "user-43.{}",
            Utc::now().timestamp() + 3600
        ));
        let forged = format!("{forged_payload}.{mac}");
        assert_eq!(verifier.verify(&forged), None);
    }

    #[test]
    fn rejects_wrong_secret() {
        let issuer = HmacTokenVerifier::new("secret-a");
        let verifier = HmacTokenVerifier::new("secret-b");
        let token = issuer.issue("user-42", 3600).unwrap();
        assert_eq!(verifier.verify(&token), None);
    }

    #[test]
    fn rejects_expired() {
        let verifier = HmacTokenVerifier::new("test-secret");
        let token = verifier.issue("user-42", -10).unwrap();
        assert_eq!(verifier.verify(&token), None);
    }

    #[test]
    fn rejects_garbage() {
        let verifier = HmacTokenVerifier::new("test-secret");
        assert_eq!(verifier.verify("not-a-token"), None);
        assert_eq!(verifier.verify(""), None);
        assert_eq!(verifier.verify("a.b.c"), None);
    }

    #[test]
    fn user_ids_with_dots_survive() {
        let verifier = HmacTokenVerifier::new("test-secret");
        let token = verifier.issue("user.with.dots", 3600).unwrap();
        assert_eq!(verifier.verify(&token).as_deref(), Some("user.with.dots"));
    }
}
