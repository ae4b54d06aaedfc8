//! Session cookies.
//!
//! Student sessions are opaque provider tokens and are only ever stored in and
//! read from their cookie. Admin sessions are built here: the claims are
//! serialized as JSON, base64url-encoded and signed with HMAC-SHA256, so the
//! admin guard can trust them without a store round-trip until they expire.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

pub const STUDENT_SESSION_COOKIE: &str = "portal_session_token";
pub const STUDENT_SESSION_MAX_AGE: i64 = 60 * 24 * 60 * 60;

pub const ADMIN_SESSION_COOKIE: &str = "admin_session";
pub const ADMIN_SESSION_MAX_AGE: i64 = 8 * 60 * 60;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub id: i64,
    pub email: String,
    pub is_admin: bool,
    /// Unix seconds.
    pub exp: i64,
}

impl AdminClaims {
    pub fn new(id: i64, email: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            is_admin: true,
            exp: Utc::now().timestamp() + ADMIN_SESSION_MAX_AGE,
        }
    }
}

/// A token that is malformed, tampered with, expired or not an admin token.
/// Callers treat it exactly like a missing cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSession;

#[derive(Clone)]
pub struct SessionCodec {
    mac: HmacSha256,
}

impl fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCodec").finish_non_exhaustive()
    }
}

impl SessionCodec {
    pub fn new(secret: &[u8]) -> anyhow::Result<Self> {
        if secret.is_empty() {
            anyhow::bail!("admin session secret must not be empty");
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|err| anyhow::anyhow!("invalid admin session secret: {err}"))?;
        Ok(Self { mac })
    }

    /// Per-process key; every admin session dies with the process.
    pub fn random() -> anyhow::Result<Self> {
        let secret: [u8; 32] = thread_rng().gen();
        Self::new(&secret)
    }

    pub fn encode(&self, claims: &AdminClaims) -> Result<String, serde_json::Error> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let signature = self.sign(&payload);
        Ok(format!("{payload}.{signature}"))
    }

    pub fn decode(&self, token: &str) -> Result<AdminClaims, InvalidSession> {
        let (payload, signature) = token.split_once('.').ok_or(InvalidSession)?;
        let signature = hex::decode(signature).map_err(|_| InvalidSession)?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| InvalidSession)?;

        let json = URL_SAFE_NO_PAD.decode(payload).map_err(|_| InvalidSession)?;
        let claims: AdminClaims = serde_json::from_slice(&json).map_err(|_| InvalidSession)?;
        if !claims.is_admin || claims.exp <= Utc::now().timestamp() {
            return Err(InvalidSession);
        }
        Ok(claims)
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// `Set-Cookie` value for a session cookie usable from a cross-site frontend.
pub fn session_cookie(name: &str, value: &str, max_age: i64) -> String {
    format!("{name}={value}; Path=/; HttpOnly; Secure; SameSite=None; Max-Age={max_age}")
}

pub fn expired_cookie(name: &str) -> String {
    session_cookie(name, "", 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> SessionCodec {
        SessionCodec::new(b"test-secret").unwrap()
    }

    fn signed(codec: &SessionCodec, json: &str) -> String {
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = codec.sign(&payload);
        format!("{payload}.{signature}")
    }

    #[test]
    fn round_trip() {
        let claims = AdminClaims::new(7, "a@x.com");
        let token = codec().encode(&claims).unwrap();
        assert_eq!(codec().decode(&token), Ok(claims));
    }

    #[test]
    fn rejects_garbage() {
        let codec = codec();
        for token in ["", ".", "abc", "abc.def", "{\"id\":1}", "e30.zz"] {
            assert_eq!(codec.decode(token), Err(InvalidSession), "{token:?}");
        }
    }

    #[test]
    fn rejects_tampered_payload() {
        let codec = codec();
        let token = codec.encode(&AdminClaims::new(7, "a@x.com")).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&AdminClaims::new(1, "root@x.com")).unwrap(),
        );
        assert_eq!(codec.decode(&format!("{forged}.{signature}")), Err(InvalidSession));
    }

    #[test]
    fn rejects_other_key() {
        let token = SessionCodec::new(b"another-secret")
            .unwrap()
            .encode(&AdminClaims::new(7, "a@x.com"))
            .unwrap();
        assert_eq!(codec().decode(&token), Err(InvalidSession));
    }

    #[test]
    fn rejects_non_admin_and_missing_flag() {
        let codec = codec();
        let exp = Utc::now().timestamp() + 60;
        let not_admin = format!(r#"{{"id":1,"email":"a@x.com","is_admin":false,"exp":{exp}}}"#);
        let missing = format!(r#"{{"id":1,"email":"a@x.com","exp":{exp}}}"#);
        let stringly = format!(r#"{{"id":1,"email":"a@x.com","is_admin":"true","exp":{exp}}}"#);
        assert_eq!(codec.decode(&signed(&codec, &not_admin)), Err(InvalidSession));
        assert_eq!(codec.decode(&signed(&codec, &missing)), Err(InvalidSession));
        assert_eq!(codec.decode(&signed(&codec, &stringly)), Err(InvalidSession));
    }

    #[test]
    fn rejects_expired() {
        let codec = codec();
        let mut claims = AdminClaims::new(7, "a@x.com");
        claims.exp = Utc::now().timestamp() - 1;
        let token = codec.encode(&claims).unwrap();
        assert_eq!(codec.decode(&token), Err(InvalidSession));
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(SessionCodec::new(b"").is_err());
    }

    #[test]
    fn cookie_attributes() {
        let cookie = session_cookie(ADMIN_SESSION_COOKIE, "tok", ADMIN_SESSION_MAX_AGE);
        assert_eq!(
            cookie,
            "admin_session=tok; Path=/; HttpOnly; Secure; SameSite=None; Max-Age=28800"
        );
        assert!(expired_cookie(STUDENT_SESSION_COOKIE).starts_with("portal_session_token=;"));
        assert!(expired_cookie(STUDENT_SESSION_COOKIE).ends_with("Max-Age=0"));
    }
}
