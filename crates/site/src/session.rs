//! Admin session store.
//!
//! The session lives entirely in one signed, httpOnly cookie; there is no
//! server-side session table. The cookie value is
//! `base64url(json) . hex(hmac-sha256(json))`, signed with the site's
//! session secret. Reads fail soft: a missing, tampered, or malformed cookie
//! is simply "not logged in", never an error.
//!
//! Sessions are not proactively refreshed. An expired access token makes the
//! next identity-provider call fail, which callers surface as "not
//! authenticated".

use axum::http::{HeaderMap, header};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Session cookie name.
pub const ADMIN_SESSION_COOKIE: &str = "sonie-admin-session";

/// Cookie lifetime in seconds (7 days).
const SESSION_MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;

type HmacSha256 = Hmac<Sha256>;

/// Authentication state carried by the admin cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as epoch seconds. Informational only; expiry is enforced by
    /// the identity provider rejecting the token, not by us.
    pub expires_at: i64,
    pub email: String,
}

/// Serialize and sign a session into the raw cookie value.
fn encode(session: &AdminSession, secret: &SecretString) -> String {
    // Serialization of a struct of strings and an i64 cannot fail.
    let payload = serde_json::to_vec(session).unwrap_or_default();
    let encoded = URL_SAFE_NO_PAD.encode(&payload);
    format!("{encoded}.{}", sign(&encoded, secret))
}

/// Verify and deserialize a raw cookie value.
///
/// Any structural or signature problem yields `None`.
#[must_use]
pub fn decode(value: &str, secret: &SecretString) -> Option<AdminSession> {
    let (encoded, tag) = value.split_once('.')?;

    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()).ok()?;
    mac.update(encoded.as_bytes());
    // Constant-time comparison via the Mac verifier.
    let provided = hex::decode(tag).ok()?;
    mac.verify_slice(&provided).ok()?;

    let payload = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    serde_json::from_slice(&payload).ok()
}

fn sign(encoded_payload: &str, secret: &SecretString) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        // HMAC accepts keys of any length; unreachable in practice.
        return String::new();
    };
    mac.update(encoded_payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Build the `Set-Cookie` value that persists a session for 7 days.
///
/// httpOnly, SameSite=Lax, Secure, site-wide path.
#[must_use]
pub fn persist_cookie(session: &AdminSession, secret: &SecretString) -> String {
    format!(
        "{ADMIN_SESSION_COOKIE}={}; HttpOnly; SameSite=Lax; Secure; Path=/; Max-Age={SESSION_MAX_AGE_SECONDS}",
        encode(session, secret)
    )
}

/// Build the `Set-Cookie` value that deletes the session cookie.
#[must_use]
pub fn clear_cookie() -> String {
    format!("{ADMIN_SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Secure; Path=/; Max-Age=0")
}

/// Read and verify the session from request headers.
///
/// Returns `None` when the cookie is missing or the payload does not verify.
#[must_use]
pub fn read(headers: &HeaderMap, secret: &SecretString) -> Option<AdminSession> {
    let raw = cookie_value(headers, ADMIN_SESSION_COOKIE)?;
    decode(raw, secret)
}

/// Extract a single cookie's value from the `Cookie` header(s).
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(str::trim)
        .find_map(|cookie| {
            let (key, value) = cookie.split_once('=')?;
            if key.trim() == name {
                Some(value.trim())
            } else {
                None
            }
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn secret() -> SecretString {
        SecretString::from("kX9#mQ2$vL8@nR4!pT6&wY0*zB5^cF3j")
    }

    fn session() -> AdminSession {
        AdminSession {
            access_token: "at-123".to_owned(),
            refresh_token: "rt-456".to_owned(),
            expires_at: 1_755_000_000,
            email: "admin@sonieatelier.com".to_owned(),
        }
    }

    #[test]
    fn test_roundtrip() {
        let encoded = encode(&session(), &secret());
        let decoded = decode(&encoded, &secret()).unwrap();
        assert_eq!(decoded, session());
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let encoded = encode(&session(), &secret());
        let (payload, tag) = encoded.split_once('.').unwrap();

        let other = AdminSession {
            email: "intruder@example.net".to_owned(),
            ..session()
        };
        let forged_payload = encode(&other, &secret());
        let (forged, _) = forged_payload.split_once('.').unwrap();

        assert!(decode(&format!("{forged}.{tag}"), &secret()).is_none());
        assert!(decode(&format!("{payload}.deadbeef"), &secret()).is_none());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let encoded = encode(&session(), &secret());
        let other = SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6d");
        assert!(decode(&encoded, &other).is_none());
    }

    #[test]
    fn test_malformed_values_fail_soft() {
        assert!(decode("", &secret()).is_none());
        assert!(decode("no-dot-here", &secret()).is_none());
        assert!(decode("notbase64!.cafe", &secret()).is_none());
    }

    #[test]
    fn test_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        let value = format!(
            "theme=dark; {ADMIN_SESSION_COOKIE}={}; other=1",
            encode(&session(), &secret())
        );
        headers.insert(header::COOKIE, HeaderValue::from_str(&value).unwrap());

        assert_eq!(read(&headers, &secret()).unwrap(), session());
    }

    #[test]
    fn test_read_missing_cookie_is_none() {
        assert!(read(&HeaderMap::new(), &secret()).is_none());
    }

    #[test]
    fn test_persist_cookie_attributes() {
        let cookie = persist_cookie(&session(), &secret());
        assert!(cookie.starts_with("sonie-admin-session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        assert!(clear_cookie().contains("Max-Age=0"));
    }
}
