//! services/site/src/web/cookies.rs
//!
//! Cookie parsing, `Set-Cookie` formatting and signed cookie values.
//!
//! Signed values use the `s:<value>.<signature>` layout, where the signature
//! is an HMAC-SHA256 of the value keyed with the configured cookie secret.

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie that carries the signed session id.
pub const SESSION_COOKIE: &str = "sid";

//=========================================================================================
// Signing
//=========================================================================================

/// Signs and verifies cookie values with a shared secret.
#[derive(Clone)]
pub struct CookieSigner {
    key: Vec<u8>,
}

impl fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieSigner").finish_non_exhaustive()
    }
}

impl CookieSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC can take a key of any size")
    }

    pub fn sign(&self, value: &str) -> String {
        let mut mac = self.mac();
        mac.update(value.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("s:{}.{}", value, signature)
    }

    /// Returns the original value if `signed` carries a valid signature.
    pub fn unsign(&self, signed: &str) -> Option<String> {
        let (value, signature) = signed.strip_prefix("s:")?.rsplit_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        let mut mac = self.mac();
        mac.update(value.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(value.to_string())
    }
}

//=========================================================================================
// Parsing
//=========================================================================================

/// Collects every `name=value` pair from the request's `Cookie` headers.
/// The first occurrence of a name wins.
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else { continue };
        for pair in value.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            cookies
                .entry(name.trim().to_string())
                .or_insert_with(|| value.to_string());
        }
    }
    cookies
}

//=========================================================================================
// Set-Cookie
//=========================================================================================

/// A `Set-Cookie` header value under construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetCookie {
    name: String,
    value: String,
    path: String,
    max_age: Option<Duration>,
    http_only: bool,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            max_age: None,
            http_only: false,
        }
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}; Path={}", self.name, self.value, self.path)?;
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age.as_secs())?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        f.write_str("; SameSite=Lax")
    }
}
