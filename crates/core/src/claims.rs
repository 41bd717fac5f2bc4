//! Unverified bearer-token claims projection.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::{AuthError, Role, User};

/// Identity attributes read from the payload segment of a bearer token.
///
/// This projection is decoded **without** verifying the signature. It is
/// only good for seeding the session optimistically before the profile
/// endpoint answers; it must never back a trust decision. The
/// authoritative identity always comes from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject identifier; maps onto [`User::id`].
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    /// Expiry as a unix timestamp, when the token carries one.
    pub expires_at: Option<i64>,
}

/// Wire shape of the payload segment. `sub` arrives as a string or a
/// number depending on the server generation.
#[derive(Deserialize)]
struct RawClaims {
    sub: serde_json::Value,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

/// Decode the middle segment of a three-segment, period-delimited token.
///
/// Any malformed segment, invalid encoding or invalid embedded structure
/// is a [`AuthError::Decode`]; callers treat that as "no usable
/// identity" and purge the offending token from the credential store.
pub fn decode_unverified(token: &str) -> Result<TokenClaims, AuthError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::decode("token is not in three-segment form"));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|err| AuthError::decode(format!("payload segment is not base64url: {err}")))?;

    let raw: RawClaims = serde_json::from_slice(&bytes)
        .map_err(|err| AuthError::decode(format!("payload is not a claims object: {err}")))?;

    let subject = match raw.sub {
        serde_json::Value::String(sub) if !sub.is_empty() => sub,
        serde_json::Value::Number(sub) => sub.to_string(),
        _ => return Err(AuthError::decode("claims carry no usable subject")),
    };

    Ok(TokenClaims {
        subject,
        email: raw.email,
        name: raw.name,
        role: raw.role.map(Role::from),
        expires_at: raw.exp,
    })
}

impl TokenClaims {
    /// Whether the embedded expiry, if any, lies in the past.
    ///
    /// `leeway_secs` absorbs clock skew between client and issuer. A
    /// token without an `exp` claim is never considered expired here;
    /// the server remains the authority either way.
    pub fn is_expired(&self, leeway_secs: i64) -> bool {
        match self.expires_at {
            Some(exp) => exp + leeway_secs < chrono::Utc::now().timestamp(),
            None => false,
        }
    }

    /// Project into a provisional user record.
    pub fn to_user(&self) -> User {
        User {
            id: self.subject.clone(),
            email: self.email.clone().unwrap_or_default(),
            name: self.name.clone(),
            phone: None,
            role: self.role.clone(),
            avatar: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
