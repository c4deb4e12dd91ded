use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::models::user::UserProfile;

/// The claims read from a token's payload segment.
///
/// ⚠️ IMPORTANT: decoding performs NO signature verification. These claims
/// are an optimistic client-side read used for display and proactive UX
/// (name, role, expiry countdown). They MUST NOT back an authorization
/// decision; the backend's acceptance or 401 is the sole authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Expiry as unix seconds.
    #[serde(default)]
    pub exp: Option<i64>,
    /// Subject id. Backends emit either `id` or `userId`.
    #[serde(default, alias = "userId")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

impl Claims {
    /// Builds a `UserProfile` from the identity claims.
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            department: self.department.clone(),
        }
    }
}

/// Decodes the payload segment of a bearer token.
///
/// Never panics or errors: any malformed input (missing segments, bad
/// base64, invalid JSON) yields `None`. Accepts payloads in either the
/// URL-safe or the standard base64 alphabet, with or without padding.
///
/// # Arguments
///
/// * `token` - The bearer token string.
///
/// # Returns
///
/// An `Option` containing the decoded `Claims`.
pub fn decode(token: &str) -> Option<Claims> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    if payload.is_empty() {
        return None;
    }

    // Normalize to the URL-safe alphabet and strip padding before decoding.
    let normalized: String = payload
        .chars()
        .filter(|c| *c != '=')
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = general_purpose::URL_SAFE_NO_PAD.decode(normalized).ok()?;

    // sonic-rs handles multi-byte UTF-8 in the raw bytes directly.
    sonic_rs::from_slice::<Claims>(&bytes).ok()
}

/// Returns the token's expiry in epoch milliseconds.
///
/// `None` if the token does not decode or carries no `exp` claim.
pub fn get_expiry(token: &str) -> Option<i64> {
    decode(token)?.exp?.checked_mul(1000)
}
