use serde::{Deserialize, Serialize};

use crate::models::user::UserProfile;

/// The durable session record, serialized as a single JSON document.
///
/// `token_expiry` is a cache of `payload.exp * 1000` for the stored token.
/// It exists so readers avoid re-decoding on every check; the authoritative
/// expired/valid decision always re-derives from the token when the cache
/// diverges. `expires_in` is the advisory value echoed from the login
/// response and is for display only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedSession {
    /// The opaque bearer token. Absence means "no session" regardless of
    /// what else is still cached.
    #[serde(default)]
    pub token: Option<String>,
    /// The cached user profile.
    #[serde(default)]
    pub user: Option<UserProfile>,
    /// Cached absolute expiry, milliseconds since epoch.
    #[serde(default, rename = "tokenExpiry")]
    pub token_expiry: Option<i64>,
    /// Advisory expiry duration in seconds, from the login response.
    #[serde(default, rename = "expiresIn")]
    pub expires_in: Option<i64>,
}

/// A read-only snapshot of the session's validity, for UI display.
#[derive(Debug, Clone, Serialize)]
pub struct TokenStatus {
    /// Token present and not yet expired.
    pub valid: bool,
    /// Token absent, undecodable, or past expiry.
    pub expired: bool,
    /// Valid and inside the warning window.
    pub expiring_soon: bool,
    /// Milliseconds until expiry (zero when expired or absent).
    pub remaining_time_ms: i64,
    /// Human-readable remaining time, e.g. "1 hour".
    pub formatted_time: String,
    /// Absolute expiry in epoch milliseconds, if a token is present.
    pub expiry: Option<i64>,
}
