use serde::{Deserialize, Serialize};

/// The denormalized user profile cached alongside the token.
///
/// Every field is optional: the profile degrades gracefully when the
/// backend (or a decoded token payload) omits claims. Identity requires at
/// least an id or an email, see `UserProfile::has_identity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's id. Backends emit either `id` or `userId`.
    #[serde(default, alias = "userId")]
    pub id: Option<String>,
    /// The user's display name.
    #[serde(default)]
    pub name: Option<String>,
    /// The user's email.
    #[serde(default)]
    pub email: Option<String>,
    /// The user's role (e.g. "Super Admin", "Lead Qualifier").
    #[serde(default)]
    pub role: Option<String>,
    /// The user's department, used as a role fallback for routing.
    #[serde(default)]
    pub department: Option<String>,
}

impl UserProfile {
    /// Returns `true` if the profile carries a usable identity.
    pub fn has_identity(&self) -> bool {
        self.id.is_some() || self.email.is_some()
    }
}
