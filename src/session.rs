use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::error::Result;
use crate::events::{EventBus, SessionEvent};
use crate::models::session::{PersistedSession, TokenStatus};
use crate::models::user::UserProfile;
use crate::monitor::{ExpiryMonitor, SESSION_EXPIRED_MESSAGE};
use crate::routes;
use crate::store::SessionStore;
use crate::token;

/// The session facade: the single API the rest of the application uses to
/// read and write session state, control monitoring, and query status.
///
/// Constructed once at startup and cloned into consumers ("one session per
/// running app" as an explicit service object, not a hidden global).
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: SessionStore,
    events: EventBus,
    monitor: ExpiryMonitor,
}

impl SessionManager {
    /// Creates a new `SessionManager` from configuration.
    pub fn new(config: &Config) -> Self {
        let store = SessionStore::open(config.session_file.clone());
        let events = EventBus::new();
        let monitor = ExpiryMonitor::new(
            store.clone(),
            events.clone(),
            config.check_interval,
            config.warning_threshold,
        );

        Self {
            inner: Arc::new(Inner {
                store,
                events,
                monitor,
            }),
        }
    }

    /// Persists a fresh session and starts the expiry monitor.
    ///
    /// # Arguments
    ///
    /// * `token` - The bearer token issued by the backend.
    /// * `user` - The profile from the login response.
    /// * `expires_in` - Advisory expiry duration in seconds.
    pub fn save_auth_data(
        &self,
        token: String,
        user: Option<UserProfile>,
        expires_in: Option<i64>,
    ) -> Result<()> {
        self.inner.store.save(token, user, expires_in)?;
        self.inner.monitor.reset_warning();
        self.inner.monitor.start();

        if let Some(user) = self.get_user() {
            self.inner.events.emit(SessionEvent::LoginSuccess { user });
        }

        tracing::info!("✅ Auth data saved, expiry monitoring active");
        Ok(())
    }

    /// Returns the current bearer token, if any.
    pub fn get_token(&self) -> Option<String> {
        self.inner.store.token()
    }

    /// Returns the current user profile.
    ///
    /// Prefers the cached profile; falls back to the token's identity
    /// claims. `None` when neither source yields a usable identity.
    pub fn get_user(&self) -> Option<UserProfile> {
        let session = self.inner.store.load();

        if let Some(user) = session.user {
            if user.has_identity() {
                return Some(user);
            }
        }

        let claims = token::decode(session.token.as_deref()?)?;
        let profile = claims.to_profile();
        profile.has_identity().then_some(profile)
    }

    /// Returns `true` while a token is present and not yet expired.
    ///
    /// Usable as a guard before any protected action; agrees with the
    /// monitor on the same validity rule.
    pub fn is_current_token_valid(&self) -> bool {
        let session = self.inner.store.load();
        match effective_expiry(&session) {
            Some(expiry) => chrono::Utc::now().timestamp_millis() < expiry,
            None => false,
        }
    }

    /// Returns `true` while the session is valid but inside the warning
    /// window.
    pub fn is_expiring_soon(&self) -> bool {
        let session = self.inner.store.load();
        let Some(expiry) = effective_expiry(&session) else {
            return false;
        };
        let remaining = expiry - chrono::Utc::now().timestamp_millis();
        remaining > 0 && remaining <= self.inner.monitor_warning_ms()
    }

    /// Wipes all stored session fields and stops the monitor. Idempotent.
    pub fn clear_auth_data(&self) {
        self.inner.monitor.stop();
        self.inner.store.clear();
    }

    /// Server-side invalidation (a 401 response): clear, stop monitoring,
    /// publish `Expired`.
    ///
    /// Returns `true` only for the call that actually removed a token, so
    /// overlapping 401s from in-flight requests act exactly once.
    pub fn invalidate_from_server(&self) -> bool {
        self.inner.monitor.stop();
        let had_session = self.inner.store.clear();
        if had_session {
            tracing::warn!("❌ Session invalidated by server (401)");
            self.inner.events.emit(SessionEvent::Expired {
                message: SESSION_EXPIRED_MESSAGE.to_string(),
            });
        }
        had_session
    }

    /// Returns a read-only validity snapshot for UI display.
    ///
    /// Querying status never mutates state or touches timers.
    pub fn get_token_status(&self) -> TokenStatus {
        let session = self.inner.store.load();
        let expiry = effective_expiry(&session);
        let now = chrono::Utc::now().timestamp_millis();

        let (valid, remaining) = match expiry {
            Some(expiry) if now < expiry => (true, expiry - now),
            _ => (false, 0),
        };

        TokenStatus {
            valid,
            expired: !valid,
            expiring_soon: valid && remaining <= self.inner.monitor_warning_ms(),
            remaining_time_ms: remaining,
            formatted_time: format_remaining_time(remaining),
            expiry,
        }
    }

    /// Subscribes to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Route hook: entering an authenticated area (re)starts monitoring
    /// when a valid token exists.
    pub fn enter_authenticated_area(&self) {
        if self.is_current_token_valid() {
            self.inner.monitor.start();
        }
    }

    /// Route hook: public routes do not poll the session.
    pub fn enter_public_route(&self) {
        self.inner.monitor.stop();
    }

    /// Returns `true` while the expiry monitor is live.
    pub fn is_monitor_running(&self) -> bool {
        self.inner.monitor.is_running()
    }

    /// Resolves the current user's dashboard base path through the role
    /// table, falling back from role to department.
    pub fn dashboard_path(&self) -> &'static str {
        let Some(user) = self.get_user() else {
            return routes::DEFAULT_DASHBOARD;
        };
        let identifier = user.role.or(user.department).unwrap_or_default();
        routes::resolve_dashboard_path(&identifier)
    }
}

impl Inner {
    fn monitor_warning_ms(&self) -> i64 {
        self.monitor.warning_threshold_ms()
    }
}

/// Authoritative expiry for a session snapshot.
///
/// The cached `tokenExpiry` exists for fast comparison, but the token's
/// own `exp` claim wins whenever the two diverge; an undecodable token
/// yields `None` (fail closed).
fn effective_expiry(session: &PersistedSession) -> Option<i64> {
    let token = session.token.as_deref()?;
    let derived = token::get_expiry(token)?;
    if session.token_expiry != Some(derived) {
        tracing::debug!(
            "Stale cached expiry ({:?}) overridden by token exp ({})",
            session.token_expiry,
            derived
        );
    }
    Some(derived)
}

/// Formats a remaining duration for display.
///
/// Pure: "Expired" for zero or negative, otherwise the single largest
/// applicable unit among days, hours, and minutes, pluralized; under one
/// minute reads "Less than 1 minute".
pub fn format_remaining_time(ms: i64) -> String {
    if ms <= 0 {
        return "Expired".to_string();
    }

    let days = ms / 86_400_000;
    let hours = ms / 3_600_000;
    let minutes = ms / 60_000;

    if days >= 1 {
        format!("{} day{}", days, if days == 1 { "" } else { "s" })
    } else if hours >= 1 {
        format!("{} hour{}", hours, if hours == 1 { "" } else { "s" })
    } else if minutes >= 1 {
        format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    } else {
        "Less than 1 minute".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose};

    fn make_token(payload_json: &str) -> String {
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(payload_json);
        format!("h.{}.s", payload)
    }

    fn token_with_exp(exp_secs: i64) -> String {
        make_token(&format!(r#"{{"exp":{},"id":"u-1","name":"Ada"}}"#, exp_secs))
    }

    fn manager() -> (tempfile::TempDir, SessionManager) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new("http://localhost:0", dir.path().join("session.json"));
        let manager = SessionManager::new(&config);
        (dir, manager)
    }

    #[test]
    fn test_format_remaining_time_fixed_points() {
        assert_eq!(format_remaining_time(0), "Expired");
        assert_eq!(format_remaining_time(-5000), "Expired");
        assert_eq!(format_remaining_time(90_000), "1 minute");
        assert_eq!(format_remaining_time(3_600_000), "1 hour");
        assert_eq!(format_remaining_time(86_400_000), "1 day");
    }

    #[test]
    fn test_format_remaining_time_plurals_and_floor() {
        assert_eq!(format_remaining_time(59_999), "Less than 1 minute");
        assert_eq!(format_remaining_time(120_000), "2 minutes");
        assert_eq!(format_remaining_time(7_200_000), "2 hours");
        assert_eq!(format_remaining_time(172_800_000), "2 days");
        // Largest unit only: 25h is "1 day", not "1 day 1 hour".
        assert_eq!(format_remaining_time(90_000_000), "1 day");
    }

    #[tokio::test]
    async fn test_past_exp_is_invalid_immediately_after_save() {
        let (_dir, manager) = manager();
        let past = chrono::Utc::now().timestamp() - 60;
        manager
            .save_auth_data(token_with_exp(past), None, None)
            .unwrap();

        assert!(!manager.is_current_token_valid());
        let status = manager.get_token_status();
        assert!(status.expired);
        assert_eq!(status.formatted_time, "Expired");
    }

    #[tokio::test]
    async fn test_far_future_exp_is_valid_not_expiring() {
        let (_dir, manager) = manager();
        let future = chrono::Utc::now().timestamp() + 24 * 3600;
        manager
            .save_auth_data(token_with_exp(future), None, Some(86_400))
            .unwrap();

        assert!(manager.is_current_token_valid());
        assert!(!manager.is_expiring_soon());

        let status = manager.get_token_status();
        assert!(status.valid && !status.expired && !status.expiring_soon);
        assert!(status.remaining_time_ms > 23 * 3_600_000);
    }

    #[tokio::test]
    async fn test_exp_within_window_is_valid_and_expiring_soon() {
        let (_dir, manager) = manager();
        let soon = chrono::Utc::now().timestamp() + 120;
        manager
            .save_auth_data(token_with_exp(soon), None, None)
            .unwrap();

        assert!(manager.is_current_token_valid());
        assert!(manager.is_expiring_soon());
    }

    #[tokio::test]
    async fn test_clear_auth_data_is_idempotent() {
        let (_dir, manager) = manager();
        let future = chrono::Utc::now().timestamp() + 3600;
        manager
            .save_auth_data(token_with_exp(future), None, None)
            .unwrap();

        manager.clear_auth_data();
        assert!(manager.get_token().is_none());
        assert!(!manager.is_current_token_valid());
        assert!(!manager.is_monitor_running());

        // Second clear is a no-op.
        manager.clear_auth_data();
        assert!(manager.get_token().is_none());
    }

    #[tokio::test]
    async fn test_get_user_prefers_cache_then_claims() {
        let (_dir, manager) = manager();
        let future = chrono::Utc::now().timestamp() + 3600;

        let cached = UserProfile {
            id: Some("u-7".to_string()),
            name: Some("Cached Name".to_string()),
            email: None,
            role: Some("Manager".to_string()),
            department: None,
        };
        manager
            .save_auth_data(token_with_exp(future), Some(cached.clone()), None)
            .unwrap();
        assert_eq!(manager.get_user(), Some(cached));

        // Without a cached profile the claims win.
        manager
            .save_auth_data(token_with_exp(future), None, None)
            .unwrap();
        let user = manager.get_user().unwrap();
        assert_eq!(user.id.as_deref(), Some("u-1"));
        assert_eq!(user.name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_get_user_none_without_identity() {
        let (_dir, manager) = manager();
        let future = chrono::Utc::now().timestamp() + 3600;
        // Claims carry an exp but no id/email.
        let token = make_token(&format!(r#"{{"exp":{}}}"#, future));
        manager.save_auth_data(token, None, None).unwrap();

        assert!(manager.get_user().is_none());
    }

    #[tokio::test]
    async fn test_status_query_does_not_start_monitor() {
        let (_dir, manager) = manager();
        let future = chrono::Utc::now().timestamp() + 3600;
        manager
            .save_auth_data(token_with_exp(future), None, None)
            .unwrap();
        manager.enter_public_route();
        assert!(!manager.is_monitor_running());

        let _ = manager.get_token_status();
        let _ = manager.is_current_token_valid();
        assert!(!manager.is_monitor_running());
    }

    #[tokio::test]
    async fn test_stale_cached_expiry_is_overridden_by_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let past = chrono::Utc::now().timestamp() - 60;

        // Hand-write a session document whose cached tokenExpiry claims the
        // session is alive while the token's own exp is in the past.
        let stale_expiry = (chrono::Utc::now().timestamp() + 3600) * 1000;
        let doc = format!(
            r#"{{"token":"{}","user":null,"tokenExpiry":{},"expiresIn":3600}}"#,
            token_with_exp(past),
            stale_expiry
        );
        std::fs::write(&path, doc).unwrap();

        let config = Config::new("http://localhost:0", &path);
        let manager = SessionManager::new(&config);
        assert!(!manager.is_current_token_valid());
        assert!(manager.get_token_status().expired);
    }

    #[tokio::test]
    async fn test_dashboard_path_from_role_claim() {
        let (_dir, manager) = manager();
        let future = chrono::Utc::now().timestamp() + 3600;
        let token = make_token(&format!(
            r#"{{"exp":{},"id":"u-2","role":"Data Miner"}}"#,
            future
        ));
        manager.save_auth_data(token, None, None).unwrap();

        assert_eq!(manager.dashboard_path(), "/data-miner");
    }
}
