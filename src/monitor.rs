use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::events::{EventBus, SessionEvent};
use crate::session::format_remaining_time;
use crate::store::SessionStore;
use crate::token;

/// Notice published when the session dies.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// The recurring session expiry check.
///
/// Two states: stopped (no task) and running (one task). `start` is
/// stop-before-start so two calls never leave two timers behind. Each tick
/// re-reads the store rather than trusting a captured copy, so a
/// concurrent login or logout is always observed.
#[derive(Clone)]
pub struct ExpiryMonitor {
    store: SessionStore,
    events: EventBus,
    check_interval: Duration,
    warning_threshold: Duration,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
    warned: Arc<AtomicBool>,
}

impl ExpiryMonitor {
    /// Creates a new `ExpiryMonitor` over the given store and bus.
    pub fn new(
        store: SessionStore,
        events: EventBus,
        check_interval: Duration,
        warning_threshold: Duration,
    ) -> Self {
        Self {
            store,
            events,
            check_interval,
            warning_threshold,
            task: Arc::new(Mutex::new(None)),
            warned: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts the recurring check. No-op when no token exists; an already
    /// running monitor is restarted, never doubled.
    pub fn start(&self) {
        let Ok(mut slot) = self.task.lock() else {
            return;
        };

        if let Some(previous) = slot.take() {
            previous.abort();
            tracing::debug!("🔁 Expiry monitor restarted");
        }

        if self.store.token().is_none() {
            tracing::debug!("Expiry monitor not started: no token present");
            return;
        }

        let store = self.store.clone();
        let events = self.events.clone();
        let warned = Arc::clone(&self.warned);
        let warning_ms = self.warning_threshold.as_millis() as i64;
        let check_interval = self.check_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(check_interval);
            loop {
                interval.tick().await;
                if !tick(&store, &events, warning_ms, &warned) {
                    break;
                }
            }
        });

        *slot = Some(handle);
        tracing::info!("✅ Expiry monitor started (interval: {:?})", check_interval);
    }

    /// Stops the recurring check. Safe to call when already stopped.
    pub fn stop(&self) {
        let Ok(mut slot) = self.task.lock() else {
            return;
        };
        if let Some(handle) = slot.take() {
            handle.abort();
            tracing::info!("🛑 Expiry monitor stopped");
        }
    }

    /// The expiring-soon window in milliseconds.
    pub fn warning_threshold_ms(&self) -> i64 {
        self.warning_threshold.as_millis() as i64
    }

    /// Re-arms the expiring-soon latch. Called when a new session replaces
    /// the old one; a mere monitor restart keeps the latch, so re-entering
    /// an authenticated area never repeats the warning for the same
    /// session.
    pub(crate) fn reset_warning(&self) {
        self.warned.store(false, Ordering::SeqCst);
    }

    /// Returns `true` while the recurring check is live.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

/// One monitor tick. Returns `false` when the session is gone and the
/// loop should terminate.
///
/// Fails closed: a missing token, an undecodable token, and a past `exp`
/// all take the expired path. The expiring-soon event fires once per entry
/// into the warning window; steady-state ticks are silent.
fn tick(store: &SessionStore, events: &EventBus, warning_ms: i64, warned: &AtomicBool) -> bool {
    let Some(token) = store.token() else {
        expire(store, events);
        return false;
    };

    let Some(expiry) = token::get_expiry(&token) else {
        tracing::warn!("❌ Stored token does not decode, treating as expired");
        expire(store, events);
        return false;
    };

    let now = chrono::Utc::now().timestamp_millis();
    let remaining = expiry - now;

    if remaining <= 0 {
        expire(store, events);
        return false;
    }

    if remaining <= warning_ms {
        if !warned.swap(true, Ordering::SeqCst) {
            let formatted = format_remaining_time(remaining);
            tracing::warn!("⏳ Session expiring soon: {}", formatted);
            events.emit(SessionEvent::ExpiringSoon {
                remaining_time_ms: remaining,
                formatted_time: formatted,
            });
        }
    } else {
        warned.store(false, Ordering::SeqCst);
    }

    true
}

/// Clears the session and publishes `Expired`, but only when this call is
/// the one that actually removed a token. A tick racing an explicit
/// logout or a 401 handler finds the latch already spent and stays silent.
fn expire(store: &SessionStore, events: &EventBus) {
    if store.clear() {
        tracing::warn!("⏰ Session expired");
        events.emit(SessionEvent::Expired {
            message: SESSION_EXPIRED_MESSAGE.to_string(),
        });
    }
}
