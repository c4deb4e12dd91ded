//! Client-side session and token lifecycle for the lead-pipeline CRM.
//!
//! The embedding shell constructs one [`SessionManager`] and one
//! [`ApiClient`] at startup and injects them into its views. The manager
//! owns durable session storage, the recurring expiry monitor, and the
//! lifecycle event bus; the client attaches the bearer token to every
//! request and turns a server 401 into an immediate local invalidation
//! plus a forced move to the login entry point.
//!
//! Token payloads are decoded WITHOUT signature verification. That read is
//! optimistic, for display and proactive UX only (name, role, expiry
//! countdown); authorization is decided solely by the backend accepting or
//! rejecting each request.

pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod monitor;
pub mod routes;
pub mod session;
pub mod store;
pub mod token;

pub mod models {
    pub mod session;
    pub mod user;
}

pub use config::Config;
pub use error::{Result, SessionError};
pub use events::SessionEvent;
pub use http::{ApiClient, Navigator, NoopNavigator};
pub use models::session::TokenStatus;
pub use models::user::UserProfile;
pub use session::{SessionManager, format_remaining_time};
