use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, SessionError};
use crate::models::user::UserProfile;
use crate::routes;
use crate::session::SessionManager;

/// Request timeout for API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Navigation seam between the interceptor and the embedding shell.
///
/// The 401 handler needs to know where the user currently is and to force
/// a move to the login entry point; how that happens (browser history,
/// TUI screen swap, test recorder) belongs to the shell.
pub trait Navigator: Send + Sync {
    /// The path of the current view.
    fn current_path(&self) -> String;
    /// Forces navigation to `path`.
    fn navigate(&self, path: &str);
}

/// A `Navigator` that goes nowhere, for headless use.
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_path(&self) -> String {
        "/".to_string()
    }

    fn navigate(&self, _path: &str) {}
}

/// The request payload for login.
#[derive(Debug, Serialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// The login response contract from the backend.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<UserProfile>,
    #[serde(default, rename = "expiresIn")]
    expires_in: Option<i64>,
}

/// The HTTP interceptor layer: every outgoing request carries the bearer
/// token when one exists, and every 401 response invalidates the session
/// and forces navigation to login, exactly once per invalidation however
/// many requests were in flight.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionManager,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Creates a new `ApiClient`.
    ///
    /// # Arguments
    ///
    /// * `config` - The client configuration (base URL).
    /// * `session` - The session facade this client reads tokens from and
    ///   invalidates on 401.
    /// * `navigator` - The shell's navigation seam.
    pub fn new(
        config: &Config,
        session: SessionManager,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
            navigator,
        })
    }

    /// Logs in and persists the resulting session.
    ///
    /// A success body missing `token` or `user` is a login failure,
    /// surfaced as "Invalid response from server." A rejected login
    /// surfaces the backend's message; neither touches local state.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        tracing::info!("🔐 Login attempt for {}", email);

        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("❌ Login rejected with status {}: {}", status, text);
            let message = if text.trim().is_empty() {
                format!("Login failed with status {}", status)
            } else {
                text
            };
            return Err(SessionError::Authentication(message));
        }

        let body: LoginResponse = response.json().await?;
        let (Some(token), Some(user)) = (body.token, body.user) else {
            return Err(SessionError::Authentication(
                "Invalid response from server.".to_string(),
            ));
        };

        self.session
            .save_auth_data(token, Some(user.clone()), body.expires_in)?;

        tracing::info!("✅ Login successful for {}", email);
        Ok(user)
    }

    /// Authenticated GET returning JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(self.http.get(self.url(path))).await?;
        Ok(response.json().await?)
    }

    /// Authenticated POST with a JSON body, returning JSON.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.http.post(self.url(path)).json(body))
            .await?;
        Ok(response.json().await?)
    }

    /// Authenticated DELETE, discarding the response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(self.http.delete(self.url(path))).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attaches the bearer token when a session exists.
    fn auth_header(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.get_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends an authenticated request and applies the response-side
    /// interceptor rules.
    ///
    /// Transport errors propagate as `Network` without touching the
    /// session; only the server's explicit 401 invalidates it.
    async fn execute(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = self.auth_header(builder).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
            return Err(SessionError::Unauthorized);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SessionError::Internal(format!(
                "Request failed with status {}: {}",
                status, text
            )));
        }

        Ok(response)
    }

    /// The 401 path: the server's rejection overrides local state even
    /// when the local clock still considers the token valid.
    fn handle_unauthorized(&self) {
        if self.session.invalidate_from_server() {
            let current = self.navigator.current_path();
            if !routes::is_public_route(&current) {
                tracing::warn!("🔒 401 received, redirecting {} to /login", current);
                self.navigator.navigate("/login");
            }
        }
    }
}
