//! REST client for the console's auth endpoints
//!
//! Three operations the session core depends on, plus the startup profile
//! fetch: login, refresh-token, logout, profile. The client only talks to
//! the wire; persisting the resulting tokens is the caller's job (the
//! coordinator invokes the credential store after a successful login or
//! renewal).
//!
//! Status-code classification:
//! - login/profile 401/403 -> `AuthRejected` (credentials invalid, stay out)
//! - refresh 401/403 -> `RefreshRejected` (terminal for the session)
//! - other non-2xx -> `Api`, transport failures -> `Http`
//!
//! Neither login nor refresh is retried here. Login is not safe to
//! auto-retry, and the coordinator treats any refresh failure as terminal.

use common::Secret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{LOGIN_PATH, LOGOUT_PATH, PROFILE_PATH, REFRESH_PATH};
use crate::error::{Error, Result};

/// Login payload. Field names follow the backend's wire format.
///
/// `PASSWORD` carries the already-masked password: the console applies its
/// masking step before the credential ever reaches this client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "UPPERCASE")]
struct LoginPayload<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

/// The backend wraps request data in a message envelope.
#[derive(Debug, Serialize)]
struct Envelope<T> {
    message: String,
    data: Vec<T>,
}

/// Response from a successful login.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

/// The authenticated user's display data and permissions.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// A single permission entry, optionally scoped to a console route.
#[derive(Debug, Clone, Deserialize)]
pub struct Permission {
    pub permission: String,
    pub url: Option<String>,
}

/// Response from a successful token refresh.
#[derive(Debug, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
struct RefreshPayload<'a> {
    refresh_token: &'a str,
}

/// Client for the auth endpoints of the console backend.
#[derive(Debug, Clone)]
pub struct SessionClient {
    http: reqwest::Client,
    base_url: String,
}

impl SessionClient {
    /// Create a client against the given backend base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authenticate with username/email and a pre-masked password.
    ///
    /// 401/403 means the credentials were rejected; anything else that
    /// fails is a transport or server problem. Neither is retried.
    pub async fn login(
        &self,
        username: &str,
        email: &str,
        password: &Secret<String>,
    ) -> Result<LoginResponse> {
        let body = Envelope {
            message: String::new(),
            data: vec![LoginPayload {
                username,
                email,
                password: password.expose(),
            }],
        };

        let response = self
            .http
            .post(self.url(LOGIN_PATH))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("login request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(Error::AuthRejected(format!(
                    "login rejected ({status}): {body}"
                )));
            }
            return Err(Error::Api(format!("login returned {status}: {body}")));
        }

        response
            .json::<LoginResponse>()
            .await
            .map_err(|e| Error::Parse(format!("invalid login response: {e}")))
    }

    /// Fetch the current user's profile using the bearer token.
    ///
    /// Used at startup to validate a persisted token. A 401-class response
    /// means the credential is no longer valid.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile> {
        let response = self
            .http
            .post(self.url(PROFILE_PATH))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::Http(format!("profile request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(Error::AuthRejected(format!(
                    "profile rejected ({status}): {body}"
                )));
            }
            return Err(Error::Api(format!("profile returned {status}: {body}")));
        }

        response
            .json::<UserProfile>()
            .await
            .map_err(|e| Error::Parse(format!("invalid profile response: {e}")))
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// 401/403 means the refresh token itself is invalid or expired, which
    /// is terminal for the session.
    pub async fn renew(&self, refresh_token: &Secret<String>) -> Result<TokenPair> {
        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&RefreshPayload {
                refresh_token: refresh_token.expose(),
            })
            .send()
            .await
            .map_err(|e| Error::Http(format!("refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(Error::RefreshRejected(format!(
                    "refresh token rejected ({status}): {body}"
                )));
            }
            return Err(Error::Api(format!("refresh returned {status}: {body}")));
        }

        response
            .json::<TokenPair>()
            .await
            .map_err(|e| Error::Parse(format!("invalid refresh response: {e}")))
    }

    /// Best-effort server-side logout.
    ///
    /// Failures are logged and swallowed: a dead network must never block
    /// the local credential clear.
    pub async fn logout(&self, access_token: Option<&str>) {
        let mut request = self.http.post(self.url(LOGOUT_PATH));
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                debug!("server-side logout completed");
            }
            Ok(response) => {
                debug!(status = %response.status(), "server-side logout returned non-success");
            }
            Err(e) => {
                debug!(error = %e, "server-side logout failed");
            }
        }
    }
}
