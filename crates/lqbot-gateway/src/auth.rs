//! Bearer token acquisition.
//!
//! The gateway only consumes tokens. [`PasswordGrantAuth`] fetches them from an
//! OpenID Connect token endpoint with the resource-owner password grant and
//! caches each one until shortly before it expires. [`StaticTokens`] serves
//! fixed tokens for tests and pre-issued credentials.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::BoxFuture;

/// Refresh this long before the reported expiry.
const EXPIRY_SKEW_SECS: i64 = 30;

/// Used when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 300;

const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Supplies bearer tokens per configured user.
pub trait TokenProvider: Send + Sync {
    /// A valid access token for `user_id` (without the `Bearer ` prefix).
    fn bearer_token<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, GatewayResult<Zeroizing<String>>>;

    /// Drop any cached token for `user_id` so the next call re-authenticates.
    fn invalidate(&self, user_id: &str);
}

/// Fixed tokens keyed by user.
#[derive(Default)]
pub struct StaticTokens {
    tokens: HashMap<String, Zeroizing<String>>,
}

impl StaticTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, user_id: impl Into<String>, token: impl Into<String>) -> Self {
        self.tokens.insert(user_id.into(), Zeroizing::new(token.into()));
        self
    }
}

impl TokenProvider for StaticTokens {
    fn bearer_token<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, GatewayResult<Zeroizing<String>>> {
        let result = self.tokens.get(user_id).cloned().ok_or_else(|| {
            GatewayError::Unauthenticated(format!("no token configured for user {user_id}"))
        });
        Box::pin(async move { result })
    }

    fn invalidate(&self, _user_id: &str) {}
}

/// Login of one configured user.
pub struct UserCredentials {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Token endpoint and client registration.
pub struct PasswordGrantConfig {
    /// Full URL of the OpenID Connect token endpoint.
    pub token_url: String,
    pub client_id: String,
    pub client_secret: Zeroizing<String>,
}

impl std::fmt::Debug for PasswordGrantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordGrantConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

struct CachedToken {
    token: Zeroizing<String>,
    refresh_at: DateTime<Utc>,
}

/// Password-grant token provider with a per-user cache.
pub struct PasswordGrantAuth {
    client: Client,
    config: PasswordGrantConfig,
    users: HashMap<String, UserCredentials>,
    cache: Mutex<HashMap<String, CachedToken>>,
}

impl PasswordGrantAuth {
    pub fn new(
        config: PasswordGrantConfig,
        users: HashMap<String, UserCredentials>,
    ) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(TOKEN_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            users,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn cached(&self, user_id: &str, now: DateTime<Utc>) -> Option<Zeroizing<String>> {
        self.cache
            .lock()
            .get(user_id)
            .filter(|c| now < c.refresh_at)
            .map(|c| c.token.clone())
    }

    async fn fetch(&self, user_id: &str) -> GatewayResult<Zeroizing<String>> {
        let creds = self.users.get(user_id).ok_or_else(|| {
            GatewayError::Unauthenticated(format!("no credentials configured for user {user_id}"))
        })?;

        let form = [
            ("grant_type", "password"),
            ("scope", "openid"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("username", creds.username.as_str()),
            ("password", creds.password.as_str()),
        ];

        debug!(user_id, url = %self.config.token_url, "Requesting access token");

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("token request failed: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            warn!(user_id, %status, "Token endpoint rejected credentials");
            return Err(GatewayError::Unauthenticated(format!(
                "token endpoint returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(GatewayError::Unavailable(format!(
                "token endpoint returned {status}"
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(format!("token response: {e}")))?;

        let token = Zeroizing::new(body.access_token);
        let refresh_at = refresh_deadline(Utc::now(), body.expires_in);
        self.cache.lock().insert(
            user_id.to_string(),
            CachedToken {
                token: token.clone(),
                refresh_at,
            },
        );

        info!(user_id, %refresh_at, "Access token acquired");
        Ok(token)
    }
}

impl TokenProvider for PasswordGrantAuth {
    fn bearer_token<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, GatewayResult<Zeroizing<String>>> {
        Box::pin(async move {
            if let Some(token) = self.cached(user_id, Utc::now()) {
                return Ok(token);
            }
            self.fetch(user_id).await
        })
    }

    fn invalidate(&self, user_id: &str) {
        if self.cache.lock().remove(user_id).is_some() {
            debug!(user_id, "Cached access token invalidated");
        }
    }
}

/// When a token issued at `now` should be replaced.
fn refresh_deadline(now: DateTime<Utc>, expires_in: Option<i64>) -> DateTime<Utc> {
    let lifetime = expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
    let usable = (lifetime - EXPIRY_SKEW_SECS).max(0);
    now + ChronoDuration::seconds(usable)
}
