//! Application configuration.

use crate::error::{AppError, AppResult};
use lqbot_gateway::{PasswordGrantConfig, UserCredentials};
use lqbot_mm::LadderConfig;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use zeroize::Zeroizing;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "LQBOT_CONFIG";

/// Config file used when neither `--config` nor `LQBOT_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Token endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// OpenID Connect token endpoint.
    pub token_url: String,
    pub client_id: String,
    /// Environment variable holding the client secret.
    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,
}

fn default_client_secret_env() -> String {
    "LQBOT_CLIENT_SECRET".to_string()
}

/// A user the bots act for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Label referenced by `bots[].user_id`.
    pub id: String,
    pub username: String,
    /// Environment variable holding the password.
    pub password_env: String,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Interval between session summaries in the log (seconds).
    #[serde(default = "default_summary_interval_secs")]
    pub summary_interval_secs: u64,
}

fn default_summary_interval_secs() -> u64 {
    3600
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            summary_interval_secs: default_summary_interval_secs(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the exchange gateway.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Interval between ticks of one bot (ms).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Delay between the start of consecutive bots (ms).
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,

    pub auth: AuthConfig,

    #[serde(default)]
    pub users: Vec<UserConfig>,

    #[serde(default)]
    pub bots: Vec<LadderConfig>,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_server_url() -> String {
    "http://localhost:50053/api/exchange/action".to_string()
}

fn default_tick_interval_ms() -> u64 {
    2000
}

fn default_stagger_ms() -> u64 {
    1000
}

impl AppConfig {
    /// Config path: explicit argument, then `LQBOT_CONFIG`, then the default.
    pub fn resolve_path(explicit: Option<String>) -> String {
        explicit
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load configuration from the resolved path.
    pub fn load(explicit: Option<String>) -> AppResult<Self> {
        let path = Self::resolve_path(explicit);
        if !Path::new(&path).exists() {
            return Err(AppError::Config(format!("Config file not found: {path}")));
        }
        Self::from_file(&path)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Reject configs the bots cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(AppError::Config("tick_interval_ms must be positive".to_string()));
        }

        let mut user_ids = HashSet::new();
        for user in &self.users {
            if !user_ids.insert(user.id.as_str()) {
                return Err(AppError::Config(format!("duplicate user id {}", user.id)));
            }
        }

        let mut slots = HashSet::new();
        for bot in &self.bots {
            bot.validate()?;
            if !user_ids.contains(bot.user_id.as_str()) {
                return Err(AppError::Config(format!(
                    "bot {} references unknown user {}",
                    bot.market(),
                    bot.user_id
                )));
            }
            // Two bots replacing the same user's orders on one market would cancel each other.
            if !slots.insert((bot.user_id.as_str(), bot.market())) {
                return Err(AppError::Config(format!(
                    "more than one bot for user {} on {}",
                    bot.user_id,
                    bot.market()
                )));
            }
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    /// Token endpoint settings with the client secret read from the environment.
    pub fn password_grant_config(&self) -> AppResult<PasswordGrantConfig> {
        Ok(PasswordGrantConfig {
            token_url: self.auth.token_url.clone(),
            client_id: self.auth.client_id.clone(),
            client_secret: read_secret(&self.auth.client_secret_env)?,
        })
    }

    /// Credentials of every configured user, passwords read from the environment.
    pub fn user_credentials(&self) -> AppResult<HashMap<String, UserCredentials>> {
        self.users
            .iter()
            .map(|u| {
                Ok((
                    u.id.clone(),
                    UserCredentials {
                        username: u.username.clone(),
                        password: read_secret(&u.password_env)?,
                    },
                ))
            })
            .collect()
    }

    /// Bot config whose `{user_id}:{market}` name or market matches `selector`.
    pub fn find_bot(&self, selector: &str) -> Option<&LadderConfig> {
        self.bots
            .iter()
            .find(|b| bot_name(b) == selector)
            .or_else(|| self.bots.iter().find(|b| b.market() == selector))
    }
}

/// Display name of a bot, `{user_id}:{market}`.
pub fn bot_name(config: &LadderConfig) -> String {
    format!("{}:{}", config.user_id, config.market())
}

fn read_secret(var_name: &str) -> AppResult<Zeroizing<String>> {
    std::env::var(var_name)
        .map(Zeroizing::new)
        .map_err(|_| AppError::Config(format!("environment variable {var_name} not set")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
        server_url = "http://exchange:50053/api/exchange/action"
        stagger_ms = 500

        [auth]
        token_url = "https://auth.example/realms/exchange/protocol/openid-connect/token"
        client_id = "bots"

        [[users]]
        id = "user1"
        username = "maker-one"
        password_env = "LQBOT_TEST_PW_USER1"

        [[bots]]
        base = "DIF"
        quote = "BTC"
        user_id = "user1"

        [[bots]]
        base = "ETH"
        quote = "USDT"
        user_id = "user1"
        deviation = "1.005"
        tiers_amount = 10
    "#;

    #[test]
    fn test_parse_with_defaults() {
        let config = AppConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.tick_interval_ms, 2000);
        assert_eq!(config.stagger(), Duration::from_millis(500));
        assert_eq!(config.auth.client_secret_env, "LQBOT_CLIENT_SECRET");
        assert_eq!(config.bots.len(), 2);
        assert_eq!(config.bots[0].deviation, dec!(1.002));
        assert_eq!(config.bots[1].deviation, dec!(1.005));
        assert_eq!(config.bots[1].tiers_amount, 10);
        assert_eq!(config.telemetry.summary_interval_secs, 3600);
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_user_rejected() {
        let mut config = AppConfig::parse(SAMPLE).unwrap();
        config.bots[0].user_id = "ghost".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_invalid_ladder_rejected() {
        let mut config = AppConfig::parse(SAMPLE).unwrap();
        config.bots[0].deviation = dec!(1);
        assert!(matches!(config.validate(), Err(AppError::Quote(_))));
    }

    #[test]
    fn test_duplicate_bot_slot_rejected() {
        let mut config = AppConfig::parse(SAMPLE).unwrap();
        let dup = config.bots[0].clone();
        config.bots.push(dup);
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_find_bot() {
        let config = AppConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.find_bot("user1:ETH_USDT").unwrap().base, "ETH");
        assert_eq!(config.find_bot("DIF_BTC").unwrap().base, "DIF");
        assert!(config.find_bot("XYZ_BTC").is_none());
    }

    #[test]
    fn test_missing_secret_env() {
        let mut config = AppConfig::parse(SAMPLE).unwrap();
        config.users[0].password_env = "LQBOT_TEST_PW_DEFINITELY_UNSET".to_string();
        assert!(matches!(config.user_credentials(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_resolve_path_prefers_explicit() {
        assert_eq!(
            AppConfig::resolve_path(Some("custom.toml".to_string())),
            "custom.toml"
        );
    }
}
