//! Settings for the relay, one sub-module per TOML section.
//!
//! Sources are layered: `config/default.toml`, then `config/{env}.toml`,
//! then `CHAT__SECTION__KEY` environment variables.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod realtime;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::auth::AuthConfig;
use self::database::DatabaseConfig;
use self::logging::LoggingConfig;
use self::realtime::{PresenceMode, RealtimeConfig};

use crate::error::AppError;

/// Placeholder shipped in `default.toml`; refused outside development.
pub const PLACEHOLDER_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub realtime: RealtimeConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Merge every source for `env` and validate the result.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CHAT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate(env)?;
        Ok(config)
    }

    /// Reject settings the relay cannot run with.
    pub fn validate(&self, env: &str) -> Result<(), AppError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }
        if env == "production" && self.auth.jwt_secret == PLACEHOLDER_SECRET {
            return Err(AppError::configuration(
                "auth.jwt_secret still holds the placeholder value",
            ));
        }
        if self.realtime.presence_mode == PresenceMode::Multi
            && self.realtime.max_connections_per_user == 0
        {
            return Err(AppError::configuration(
                "realtime.max_connections_per_user must be at least 1",
            ));
        }
        if self.realtime.channel_buffer_size == 0 {
            return Err(AppError::configuration(
                "realtime.channel_buffer_size must be at least 1",
            ));
        }
        if self.realtime.ping_interval_seconds == 0 {
            return Err(AppError::configuration(
                "realtime.ping_interval_seconds must be at least 1",
            ));
        }
        if self.realtime.max_message_size == 0 {
            return Err(AppError::configuration(
                "realtime.max_message_size must be at least 1",
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::configuration(
                "database.min_connections exceeds database.max_connections",
            ));
        }
        Ok(())
    }
}
