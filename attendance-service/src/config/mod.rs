use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

use crate::services::gate::{DEFAULT_MATCH_THRESHOLD, DEFAULT_MAX_TEMPLATES};
use crate::services::lifecycle::{
    SessionPolicy, DEFAULT_SESSION_MINUTES, MAX_ACTIVE_SESSIONS_PER_OWNER, MAX_SESSION_MINUTES,
};

#[derive(Debug, Clone)]
pub struct AttendanceConfig {
    pub common: core_config::Config,
    pub environment: String,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreBackend,
    pub mongodb: MongoConfig,
    pub session: SessionConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub default_duration_minutes: u32,
    pub max_duration_minutes: u32,
    /// 0 disables the cap.
    pub max_active_per_owner: u32,
    /// 0 disables the background sweeper.
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub match_threshold: f64,
    pub max_templates: usize,
    /// Probability that a well-formed activeness challenge passes.
    pub activeness_accept_rate: f64,
}

impl SessionConfig {
    pub fn policy(&self) -> SessionPolicy {
        SessionPolicy {
            default_duration_minutes: self.default_duration_minutes,
            max_duration_minutes: self.max_duration_minutes,
            max_active_per_owner: (self.max_active_per_owner > 0)
                .then_some(self.max_active_per_owner),
        }
    }
}

impl Default for AttendanceConfig {
    /// In-memory configuration for tests and local runs without MongoDB.
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            environment: "dev".to_string(),
            service_name: "attendance-service".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            store: StoreBackend::Memory,
            mongodb: MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "attendance_db".to_string(),
            },
            session: SessionConfig {
                default_duration_minutes: DEFAULT_SESSION_MINUTES,
                max_duration_minutes: MAX_SESSION_MINUTES,
                max_active_per_owner: MAX_ACTIVE_SESSIONS_PER_OWNER,
                sweep_interval_seconds: 0,
            },
            identity: IdentityConfig {
                match_threshold: DEFAULT_MATCH_THRESHOLD,
                max_templates: DEFAULT_MAX_TEMPLATES,
                activeness_accept_rate: 1.0,
            },
        }
    }
}

impl AttendanceConfig {
    pub fn load() -> Result<Self, AppError> {
        // Common config handles .env and the APP__ prefix.
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build from any key lookup; `load` passes the process environment.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string());
        let is_prod = environment == "prod";
        let get = |key: &str, default: Option<&str>| get_env(&lookup, key, default, is_prod);

        let store: StoreBackend = parse("STORE_BACKEND", get("STORE_BACKEND", Some("mongo"))?)?;
        // The URI is only mandatory when MongoDB actually backs the stores.
        let uri_default = match store {
            StoreBackend::Mongo => None,
            StoreBackend::Memory => Some("mongodb://localhost:27017"),
        };

        let config = AttendanceConfig {
            common,
            service_name: get("SERVICE_NAME", Some("attendance-service"))?,
            log_level: get("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),
            store,
            mongodb: MongoConfig {
                uri: get("MONGODB_URI", uri_default)?,
                database: get("MONGODB_DATABASE", Some("attendance_db"))?,
            },
            session: SessionConfig {
                default_duration_minutes: parse(
                    "SESSION_DEFAULT_DURATION_MINUTES",
                    get("SESSION_DEFAULT_DURATION_MINUTES", Some("2"))?,
                )?,
                max_duration_minutes: parse(
                    "SESSION_MAX_DURATION_MINUTES",
                    get("SESSION_MAX_DURATION_MINUTES", Some("120"))?,
                )?,
                max_active_per_owner: parse(
                    "SESSION_MAX_ACTIVE_PER_OWNER",
                    get("SESSION_MAX_ACTIVE_PER_OWNER", Some("5"))?,
                )?,
                sweep_interval_seconds: parse(
                    "SESSION_SWEEP_INTERVAL_SECONDS",
                    get("SESSION_SWEEP_INTERVAL_SECONDS", Some("0"))?,
                )?,
            },
            identity: IdentityConfig {
                match_threshold: parse(
                    "IDENTITY_MATCH_THRESHOLD",
                    get("IDENTITY_MATCH_THRESHOLD", Some("0.85"))?,
                )?,
                max_templates: parse(
                    "IDENTITY_MAX_TEMPLATES",
                    get("IDENTITY_MAX_TEMPLATES", Some("10"))?,
                )?,
                activeness_accept_rate: parse(
                    "ACTIVENESS_ACCEPT_RATE",
                    get("ACTIVENESS_ACCEPT_RATE", Some("1.0"))?,
                )?,
            },
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        let session = &self.session;
        if session.max_duration_minutes == 0 {
            return Err(config_error("SESSION_MAX_DURATION_MINUTES must be at least 1"));
        }
        if session.default_duration_minutes == 0
            || session.default_duration_minutes > session.max_duration_minutes
        {
            return Err(config_error(
                "SESSION_DEFAULT_DURATION_MINUTES must be between 1 and SESSION_MAX_DURATION_MINUTES",
            ));
        }
        if !(0.0..=1.0).contains(&self.identity.match_threshold) {
            return Err(config_error("IDENTITY_MATCH_THRESHOLD must be within [0, 1]"));
        }
        if self.identity.max_templates == 0 {
            return Err(config_error("IDENTITY_MAX_TEMPLATES must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.identity.activeness_accept_rate) {
            return Err(config_error("ACTIVENESS_ACCEPT_RATE must be within [0, 1]"));
        }
        Ok(())
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

fn parse<T>(key: &str, raw: String) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{} is invalid: {}", key, e)))
}

fn config_error(message: &str) -> AppError {
    AppError::ConfigError(anyhow::anyhow!(message.to_string()))
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
