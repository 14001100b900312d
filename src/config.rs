use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_SITE_NAME: &str = "Vijayalakshmi Silks";

/// How a replayed settlement callback for an already-paid order group is
/// handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettlementReplay {
    /// Re-verify, re-write the paid fields, and re-send every notification.
    /// Matches the historically observed behavior.
    Resettle,
    /// Re-verify, then return success without re-committing or re-notifying.
    Skip,
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// JWT secret key used to sign session tokens
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// JWT expiration time in seconds
    pub jwt_expiration: usize,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins; permissive in development
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Storefront name used in notification subjects and sign-offs
    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Public base URL, used for links in admin notifications
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Currency code passed to the payment gateway
    #[serde(default = "default_currency")]
    pub default_currency: String,

    // ========== Payment gateway (Razorpay) ==========
    /// Razorpay key id, exposed to the payment page
    #[serde(default)]
    pub razorpay_key_id: String,

    /// Razorpay key secret, used for API auth and signature verification
    #[serde(default)]
    pub razorpay_key_secret: String,

    /// Replay handling for already-settled order groups: "resettle" or "skip"
    #[serde(default = "default_settlement_replay")]
    #[validate(custom = "validate_settlement_replay")]
    pub settlement_replay: String,

    // ========== Email (SMTP) ==========
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: String,
    #[serde(default)]
    pub smtp_password: String,
    /// From address for outgoing mail; falls back to the SMTP username
    #[serde(default)]
    pub default_from_email: Option<String>,
    /// Destination for admin order notifications; unset disables them
    #[serde(default)]
    pub admin_email: Option<String>,

    // ========== SMS (Twilio) ==========
    /// Master switch for all SMS notifications
    #[serde(default)]
    pub enable_sms: bool,
    #[serde(default)]
    pub twilio_account_sid: Option<String>,
    #[serde(default)]
    pub twilio_auth_token: Option<String>,
    #[serde(default)]
    pub twilio_from_number: Option<String>,
    /// Destination for admin order SMS; unset disables it
    #[serde(default)]
    pub admin_phone: Option<String>,
}

impl AppConfig {
    /// Gets database URL reference
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Creates a new configuration with defaults for the optional fields
    pub fn new(
        database_url: String,
        jwt_secret: String,
        jwt_expiration: usize,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            site_name: default_site_name(),
            site_url: default_site_url(),
            default_currency: default_currency(),
            razorpay_key_id: String::new(),
            razorpay_key_secret: String::new(),
            settlement_replay: default_settlement_replay(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            default_from_email: None,
            admin_email: None,
            enable_sms: false,
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_from_number: None,
            admin_phone: None,
        }
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// From address for outgoing mail
    pub fn from_email(&self) -> &str {
        self.default_from_email
            .as_deref()
            .filter(|addr| !addr.is_empty())
            .unwrap_or(&self.smtp_username)
    }

    /// Parsed replay policy; validation guarantees the string is one of the
    /// accepted values.
    pub fn replay_policy(&self) -> SettlementReplay {
        match self.settlement_replay.to_ascii_lowercase().as_str() {
            "skip" => SettlementReplay::Skip,
            _ => SettlementReplay::Resettle,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    16
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_site_name() -> String {
    DEFAULT_SITE_NAME.to_string()
}

fn default_site_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_settlement_replay() -> String {
    "resettle".to_string()
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn validate_settlement_replay(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "resettle" | "skip" => Ok(()),
        _ => {
            let mut err = ValidationError::new("settlement_replay");
            err.message = Some("Must be one of: resettle, skip".into());
            Err(err)
        }
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("sareeshop_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // NOTE: jwt_secret has no default - it MUST be provided via environment
    // variable or config file.
    let builder = Config::builder()
        .set_default("database_url", "sqlite://sareeshop.db?mode=rwc")?
        .set_default("jwt_expiration", 3600_i64)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        error!("JWT secret is not configured. Set APP__JWT_SECRET with a secure random string.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured. Set APP__JWT_SECRET environment variable."
                .into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "test_secret_key_for_testing_purposes_only_32chars".into(),
            3600,
            "127.0.0.1".into(),
            8080,
            "test".into(),
        )
    }

    #[test]
    fn replay_policy_defaults_to_resettle() {
        let cfg = base_config();
        assert_eq!(cfg.replay_policy(), SettlementReplay::Resettle);
    }

    #[test]
    fn replay_policy_parses_skip() {
        let mut cfg = base_config();
        cfg.settlement_replay = "skip".into();
        assert_eq!(cfg.replay_policy(), SettlementReplay::Skip);
    }

    #[test]
    fn settlement_replay_rejects_unknown_values() {
        assert!(validate_settlement_replay("resettle").is_ok());
        assert!(validate_settlement_replay("skip").is_ok());
        assert!(validate_settlement_replay("retry").is_err());
    }

    #[test]
    fn from_email_falls_back_to_smtp_username() {
        let mut cfg = base_config();
        cfg.smtp_username = "orders@example.com".into();
        assert_eq!(cfg.from_email(), "orders@example.com");

        cfg.default_from_email = Some("noreply@example.com".into());
        assert_eq!(cfg.from_email(), "noreply@example.com");
    }

    #[test]
    fn jwt_secret_length_is_validated() {
        let mut cfg = base_config();
        cfg.jwt_secret = "short".into();
        assert!(cfg.validate().is_err());
    }
}
