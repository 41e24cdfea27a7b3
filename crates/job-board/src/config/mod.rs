use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::board::integrity::DEFAULT_CACHE_ATTEMPTS;
use crate::board::query::DEFAULT_PAGE_SIZE;
use crate::board::token::TokenAuthority;
use crate::board::workflow::TransitionPolicy;

const DEV_JWT_SECRET: &str = "job-board-development-secret";
const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;
const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub board: BoardConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingSecret)
            }
            _ => DEV_JWT_SECRET.to_string(),
        };
        let token_ttl_days = parse_number("JWT_TTL_DAYS", DEFAULT_TOKEN_TTL_DAYS)?;
        if token_ttl_days < 1 {
            return Err(ConfigError::InvalidNumber { key: "JWT_TTL_DAYS" });
        }

        let bootstrap_admins = env::var("APP_BOOTSTRAP_ADMINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let board = BoardConfig {
            strict_status_transitions: parse_flag("APP_STRICT_STATUS_TRANSITIONS", false)?,
            cache_update_attempts: parse_number(
                "APP_CACHE_UPDATE_ATTEMPTS",
                DEFAULT_CACHE_ATTEMPTS,
            )?
            .max(1),
            max_page_size: parse_number("APP_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)?
                .max(DEFAULT_PAGE_SIZE),
            bootstrap_admins,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth: AuthConfig {
                jwt_secret,
                token_ttl_days,
            },
            board,
        })
    }
}

fn parse_number<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        _ => Ok(default),
    }
}

fn parse_flag(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidFlag { key }),
        },
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Bearer token signing settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

impl AuthConfig {
    pub fn authority(&self) -> TokenAuthority {
        TokenAuthority::new(
            self.jwt_secret.clone(),
            chrono::Duration::days(self.token_ttl_days),
        )
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_days", &self.token_ttl_days)
            .finish()
    }
}

/// Behavior switches for the board itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub strict_status_transitions: bool,
    pub cache_update_attempts: u8,
    pub max_page_size: u32,
    /// External identity ids promoted to `admin` when first synced.
    pub bootstrap_admins: Vec<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            strict_status_transitions: false,
            cache_update_attempts: DEFAULT_CACHE_ATTEMPTS,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            bootstrap_admins: Vec::new(),
        }
    }
}

impl BoardConfig {
    pub fn transition_policy(&self) -> TransitionPolicy {
        if self.strict_status_transitions {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Permissive
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingSecret,
    InvalidNumber { key: &'static str },
    InvalidFlag { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingSecret => {
                write!(f, "JWT_SECRET must be set when APP_ENV is production")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a positive integer")
            }
            ConfigError::InvalidFlag { key } => write!(f, "{key} must be true or false"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
