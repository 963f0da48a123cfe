use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::ingest::Crs;

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
    pub data: DataConfig,
    pub naver: Option<NaverCredentials>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8050".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let data = DataConfig::from_env()?;
        let naver = NaverCredentials::from_env();

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data,
            naver,
        })
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where source datasets live and how the scored tables are produced.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub data_root: PathBuf,
    pub docs_dir: PathBuf,
    pub target_crs: Crs,
    pub top_n: usize,
    pub scoring_config: Option<PathBuf>,
}

impl DataConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let data_root = env::var("GOPCHANG_DATA_ROOT").unwrap_or_else(|_| "data".to_string());
        let docs_dir = env::var("GOPCHANG_DOCS_DIR").unwrap_or_else(|_| "docs".to_string());

        let raw_crs = env::var("GOPCHANG_TARGET_CRS").unwrap_or_else(|_| "5186".to_string());
        let target_crs = raw_crs
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(|code| Crs::from_epsg(code).ok())
            .ok_or(ConfigError::InvalidCrs(raw_crs))?;

        let top_n = env::var("GOPCHANG_TOP_N")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<usize>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ConfigError::InvalidTopN)?;

        let scoring_config = env::var("GOPCHANG_SCORING_CONFIG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            data_root: PathBuf::from(data_root),
            docs_dir: PathBuf::from(docs_dir),
            target_crs,
            top_n,
            scoring_config,
        })
    }
}

/// Naver open API credentials; absent when either variable is unset.
#[derive(Clone)]
pub struct NaverCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl NaverCredentials {
    fn from_env() -> Option<Self> {
        let client_id = env::var("NAVER_CLIENT_ID").ok()?;
        let client_secret = env::var("NAVER_CLIENT_SECRET").ok()?;
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return None;
        }
        Some(Self {
            client_id,
            client_secret,
        })
    }
}

impl fmt::Debug for NaverCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NaverCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCrs(String),
    InvalidTopN,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCrs(value) => write!(
                f,
                "GOPCHANG_TARGET_CRS '{value}' is not a supported EPSG code"
            ),
            ConfigError::InvalidTopN => write!(f, "GOPCHANG_TOP_N must be a positive integer"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort | ConfigError::InvalidCrs(_) | ConfigError::InvalidTopN => {
                None
            }
        }
    }
}
