use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::intake::{EligibilityPolicy, PolicyLoadError};

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
    pub catalog: CatalogConfig,
    pub eligibility: EligibilityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&env_or("APP_ENV", "development"));
        let host = env_or("APP_HOST", "127.0.0.1");
        let port = env_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;
        let log_level = env_or("APP_LOG_LEVEL", "info");

        let catalog = CatalogConfig {
            cities: env_or("CATALOG_CITIES_URL", CatalogConfig::DEFAULT_CITIES),
            specialties: env_or("CATALOG_SPECIALTIES_URL", CatalogConfig::DEFAULT_SPECIALTIES),
            doctors: env_or("CATALOG_DOCTORS_URL", CatalogConfig::DEFAULT_DOCTORS),
            timeout_secs: env_or("CATALOG_TIMEOUT_SECS", "10")
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidCatalogTimeout)?,
        };

        let policy_path = env::var("ELIGIBILITY_POLICY_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            catalog,
            eligibility: EligibilityConfig { policy_path },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
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

/// Locations of the reference catalogs. Each entry is an `http(s)` URL or a file path.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub cities: String,
    pub specialties: String,
    pub doctors: String,
    pub timeout_secs: u64,
}

impl CatalogConfig {
    pub const DEFAULT_CITIES: &'static str = "fixtures/cities.json";
    pub const DEFAULT_SPECIALTIES: &'static str = "fixtures/specialties.json";
    pub const DEFAULT_DOCTORS: &'static str = "fixtures/doctors.json";

    /// Catalogs read from `cities.json`, `specialties.json` and `doctors.json` in `dir`.
    pub fn from_dir(dir: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        let dir = dir.into();
        let file = |name: &str| dir.join(name).display().to_string();
        Self {
            cities: file("cities.json"),
            specialties: file("specialties.json"),
            doctors: file("doctors.json"),
            timeout_secs,
        }
    }
}

/// Where the eligibility policy table comes from.
#[derive(Debug, Clone, Default)]
pub struct EligibilityConfig {
    pub policy_path: Option<PathBuf>,
}

impl EligibilityConfig {
    /// The configured policy file, or the built-in table when none is set.
    pub fn policy(&self) -> Result<EligibilityPolicy, PolicyLoadError> {
        match &self.policy_path {
            Some(path) => EligibilityPolicy::from_path(path),
            None => Ok(EligibilityPolicy::default()),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidCatalogTimeout,
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidCatalogTimeout => {
                write!(f, "CATALOG_TIMEOUT_SECS must be a whole number of seconds")
            }
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidCatalogTimeout => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
