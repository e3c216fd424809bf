/*
 * Responsibility
 * - Load process-wide settings from the environment (.env supported)
 * - Validate them once at startup (a missing signing secret refuses to boot)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use jsonwebtoken::Algorithm;

use crate::middleware::security_headers::FrameOptions;
use crate::services::auth::policy::Fallback;

// HMAC keys shorter than this are refused.
const MIN_SECRET_BYTES: usize = 32;
// One year.
const MAX_TOKEN_TTL_SECONDS: u64 = 31_536_000;
const MAX_TOKEN_LEEWAY_SECONDS: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Credentials for an account seeded into the user directory at startup.
#[derive(Clone)]
pub struct BootstrapManager {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BootstrapManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapManager")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub jwt_issuer: Option<String>,
    pub access_token_ttl_seconds: u64,
    pub access_token_leeway_seconds: u64,

    pub access_policy_file: Option<PathBuf>,
    pub policy_fallback: Fallback,

    pub frame_options: FrameOptions,
    pub bcrypt_cost: u32,
    pub bootstrap_manager: Option<BootstrapManager>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the signing secret
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("access_token_leeway_seconds", &self.access_token_leeway_seconds)
            .field("access_policy_file", &self.access_policy_file)
            .field("policy_fallback", &self.policy_fallback)
            .field("frame_options", &self.frame_options)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("bootstrap_manager", &self.bootstrap_manager)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 8080,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let jwt_algorithm = match lookup("JWT_ALGORITHM") {
            Some(raw) => parse_hmac_algorithm(&raw).ok_or(ConfigError::Invalid("JWT_ALGORITHM"))?,
            None => Algorithm::HS512,
        };

        let jwt_issuer = lookup("JWT_ISSUER")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let access_token_ttl_seconds = match lookup("ACCESS_TOKEN_TTL_SECONDS") {
            Some(raw) => parse_bounded(&raw, 1, MAX_TOKEN_TTL_SECONDS)
                .ok_or(ConfigError::Invalid("ACCESS_TOKEN_TTL_SECONDS"))?,
            None => 3600,
        };

        let access_token_leeway_seconds = match lookup("ACCESS_TOKEN_LEEWAY_SECONDS") {
            Some(raw) => parse_bounded(&raw, 0, MAX_TOKEN_LEEWAY_SECONDS)
                .ok_or(ConfigError::Invalid("ACCESS_TOKEN_LEEWAY_SECONDS"))?,
            None => 60,
        };

        let access_policy_file = lookup("ACCESS_POLICY_FILE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let policy_fallback = match lookup("POLICY_FALLBACK") {
            Some(raw) => raw
                .parse::<Fallback>()
                .map_err(|_| ConfigError::Invalid("POLICY_FALLBACK"))?,
            None => Fallback::Authenticated,
        };

        let frame_options = match lookup("FRAME_OPTIONS") {
            Some(raw) => raw
                .parse::<FrameOptions>()
                .map_err(|_| ConfigError::Invalid("FRAME_OPTIONS"))?,
            None => FrameOptions::Deny,
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|c| (4..=31).contains(c))
                .ok_or(ConfigError::Invalid("BCRYPT_COST"))?,
            None => bcrypt::DEFAULT_COST,
        };

        let bootstrap_manager = match (
            lookup("BOOTSTRAP_MANAGER_USERNAME"),
            lookup("BOOTSTRAP_MANAGER_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(BootstrapManager { username, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("BOOTSTRAP_MANAGER_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("BOOTSTRAP_MANAGER_USERNAME")),
        };

        Ok(Self {
            addr,
            app_env,
            jwt_secret,
            jwt_algorithm,
            jwt_issuer,
            access_token_ttl_seconds,
            access_token_leeway_seconds,
            access_policy_file,
            policy_fallback,
            frame_options,
            bcrypt_cost,
            bootstrap_manager,
        })
    }
}

fn parse_bounded(raw: &str, min: u64, max: u64) -> Option<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

fn parse_hmac_algorithm(raw: &str) -> Option<Algorithm> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Some(Algorithm::HS256),
        "HS384" => Some(Algorithm::HS384),
        "HS512" => Some(Algorithm::HS512),
        _ => None,
    }
}
