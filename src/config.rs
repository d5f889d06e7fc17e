use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::intake::IntakePolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DATABASE_URL must be set when FILE_STORE=postgres")]
    MissingDatabaseUrl,
    #[error("invalid value `{value}` for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("MAX_UPLOAD_BYTES must be greater than zero")]
    ZeroUploadLimit,
    #[error("PERMITTED_EXTENSIONS must name at least one extension")]
    NoPermittedExtensions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreKind::Postgres),
            "memory" | "mem" => Ok(StoreKind::Memory),
            _ => Err(ConfigError::InvalidValue {
                key: "FILE_STORE",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub policy: IntakePolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".to_string());

        let store = match lookup("FILE_STORE") {
            Some(kind) => kind.parse()?,
            None => StoreKind::Postgres,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if store == StoreKind::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        let max_size_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                key: "MAX_UPLOAD_BYTES",
                value: raw.clone(),
            })?,
            None => IntakePolicy::DEFAULT_MAX_SIZE_BYTES,
        };
        if max_size_bytes == 0 {
            return Err(ConfigError::ZeroUploadLimit);
        }

        let policy = match lookup("PERMITTED_EXTENSIONS") {
            Some(raw) => IntakePolicy::new(max_size_bytes, raw.split(',')),
            None => IntakePolicy::new(max_size_bytes, IntakePolicy::DEFAULT_EXTENSIONS),
        };
        if policy.permitted_extensions().is_empty() {
            return Err(ConfigError::NoPermittedExtensions);
        }

        Ok(AppConfig {
            bind_address,
            store,
            database_url,
            policy,
        })
    }
}
