//! Runtime configuration, read from the environment (a `.env` file is
//! loaded first by `main`).

use crate::agent::DEFAULT_MODEL;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL must be set (or USE_INMEMORY=true)")]
    MissingDatabaseUrl,

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    Postgres { url: String, max_connections: u32 },
    InMemory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub storage: Storage,
    pub port: u16,
    pub ollama_base_url: String,
    pub ollama_model: String,
    /// Allowed CORS origin for the browser client.
    pub frontend_origin: String,
    pub seed_sample_tasks: bool,
}

fn parse_flag(key: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if v.is_empty() => Ok(false),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue { key, value: v }),
        },
    }
}

fn parse_number<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: v }),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`, which returns the raw value
    /// of a variable if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let in_memory = parse_flag("USE_INMEMORY", lookup("USE_INMEMORY"))?;
        let storage = if in_memory {
            Storage::InMemory
        } else {
            let url = lookup("DATABASE_URL")
                .filter(|u| !u.trim().is_empty())
                .ok_or(ConfigError::MissingDatabaseUrl)?;
            let max_connections = parse_number(
                "DB_MAX_CONNECTIONS",
                lookup("DB_MAX_CONNECTIONS"),
                DEFAULT_MAX_CONNECTIONS,
            )?;
            Storage::Postgres { url, max_connections }
        };

        Ok(Self {
            storage,
            port: parse_number("PORT", lookup("PORT"), DEFAULT_PORT)?,
            ollama_base_url: lookup("OLLAMA_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            ollama_model: lookup("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            frontend_origin: lookup("FRONTEND_ORIGIN")
                .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_string()),
            seed_sample_tasks: parse_flag("SEED_SAMPLE_TASKS", lookup("SEED_SAMPLE_TASKS"))?,
        })
    }

    /// In-memory stores start empty, so they are always seeded.
    pub fn should_seed(&self) -> bool {
        self.seed_sample_tasks || self.storage == Storage::InMemory
    }
}
