use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

const DEV_CORS_ORIGINS: &[&str] = &[
    "http://localhost:19006", // Expo web
    "http://localhost:3000",  // React dev server
    "http://localhost:8081",  // Metro bundler
];

const DEFAULT_DEPLOYMENT: &str = "gpt-4o";
const DEFAULT_API_VERSION: &str = "2024-12-01-preview";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is not a valid value: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("AZURE_POSTGRESQL_CONNECTIONSTRING is malformed: {0}")]
    MalformedConnectionString(String),
}

/// Endpoint and credentials for the chat-completions deployment.
///
/// Passed through to the model client unvalidated: a missing key or endpoint
/// only shows up when the first request reaches the model.
#[derive(Clone, Default)]
pub struct ModelBinding {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub deployment: String,
    pub api_version: String,
}

impl fmt::Debug for ModelBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBinding")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    pub model: ModelBinding,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 3000,
        };

        let cors_origins = if var("RUNNING_IN_PRODUCTION").is_some() {
            var("MI_COACH_CORS_ORIGINS")
                .map(|raw| split_origins(&raw))
                .unwrap_or_default()
        } else {
            DEV_CORS_ORIGINS.iter().map(|o| o.to_string()).collect()
        };

        let model = ModelBinding {
            endpoint: var("AZURE_OPENAI_ENDPOINT"),
            api_key: var("AZURE_OPENAI_API_KEY"),
            deployment: var("AZURE_OPENAI_DEPLOYMENT")
                .unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string()),
            api_version: var("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        };

        Ok(Self {
            port,
            database_url: resolve_database_url(&var)?,
            cors_origins,
            model,
        })
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pick the Postgres URL.
///
/// 1. `DATABASE_URL` verbatim
/// 2. On App Service (`WEBSITE_HOSTNAME` set): `AZURE_POSTGRESQL_CONNECTIONSTRING`
/// 3. Local development: `DBUSER`, `DBPASS`, `DBHOST`, `DBNAME`, `DBPORT`
pub fn resolve_database_url(var: &impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
    if let Some(url) = var("DATABASE_URL") {
        return Ok(url);
    }

    if var("WEBSITE_HOSTNAME").is_some() {
        tracing::info!("resolving database from AZURE_POSTGRESQL_CONNECTIONSTRING");
        let raw = var("AZURE_POSTGRESQL_CONNECTIONSTRING")
            .ok_or(ConfigError::Missing("AZURE_POSTGRESQL_CONNECTIONSTRING"))?;
        return parse_azure_connection_string(&raw);
    }

    tracing::info!("resolving database from local DB* variables");
    let user = var("DBUSER").ok_or(ConfigError::Missing("DBUSER"))?;
    let password = var("DBPASS").ok_or(ConfigError::Missing("DBPASS"))?;
    let host = var("DBHOST").ok_or(ConfigError::Missing("DBHOST"))?;
    let dbname = var("DBNAME").ok_or(ConfigError::Missing("DBNAME"))?;
    let port = var("DBPORT").unwrap_or_else(|| "5432".to_string());

    build_postgres_url(&user, &password, &host, &port, &dbname, None)
}

/// Convert the libpq-style `key=value key=value` string App Service injects
/// into a `postgresql://` URL.
fn parse_azure_connection_string(raw: &str) -> Result<String, ConfigError> {
    let mut details = HashMap::new();
    for pair in raw.split_whitespace() {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedConnectionString(format!("'{pair}'")))?;
        details.insert(key, value);
    }

    let get = |key: &str| {
        details
            .get(key)
            .copied()
            .ok_or_else(|| ConfigError::MalformedConnectionString(format!("missing '{key}'")))
    };

    build_postgres_url(
        get("user")?,
        get("password")?,
        get("host")?,
        get("port")?,
        get("dbname")?,
        Some(get("sslmode")?),
    )
}

fn build_postgres_url(
    user: &str,
    password: &str,
    host: &str,
    port: &str,
    dbname: &str,
    sslmode: Option<&str>,
) -> Result<String, ConfigError> {
    let invalid = |value: String| ConfigError::Invalid {
        name: "database url",
        value,
    };

    let mut url = url::Url::parse(&format!("postgresql://{host}:{port}/{dbname}"))
        .map_err(|e| invalid(e.to_string()))?;
    url.set_username(user)
        .map_err(|_| invalid("username".to_string()))?;
    url.set_password(Some(password))
        .map_err(|_| invalid("password".to_string()))?;
    if let Some(mode) = sslmode {
        url.query_pairs_mut().append_pair("sslmode", mode);
    }
    Ok(url.to_string())
}
