use clap::Parser;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Command line overrides for the server binary
#[derive(Debug, Default, Clone, Parser)]
#[command(name = "case-admin")]
#[command(about = "Case management admin API server")]
#[command(version)]
pub struct CliArgs {
    #[arg(short, long, help = "Path to a YAML or JSON config file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Address to bind")]
    pub host: Option<String>,

    #[arg(long, help = "Port to listen on")]
    pub port: Option<u16>,

    #[arg(long = "db-path", help = "SQLite database file")]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub log: LogConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Built admin UI; `None` disables static serving
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
    pub max_connections: u32,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Role taken from the `x-role-code` header
    Simple,
    /// Every request acts as admin
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: Some(PathBuf::from("public")),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/app.db"),
            busy_timeout_ms: 5000,
            max_connections: 5,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay_ms: 50,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { mode: AuthMode::Simple }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file, then environment, then CLI flags.
    ///
    /// Relative paths are resolved against the directory holding the config file.
    pub fn load(args: &CliArgs) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = match &args.config {
            Some(path) => absolute(path),
            None => absolute(Path::new(DEFAULT_CONFIG_FILE)),
        };

        let mut config = Self::from_file(&config_path)?
            .with_env_overrides()
            .with_cli_overrides(args);

        let base = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        config.resolve_paths(&base);

        Ok((config, config_path))
    }

    /// A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            return serde_json::from_str(raw).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            });
        }
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("CASE_ADMIN_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("CASE_ADMIN_PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("CASE_ADMIN_STATIC_DIR") {
            self.server.static_dir = if v.is_empty() { None } else { Some(PathBuf::from(v)) };
        }
        if let Ok(v) = env::var("CASE_ADMIN_DB_PATH") {
            self.database.path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("CASE_ADMIN_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Ok(v) = env::var("CASE_ADMIN_AUTH_MODE") {
            match v.as_str() {
                "simple" => self.auth.mode = AuthMode::Simple,
                "disabled" | "none" => self.auth.mode = AuthMode::Disabled,
                other => tracing::warn!("Ignoring unknown CASE_ADMIN_AUTH_MODE '{}'", other),
            }
        }
        self
    }

    fn with_cli_overrides(mut self, args: &CliArgs) -> Self {
        if let Some(host) = &args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(path) = &args.db_path {
            self.database.path = path.clone();
        }
        self
    }

    fn resolve_paths(&mut self, base: &Path) {
        self.database.path = resolve(base, &self.database.path);
        self.server.static_dir = self.server.static_dir.as_deref().map(|dir| resolve(base, dir));
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
