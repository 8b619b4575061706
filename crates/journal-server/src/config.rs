//! Configuration loading from the environment and an optional `.env` file

use anyhow::{Context, Result, anyhow, bail};
use journal_db::DatabaseSettings;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Accepted values for `DB_SSLMODE`
const SSL_MODES: [&str; 6] = [
    "disable",
    "allow",
    "prefer",
    "require",
    "verify-ca",
    "verify-full",
];

/// Main configuration structure
#[derive(Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Deadline applied to every request
    pub request_timeout: Duration,
}

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub admin_password: Option<String>,
    pub legacy_plaintext_upgrade: bool,
    pub cookie_secure: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Strict boolean used for flags
struct Flag(bool);

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Flag(true)),
            "0" | "false" | "no" | "off" => Ok(Flag(false)),
            other => Err(format!("expected a boolean, got '{}'", other)),
        }
    }
}

/// Looks up a variable by any of its names; the first name is canonical
struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, names: &[&str]) -> Option<String> {
        names
            .iter()
            .find_map(|name| (self.lookup)(*name))
            .filter(|value| !value.trim().is_empty())
    }

    fn required(&self, names: &[&str]) -> Result<String> {
        self.get(names)
            .with_context(|| format!("Environment variable {} must be set", names[0]))
    }

    fn parsed<T>(&self, names: &[&str], default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(names) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid value for {}: {}", names[0], e)),
            None => Ok(default),
        }
    }
}

impl Config {
    /// Load from the process environment, falling back to values in `env_file`.
    ///
    /// A missing file is not an error. Variables already present in the
    /// environment take precedence over the file.
    pub fn load(env_file: &Path) -> Result<Self> {
        let file = read_env_file(env_file)?;
        Self::from_lookup(|key: &str| std::env::var(key).ok().or_else(|| file.get(key).cloned()))
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let ssl_mode = vars
            .get(&["DB_SSLMODE"])
            .unwrap_or_else(|| "disable".to_string())
            .to_ascii_lowercase();
        if !SSL_MODES.contains(&ssl_mode.as_str()) {
            bail!("Invalid value for DB_SSLMODE: {}", ssl_mode);
        }

        let database = DatabaseSettings {
            host: vars.required(&["DB_HOST"])?,
            port: vars.parsed(&["DB_PORT"], 5432)?,
            username: vars.required(&["DB_USER"])?,
            password: vars.required(&["DB_PASSWORD"])?,
            database: vars.required(&["DB_NAME"])?,
            ssl_mode,
            max_connections: vars.parsed(&["DB_MAX_CONNECTIONS"], 10)?,
            acquire_timeout: Duration::from_secs(vars.parsed(&["DB_ACQUIRE_TIMEOUT_SECS"], 5)?),
        };
        if database.max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be at least 1");
        }

        let server = ServerConfig {
            bind_address: vars
                .get(&["BIND_ADDRESS"])
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: vars.parsed(&["SERVER_PORT", "Server_Port"], 8080)?,
            request_timeout: Duration::from_secs(vars.parsed(&["REQUEST_TIMEOUT_SECS"], 30)?),
        };

        let auth = AuthConfig {
            jwt_secret: vars.required(&["JWT_SECRET", "SecretKey"])?,
            admin_password: vars.get(&["ADMIN_PASSWORD"]),
            legacy_plaintext_upgrade: vars.parsed(&["LEGACY_PLAINTEXT_UPGRADE"], Flag(false))?.0,
            cookie_secure: vars.parsed(&["COOKIE_SECURE"], Flag(false))?.0,
        };

        let logging = LoggingConfig {
            level: vars
                .get(&["LOG_LEVEL"])
                .unwrap_or_else(|| "info".to_string()),
            format: vars.parsed(&["LOG_FORMAT"], LogFormat::Pretty)?,
        };

        Ok(Self {
            server,
            database,
            auth,
            logging,
        })
    }
}

/// Read `KEY=value` pairs without touching the process environment
fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => {
            info!("No env file at {}, using the process environment", path.display());
            return Ok(HashMap::new());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read env file: {}", path.display()));
        }
    };

    let mut values = HashMap::new();
    for item in iter {
        let (key, value) =
            item.with_context(|| format!("Failed to parse env file: {}", path.display()))?;
        values.insert(key, value);
    }

    info!("Loaded {} variables from {}", values.len(), path.display());
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const MINIMAL: [(&str, &str); 5] = [
        ("DB_HOST", "localhost"),
        ("DB_USER", "journal"),
        ("DB_PASSWORD", "secret"),
        ("DB_NAME", "journal"),
        ("JWT_SECRET", "signing-key"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&MINIMAL)).unwrap();

        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.ssl_mode, "disable");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.request_timeout, Duration::from_secs(30));
        assert!(config.auth.admin_password.is_none());
        assert!(!config.auth.legacy_plaintext_upgrade);
        assert!(!config.auth.cookie_secure);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_missing_required_variable_is_named() {
        let pairs: Vec<_> = MINIMAL.iter().copied().filter(|(k, _)| *k != "DB_HOST").collect();
        let err = Config::from_lookup(lookup(&pairs)).err().unwrap();
        assert!(err.to_string().contains("DB_HOST"));
    }

    #[test]
    fn test_empty_jwt_secret_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.retain(|(k, _)| *k != "JWT_SECRET");
        pairs.push(("JWT_SECRET", ""));
        let err = Config::from_lookup(lookup(&pairs)).err().unwrap();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_legacy_names() {
        let mut pairs: Vec<_> = MINIMAL
            .iter()
            .copied()
            .filter(|(k, _)| *k != "JWT_SECRET")
            .collect();
        pairs.push(("SecretKey", "legacy-key"));
        pairs.push(("Server_Port", "9000"));

        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.auth.jwt_secret, "legacy-key");
        assert_eq!(config.server.port, 9000);

        pairs.push(("SERVER_PORT", "9100"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_overrides_and_flags() {
        let mut pairs = MINIMAL.to_vec();
        pairs.extend([
            ("DB_PORT", "6543"),
            ("DB_SSLMODE", "REQUIRE"),
            ("ADMIN_PASSWORD", "root"),
            ("LEGACY_PLAINTEXT_UPGRADE", "true"),
            ("COOKIE_SECURE", "1"),
            ("LOG_FORMAT", "json"),
            ("REQUEST_TIMEOUT_SECS", "3"),
        ]);

        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.ssl_mode, "require");
        assert_eq!(config.auth.admin_password.as_deref(), Some("root"));
        assert!(config.auth.legacy_plaintext_upgrade);
        assert!(config.auth.cookie_secure);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.server.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for (key, value) in [
            ("DB_PORT", "not-a-port"),
            ("DB_SSLMODE", "sometimes"),
            ("COOKIE_SECURE", "maybe"),
            ("LOG_FORMAT", "xml"),
            ("DB_MAX_CONNECTIONS", "0"),
        ] {
            let mut pairs = MINIMAL.to_vec();
            pairs.push((key, value));
            let err = Config::from_lookup(lookup(&pairs)).err().unwrap();
            assert!(err.to_string().contains(key), "{}: {}", key, err);
        }
    }

    #[test]
    fn test_missing_env_file_is_not_an_error() {
        let values = read_env_file(Path::new("/nonexistent/journal/.env")).unwrap();
        assert!(values.is_empty());
    }
}
