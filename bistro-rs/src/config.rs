use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(
    name = "bistro-rs",
    version,
    about = "Bistro restaurant management backend"
)]
pub struct Cli {
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    #[arg(long, value_name = "URI")]
    pub mongodb_uri: Option<String>,

    #[arg(long, value_name = "NAME")]
    pub database: Option<String>,

    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub mongodb_uri: String,
    pub database: String,
    pub token_secret: String,
    pub payment_secret_key: String,
    pub payment_api_base: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("missing required configuration: set {key}")]
    Missing { key: &'static str },
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind: Option<SocketAddr>,
    database: Option<String>,
    payment_api_base: Option<String>,
}

impl AppConfig {
    /// Resolve configuration with CLI > file > env > default precedence.
    /// Secrets (store URI, token secret, processor key) come from env only.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let from_file = read_file_config(cli.config.as_deref())?;
        resolve(cli, from_file, read_env)
    }
}

fn resolve(
    cli: Cli,
    from_file: FileConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let bind = cli
        .bind
        .or(from_file.bind)
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 5000)));
    let mongodb_uri = cli
        .mongodb_uri
        .or_else(|| env("BISTRO_MONGODB_URI"))
        .or_else(|| env("MONGODB_URI"))
        .ok_or(ConfigError::Missing {
            key: "BISTRO_MONGODB_URI",
        })?;
    let database = cli
        .database
        .or(from_file.database)
        .unwrap_or_else(|| String::from("bistroDB"));
    let token_secret = env("BISTRO_TOKEN_SECRET")
        .or_else(|| env("ACCESS_TOKEN_SECRET"))
        .ok_or(ConfigError::Missing {
            key: "BISTRO_TOKEN_SECRET",
        })?;
    let payment_secret_key = env("STRIPE_SECRET_KEY").ok_or(ConfigError::Missing {
        key: "STRIPE_SECRET_KEY",
    })?;
    let payment_api_base = from_file
        .payment_api_base
        .or_else(|| env("BISTRO_PAYMENT_API_BASE"))
        .unwrap_or_else(|| String::from("https://api.stripe.com"));

    Ok(AppConfig {
        bind,
        mongodb_uri,
        database,
        token_secret,
        payment_secret_key,
        payment_api_base,
    })
}

fn read_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::net::SocketAddr;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{read_file_config, resolve, Cli, ConfigError, FileConfig};

    fn bare_cli() -> Cli {
        Cli {
            bind: None,
            mongodb_uri: None,
            database: None,
            config: None,
        }
    }

    fn full_env(key: &str) -> Option<String> {
        match key {
            "BISTRO_MONGODB_URI" => Some(String::from("mongodb://localhost:27017")),
            "BISTRO_TOKEN_SECRET" => Some(String::from("token-secret")),
            "STRIPE_SECRET_KEY" => Some(String::from("sk_test_key")),
            _ => None,
        }
    }

    #[test]
    fn resolve_applies_defaults() -> Result<()> {
        let config = resolve(bare_cli(), FileConfig::default(), full_env)?;

        assert_eq!(config.bind, SocketAddr::from(([0, 0, 0, 0], 5000)));
        assert_eq!(config.database, "bistroDB");
        assert_eq!(config.payment_api_base, "https://api.stripe.com");
        assert_eq!(config.mongodb_uri, "mongodb://localhost:27017");
        Ok(())
    }

    #[test]
    fn cli_overrides_file_and_default() -> Result<()> {
        let cli = Cli {
            bind: Some("127.0.0.1:6000".parse()?),
            mongodb_uri: Some(String::from("mongodb://cli:27017")),
            database: Some(String::from("cliDB")),
            config: None,
        };
        let from_file = FileConfig {
            bind: Some("127.0.0.1:7000".parse()?),
            database: Some(String::from("fileDB")),
            payment_api_base: None,
        };

        let config = resolve(cli, from_file, full_env)?;

        assert_eq!(config.bind, "127.0.0.1:6000".parse::<SocketAddr>()?);
        assert_eq!(config.mongodb_uri, "mongodb://cli:27017");
        assert_eq!(config.database, "cliDB");
        Ok(())
    }

    #[test]
    fn missing_store_uri_names_the_key() {
        let env = |key: &str| match key {
            "BISTRO_TOKEN_SECRET" => Some(String::from("s")),
            "STRIPE_SECRET_KEY" => Some(String::from("k")),
            _ => None,
        };

        let error = resolve(bare_cli(), FileConfig::default(), env).unwrap_err();
        assert!(matches!(
            error,
            ConfigError::Missing {
                key: "BISTRO_MONGODB_URI"
            }
        ));
    }

    #[test]
    fn legacy_env_aliases_are_accepted() -> Result<()> {
        let env = |key: &str| match key {
            "MONGODB_URI" => Some(String::from("mongodb://alias:27017")),
            "ACCESS_TOKEN_SECRET" => Some(String::from("legacy-secret")),
            "STRIPE_SECRET_KEY" => Some(String::from("sk_test_key")),
            _ => None,
        };

        let config = resolve(bare_cli(), FileConfig::default(), env)?;

        assert_eq!(config.mongodb_uri, "mongodb://alias:27017");
        assert_eq!(config.token_secret, "legacy-secret");
        Ok(())
    }

    #[test]
    fn file_config_parses_known_fields() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bistro.toml");
        std::fs::write(
            &path,
            "bind = \"127.0.0.1:8080\"\ndatabase = \"testDB\"\npayment_api_base = \"http://localhost:9999\"\n",
        )?;

        let parsed = read_file_config(Some(&path))?;

        assert_eq!(parsed.bind, Some("127.0.0.1:8080".parse()?));
        assert_eq!(parsed.database.as_deref(), Some("testDB"));
        assert_eq!(
            parsed.payment_api_base.as_deref(),
            Some("http://localhost:9999")
        );
        Ok(())
    }

    #[test]
    fn file_config_rejects_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bistro.toml");
        std::fs::write(&path, "bind = not-an-addr").unwrap();

        assert!(read_file_config(Some(&path)).is_err());
    }
}
