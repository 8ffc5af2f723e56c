//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use url::Url;
use vulnscan_core::ingest::DEFAULT_CONCURRENCY;

/// Database file used when neither the CLI nor the config file names one.
pub const DEFAULT_DATABASE_PATH: &str = "vulnerabilities.db";

/// Listen address used by `serve` when none is configured.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

/// TOML-backed file configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// `SQLite` database file.
    pub database_path: Option<PathBuf>,
    /// Listen address for `serve`.
    pub bind_address: Option<String>,
    /// Branch used when resolving raw content URLs.
    pub branch: Option<String>,
    /// Raw content host override (mirrors).
    pub raw_base_url: Option<String>,
    pub fetch_connect_timeout_secs: Option<u64>,
    pub fetch_read_timeout_secs: Option<u64>,
    /// Pool size; must cover the ingestion concurrency.
    pub db_max_connections: Option<u32>,
    pub db_busy_timeout_ms: Option<u32>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(bind) = &self.bind_address
            && bind.parse::<SocketAddr>().is_err()
        {
            bail!("Invalid config value for `bind_address`: '{bind}'. Expected host:port");
        }

        if let Some(branch) = &self.branch
            && branch.trim().is_empty()
        {
            bail!("Invalid config value for `branch`: must not be empty");
        }

        if let Some(raw) = &self.raw_base_url {
            let url = Url::parse(raw)
                .with_context(|| format!("Invalid config value for `raw_base_url`: '{raw}'"))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("Invalid config value for `raw_base_url`: '{raw}'. Expected http(s) URL");
            }
        }

        validate_timeout_secs("fetch_connect_timeout_secs", self.fetch_connect_timeout_secs)?;
        validate_timeout_secs("fetch_read_timeout_secs", self.fetch_read_timeout_secs)?;
        validate_db_max_connections(self.db_max_connections)?;
        validate_db_busy_timeout_ms(self.db_busy_timeout_ms)?;

        Ok(())
    }
}

fn validate_db_max_connections(value: Option<u32>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    let min = u32::try_from(DEFAULT_CONCURRENCY).unwrap_or(u32::MAX);
    if !(min..=20).contains(&value) {
        bail!("Invalid config value for `db_max_connections`: {value}. Expected range: {min}..=20");
    }
    Ok(())
}

fn validate_db_busy_timeout_ms(value: Option<u32>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if value > 120_000 {
        bail!("Invalid config value for `db_busy_timeout_ms`: {value}. Expected range: 0..=120000");
    }
    Ok(())
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Path that was consulted, if any.
    pub path: Option<PathBuf>,
    /// Parsed config; defaults when no file was found.
    pub config: FileConfig,
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/vulnscan/config.toml`
/// 2. `$HOME/.config/vulnscan/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("vulnscan")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("vulnscan")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from `explicit` if given (it must exist), otherwise from the
/// default path if present.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config,
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config,
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            config: FileConfig::default(),
            loaded_from_file: false,
        }),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let cfg: FileConfig = toml::from_str(raw)?;
    cfg.validate()?;
    Ok(cfg)
}
