use crate::cli::Cli;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "127.0.0.1";

/// Settings that can be provided by a TOML config file
#[derive(Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    port: Option<u16>,
    host: Option<String>,
    database: Option<PathBuf>,
    seed: Option<PathBuf>,
}

impl RawConfig {
    fn load(path: &Path) -> Result<Self> {
        let toml_str = read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&toml_str)
            .with_context(|| format!("Failed to deserialize TOML config file {}", path.display()))
    }
}

/// The resolved server configuration
#[derive(Debug, Eq, PartialEq)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub database: PathBuf,
    pub seed: Option<PathBuf>,
}

impl Config {
    /// Combine the command line arguments with the config file they reference, if any
    /// Command line arguments and environment variables take precedence over the config file.
    pub fn load(cli: &Cli, data_dir: &Path) -> Result<Self> {
        let raw = match &cli.config {
            Some(path) => RawConfig::load(path)?,
            None => RawConfig::default(),
        };
        Ok(Self::from_raw(cli, raw, data_dir))
    }

    fn from_raw(cli: &Cli, raw: RawConfig, data_dir: &Path) -> Self {
        Self {
            port: cli.port.or(raw.port).unwrap_or(DEFAULT_PORT),
            host: cli
                .host
                .clone()
                .or(raw.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            database: cli
                .database
                .clone()
                .or(raw.database)
                .unwrap_or_else(|| data_dir.join("runlog.db")),
            seed: cli.seed.clone().or(raw.seed),
        }
    }
}

/// Return the directory where runlog stores application data
pub fn get_data_dir() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("com", "runlog", "runlog")
        .context("Failed to determine application directories")?;
    Ok(project_dirs.data_local_dir().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cli() -> Cli {
        Cli {
            port: None,
            host: None,
            database: None,
            seed: None,
            config: None,
            quiet: false,
        }
    }

    fn parse_raw(toml: &str) -> Result<RawConfig> {
        Ok(toml::from_str(toml)?)
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            Config::from_raw(&empty_cli(), RawConfig::default(), Path::new("/data")),
            Config {
                port: 8080,
                host: "127.0.0.1".to_owned(),
                database: PathBuf::from("/data/runlog.db"),
                seed: None,
            }
        );
    }

    #[test]
    fn test_config_file() -> Result<()> {
        let raw = parse_raw(
            "port = 9000
host = '0.0.0.0'
database = '/var/lib/runlog.db'
seed = 'runs.json'",
        )?;
        let cli = Cli {
            host: Some("localhost".to_owned()),
            ..empty_cli()
        };
        let config = Config::from_raw(&cli, raw, Path::new("/data"));

        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.database, PathBuf::from("/var/lib/runlog.db"));
        assert_eq!(config.seed, Some(PathBuf::from("runs.json")));
        Ok(())
    }

    #[test]
    fn test_unknown_key() {
        assert!(parse_raw("prot = 9000").is_err());
    }
}
