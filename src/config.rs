use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "config/flockbot.toml";

/// Bot configuration, loaded from `config/flockbot.toml` with CLI overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    /// Server host name.
    pub server: String,
    /// Server port.
    pub port: u16,
    /// Whiteboard (room) to join.
    pub whiteboard: String,
    /// Username to join as.
    pub username: String,
    /// Seconds between keep-alive bitmap probes.
    pub probe_interval_secs: u64,
    /// Directory bitmap dumps are written into.
    pub dump_dir: PathBuf,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            server: flockbot_proto::DEFAULT_SERVER.to_string(),
            port: flockbot_proto::DEFAULT_PORT,
            whiteboard: "testone".to_string(),
            username: "observer".to_string(),
            probe_interval_secs: 60,
            dump_dir: PathBuf::from("."),
        }
    }
}

impl BotConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<BotConfig>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    BotConfig::default()
                }
            },
            Err(_) => {
                info!("No config at {}; using defaults", path.display());
                BotConfig::default()
            }
        }
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_args(&mut self) -> Result<()> {
        self.apply_arg_iter(env::args().skip(1))
    }

    fn apply_arg_iter<I>(&mut self, mut args: I) -> Result<()>
    where
        I: Iterator<Item = String>,
    {
        while let Some(arg) = args.next() {
            let mut value_for = |flag: &str| -> Result<String> {
                match args.next() {
                    Some(value) => Ok(value),
                    None => bail!("{flag} requires a value"),
                }
            };
            match arg.as_str() {
                "--server" => self.server = value_for("--server")?,
                "--port" => self.port = value_for("--port")?.parse()?,
                "--whiteboard" => self.whiteboard = value_for("--whiteboard")?,
                "--username" => self.username = value_for("--username")?,
                "--interval-secs" => {
                    self.probe_interval_secs = value_for("--interval-secs")?.parse()?
                }
                "--dump-dir" => self.dump_dir = PathBuf::from(value_for("--dump-dir")?),
                other => warn!("ignoring unknown option {other}"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(config: &mut BotConfig, args: &[&str]) -> Result<()> {
        config.apply_arg_iter(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn defaults_point_at_the_public_server() {
        let config = BotConfig::default();
        assert_eq!(config.server, "flockdraw.com");
        assert_eq!(config.port, 443);
        assert_eq!(config.probe_interval_secs, 60);
    }

    #[test]
    fn cli_overrides_apply() {
        let mut config = BotConfig::default();
        apply(
            &mut config,
            &["--whiteboard", "doodles", "--username", "scribe", "--port", "8080"],
        )
        .expect("valid args must apply");

        assert_eq!(config.whiteboard, "doodles");
        assert_eq!(config.username, "scribe");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn missing_value_is_an_error() {
        let mut config = BotConfig::default();
        assert!(apply(&mut config, &["--port"]).is_err());
        assert!(apply(&mut config, &["--port", "not-a-number"]).is_err());
    }

    #[test]
    fn config_file_roundtrips() {
        let config = BotConfig::default();
        let serialized = toml::to_string(&config).expect("config must serialize");
        let parsed: BotConfig = toml::from_str(&serialized).expect("config must parse");
        assert_eq!(parsed.whiteboard, config.whiteboard);
        assert_eq!(parsed.dump_dir, config.dump_dir);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = BotConfig::load_from_path(Path::new("does/not/exist.toml"));
        assert_eq!(config.server, BotConfig::default().server);
    }
}
