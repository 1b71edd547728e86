//! CLI configuration using Figment
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. `customfields.{toml,yaml,json}` in the working directory, or `--config`
//! 3. `CUSTOMFIELDS_*` environment variables
//! 4. Command line flags

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const ENV_PREFIX: &str = "CUSTOMFIELDS_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub fields_dir: PathBuf,
    pub log_filter: String,
    pub output: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fields_dir: PathBuf::from(".customfields/fields"),
            log_filter: "warn".to_string(),
            output: OutputFormat::Json,
        }
    }
}

/// Values given on the command line; unset flags leave lower layers alone.
#[derive(Debug, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputFormat>,
}

impl Settings {
    pub fn load(config_file: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(config_files(config_file)?)
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides));

        let settings: Settings = figment
            .extract()
            .context("failed to load configuration")?;
        debug!(?settings, "configuration loaded");
        Ok(settings)
    }
}

fn config_files(explicit: Option<&Path>) -> Result<Figment> {
    let Some(path) = explicit else {
        return Ok(Figment::new()
            .merge(Toml::file("customfields.toml"))
            .merge(Yaml::file("customfields.yaml"))
            .merge(Json::file("customfields.json")));
    };

    if !path.exists() {
        bail!("configuration file not found: {}", path.display());
    }
    let figment = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Figment::from(Toml::file(path)),
        Some("yaml") | Some("yml") => Figment::from(Yaml::file(path)),
        Some("json") => Figment::from(Json::file(path)),
        other => bail!(
            "unsupported configuration format {:?} for {}",
            other.unwrap_or(""),
            path.display()
        ),
    };
    Ok(figment)
}
