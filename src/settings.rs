use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory when `--config` is absent
/// (any extension the `config` crate understands: `agentmd.toml`, ...).
const DEFAULT_CONFIG_NAME: &str = "agentmd";
const ENV_PREFIX: &str = "AGENTMD";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Max characters per chunk; 0 disables chunking.
    pub chunk_size: usize,
    pub format: OutputFormat,
    /// Wrap output in a frontmatter block.
    pub frontmatter: bool,
    /// Batch worker threads; 0 lets rayon decide.
    pub threads: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            chunk_size: 0,
            format: OutputFormat::Markdown,
            frontmatter: true,
            threads: 0,
        }
    }
}

/// Defaults → config file → `AGENTMD_*` environment.
///
/// An explicit `path` must exist; the default `agentmd.*` file is optional.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let defaults = Settings::default();
    let builder = Config::builder()
        .set_default("chunk_size", defaults.chunk_size as u64)?
        .set_default("format", "markdown")?
        .set_default("frontmatter", defaults.frontmatter)?
        .set_default("threads", defaults.threads as u64)?;

    let builder = match path {
        Some(p) => builder.add_source(File::from(p).required(true)),
        None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
    };

    builder
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()
        .context("Failed to load configuration")?
        .try_deserialize()
        .context("Invalid configuration")
}
