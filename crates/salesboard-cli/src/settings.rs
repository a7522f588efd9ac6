//! Layered configuration: defaults, then the TOML file, then `SALESBOARD_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::ValueEnum;
use salesboard_analytics::{aggregate::ZeroTotal, segment::SegmentationConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub database_path: PathBuf,
  pub output:        OutputSettings,
  pub segmentation:  SegmentationConfig,
  pub part_to_whole: PartToWholeSettings,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      database_path: PathBuf::from("sales.db"),
      output:        OutputSettings::default(),
      segmentation:  SegmentationConfig::default(),
      part_to_whole: PartToWholeSettings::default(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
  /// Space-aligned columns.
  #[default]
  Table,
  /// One line per row, RFC 4180 quoting.
  Delimited,
  Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
  pub format:    OutputFormat,
  /// Field separator for `delimited` output; must be a single character.
  pub delimiter: String,
}

impl Default for OutputSettings {
  fn default() -> Self {
    Self { format: OutputFormat::default(), delimiter: ",".to_string() }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartToWholeSettings {
  pub zero_total: ZeroTotal,
}

impl Settings {
  /// Read `path` if it exists and overlay the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SALESBOARD")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut settings: Settings = raw
      .try_deserialize()
      .context("failed to deserialise Settings")?;
    settings.database_path = expand_tilde(&settings.database_path);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
