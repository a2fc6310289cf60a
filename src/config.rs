use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::Severity;

/// Configuration file structure for cigraph.
///
/// Holds output preferences that would otherwise have to be repeated on every
/// invocation. Analysis thresholds and graph spacing are fixed and cannot be
/// configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,

    /// Issue report preferences
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,

    /// Use colors in terminal output
    #[serde(default = "default_true")]
    pub color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
    Report,
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportConfig {
    /// Which issues to list
    #[serde(default)]
    pub severity: SeverityFilter,

    /// Include node positions and edges in the terminal summary
    #[serde(default = "default_true")]
    pub show_graph: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeverityFilter {
    #[default]
    All,
    Error,
    Warning,
}

impl SeverityFilter {
    pub fn matches(self, severity: Severity) -> bool {
        match self {
            Self::All => true,
            Self::Error => severity == Severity::Error,
            Self::Warning => severity == Severity::Warning,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Summary,
            pretty: false,
            color: true,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            severity: SeverityFilter::All,
            show_graph: true,
        }
    }
}

fn default_true() -> bool {
    true
}

const CANDIDATES: [&str; 4] = ["cigraph.toml", "cigraph.json", "cigraph.yaml", "cigraph.yml"];

impl Config {
    /// Reads settings from `path`, or from the first settings file found.
    ///
    /// Without an explicit path the working directory is searched for
    /// `cigraph.toml`, `cigraph.json`, `cigraph.yaml` and `cigraph.yml`, then
    /// `<user config dir>/cigraph/config.toml`. Defaults apply when none exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let found = CANDIDATES
            .iter()
            .map(PathBuf::from)
            .chain(user_config_path())
            .find(|candidate| candidate.exists());

        match found {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read settings from {}", path.display()))?;
        debug!("Loaded settings file {}", path.display());

        let parsed = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&contents).map_err(anyhow::Error::from),
            Some("json") => serde_json::from_str(&contents).map_err(anyhow::Error::from),
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&contents).map_err(anyhow::Error::from)
            }
            // Unknown extension: accept whichever format parses.
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .map_err(anyhow::Error::from),
        };

        parsed.with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Writes the settings, choosing the format from the file extension
    /// (TOML unless it is `.json`, `.yaml` or `.yml`).
    pub fn save(&self, path: &Path) -> Result<()> {
        let rendered = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml" | "yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, rendered)
            .with_context(|| format!("Cannot write settings to {}", path.display()))
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cigraph").join("config.toml"))
}
