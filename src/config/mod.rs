use crate::data::DefaultClickBehavior;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Root of the generated artifacts, relative to the project
    #[serde(default = "default_output_root")]
    pub output_root: String,
    /// Sprint status file, relative to `output_root`
    #[serde(default = "default_sprint_status_file")]
    pub sprint_status_file: String,
    /// Planning documents directory, relative to `output_root`
    #[serde(default = "default_planning_dir")]
    pub planning_dir: String,
}

fn default_output_root() -> String {
    "_bmad-output".to_string()
}

fn default_sprint_status_file() -> String {
    "implementation-artifacts/sprint-status.yaml".to_string()
}

fn default_planning_dir() -> String {
    "planning-artifacts".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            sprint_status_file: default_sprint_status_file(),
            planning_dir: default_planning_dir(),
        }
    }
}

impl ProjectConfig {
    pub fn sprint_status_path(&self, project_root: &Path) -> PathBuf {
        project_root
            .join(&self.output_root)
            .join(&self.sprint_status_file)
    }

    pub fn planning_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.output_root).join(&self.planning_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub default_click_behavior: DefaultClickBehavior,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Extra `tracing` filter directive, e.g. "bmad_board=debug"
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "bmad_board=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

pub fn config_dir() -> Result<PathBuf> {
    let dir = directories::ProjectDirs::from("", "", "bmad-board")
        .context("Could not determine config directory")?
        .config_dir()
        .to_path_buf();
    Ok(dir)
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from `path`, or from the default location.
///
/// A missing file at the default location means defaults; a missing explicit path is an error.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found at {}", p.display());
            }
            p.to_path_buf()
        }
        None => {
            let p = default_config_path()?;
            if !p.exists() {
                return Ok(Config::default());
            }
            p
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    Ok(config)
}

/// Write a default config file. Refuses to overwrite unless `force` is set.
pub fn init(path: Option<&Path>, force: bool) -> Result<PathBuf> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(config_path)
}
