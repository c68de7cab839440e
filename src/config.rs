use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LIST_HEIGHT: usize = 12;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub list_height: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_file: None,
            log_level: None,
            log_dir: None,
            list_height: DEFAULT_LIST_HEIGHT,
        }
    }
}

impl Config {
    /// Reads `config.yml` from the platform config directory, if any.
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) => Config::load(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config =
            serde_yaml::from_str(&data).with_context(|| format!("parsing {:?}", path))?;
        Ok(config)
    }

    /// Command line values take precedence over the file.
    pub fn with_overrides(mut self, data_file: Option<PathBuf>, log_level: Option<String>) -> Self {
        if data_file.is_some() {
            self.data_file = data_file;
        }
        if log_level.is_some() {
            self.log_level = log_level;
        }
        self
    }

    pub fn list_height(&self) -> usize {
        self.list_height.max(1)
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir.clone().or_else(|| {
            ProjectDirs::from("", "", "todolist").map(|dirs| dirs.data_local_dir().join("logs"))
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "todolist").map(|dirs| dirs.config_dir().join("config.yml"))
}
