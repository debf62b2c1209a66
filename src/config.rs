use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{MigrateError, Result};

#[derive(Debug, Deserialize, Default)]
pub struct MigrationConfig {
    #[serde(default)]
    pub users: HashMap<String, UserEntry>,
    /// Base URL of the Mantis installation, used for backlinks.
    #[serde(default, alias = "mantisUrl")]
    pub mantis_url: Option<String>,
    #[serde(default)]
    pub category_labels: HashMap<String, String>,
    #[serde(default)]
    pub priority_labels: HashMap<String, String>,
    #[serde(default)]
    pub severity_labels: HashMap<String, String>,
    #[serde(default)]
    pub closed_statuses: HashMap<String, bool>,
    #[serde(default)]
    pub version_milestones: HashMap<String, MilestoneSpec>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UserEntry {
    /// GitLab username the Mantis account maps to.
    pub gitlab: Option<String>,
    #[serde(alias = "fullName")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MilestoneSpec {
    Id(u64),
    Detailed { id: u64, title: Option<String> },
}

impl MilestoneSpec {
    pub fn id(&self) -> u64 {
        match self {
            Self::Id(id) | Self::Detailed { id, .. } => *id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Detailed { title, .. } => title.as_deref(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mantis2gitlab")
        .join("config.json")
}

pub fn load_config(path: &Path) -> Result<MigrationConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| MigrateError::config(path, format!("cannot read file: {e}")))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        toml::from_str(&contents).map_err(|e| MigrateError::config(path, e.to_string()))
    } else {
        serde_json::from_str(&contents).map_err(|e| MigrateError::config(path, e.to_string()))
    }
}
