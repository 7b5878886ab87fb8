//! Toolkit configuration
//!
//! Project config (`.bdt/config.yaml`) wins over the per-user global config;
//! a missing file quietly falls back, a malformed file is a hard error. The
//! jurisdiction block carries the compliance threshold so one project can
//! follow one code edition without the engine hardcoding any.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::project::Project;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Recorded as the author of new entities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Editor command for `session edit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    /// The airtightness code this project tests against
    #[serde(default)]
    pub jurisdiction: Jurisdiction,
}

/// A jurisdiction's airtightness requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jurisdiction {
    pub name: String,
    pub threshold_ach50: f64,
}

impl Default for Jurisdiction {
    fn default() -> Self {
        Self {
            name: "Minnesota 2020 Energy Code (Climate Zone 6)".to_string(),
            threshold_ach50: 3.0,
        }
    }
}

impl Config {
    /// Load config for a project: project file, else global file, else defaults
    pub fn load(project: &Project) -> Result<Self, ConfigError> {
        let project_path = project.config_path();
        if project_path.exists() {
            return Self::from_file(&project_path);
        }
        if let Some(global) = Self::global_path() {
            if global.exists() {
                return Self::from_file(&global);
            }
        }
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        serde_yml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Per-user config location (`~/.config/bdt/config.yaml` on Linux)
    pub fn global_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "bdt").map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Author for new entities: config, then $BDT_AUTHOR, then $USER
    pub fn author(&self) -> String {
        if let Some(author) = &self.author {
            return author.clone();
        }
        std::env::var("BDT_AUTHOR")
            .or_else(|_| std::env::var("USER"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Editor command: config, then $EDITOR
    pub fn editor(&self) -> String {
        if let Some(editor) = &self.editor {
            return editor.clone();
        }
        std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string())
    }

    pub fn threshold_ach50(&self) -> f64 {
        self.jurisdiction.threshold_ach50
    }

    /// Commented starter config written by `bdt init`
    pub fn starter_yaml(author: &str) -> String {
        let jurisdiction = Jurisdiction::default();
        format!(
            "# bdt project configuration\n\
             author: {}\n\
             \n\
             # Editor for 'bdt session edit' (falls back to $EDITOR)\n\
             # editor: nvim\n\
             \n\
             # Compliance code this project tests against\n\
             jurisdiction:\n\
             \x20 name: {}\n\
             \x20 threshold_ach50: {}\n",
            author, jurisdiction.name, jurisdiction.threshold_ach50
        )
    }
}

/// Errors from loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config at {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
