//! Project discovery and on-disk layout
//!
//! A project is any directory with a `.bdt/` marker. Entity files live in
//! per-type subdirectories (`sessions/`) named `{ID}.bdt.yaml`, so the whole
//! project diffs and merges cleanly under git.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};

/// Marker/metadata directory at the project root
pub const PROJECT_DIR: &str = ".bdt";

/// Suffix for all entity files
pub const ENTITY_FILE_SUFFIX: &str = ".bdt.yaml";

/// A discovered project rooted at the directory holding `.bdt/`
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Walk up from the current directory to find the project root
    pub fn discover() -> Result<Self, ProjectError> {
        Self::discover_from(std::env::current_dir()?)
    }

    /// Walk up from `start` to find the project root
    pub fn discover_from(start: PathBuf) -> Result<Self, ProjectError> {
        for dir in start.ancestors() {
            if dir.join(PROJECT_DIR).is_dir() {
                return Ok(Self {
                    root: dir.to_path_buf(),
                });
            }
        }
        Err(ProjectError::NotFound)
    }

    /// Scaffold a new project at `root`
    pub fn init(root: &Path) -> Result<Self, ProjectError> {
        let marker = root.join(PROJECT_DIR);
        if marker.exists() {
            return Err(ProjectError::AlreadyExists(root.to_path_buf()));
        }
        fs::create_dir_all(&marker)?;
        for prefix in EntityPrefix::all() {
            fs::create_dir_all(root.join(prefix.dir()))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.bdt/` metadata directory
    pub fn meta_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.meta_dir().join("config.yaml")
    }

    pub fn shortid_path(&self) -> PathBuf {
        self.meta_dir().join("shortids.json")
    }

    /// Directory holding one entity type's files
    pub fn entity_dir(&self, prefix: EntityPrefix) -> PathBuf {
        self.root.join(prefix.dir())
    }

    /// Canonical path of one entity's file
    pub fn entity_path(&self, id: &EntityId) -> PathBuf {
        self.entity_dir(id.prefix())
            .join(format!("{}{}", id, ENTITY_FILE_SUFFIX))
    }

    /// All entity files of one type, sorted by filename.
    ///
    /// ULID filenames sort oldest-first, which list commands rely on.
    pub fn iter_entity_files(&self, prefix: EntityPrefix) -> Vec<PathBuf> {
        let dir = self.entity_dir(prefix);
        let mut files: Vec<PathBuf> = match fs::read_dir(&dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .map(|n| {
                            let name = n.to_string_lossy();
                            name.ends_with(ENTITY_FILE_SUFFIX)
                                && name.starts_with(&format!("{}-", prefix.as_str()))
                        })
                        .unwrap_or(false)
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        files.sort();
        files
    }
}

/// Errors from project discovery and scaffolding
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not inside a bdt project (no {} directory found here or above)", PROJECT_DIR)]
    NotFound,

    #[error("a bdt project already exists at {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_layout() {
        let tmp = TempDir::new().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        assert!(project.meta_dir().is_dir());
        assert!(project.entity_dir(EntityPrefix::Session).is_dir());
    }

    #[test]
    fn test_init_refuses_existing_project() {
        let tmp = TempDir::new().unwrap();
        Project::init(tmp.path()).unwrap();
        assert!(matches!(
            Project::init(tmp.path()),
            Err(ProjectError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_discover_from_nested_directory() {
        let tmp = TempDir::new().unwrap();
        Project::init(tmp.path()).unwrap();
        let nested = tmp.path().join("sessions").join("deep");
        fs::create_dir_all(&nested).unwrap();

        let project = Project::discover_from(nested).unwrap();
        assert_eq!(project.root(), tmp.path());
    }

    #[test]
    fn test_discover_fails_outside_project() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            Project::discover_from(tmp.path().to_path_buf()),
            Err(ProjectError::NotFound)
        ));
    }

    #[test]
    fn test_entity_path_and_listing() {
        let tmp = TempDir::new().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        let id = EntityId::new(EntityPrefix::Session);
        let path = project.entity_path(&id);
        assert!(path.starts_with(project.entity_dir(EntityPrefix::Session)));
        assert!(path.to_string_lossy().ends_with(ENTITY_FILE_SUFFIX));

        fs::write(&path, "title: x\n").unwrap();
        fs::write(
            project.entity_dir(EntityPrefix::Session).join("notes.md"),
            "ignored",
        )
        .unwrap();

        let files = project.iter_entity_files(EntityPrefix::Session);
        assert_eq!(files, vec![path]);
    }
}
