//! Entity identity - prefixed ULID identifiers
//!
//! Every entity file is named by its ID (e.g. `SES-01J8ME0QGKXV3T4C8YQBW0F7EZ`),
//! which keeps files stable under rename and merge-friendly under git.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

/// Entity type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityPrefix {
    /// Blower door test session (SES)
    Session,
}

impl EntityPrefix {
    /// All known prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[EntityPrefix::Session]
    }

    /// The prefix string used in IDs and filenames
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityPrefix::Session => "SES",
        }
    }

    /// The project subdirectory holding this entity type
    pub const fn dir(self) -> &'static str {
        match self {
            EntityPrefix::Session => "sessions",
        }
    }

    /// Human-readable singular name
    pub const fn name(self) -> &'static str {
        match self {
            EntityPrefix::Session => "session",
        }
    }

    /// Determine the entity type from a filename like `SES-...bdt.yaml`
    pub fn from_filename(name: &str) -> Option<Self> {
        EntityPrefix::all()
            .iter()
            .copied()
            .find(|p| name.starts_with(&format!("{}-", p.as_str())))
    }

    /// Determine the entity type from a path's parent directories
    pub fn from_path(path: &Path) -> Option<Self> {
        path.components().find_map(|c| {
            let name = c.as_os_str().to_string_lossy();
            EntityPrefix::all().iter().copied().find(|p| name == p.dir())
        })
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityPrefix::all()
            .iter()
            .copied()
            .find(|p| s.eq_ignore_ascii_case(p.as_str()))
            .ok_or_else(|| IdParseError::UnknownPrefix(s.to_string()))
    }
}

/// A prefixed ULID identifier, e.g. `SES-01J8ME0QGKXV3T4C8YQBW0F7EZ`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Mint a fresh ID for the given entity type
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    /// Parse a `PREFIX-ULID` string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        let (prefix_str, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::Format(s.to_string()))?;
        let prefix = prefix_str.parse()?;
        let ulid =
            Ulid::from_string(ulid_str).map_err(|_| IdParseError::Ulid(s.to_string()))?;
        Ok(Self { prefix, ulid })
    }

    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityId::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = IdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        EntityId::parse(&s)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> String {
        id.to_string()
    }
}

/// Errors from parsing entity IDs and prefixes
#[derive(Debug, Error, PartialEq)]
pub enum IdParseError {
    #[error("invalid entity id '{0}': expected PREFIX-ULID")]
    Format(String),

    #[error("unknown entity prefix '{0}'")]
    UnknownPrefix(String),

    #[error("invalid ULID in entity id '{0}'")]
    Ulid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_round_trips() {
        let id = EntityId::new(EntityPrefix::Session);
        let parsed = EntityId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert_eq!(parsed.prefix(), EntityPrefix::Session);
    }

    #[test]
    fn test_display_format() {
        let id = EntityId::new(EntityPrefix::Session);
        let s = id.to_string();
        assert!(s.starts_with("SES-"));
        // ULID is 26 Crockford base32 characters
        assert_eq!(s.len(), "SES-".len() + 26);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            EntityId::parse("no_separator"),
            Err(IdParseError::Format(_))
        ));
        assert!(matches!(
            EntityId::parse("XXX-01J8ME0QGKXV3T4C8YQBW0F7EZ"),
            Err(IdParseError::UnknownPrefix(_))
        ));
        assert!(matches!(
            EntityId::parse("SES-notaulid"),
            Err(IdParseError::Ulid(_))
        ));
    }

    #[test]
    fn test_prefix_from_filename() {
        assert_eq!(
            EntityPrefix::from_filename("SES-01J8ME0QGKXV3T4C8YQBW0F7EZ.bdt.yaml"),
            Some(EntityPrefix::Session)
        );
        assert_eq!(EntityPrefix::from_filename("notes.md"), None);
    }

    #[test]
    fn test_prefix_from_path() {
        assert_eq!(
            EntityPrefix::from_path(Path::new("proj/sessions/SES-X.bdt.yaml")),
            Some(EntityPrefix::Session)
        );
        assert_eq!(EntityPrefix::from_path(Path::new("proj/docs/readme.md")), None);
    }

    #[test]
    fn test_serde_as_string() {
        let id = EntityId::new(EntityPrefix::Session);
        let yaml = serde_yml::to_string(&id).unwrap();
        assert!(yaml.trim().ends_with(&id.to_string()) || yaml.contains(&id.to_string()));
        let back: EntityId = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(back, id);
    }
}
