//! Short ID aliases for sessions
//!
//! Full IDs (`SES-01ABC...`) are unambiguous but miserable to type, so list
//! commands assign each session a small stable number. References like `@3`,
//! `3`, or `SES@3` then resolve back to the full ID. Assignments persist in
//! `.bdt/shortids.json` and never renumber: a session keeps its alias until
//! the file is deleted.

use std::collections::{BTreeMap, HashMap};
use std::fs;

use crate::core::identity::EntityId;
use crate::core::project::Project;

/// Maps small numbers to full session IDs
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ShortIdIndex {
    /// Alias number to full ID (e.g. 1 -> "SES-01ABC...")
    entries: BTreeMap<u32, String>,
    /// Next alias to hand out
    next_id: u32,
    /// Full ID to alias, rebuilt on load
    #[serde(skip)]
    reverse: HashMap<String, u32>,
}

impl ShortIdIndex {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 1,
            reverse: HashMap::new(),
        }
    }

    /// Load the index from a project, or start empty
    pub fn load(project: &Project) -> Self {
        let path = project.shortid_path();
        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(mut index) = serde_json::from_str::<ShortIdIndex>(&content) {
                    index.reverse = index
                        .entries
                        .iter()
                        .map(|(n, id)| (id.clone(), *n))
                        .collect();
                    if index.next_id == 0 {
                        index.next_id = 1;
                    }
                    return index;
                }
            }
        }
        Self::new()
    }

    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(project.shortid_path(), content)
    }

    /// Assign an alias to an ID, or return the one it already has
    pub fn assign(&mut self, entity_id: String) -> u32 {
        if let Some(&existing) = self.reverse.get(&entity_id) {
            return existing;
        }
        let alias = self.next_id;
        self.next_id += 1;
        self.entries.insert(alias, entity_id.clone());
        self.reverse.insert(entity_id, alias);
        alias
    }

    /// Ensure every ID in the iterator has an alias; existing aliases are kept
    pub fn rebuild(&mut self, entity_ids: impl IntoIterator<Item = String>) {
        for id in entity_ids {
            self.assign(id);
        }
    }

    /// Resolve a reference to a full ID
    ///
    /// Accepts `@N`, a bare number, or `SES@N`. Anything else passes through
    /// unchanged so partial-ID matching can take over.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let num_str = if let Some((prefix, rest)) = reference.split_once('@') {
            if !prefix.is_empty() && !prefix.eq_ignore_ascii_case("ses") {
                return None;
            }
            rest
        } else if reference.chars().all(|c| c.is_ascii_digit()) && !reference.is_empty() {
            reference
        } else {
            return Some(reference.to_string());
        };

        num_str
            .parse::<u32>()
            .ok()
            .and_then(|n| self.entries.get(&n).cloned())
    }

    pub fn get_short_id(&self, entity_id: &str) -> Option<u32> {
        self.reverse.get(entity_id).copied()
    }

    /// Left column for list output: `@3   SES-...`
    pub fn format_with_short_id(&self, entity_id: &EntityId) -> String {
        let id_str = entity_id.to_string();
        if let Some(alias) = self.reverse.get(&id_str) {
            format!("@{:<3} {}", alias, id_str)
        } else {
            format!("     {}", id_str)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve a reference that might be a short ID, falling back to the raw text
pub fn parse_entity_reference(reference: &str, project: &Project) -> String {
    let index = ShortIdIndex::load(project);
    index
        .resolve(reference)
        .unwrap_or_else(|| reference.to_string())
}
