//! Shared utilities for CLI commands

use std::fs;
use std::path::{Path, PathBuf};

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::format_short_id;
use crate::core::identity::EntityPrefix;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::entities::session::ComplianceStatus;
use crate::entities::TestSession;

/// Load every parseable session in the project, oldest first
///
/// Unparseable files are reported to stderr and skipped so one corrupt
/// session does not hide the rest.
pub fn load_all_sessions(project: &Project) -> Vec<(TestSession, PathBuf)> {
    let mut sessions = Vec::new();

    for path in project.iter_entity_files(EntityPrefix::Session) {
        match crate::yaml::parse_yaml_file::<TestSession>(&path) {
            Ok(session) => sessions.push((session, path)),
            Err(e) => {
                eprintln!(
                    "{} Failed to parse {}: {}",
                    style("!").yellow(),
                    path.display(),
                    e
                );
            }
        }
    }

    sessions.sort_by(|a, b| a.0.created.cmp(&b.0.created));
    sessions
}

/// Find one session by short ID, full or partial ID, or title substring
pub fn find_session(project: &Project, reference: &str) -> Result<(TestSession, PathBuf)> {
    let short_ids = ShortIdIndex::load(project);
    let resolved = short_ids
        .resolve(reference)
        .ok_or_else(|| miette::miette!("no session with short ID '{}'", reference))?;

    let query = resolved.to_lowercase();
    let mut matches: Vec<(TestSession, PathBuf)> = load_all_sessions(project)
        .into_iter()
        .filter(|(session, _)| {
            let id_str = session.id.to_string();
            id_str == resolved
                || id_str.starts_with(&resolved)
                || session.title.to_lowercase().contains(&query)
        })
        .collect();

    match matches.len() {
        0 => Err(miette::miette!(
            "no session found matching '{}'",
            reference
        )),
        1 => Ok(matches.remove(0)),
        _ => {
            println!("{} Multiple matches found:", style("!").yellow());
            for (session, _) in &matches {
                println!("  {} - {}", format_short_id(&session.id), session.title);
            }
            Err(miette::miette!(
                "ambiguous reference '{}', be more specific",
                reference
            ))
        }
    }
}

/// Resolve the session a command acts on: explicit reference, or the newest
pub fn target_session(
    project: &Project,
    reference: Option<&str>,
) -> Result<(TestSession, PathBuf)> {
    match reference {
        Some(r) => find_session(project, r),
        None => {
            let mut sessions = load_all_sessions(project);
            sessions.pop().ok_or_else(|| {
                miette::miette!("no sessions yet (create one with 'bdt session new')")
            })
        }
    }
}

/// Write a session back to its file
pub fn save_session(session: &TestSession, path: &Path) -> Result<()> {
    let yaml = serde_yml::to_string(session).into_diagnostic()?;
    fs::write(path, yaml).into_diagnostic()?;
    Ok(())
}

/// Styled verdict word for terminal output
pub fn styled_verdict(compliance: ComplianceStatus) -> console::StyledObject<&'static str> {
    match compliance {
        ComplianceStatus::Pass => style("PASS").green().bold(),
        ComplianceStatus::Fail => style("FAIL").red().bold(),
        ComplianceStatus::Indeterminate => style("INDETERMINATE").yellow().bold(),
    }
}

/// Warn when an edit just threw away stored results
pub fn note_results_cleared(had_results: bool, session: &TestSession) {
    if had_results && session.results.is_none() {
        println!(
            "{} Stored results cleared; rerun {}",
            style("!").yellow(),
            style("bdt calc").yellow()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_session(project: &Project, title: &str) -> TestSession {
        let session = TestSession::new(title.to_string(), "tester".to_string());
        let path = project.entity_path(&session.id);
        save_session(&session, &path).unwrap();
        session
    }

    #[test]
    fn test_find_session_by_partial_id() {
        let tmp = TempDir::new().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let session = write_session(&project, "Lot 14 final");

        let full = session.id.to_string();
        let (found, _) = find_session(&project, &full[..12]).unwrap();
        assert_eq!(found.id, session.id);
    }

    #[test]
    fn test_find_session_by_title() {
        let tmp = TempDir::new().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        write_session(&project, "Maple Street duplex");
        write_session(&project, "Lot 14 final");

        let (found, _) = find_session(&project, "maple").unwrap();
        assert_eq!(found.title, "Maple Street duplex");
    }

    #[test]
    fn test_ambiguous_reference_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        write_session(&project, "Lot 14 pre-drywall");
        write_session(&project, "Lot 14 final");

        assert!(find_session(&project, "lot 14").is_err());
    }

    #[test]
    fn test_target_session_defaults_to_newest() {
        let tmp = TempDir::new().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        write_session(&project, "older");
        // ULID creation times tie within a millisecond; created drives the sort
        let mut newer = TestSession::new("newer".to_string(), "tester".to_string());
        newer.created += chrono::Duration::seconds(5);
        save_session(&newer, &project.entity_path(&newer.id)).unwrap();

        let (found, _) = target_session(&project, None).unwrap();
        assert_eq!(found.title, "newer");
    }

    #[test]
    fn test_target_session_empty_project_errors() {
        let tmp = TempDir::new().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        assert!(target_session(&project, None).is_err());
    }
}
