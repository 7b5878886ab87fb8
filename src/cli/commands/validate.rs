//! `bdt validate` command - Check every session file in the project
//!
//! Syntax errors are hard failures; field-level trouble a technician can
//! still fix in the truck (too few points, a half-entered temperature pair,
//! a missing volume) surfaces as warnings unless --strict.

use std::path::PathBuf;

use console::style;
use miette::Result;
use walkdir::WalkDir;

use crate::core::identity::EntityPrefix;
use crate::core::project::{Project, ENTITY_FILE_SUFFIX};
use crate::core::regression::MIN_VALID_POINTS;
use crate::entities::session::Stage;
use crate::entities::TestSession;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Paths to validate (default: entire project)
    #[arg()]
    pub paths: Vec<PathBuf>,

    /// Strict mode - warnings become errors
    #[arg(long)]
    pub strict: bool,

    /// Only validate git-staged files
    #[arg(long)]
    pub staged: bool,

    /// Continue validation after first error
    #[arg(long)]
    pub keep_going: bool,

    /// Show summary only, don't show individual findings
    #[arg(long)]
    pub summary: bool,
}

/// Validation statistics
#[derive(Default)]
struct ValidationStats {
    files_checked: usize,
    files_passed: usize,
    files_failed: usize,
    total_errors: usize,
    total_warnings: usize,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut stats = ValidationStats::default();
    let mut had_error = false;

    let files_to_validate: Vec<PathBuf> = if args.staged {
        get_staged_files(&project)?
    } else if args.paths.is_empty() {
        get_all_bdt_files(&project)
    } else {
        expand_paths(&args.paths)
    };

    println!(
        "{} Validating {} file(s)...\n",
        style("→").blue(),
        files_to_validate.len()
    );

    for path in &files_to_validate {
        if !path.to_string_lossy().ends_with(ENTITY_FILE_SUFFIX) {
            continue;
        }

        let filename = path.file_name().unwrap_or_default().to_string_lossy();
        if EntityPrefix::from_filename(&filename).is_none() {
            if !args.summary {
                println!(
                    "{} {} - unknown entity type (skipped)",
                    style("?").yellow(),
                    path.display()
                );
            }
            continue;
        }

        stats.files_checked += 1;

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                if !args.summary {
                    println!("{} {} - {}", style("✗").red(), path.display(), e);
                }
                stats.files_failed += 1;
                stats.total_errors += 1;
                had_error = true;
                if !args.keep_going {
                    break;
                }
                continue;
            }
        };

        match crate::yaml::parse_yaml::<TestSession>(&content, &filename) {
            Ok(session) => {
                let warnings = session_warnings(&session);
                stats.total_warnings += warnings.len();

                let failed = args.strict && !warnings.is_empty();
                if failed {
                    stats.files_failed += 1;
                    stats.total_errors += warnings.len();
                    had_error = true;
                } else {
                    stats.files_passed += 1;
                }

                if !args.summary {
                    if warnings.is_empty() {
                        println!("{} {}", style("✓").green(), path.display());
                    } else {
                        let marker = if failed {
                            style("✗").red()
                        } else {
                            style("!").yellow()
                        };
                        println!(
                            "{} {} - {} warning(s)",
                            marker,
                            path.display(),
                            warnings.len()
                        );
                        for warning in &warnings {
                            println!("    {} {}", style("•").yellow(), warning);
                        }
                    }
                }

                if failed && !args.keep_going {
                    break;
                }
            }
            Err(e) => {
                stats.files_failed += 1;
                stats.total_errors += 1;
                had_error = true;

                if !args.summary {
                    println!("{} {} - parse error", style("✗").red(), path.display());
                    println!("{:?}", miette::Report::new(e));
                }

                if !args.keep_going {
                    break;
                }
            }
        }
    }

    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Files checked:  {}", style(stats.files_checked).cyan());
    println!("  Files passed:   {}", style(stats.files_passed).green());
    println!("  Files failed:   {}", style(stats.files_failed).red());
    println!("  Total errors:   {}", style(stats.total_errors).red());

    if stats.total_warnings > 0 {
        println!(
            "  Total warnings: {}",
            style(stats.total_warnings).yellow()
        );
    }

    println!();

    if had_error {
        if stats.files_failed == 1 {
            Err(miette::miette!("Validation failed: 1 file has errors"))
        } else {
            Err(miette::miette!(
                "Validation failed: {} files have errors",
                stats.files_failed
            ))
        }
    } else {
        println!(
            "{} All files passed validation!",
            style("✓").green().bold()
        );
        Ok(())
    }
}

/// Field-level findings that do not stop parsing
fn session_warnings(session: &TestSession) -> Vec<String> {
    let mut warnings = Vec::new();

    if !session.points.is_empty() {
        let valid = session.valid_point_count();
        if valid < MIN_VALID_POINTS {
            warnings.push(format!(
                "only {} valid point(s); a multi-point fit needs {}",
                valid, MIN_VALID_POINTS
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for point in &session.points {
            if !seen.insert(point.index) {
                warnings.push(format!("duplicate point index {}", point.index));
            }
        }
    }

    if !session.building.has_volume() && !session.points.is_empty() {
        warnings.push("no building volume; ACH50 and the verdict will be indeterminate".to_string());
    }

    let weather = &session.weather;
    if weather.indoor_temp_f.is_some() != weather.outdoor_temp_f.is_some() {
        warnings.push(
            "only one of the temperature pair recorded; the stack correction needs both".to_string(),
        );
    }

    if session.results.is_some() && session.stage < Stage::Results {
        warnings.push(format!(
            "stored results but stage is '{}'; results may be stale",
            session.stage
        ));
    }
    if session.results.is_none() && session.stage >= Stage::Results {
        warnings.push(format!(
            "stage is '{}' but no results are stored",
            session.stage
        ));
    }

    warnings
}

/// Get all entity files in the project
fn get_all_bdt_files(project: &Project) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(project.root())
        .into_iter()
        .filter_entry(|e| {
            // Skip .git and .bdt directories
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') || e.depth() == 0
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if path.to_string_lossy().ends_with(ENTITY_FILE_SUFFIX) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files
}

/// Get git-staged entity files
fn get_staged_files(project: &Project) -> Result<Vec<PathBuf>> {
    let output = std::process::Command::new("git")
        .args(["diff", "--cached", "--name-only", "--diff-filter=ACM"])
        .current_dir(project.root())
        .output()
        .map_err(|e| miette::miette!("Failed to run git: {}", e))?;

    if !output.status.success() {
        return Err(miette::miette!(
            "git diff failed: {}",
            String::from_utf8_lossy(&output.stderr)
        ));
    }

    let files: Vec<PathBuf> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| line.ends_with(ENTITY_FILE_SUFFIX))
        .map(|line| project.root().join(line))
        .filter(|path| path.exists())
        .collect();

    Ok(files)
}

/// Expand paths - directories are searched for entity files
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if entry
                    .path()
                    .to_string_lossy()
                    .ends_with(ENTITY_FILE_SUFFIX)
                {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else if path.exists() {
            files.push(path.clone());
        }
    }

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calibration::FanRing;
    use crate::entities::session::TestPoint;

    fn session_with_points(count: usize) -> TestSession {
        let mut session = TestSession::new("warn test".to_string(), "test".to_string());
        for i in 0..count {
            session.add_point(TestPoint {
                index: i as u32 + 1,
                target_pa: 50.0 - 5.0 * i as f64,
                fan_pa: 45.0 - 5.0 * i as f64,
                ring: FanRing::Open,
            });
        }
        session
    }

    #[test]
    fn test_too_few_points_warns() {
        let session = session_with_points(3);
        let warnings = session_warnings(&session);
        assert!(warnings.iter().any(|w| w.contains("3 valid point(s)")));
    }

    #[test]
    fn test_missing_volume_warns_once_points_exist() {
        let mut session = session_with_points(5);
        assert!(session_warnings(&session)
            .iter()
            .any(|w| w.contains("no building volume")));

        session.building.volume_cu_ft = Some(12000.0);
        assert!(session_warnings(&session).is_empty());
    }

    #[test]
    fn test_half_temperature_pair_warns() {
        let mut session = session_with_points(5);
        session.building.volume_cu_ft = Some(12000.0);
        session.weather.indoor_temp_f = Some(70.0);
        let warnings = session_warnings(&session);
        assert!(warnings.iter().any(|w| w.contains("temperature pair")));
    }

    #[test]
    fn test_duplicate_index_warns() {
        let mut session = session_with_points(5);
        session.building.volume_cu_ft = Some(12000.0);
        session.points[4].index = 1;
        let warnings = session_warnings(&session);
        assert!(warnings.iter().any(|w| w.contains("duplicate point index 1")));
    }

    #[test]
    fn test_stage_results_without_results_warns() {
        let mut session = session_with_points(5);
        session.building.volume_cu_ft = Some(12000.0);
        session.stage = Stage::Results;
        let warnings = session_warnings(&session);
        assert!(warnings.iter().any(|w| w.contains("no results are stored")));
    }
}
