//! `bdt init` command - Create a new project

use std::fs;
use std::path::PathBuf;

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::project::{Project, ProjectError};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg()]
    pub path: Option<PathBuf>,

    /// Rewrite the starter config even if a project already exists
    #[arg(long)]
    pub force: bool,

    /// Author recorded in the project config
    #[arg(long)]
    pub author: Option<String>,
}

pub fn run(args: InitArgs) -> Result<()> {
    let root = match args.path {
        Some(p) => p,
        None => std::env::current_dir().into_diagnostic()?,
    };

    let project = match Project::init(&root) {
        Ok(project) => project,
        Err(ProjectError::AlreadyExists(path)) => {
            if !args.force {
                println!(
                    "{} Project already exists at {}",
                    style("!").yellow(),
                    path.display()
                );
                return Ok(());
            }
            Project::discover_from(root).map_err(|e| miette::miette!("{}", e))?
        }
        Err(e) => return Err(miette::miette!("{}", e)),
    };

    let config_path = project.config_path();
    if !config_path.exists() || args.force {
        let author = args.author.unwrap_or_else(|| Config::default().author());
        fs::write(&config_path, Config::starter_yaml(&author)).into_diagnostic()?;
    }

    println!(
        "{} Initialized bdt project at {}",
        style("✓").green(),
        project.root().display()
    );
    println!("   {}", style(config_path.display()).dim());
    println!();
    println!("Next steps:");
    println!(
        "  {}   create a test session",
        style("bdt session new -i").yellow()
    );
    println!(
        "  {}           review the fan calibration table",
        style("bdt rings").yellow()
    );

    Ok(())
}
