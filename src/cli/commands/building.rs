//! `bdt building` command - Building profile entry

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::Result;

use crate::cli::commands::utils::{note_results_cleared, save_session, target_session};
use crate::cli::helpers::{fmt_num, format_short_id};
use crate::core::project::Project;
use crate::entities::session::BasementType;

#[derive(Subcommand, Debug)]
pub enum BuildingCommands {
    /// Set building geometry on a session
    Set(SetArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BasementArg {
    None,
    Unconditioned,
    Conditioned,
}

impl From<BasementArg> for BasementType {
    fn from(arg: BasementArg) -> Self {
        match arg {
            BasementArg::None => BasementType::None,
            BasementArg::Unconditioned => BasementType::Unconditioned,
            BasementArg::Conditioned => BasementType::Conditioned,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Session to update (default: the newest session)
    #[arg(long, short = 's')]
    pub session: Option<String>,

    /// Conditioned volume in cubic feet
    #[arg(long, short = 'v')]
    pub volume: Option<f64>,

    /// Conditioned floor area in square feet
    #[arg(long, short = 'a')]
    pub area: Option<f64>,

    /// Envelope surface area in square feet
    #[arg(long)]
    pub surface: Option<f64>,

    /// Stories above grade
    #[arg(long)]
    pub stories: Option<u32>,

    /// Basement/foundation type
    #[arg(long, value_enum)]
    pub basement: Option<BasementArg>,
}

pub fn run(cmd: BuildingCommands) -> Result<()> {
    match cmd {
        BuildingCommands::Set(args) => run_set(args),
    }
}

fn run_set(args: SetArgs) -> Result<()> {
    if args.volume.is_none()
        && args.area.is_none()
        && args.surface.is_none()
        && args.stories.is_none()
        && args.basement.is_none()
    {
        return Err(miette::miette!(
            "nothing to set; pass at least one of --volume, --area, --surface, --stories, --basement"
        ));
    }

    if let Some(volume) = args.volume {
        if volume <= 0.0 {
            return Err(miette::miette!(
                "volume must be positive, got {}",
                volume
            ));
        }
    }

    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (mut session, path) = target_session(&project, args.session.as_deref())?;

    let had_results = session.results.is_some();
    session.invalidate_results();

    if let Some(volume) = args.volume {
        session.building.volume_cu_ft = Some(volume);
    }
    if let Some(area) = args.area {
        session.building.conditioned_area_sq_ft = Some(area);
    }
    if let Some(surface) = args.surface {
        session.building.surface_area_sq_ft = Some(surface);
    }
    if let Some(stories) = args.stories {
        session.building.stories = Some(stories);
    }
    if let Some(basement) = args.basement {
        session.building.basement = Some(basement.into());
    }

    save_session(&session, &path)?;

    println!(
        "{} Updated building profile on {}",
        style("✓").green(),
        style(format_short_id(&session.id)).cyan()
    );
    if let Some(v) = session.building.volume_cu_ft {
        println!("   Volume: {} cu ft", fmt_num(v, 0));
    }
    note_results_cleared(had_results, &session);

    Ok(())
}
