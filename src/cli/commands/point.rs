//! `bdt point` command - Measurement point entry

use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{
    note_results_cleared, save_session, target_session,
};
use crate::cli::helpers::{fmt_num, format_short_id};
use crate::cli::output::{delimited_record, effective_format};
use crate::cli::table::TableFormatter;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::calibration::FanRing;
use crate::core::engine::validate_point;
use crate::core::project::Project;
use crate::core::regression::MIN_VALID_POINTS;
use crate::entities::session::{TestPoint, TestSession};

#[derive(Subcommand, Debug)]
pub enum PointCommands {
    /// Record a measurement point
    Add(AddArgs),

    /// List a session's points
    List(ListArgs),

    /// Remove a point by index
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Session to update (default: the newest session)
    #[arg(long, short = 's')]
    pub session: Option<String>,

    /// Induced building pressure target, Pa
    #[arg(long, short = 't')]
    pub target: Option<f64>,

    /// Fan pressure reading, Pa
    #[arg(long, short = 'f')]
    pub fan: Option<f64>,

    /// Ring installed (open, a, b, c, d)
    #[arg(long, short = 'r')]
    pub ring: Option<String>,

    /// Prompt for points repeatedly until done
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Session to list (default: the newest session)
    #[arg(long, short = 's')]
    pub session: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Point index to remove
    pub index: u32,

    /// Session to update (default: the newest session)
    #[arg(long, short = 's')]
    pub session: Option<String>,
}

pub fn run(cmd: PointCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        PointCommands::Add(args) => run_add(args),
        PointCommands::List(args) => run_list(args, global),
        PointCommands::Rm(args) => run_rm(args),
    }
}

fn run_add(args: AddArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (mut session, path) = target_session(&project, args.session.as_deref())?;
    let had_results = session.results.is_some();

    if args.interactive {
        add_interactive(&mut session)?;
    } else {
        let target = args
            .target
            .ok_or_else(|| miette::miette!("--target is required (or use -i)"))?;
        let fan = args
            .fan
            .ok_or_else(|| miette::miette!("--fan is required (or use -i)"))?;
        let ring: FanRing = args
            .ring
            .as_deref()
            .ok_or_else(|| miette::miette!("--ring is required (or use -i)"))?
            .parse()
            .map_err(|e| miette::miette!("{}", e))?;

        add_one(&mut session, target, fan, ring);
    }

    save_session(&session, &path)?;
    print_point_status(&session);
    note_results_cleared(had_results, &session);
    println!("   {}", style(format_short_id(&session.id)).dim());

    Ok(())
}

fn add_interactive(session: &mut TestSession) -> Result<()> {
    let theme = ColorfulTheme::default();
    let ring_labels: Vec<&str> = FanRing::ALL.iter().map(|r| r.label()).collect();
    let mut last_ring = 0usize;

    println!("Recording points (leave target empty to finish)");
    loop {
        let target: String = Input::with_theme(&theme)
            .with_prompt("Target pressure, Pa")
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;
        if target.trim().is_empty() {
            break;
        }
        let target: f64 = target
            .trim()
            .parse()
            .map_err(|_| miette::miette!("invalid pressure: '{}'", target))?;

        let fan: f64 = Input::with_theme(&theme)
            .with_prompt("Fan pressure, Pa")
            .interact_text()
            .into_diagnostic()?;

        last_ring = Select::with_theme(&theme)
            .with_prompt("Ring")
            .items(&ring_labels)
            .default(last_ring)
            .interact()
            .into_diagnostic()?;

        add_one(session, target, fan, FanRing::ALL[last_ring]);
    }

    Ok(())
}

fn add_one(session: &mut TestSession, target: f64, fan: f64, ring: FanRing) {
    let point = TestPoint {
        index: session.next_point_index(),
        target_pa: target,
        fan_pa: fan,
        ring,
    };
    session.add_point(point);

    match validate_point(&point) {
        None => println!(
            "{} Point {} recorded: {} Pa target, {} Pa fan, {} (~{} CFM uncorrected)",
            style("✓").green(),
            point.index,
            fmt_num(target, 1),
            fmt_num(fan, 1),
            ring.label(),
            fmt_num(ring.flow_cfm(fan), 0)
        ),
        Some(issue) => println!(
            "{} Point {} recorded but will be excluded: {}",
            style("!").yellow(),
            point.index,
            issue
        ),
    }
}

fn print_point_status(session: &TestSession) {
    let valid = session.valid_point_count();
    if valid >= MIN_VALID_POINTS {
        println!(
            "   {} valid point(s) recorded (multi-point minimum met)",
            style(valid).green()
        );
    } else {
        println!(
            "   {} of {} minimum valid points recorded",
            style(valid).yellow(),
            MIN_VALID_POINTS
        );
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (session, _) = target_session(&project, args.session.as_deref())?;

    if session.points.is_empty() {
        println!("No points recorded on {}.", format_short_id(&session.id));
        println!();
        println!("Record one with: {}", style("bdt point add -i").yellow());
        return Ok(());
    }

    match effective_format(global.format, true) {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&session.points).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!(
                "{}",
                serde_yml::to_string(&session.points).into_diagnostic()?
            );
        }
        format @ (OutputFormat::Tsv | OutputFormat::Csv) => {
            for point in &session.points {
                let cells = vec![
                    point.index.to_string(),
                    point.target_pa.to_string(),
                    point.fan_pa.to_string(),
                    point.ring.to_string(),
                    fmt_num(point.ring.flow_cfm(point.fan_pa), 1),
                ];
                println!("{}", delimited_record(&cells, format));
            }
        }
        _ => {
            let mut table =
                TableFormatter::new(["IDX", "TARGET Pa", "FAN Pa", "RING", "CFM (raw)", "NOTE"])
                    .numeric_from(1);
            for point in &session.points {
                let issue = validate_point(point);
                table.add_row([
                    point.index.to_string(),
                    fmt_num(point.target_pa, 1),
                    fmt_num(point.fan_pa, 1),
                    point.ring.label().to_string(),
                    if issue.is_none() {
                        fmt_num(point.ring.flow_cfm(point.fan_pa), 1)
                    } else {
                        "-".to_string()
                    },
                    issue.map(|i| i.to_string()).unwrap_or_default(),
                ]);
            }
            println!("{}", table.render());
            print_point_status(&session);
        }
    }

    Ok(())
}

fn run_rm(args: RmArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (mut session, path) = target_session(&project, args.session.as_deref())?;
    let had_results = session.results.is_some();

    if !session.remove_point(args.index) {
        return Err(miette::miette!(
            "no point with index {} on {}",
            args.index,
            format_short_id(&session.id)
        ));
    }

    save_session(&session, &path)?;
    println!(
        "{} Removed point {} from {}",
        style("✓").green(),
        args.index,
        style(format_short_id(&session.id)).cyan()
    );
    print_point_status(&session);
    note_results_cleared(had_results, &session);

    Ok(())
}
