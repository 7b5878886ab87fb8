//! `bdt session` command - Test session management

use std::fs;

use clap::{Subcommand, ValueEnum};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{find_session, load_all_sessions, save_session, styled_verdict};
use crate::cli::helpers::{fmt_num, fmt_opt, format_short_id, truncate_str};
use crate::cli::output::{delimited_record, effective_format};
use crate::cli::table::TableFormatter;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::engine::validate_point;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::session::{ComplianceStatus, Stage, TestSession};

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// List sessions
    List(ListArgs),

    /// Create a new session
    New(NewArgs),

    /// Show a session's details
    Show(ShowArgs),

    /// Edit a session file in your editor
    Edit(EditArgs),

    /// Delete a session
    Delete(DeleteArgs),
}

/// Workflow stage filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StageFilter {
    Setup,
    Weather,
    Multipoint,
    Results,
    Report,
    All,
}

/// Stored-verdict filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VerdictFilter {
    Pass,
    Fail,
    Indeterminate,
    /// Sessions with no stored results
    None,
    All,
}

/// Sort field for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Created,
    Title,
    Date,
    Ach50,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by workflow stage
    #[arg(long, short = 's', default_value = "all")]
    pub stage: StageFilter,

    /// Filter by stored verdict
    #[arg(long, default_value = "all")]
    pub verdict: VerdictFilter,

    /// Search in title, customer, and site address
    #[arg(long)]
    pub search: Option<String>,

    /// Sort by field
    #[arg(long, default_value = "created")]
    pub sort: SortField,

    /// Reverse sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Limit output to the last N sessions in sort order
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only, not the sessions
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Session title (defaults to a placeholder)
    #[arg(long)]
    pub title: Option<String>,

    /// Customer or builder name
    #[arg(long, short = 'c')]
    pub customer: Option<String>,

    /// Site address
    #[arg(long)]
    pub address: Option<String>,

    /// Test date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Use interactive wizard to fill in fields
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,

    /// Don't open in editor after creation
    #[arg(long)]
    pub no_edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Session ID, @N short ID, or title search term
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Session ID, @N short ID, or title search term
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Session ID, @N short ID, or title search term
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Row shape for structured list output
#[derive(Debug, serde::Serialize)]
struct SessionSummary {
    id: String,
    title: String,
    stage: String,
    customer: Option<String>,
    test_date: Option<String>,
    points: usize,
    valid_points: usize,
    ach50: Option<f64>,
    compliance: Option<ComplianceStatus>,
}

impl SessionSummary {
    fn from_session(session: &TestSession) -> Self {
        Self {
            id: session.id.to_string(),
            title: session.title.clone(),
            stage: session.stage.to_string(),
            customer: session.customer.clone(),
            test_date: session.test_date.map(|d| d.to_string()),
            points: session.points.len(),
            valid_points: session.valid_point_count(),
            ach50: session.results.as_ref().and_then(|r| r.ach50),
            compliance: session.results.as_ref().map(|r| r.compliance),
        }
    }
}

pub fn run(cmd: SessionCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SessionCommands::List(args) => run_list(args, global),
        SessionCommands::New(args) => run_new(args, global),
        SessionCommands::Show(args) => run_show(args, global),
        SessionCommands::Edit(args) => run_edit(args),
        SessionCommands::Delete(args) => run_delete(args),
    }
}

fn stage_matches(stage: Stage, filter: StageFilter) -> bool {
    match filter {
        StageFilter::Setup => stage == Stage::Setup,
        StageFilter::Weather => stage == Stage::Weather,
        StageFilter::Multipoint => stage == Stage::MultiPoint,
        StageFilter::Results => stage == Stage::Results,
        StageFilter::Report => stage == Stage::Report,
        StageFilter::All => true,
    }
}

fn verdict_matches(session: &TestSession, filter: VerdictFilter) -> bool {
    let verdict = session.results.as_ref().map(|r| r.compliance);
    match filter {
        VerdictFilter::Pass => verdict == Some(ComplianceStatus::Pass),
        VerdictFilter::Fail => verdict == Some(ComplianceStatus::Fail),
        VerdictFilter::Indeterminate => verdict == Some(ComplianceStatus::Indeterminate),
        VerdictFilter::None => verdict.is_none(),
        VerdictFilter::All => true,
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut sessions = load_all_sessions(&project);

    // Keep short IDs stable across lists
    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.rebuild(sessions.iter().map(|(s, _)| s.id.to_string()));
    if let Err(e) = short_ids.save(&project) {
        eprintln!("{} Could not save short ID index: {}", style("!").yellow(), e);
    }

    sessions.retain(|(s, _)| stage_matches(s.stage, args.stage));
    sessions.retain(|(s, _)| verdict_matches(s, args.verdict));

    if let Some(query) = &args.search {
        let query = query.to_lowercase();
        sessions.retain(|(s, _)| {
            s.title.to_lowercase().contains(&query)
                || s.customer
                    .as_deref()
                    .is_some_and(|c| c.to_lowercase().contains(&query))
                || s.site_address
                    .as_deref()
                    .is_some_and(|a| a.to_lowercase().contains(&query))
        });
    }

    match args.sort {
        // Load order is already created ascending
        SortField::Created => {}
        SortField::Title => {
            sessions.sort_by(|(a, _), (b, _)| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        }
        SortField::Date => sessions.sort_by_key(|(s, _)| s.test_date),
        SortField::Ach50 => sessions.sort_by(|(a, _), (b, _)| {
            let key = |s: &TestSession| s.results.as_ref().and_then(|r| r.ach50);
            key(a)
                .partial_cmp(&key(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
    }
    if args.reverse {
        sessions.reverse();
    }

    if let Some(limit) = args.limit {
        let skip = sessions.len().saturating_sub(limit);
        sessions.drain(..skip);
    }

    if args.count {
        println!("{}", sessions.len());
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No sessions found.");
        println!();
        println!("Create one with: {}", style("bdt session new").yellow());
        return Ok(());
    }

    match effective_format(global.format, true) {
        OutputFormat::Json => {
            let summaries: Vec<SessionSummary> = sessions
                .iter()
                .map(|(s, _)| SessionSummary::from_session(s))
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&summaries).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            let summaries: Vec<SessionSummary> = sessions
                .iter()
                .map(|(s, _)| SessionSummary::from_session(s))
                .collect();
            print!("{}", serde_yml::to_string(&summaries).into_diagnostic()?);
        }
        OutputFormat::Id => {
            for (session, _) in &sessions {
                println!("{}", session.id);
            }
        }
        OutputFormat::Path => {
            for (_, path) in &sessions {
                println!("{}", path.display());
            }
        }
        format @ (OutputFormat::Tsv | OutputFormat::Csv) => {
            for (session, _) in &sessions {
                let s = SessionSummary::from_session(session);
                let cells = vec![
                    s.id,
                    s.title,
                    s.stage,
                    s.test_date.unwrap_or_default(),
                    s.points.to_string(),
                    s.compliance.map(|c| c.to_string()).unwrap_or_default(),
                ];
                println!("{}", delimited_record(&cells, format));
            }
        }
        _ => {
            let mut table =
                TableFormatter::new(["", "ID", "TITLE", "STAGE", "DATE", "POINTS", "VERDICT"])
                    .numeric_from(5);
            for (session, _) in &sessions {
                let alias = short_ids
                    .get_short_id(&session.id.to_string())
                    .map(|n| format!("@{}", n))
                    .unwrap_or_default();
                let verdict = session
                    .results
                    .as_ref()
                    .map(|r| r.compliance.to_string())
                    .unwrap_or_else(|| "-".to_string());
                table.add_row([
                    alias,
                    format_short_id(&session.id),
                    truncate_str(&session.title, 32),
                    session.stage.to_string(),
                    session
                        .test_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    session.points.len().to_string(),
                    verdict,
                ]);
            }
            println!("{}", table.render());
            println!(
                "{} session(s) found. Reference by {} or ID.",
                style(sessions.len()).cyan(),
                style("@N").cyan()
            );
        }
    }

    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load(&project).map_err(|e| miette::miette!("{}", e))?;
    let theme = ColorfulTheme::default();

    let mut session = TestSession::new("New test session".to_string(), config.author());

    if args.interactive {
        session.title = Input::with_theme(&theme)
            .with_prompt("Title")
            .interact_text()
            .into_diagnostic()?;

        let customer: String = Input::with_theme(&theme)
            .with_prompt("Customer (optional)")
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;
        if !customer.trim().is_empty() {
            session.customer = Some(customer.trim().to_string());
        }

        let address: String = Input::with_theme(&theme)
            .with_prompt("Site address (optional)")
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;
        if !address.trim().is_empty() {
            session.site_address = Some(address.trim().to_string());
        }

        let volume: String = Input::with_theme(&theme)
            .with_prompt("Building volume, cu ft (optional)")
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;
        if !volume.trim().is_empty() {
            let parsed: f64 = volume
                .trim()
                .parse()
                .map_err(|_| miette::miette!("invalid volume: '{}'", volume))?;
            session.building.volume_cu_ft = Some(parsed);
        }
    } else {
        if let Some(title) = args.title {
            session.title = title;
        }
        session.customer = args.customer;
        session.site_address = args.address;
    }

    if let Some(date) = args.date.as_deref() {
        let parsed = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| miette::miette!("invalid date '{}', expected YYYY-MM-DD", date))?;
        session.test_date = Some(parsed);
    }

    let file_path = project.entity_path(&session.id);
    save_session(&session, &file_path)?;

    let mut short_ids = ShortIdIndex::load(&project);
    let alias = short_ids.assign(session.id.to_string());
    if let Err(e) = short_ids.save(&project) {
        eprintln!("{} Could not save short ID index: {}", style("!").yellow(), e);
    }

    match global.format {
        OutputFormat::Id => println!("{}", session.id),
        OutputFormat::Path => println!("{}", file_path.display()),
        _ => {
            println!(
                "{} Created session {} {}",
                style("✓").green(),
                style(format_short_id(&session.id)).cyan(),
                style(format!("(@{})", alias)).dim()
            );
            println!("   {}", style(file_path.display()).dim());
            println!("   {}", style(&session.title).yellow());
        }
    }

    if args.edit || (!args.no_edit && !args.interactive && global.format == OutputFormat::Auto) {
        let editor = config.editor();
        println!();
        println!("Opening in {}...", style(&editor).yellow());

        std::process::Command::new(&editor)
            .arg(&file_path)
            .status()
            .into_diagnostic()?;
    }

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (session, path) = find_session(&project, &args.id)?;

    match global.format {
        OutputFormat::Yaml => {
            let content = fs::read_to_string(&path).into_diagnostic()?;
            print!("{}", content);
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&session).into_diagnostic()?
            );
        }
        OutputFormat::Id => println!("{}", session.id),
        OutputFormat::Path => println!("{}", path.display()),
        _ => pretty_print_session(&session),
    }

    Ok(())
}

fn pretty_print_session(session: &TestSession) {
    let rule = style("─".repeat(60)).dim();

    println!("{}", rule);
    println!(
        "{}: {}",
        style("ID").bold(),
        style(session.id.to_string()).cyan()
    );
    println!(
        "{}: {}",
        style("Title").bold(),
        style(&session.title).yellow()
    );
    println!(
        "{}: {}    {}: {}",
        style("Stage").bold(),
        session.stage,
        style("Status").bold(),
        session.status
    );
    if let Some(ref customer) = session.customer {
        println!("{}: {}", style("Customer").bold(), customer);
    }
    if let Some(ref address) = session.site_address {
        println!("{}: {}", style("Site").bold(), address);
    }
    if let Some(date) = session.test_date {
        println!("{}: {}", style("Test date").bold(), date);
    }
    println!("{}", rule);

    println!("{}", style("Building").bold());
    let building = &session.building;
    if *building == Default::default() {
        println!("  (not recorded)");
    } else {
        if let Some(v) = building.volume_cu_ft {
            println!("  Volume:           {} cu ft", fmt_num(v, 0));
        }
        if let Some(a) = building.conditioned_area_sq_ft {
            println!("  Conditioned area: {} sq ft", fmt_num(a, 0));
        }
        if let Some(a) = building.surface_area_sq_ft {
            println!("  Surface area:     {} sq ft", fmt_num(a, 0));
        }
        if let Some(stories) = building.stories {
            println!("  Stories:          {}", stories);
        }
        if let Some(basement) = building.basement {
            println!("  Basement:         {}", basement);
        }
    }

    println!("{}", style("Weather").bold());
    let weather = &session.weather;
    if weather.is_empty() {
        println!("  (not recorded)");
    } else {
        if weather.indoor_temp_f.is_some() || weather.outdoor_temp_f.is_some() {
            println!(
                "  Indoor {} F   Outdoor {} F",
                fmt_opt(weather.indoor_temp_f, 1),
                fmt_opt(weather.outdoor_temp_f, 1)
            );
        }
        if weather.indoor_humidity_pct.is_some() || weather.outdoor_humidity_pct.is_some() {
            println!(
                "  Humidity in {} %   out {} %",
                fmt_opt(weather.indoor_humidity_pct, 0),
                fmt_opt(weather.outdoor_humidity_pct, 0)
            );
        }
        if let Some(wind) = weather.wind_speed_mph {
            println!("  Wind {} mph", fmt_num(wind, 0));
        }
        if weather.barometric_in_hg.is_some() || weather.altitude_ft.is_some() {
            println!(
                "  Barometric {} inHg   Altitude {} ft",
                fmt_opt(weather.barometric_in_hg, 2),
                fmt_opt(weather.altitude_ft, 0)
            );
        }
    }

    println!(
        "{} ({} recorded, {} valid)",
        style("Points").bold(),
        session.points.len(),
        session.valid_point_count()
    );
    if !session.points.is_empty() {
        let mut table = TableFormatter::new(["IDX", "TARGET Pa", "FAN Pa", "RING", "CFM", "NOTE"])
            .numeric_from(1);
        if let Some(ref results) = session.results {
            for point in &results.points {
                table.add_row([
                    point.index.to_string(),
                    fmt_num(point.target_pa, 1),
                    fmt_num(point.fan_pa, 1),
                    point.ring.label().to_string(),
                    fmt_opt(point.cfm, 1),
                    point.issue.map(|i| i.to_string()).unwrap_or_default(),
                ]);
            }
        } else {
            for point in &session.points {
                table.add_row([
                    point.index.to_string(),
                    fmt_num(point.target_pa, 1),
                    fmt_num(point.fan_pa, 1),
                    point.ring.label().to_string(),
                    "-".to_string(),
                    validate_point(point)
                        .map(|i| i.to_string())
                        .unwrap_or_default(),
                ]);
            }
        }
        println!("{}", table.render());
    }

    match session.results {
        Some(ref results) => {
            println!("{}", style("Results").bold());
            let margin = results
                .margin_ach50
                .map(|m| format!("  (margin {:+.2} ACH50)", m))
                .unwrap_or_default();
            println!(
                "  Verdict: {}{}",
                styled_verdict(results.compliance),
                margin
            );
            println!("  CFM50:   {}", fmt_num(results.cfm50, 1));
            match results.ach50 {
                Some(ach50) => println!(
                    "  ACH50:   {}  (limit {})",
                    fmt_num(ach50, 2),
                    fmt_num(results.threshold_ach50, 2)
                ),
                None => println!(
                    "  ACH50:   -  (building volume missing, limit {})",
                    fmt_num(results.threshold_ach50, 2)
                ),
            }
            if let Some(ela) = results.ela_sq_in {
                println!("  ELA:     {} sq in at 4 Pa", fmt_num(ela, 1));
            }
            println!(
                "  Fit:     Q = {} * dP^{}   r2 {}   ({} points)",
                fmt_num(results.fit.flow_coefficient, 2),
                fmt_num(results.fit.flow_exponent, 3),
                fmt_num(results.fit.r_squared, 4),
                results.fit.point_count
            );
            println!(
                "  Corrections: temperature x{} ({})   density x{} ({})",
                fmt_num(results.temperature_correction_factor, 4),
                if results.weather_corrected {
                    "applied"
                } else {
                    "not applied"
                },
                fmt_num(results.altitude_correction_factor, 4),
                if results.altitude_corrected {
                    "applied"
                } else {
                    "not applied"
                }
            );
            if let Some(at) = session.calculated_at {
                println!(
                    "  {}",
                    style(format!("Calculated {}", at.format("%Y-%m-%d %H:%M UTC"))).dim()
                );
            }
        }
        None => {
            println!(
                "{}  (none stored; run {})",
                style("Results").bold(),
                style("bdt calc").yellow()
            );
        }
    }

    println!("{}", rule);
    println!(
        "{}: {} | {}: {}",
        style("Author").dim(),
        session.author,
        style("Created").dim(),
        session.created.format("%Y-%m-%d %H:%M")
    );
}

fn run_edit(args: EditArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load(&project).map_err(|e| miette::miette!("{}", e))?;
    let (session, path) = find_session(&project, &args.id)?;

    let editor = config.editor();
    println!(
        "Opening {} in {}...",
        style(format_short_id(&session.id)).cyan(),
        style(&editor).yellow()
    );

    std::process::Command::new(&editor)
        .arg(&path)
        .status()
        .into_diagnostic()?;

    Ok(())
}

fn run_delete(args: DeleteArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (session, path) = find_session(&project, &args.id)?;

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Delete session {} '{}'?",
                format_short_id(&session.id),
                session.title
            ))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    fs::remove_file(&path).into_diagnostic()?;
    println!(
        "{} Deleted session {}",
        style("✓").green(),
        style(format_short_id(&session.id)).cyan()
    );
    println!("   {}", style(path.display()).dim());

    Ok(())
}
