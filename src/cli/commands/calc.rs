//! `bdt calc` command - Fit the leakage curve and evaluate compliance

use std::path::PathBuf;

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{save_session, styled_verdict, target_session};
use crate::cli::helpers::{fmt_num, format_short_id};
use crate::cli::table::TableFormatter;
use crate::cli::viz::{render_fit_plot, render_margin_bar};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::engine::{validate_point, CalculationError};
use crate::core::project::Project;
use crate::core::regression::MIN_VALID_POINTS;
use crate::core::Config;
use crate::entities::session::{Stage, TestResult, TestSession};

#[derive(clap::Args, Debug)]
pub struct CalcArgs {
    /// Session to calculate (default: the newest session)
    #[arg()]
    pub session: Option<String>,

    /// Compliance threshold in ACH50 (default: project config, then 3.0)
    #[arg(long, short = 't')]
    pub threshold: Option<f64>,

    /// Draw the leakage curve on log-log axes
    #[arg(long)]
    pub plot: bool,

    /// Export the evaluated points to a CSV file
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Compute and print only; do not store the result on the session
    #[arg(long)]
    pub no_store: bool,
}

pub fn run(args: CalcArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load(&project).map_err(|e| miette::miette!("{}", e))?;
    let (mut session, path) = target_session(&project, args.session.as_deref())?;

    let threshold = args.threshold.unwrap_or_else(|| config.threshold_ach50());
    if threshold <= 0.0 {
        return Err(miette::miette!(
            "threshold must be positive, got {}",
            threshold
        ));
    }

    let result = match session.calculate(threshold) {
        Ok(result) => result,
        Err(e @ CalculationError::InsufficientPoints { .. }) => {
            print_gate_refusal(&session);
            return Err(miette::miette!("{}", e));
        }
        Err(e) => return Err(miette::miette!("{}", e)),
    };

    match global.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&result).into_diagnostic()?
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&result).into_diagnostic()?);
        }
        _ => print_result(&session, &result, args.threshold.is_some(), &config, args.plot),
    }

    if let Some(csv_path) = &args.csv {
        export_points_csv(&result, csv_path)?;
        println!(
            "{} Exported {} point(s) to {}",
            style("✓").green(),
            result.points.len(),
            style(csv_path.display()).dim()
        );
    }

    if !args.no_store {
        session.record_results(result);
        // Exporting the point table counts as reporting the test out
        if args.csv.is_some() {
            session.advance_stage(Stage::Report);
        }
        save_session(&session, &path)?;
        println!(
            "{} Stored results on {} (stage: {})",
            style("✓").green(),
            style(format_short_id(&session.id)).cyan(),
            session.stage
        );
    }

    Ok(())
}

/// Explain exactly why the multi-point gate refused, point by point
fn print_gate_refusal(session: &TestSession) {
    let valid = session.valid_point_count();
    println!(
        "{} Only {} valid point(s) recorded; a multi-point fit needs {}.",
        style("✗").red(),
        valid,
        MIN_VALID_POINTS
    );

    if !session.points.is_empty() {
        println!();
        for point in &session.points {
            match validate_point(point) {
                None => println!(
                    "  {} point {}: {} Pa target, {} Pa fan, {}",
                    style("✓").green(),
                    point.index,
                    fmt_num(point.target_pa, 1),
                    fmt_num(point.fan_pa, 1),
                    point.ring.label()
                ),
                Some(issue) => println!(
                    "  {} point {}: {}",
                    style("✗").red(),
                    point.index,
                    issue
                ),
            }
        }
    }

    println!();
    println!(
        "Record more points with: {}",
        style("bdt point add -i").yellow()
    );
}

fn print_result(
    session: &TestSession,
    result: &TestResult,
    threshold_from_flag: bool,
    config: &Config,
    plot: bool,
) {
    let rule = style("─".repeat(60)).dim();

    println!("{}", rule);
    println!(
        "{} {} {}",
        style("Test result for").bold(),
        style(format_short_id(&session.id)).cyan(),
        style(&session.title).yellow()
    );
    println!("{}", rule);

    let mut table = TableFormatter::new(["IDX", "TARGET Pa", "FAN Pa", "RING", "CFM", "NOTE"])
        .numeric_from(1);
    for point in &result.points {
        table.add_row([
            point.index.to_string(),
            fmt_num(point.target_pa, 1),
            fmt_num(point.fan_pa, 1),
            point.ring.label().to_string(),
            point
                .cfm
                .map(|q| fmt_num(q, 1))
                .unwrap_or_else(|| "-".to_string()),
            point.issue.map(|i| i.to_string()).unwrap_or_default(),
        ]);
    }
    println!("{}", table.render());

    println!(
        "  Fit:     Q = {} * dP^{}   r2 {}   ({} points)",
        fmt_num(result.fit.flow_coefficient, 2),
        fmt_num(result.fit.flow_exponent, 3),
        fmt_num(result.fit.r_squared, 4),
        result.fit.point_count
    );
    println!("  CFM50:   {}", fmt_num(result.cfm50, 1));
    match result.ach50 {
        Some(ach50) => println!("  ACH50:   {}", fmt_num(ach50, 2)),
        None => println!(
            "  ACH50:   -  (set a building volume with {})",
            style("bdt building set --volume <cu ft>").yellow()
        ),
    }
    if let Some(ela) = result.ela_sq_in {
        println!("  ELA:     {} sq in at 4 Pa", fmt_num(ela, 1));
    }
    if threshold_from_flag {
        println!(
            "  Limit:   {} ACH50 (from --threshold)",
            fmt_num(result.threshold_ach50, 2)
        );
    } else {
        println!(
            "  Limit:   {} ACH50 ({})",
            fmt_num(result.threshold_ach50, 2),
            config.jurisdiction.name
        );
    }
    println!(
        "  Corrections: temperature x{} ({})   density x{} ({})",
        fmt_num(result.temperature_correction_factor, 4),
        if result.weather_corrected {
            "applied"
        } else {
            "not applied"
        },
        fmt_num(result.altitude_correction_factor, 4),
        if result.altitude_corrected {
            "applied"
        } else {
            "not applied"
        }
    );

    println!();
    let margin = result
        .margin_ach50
        .map(|m| format!("  (margin {:+.2} ACH50)", m))
        .unwrap_or_default();
    println!("  Verdict: {}{}", styled_verdict(result.compliance), margin);
    if let Some(ach50) = result.ach50 {
        println!("{}", render_margin_bar(ach50, result.threshold_ach50));
    }

    if plot {
        println!();
        println!("{}", render_fit_plot(&result.points, &result.fit));
    }
    println!("{}", rule);
}

/// Write the evaluated points as CSV
fn export_points_csv(result: &TestResult, path: &PathBuf) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).into_diagnostic()?;
    writer
        .write_record(["index", "target_pa", "fan_pa", "ring", "cfm", "issue"])
        .into_diagnostic()?;

    for point in &result.points {
        writer
            .write_record([
                point.index.to_string(),
                point.target_pa.to_string(),
                point.fan_pa.to_string(),
                point.ring.to_string(),
                point.cfm.map(|q| q.to_string()).unwrap_or_default(),
                point.issue.map(|i| i.to_string()).unwrap_or_default(),
            ])
            .into_diagnostic()?;
    }

    writer.flush().into_diagnostic()?;
    Ok(())
}
