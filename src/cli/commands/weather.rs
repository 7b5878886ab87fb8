//! `bdt weather` command - Weather block entry
//!
//! Weather is never required: corrections apply only to the fields that are
//! actually recorded here, and `weather clear` returns a session to the
//! uncorrected baseline.

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::commands::utils::{note_results_cleared, save_session, target_session};
use crate::cli::helpers::{fmt_opt, format_short_id};
use crate::core::corrections::FlowCorrections;
use crate::core::project::Project;
use crate::entities::session::{Stage, WeatherConditions};

#[derive(Subcommand, Debug)]
pub enum WeatherCommands {
    /// Record weather observations on a session
    Set(SetArgs),

    /// Remove the weather block from a session
    Clear(ClearArgs),
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Session to update (default: the newest session)
    #[arg(long, short = 's')]
    pub session: Option<String>,

    /// Indoor temperature, degrees F
    #[arg(long)]
    pub indoor_temp: Option<f64>,

    /// Outdoor temperature, degrees F
    #[arg(long)]
    pub outdoor_temp: Option<f64>,

    /// Indoor relative humidity, percent
    #[arg(long)]
    pub indoor_humidity: Option<f64>,

    /// Outdoor relative humidity, percent
    #[arg(long)]
    pub outdoor_humidity: Option<f64>,

    /// Wind speed, mph
    #[arg(long)]
    pub wind: Option<f64>,

    /// Station barometric pressure, inHg
    #[arg(long)]
    pub barometric: Option<f64>,

    /// Site altitude, feet above sea level
    #[arg(long)]
    pub altitude: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct ClearArgs {
    /// Session to update (default: the newest session)
    #[arg(long, short = 's')]
    pub session: Option<String>,
}

pub fn run(cmd: WeatherCommands) -> Result<()> {
    match cmd {
        WeatherCommands::Set(args) => run_set(args),
        WeatherCommands::Clear(args) => run_clear(args),
    }
}

fn run_set(args: SetArgs) -> Result<()> {
    if args.indoor_temp.is_none()
        && args.outdoor_temp.is_none()
        && args.indoor_humidity.is_none()
        && args.outdoor_humidity.is_none()
        && args.wind.is_none()
        && args.barometric.is_none()
        && args.altitude.is_none()
    {
        return Err(miette::miette!(
            "nothing to set; pass at least one weather field"
        ));
    }

    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (mut session, path) = target_session(&project, args.session.as_deref())?;

    let had_results = session.results.is_some();
    session.invalidate_results();

    let weather = &mut session.weather;
    if let Some(t) = args.indoor_temp {
        weather.indoor_temp_f = Some(t);
    }
    if let Some(t) = args.outdoor_temp {
        weather.outdoor_temp_f = Some(t);
    }
    if let Some(h) = args.indoor_humidity {
        weather.indoor_humidity_pct = Some(h);
    }
    if let Some(h) = args.outdoor_humidity {
        weather.outdoor_humidity_pct = Some(h);
    }
    if let Some(w) = args.wind {
        weather.wind_speed_mph = Some(w);
    }
    if let Some(p) = args.barometric {
        weather.barometric_in_hg = Some(p);
    }
    if let Some(a) = args.altitude {
        weather.altitude_ft = Some(a);
    }

    session.advance_stage(Stage::Weather);
    save_session(&session, &path)?;

    println!(
        "{} Updated weather on {}",
        style("✓").green(),
        style(format_short_id(&session.id)).cyan()
    );

    let corrections = FlowCorrections::from_weather(&session.weather);
    if corrections.weather_corrected || corrections.altitude_corrected {
        println!(
            "   Correction factors now: temperature x{:.4}, density x{:.4}",
            corrections.temperature_factor, corrections.altitude_factor
        );
    } else if !session.weather.has_temperature_pair() {
        println!(
            "   {} temperatures: indoor {} F, outdoor {} F (both needed for the stack correction)",
            style("note").dim(),
            fmt_opt(session.weather.indoor_temp_f, 1),
            fmt_opt(session.weather.outdoor_temp_f, 1)
        );
    }
    note_results_cleared(had_results, &session);

    Ok(())
}

fn run_clear(args: ClearArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (mut session, path) = target_session(&project, args.session.as_deref())?;

    if session.weather.is_empty() {
        println!("No weather recorded; nothing to clear.");
        return Ok(());
    }

    let had_results = session.results.is_some();
    session.invalidate_results();
    session.weather = WeatherConditions::default();
    save_session(&session, &path)?;

    println!(
        "{} Cleared weather on {} (future calcs use uncorrected flows)",
        style("✓").green(),
        style(format_short_id(&session.id)).cyan()
    );
    note_results_cleared(had_results, &session);

    Ok(())
}
