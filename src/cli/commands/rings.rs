//! `bdt rings` command - Fan calibration table

use console::style;
use miette::Result;

use crate::cli::helpers::fmt_num;
use crate::cli::table::TableFormatter;
use crate::core::calibration::FanRing;

#[derive(clap::Args, Debug)]
pub struct RingsArgs {
    /// Fan pressures to tabulate, Pa
    #[arg(
        long,
        short = 'p',
        value_delimiter = ',',
        default_values_t = vec![10.0, 25.0, 50.0, 75.0]
    )]
    pub pressures: Vec<f64>,
}

pub fn run(args: RingsArgs) -> Result<()> {
    for &pressure in &args.pressures {
        if pressure <= 0.0 {
            return Err(miette::miette!(
                "fan pressures must be positive, got {}",
                pressure
            ));
        }
    }

    let mut headers: Vec<String> = vec!["RING".into(), "c".into(), "n".into()];
    headers.extend(
        args.pressures
            .iter()
            .map(|p| format!("CFM @{} Pa", fmt_num(*p, 0))),
    );

    let mut table = TableFormatter::new(headers).numeric_from(1);
    for ring in FanRing::ALL {
        let curve = ring.curve();
        let mut row = vec![
            ring.label().to_string(),
            fmt_num(curve.coefficient, 2),
            fmt_num(curve.exponent, 3),
        ];
        row.extend(
            args.pressures
                .iter()
                .map(|p| fmt_num(ring.flow_cfm(*p), 1)),
        );
        table.add_row(row);
    }

    println!("{}", table.render());
    println!(
        "{}",
        style("Q = c * dPfan^n per installed ring; smaller rings resolve smaller leaks.").dim()
    );

    Ok(())
}
