//! Terminal visualization using braille graphics
//!
//! Renders the fitted leakage curve against the measured points on log-log
//! axes, where a good power-law fit reads as a straight line, plus a simple
//! bar showing where the result landed relative to the compliance limit.

use drawille::Canvas;

use crate::core::engine::REFERENCE_PRESSURE_PA;
use crate::entities::session::{PointResult, PowerLawFit};

/// Canvas size for the fit plot, in braille dots
pub const PLOT_WIDTH: u32 = 100;
pub const PLOT_HEIGHT: u32 = 44;

/// Render the leakage curve fit on log-log axes
///
/// The fitted line is drawn across the pressure window and each valid
/// measured point is overlaid as a 2x2 dot cluster. The 50 Pa reference
/// pressure gets a dotted vertical guide.
pub fn render_fit_plot(points: &[PointResult], fit: &PowerLawFit) -> String {
    let measured: Vec<(f64, f64)> = points
        .iter()
        .filter(|p| p.is_valid())
        .filter_map(|p| p.cfm.map(|q| (p.target_pa, q)))
        .filter(|(dp, q)| *dp > 0.0 && *q > 0.0)
        .collect();

    if measured.is_empty() {
        return "  (no valid points to plot)".to_string();
    }

    let x_lo = measured
        .iter()
        .map(|(dp, _)| *dp)
        .fold(REFERENCE_PRESSURE_PA, f64::min);
    let x_hi = measured
        .iter()
        .map(|(dp, _)| *dp)
        .fold(REFERENCE_PRESSURE_PA, f64::max);

    let lx_min = (x_lo * 0.9).ln();
    let lx_max = (x_hi * 1.1).ln();
    if !(lx_max - lx_min).is_finite() || lx_max <= lx_min {
        return "  (pressure range too narrow to plot)".to_string();
    }

    let mut q_lo = f64::INFINITY;
    let mut q_hi = 0.0f64;
    for &(_, q) in &measured {
        q_lo = q_lo.min(q);
        q_hi = q_hi.max(q);
    }
    for lx in [lx_min, lx_max] {
        let q = fit.flow_at(lx.exp());
        if q > 0.0 {
            q_lo = q_lo.min(q);
            q_hi = q_hi.max(q);
        }
    }
    let ly_min = (q_lo * 0.9).ln();
    let ly_max = (q_hi * 1.1).ln();
    if ly_max <= ly_min {
        return "  (flow range too narrow to plot)".to_string();
    }

    let px_of = |lx: f64| (lx - lx_min) / (lx_max - lx_min) * (PLOT_WIDTH - 1) as f64;
    let py_of =
        |ly: f64| (PLOT_HEIGHT - 1) as f64 - (ly - ly_min) / (ly_max - ly_min) * (PLOT_HEIGHT - 1) as f64;

    let mut canvas = Canvas::new(PLOT_WIDTH, PLOT_HEIGHT);

    // Dotted guide at the 50 Pa reference pressure
    let ref_ln = REFERENCE_PRESSURE_PA.ln();
    if ref_ln >= lx_min && ref_ln <= lx_max {
        let gx = px_of(ref_ln) as u32;
        for y in (0..PLOT_HEIGHT).step_by(4) {
            canvas.set(gx, y);
        }
    }

    // Fitted line
    let steps = 160;
    for i in 0..=steps {
        let lx = lx_min + (lx_max - lx_min) * (i as f64) / (steps as f64);
        let q = fit.flow_at(lx.exp());
        if q <= 0.0 {
            continue;
        }
        let ly = q.ln();
        if ly < ly_min || ly > ly_max {
            continue;
        }
        canvas.set(px_of(lx) as u32, py_of(ly) as u32);
    }

    // Measured points as 2x2 clusters so they stand out from the line
    for &(dp, q) in &measured {
        let px = px_of(dp.ln()) as u32;
        let py = py_of(q.ln()) as u32;
        for dx in 0..2 {
            for dy in 0..2 {
                canvas.set(
                    (px + dx).min(PLOT_WIDTH - 1),
                    (py + dy).min(PLOT_HEIGHT - 1),
                );
            }
        }
    }

    let mut output = String::new();
    output.push_str("Leakage curve (log-log):\n");
    output.push_str(&canvas.frame());
    output.push_str(&format!(
        "\n  dP {:.0}-{:.0} Pa   flow {:.0}-{:.0} CFM   fit Q = {:.2} * dP^{:.3}  (r2 {:.4})",
        x_lo, x_hi, q_lo, q_hi, fit.flow_coefficient, fit.flow_exponent, fit.r_squared
    ));

    output
}

/// Render a 1D bar of the result against the compliance limit
///
/// The limit marker becomes a crossing when the result overshoots it.
pub fn render_margin_bar(ach50: f64, threshold: f64) -> String {
    let bar_width = 60usize;
    let view_max = (threshold.max(ach50) * 1.25).max(f64::MIN_POSITIVE);

    let pos_of = |v: f64| {
        (((v / view_max) * bar_width as f64) as usize).min(bar_width - 1)
    };
    let pos_limit = pos_of(threshold);
    let pos_result = pos_of(ach50);

    let mut bar: Vec<char> = vec!['─'; bar_width];
    for slot in bar.iter_mut().take(pos_result + 1) {
        *slot = '═';
    }
    bar[pos_limit] = if pos_result >= pos_limit { '╋' } else { '│' };

    let bar_str: String = bar.into_iter().collect();
    format!(
        "  0 {} {:.2}\n    result={:.2} ACH50   limit={:.2}   margin={:+.2}",
        bar_str,
        view_max,
        ach50,
        threshold,
        threshold - ach50
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calibration::FanRing;

    fn sample_fit() -> PowerLawFit {
        PowerLawFit {
            flow_coefficient: 49.57,
            flow_exponent: 0.598,
            r_squared: 0.9998,
            point_count: 5,
        }
    }

    fn sample_points() -> Vec<PointResult> {
        [(50.0, 45.0), (45.0, 40.0), (40.0, 35.0), (35.0, 30.0), (30.0, 25.0)]
            .iter()
            .enumerate()
            .map(|(i, &(target, fan))| PointResult {
                index: (i + 1) as u32,
                target_pa: target,
                fan_pa: fan,
                ring: FanRing::Open,
                cfm: Some(FanRing::Open.flow_cfm(fan)),
                issue: None,
            })
            .collect()
    }

    #[test]
    fn test_fit_plot_contains_braille() {
        let output = render_fit_plot(&sample_points(), &sample_fit());

        assert!(output
            .chars()
            .any(|c| c as u32 >= 0x2800 && c as u32 <= 0x28FF));
        assert!(output.contains("dP 30-50 Pa"));
        assert!(output.contains("0.598"));
    }

    #[test]
    fn test_fit_plot_without_points() {
        let output = render_fit_plot(&[], &sample_fit());
        assert!(output.contains("no valid points"));
    }

    #[test]
    fn test_margin_bar_pass_and_fail() {
        let pass = render_margin_bar(2.57, 3.0);
        assert!(pass.contains("margin=+0.43"));
        assert!(pass.contains('│'));

        let fail = render_margin_bar(3.2, 3.0);
        assert!(fail.contains("margin=-0.20"));
        assert!(fail.contains('╋'));
    }
}
