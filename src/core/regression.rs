//! Multi-point power-law regression
//!
//! Fits the infiltration model `Q = C · ΔP^n` by ordinary least squares in
//! log-log space (`ln Q = ln C + n · ln ΔP`), the standard reduction for
//! multi-point blower door analysis. The flow exponent of a real leakage
//! path lands near 0.5 (orifice flow) to 1.0 (laminar flow); the fit does
//! not clamp to that range, callers may treat excursions as a quality flag.

use crate::core::engine::CalculationError;
use crate::entities::session::PowerLawFit;

/// Minimum number of valid points for a defensible multi-point fit
pub const MIN_VALID_POINTS: usize = 5;

/// Fit `Q = C · ΔP^n` to `(building pressure Pa, flow CFM)` pairs.
///
/// Pairs must have positive pressure and flow; point validation guarantees
/// that upstream. Duplicate pairs are treated as independent samples and
/// ordering does not affect the fitted model.
pub fn fit_power_law(pairs: &[(f64, f64)]) -> Result<PowerLawFit, CalculationError> {
    if pairs.len() < MIN_VALID_POINTS {
        return Err(CalculationError::InsufficientPoints {
            valid: pairs.len(),
        });
    }

    let count = pairs.len() as f64;
    let xs: Vec<f64> = pairs.iter().map(|(dp, _)| dp.ln()).collect();
    let ys: Vec<f64> = pairs.iter().map(|(_, q)| q.ln()).collect();

    let x_mean = xs.iter().sum::<f64>() / count;
    let y_mean = ys.iter().sum::<f64>() / count;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    // Every point at one target pressure leaves the slope undefined
    if sxx == 0.0 {
        return Err(CalculationError::NoPressureSpread);
    }

    let flow_exponent = sxy / sxx;
    let flow_coefficient = (y_mean - flow_exponent * x_mean).exp();
    // Zero flow variance means the data is exactly a constant: perfect fit
    let r_squared = if syy == 0.0 {
        1.0
    } else {
        (sxy * sxy) / (sxx * syy)
    };

    Ok(PowerLawFit {
        flow_coefficient,
        flow_exponent,
        r_squared,
        point_count: pairs.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic(coefficient: f64, exponent: f64, pressures: &[f64]) -> Vec<(f64, f64)> {
        pressures
            .iter()
            .map(|&dp| (dp, coefficient * dp.powf(exponent)))
            .collect()
    }

    #[test]
    fn test_recovers_exact_power_law() {
        let pairs = synthetic(60.0, 0.65, &[15.0, 25.0, 35.0, 50.0, 60.0]);
        let fit = fit_power_law(&pairs).unwrap();
        assert!((fit.flow_coefficient - 60.0).abs() < 1e-9);
        assert!((fit.flow_exponent - 0.65).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(fit.point_count, 5);
    }

    #[test]
    fn test_minimum_point_gate() {
        let four = synthetic(60.0, 0.65, &[20.0, 30.0, 40.0, 50.0]);
        assert_eq!(
            fit_power_law(&four),
            Err(CalculationError::InsufficientPoints { valid: 4 })
        );

        let five = synthetic(60.0, 0.65, &[20.0, 30.0, 40.0, 50.0, 60.0]);
        assert!(fit_power_law(&five).is_ok());
    }

    #[test]
    fn test_no_pressure_spread() {
        let pairs = vec![(50.0, 500.0); 5];
        assert_eq!(fit_power_law(&pairs), Err(CalculationError::NoPressureSpread));
    }

    #[test]
    fn test_duplicates_are_independent_samples() {
        let mut pairs = synthetic(60.0, 0.65, &[20.0, 30.0, 40.0, 50.0]);
        let dup = pairs[3];
        pairs.push(dup);
        let fit = fit_power_law(&pairs).unwrap();
        assert_eq!(fit.point_count, 5);
        assert!((fit.flow_exponent - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_order_independent() {
        let pairs = synthetic(55.0, 0.58, &[18.0, 28.0, 38.0, 48.0, 58.0]);
        let mut reversed = pairs.clone();
        reversed.reverse();
        let a = fit_power_law(&pairs).unwrap();
        let b = fit_power_law(&reversed).unwrap();
        assert!((a.flow_coefficient - b.flow_coefficient).abs() < 1e-9);
        assert!((a.flow_exponent - b.flow_exponent).abs() < 1e-12);
    }

    #[test]
    fn test_noisy_data_degrades_r_squared() {
        let mut pairs = synthetic(60.0, 0.65, &[15.0, 25.0, 35.0, 50.0, 60.0]);
        pairs[2].1 *= 1.15;
        let fit = fit_power_law(&pairs).unwrap();
        assert!(fit.r_squared < 1.0);
        assert!(fit.r_squared > 0.8);
    }
}
