//! The measurement-to-verdict pipeline
//!
//! `compute_result` is the engine's single entry point: a pure function of
//! an immutable snapshot of points, building profile, weather, and the code
//! threshold. No I/O, no clock, no randomness; identical inputs reproduce
//! an identical `TestResult`, so callers may re-run it freely and compare.

use thiserror::Error;

use crate::core::corrections::FlowCorrections;
use crate::core::regression::{fit_power_law, MIN_VALID_POINTS};
use crate::entities::session::{
    BuildingProfile, ComplianceStatus, PointIssue, PointResult, PowerLawFit, TestPoint,
    TestResult, WeatherConditions,
};

/// Reference envelope pressure for code metrics, Pa
pub const REFERENCE_PRESSURE_PA: f64 = 50.0;

/// Reference pressure for effective leakage area, Pa (LBL convention)
const ELA_REFERENCE_PA: f64 = 4.0;

/// Air density at the ELA reference conditions, kg/m³
const AIR_DENSITY_KG_M3: f64 = 1.2041;

const CFM_TO_M3_PER_S: f64 = 4.719474e-4;
const SQ_M_TO_SQ_IN: f64 = 1550.0031;

/// Errors that abort a calculation outright.
///
/// Missing weather never lands here (corrections are opportunistic) and a
/// missing building volume never lands here either (the result comes back
/// with ACH50/ELA/compliance marked indeterminate instead).
#[derive(Debug, Error, PartialEq)]
pub enum CalculationError {
    #[error("only {valid} valid point(s); a multi-point fit needs {}", MIN_VALID_POINTS)]
    InsufficientPoints { valid: usize },

    #[error("all valid points share one target pressure; vary the induced pressure and re-measure")]
    NoPressureSpread,
}

/// Classify one raw point; `None` means it enters the regression
pub fn validate_point(point: &TestPoint) -> Option<PointIssue> {
    if point.fan_pa <= 0.0 {
        Some(PointIssue::NonPositiveFanPressure)
    } else if point.target_pa <= 0.0 {
        Some(PointIssue::NonPositiveTargetPressure)
    } else {
        None
    }
}

/// ACH50 from CFM50 and a positive building volume
pub fn ach50_from(cfm50: f64, volume_cu_ft: f64) -> f64 {
    cfm50 * 60.0 / volume_cu_ft
}

/// Compare ACH50 against the jurisdiction threshold.
///
/// Boundary equality passes. A missing ACH50 yields Indeterminate with no
/// margin, never a sentinel number.
pub fn evaluate_compliance(
    ach50: Option<f64>,
    threshold_ach50: f64,
) -> (ComplianceStatus, Option<f64>) {
    match ach50 {
        Some(value) => {
            let status = if value <= threshold_ach50 {
                ComplianceStatus::Pass
            } else {
                ComplianceStatus::Fail
            };
            (status, Some(threshold_ach50 - value))
        }
        None => (ComplianceStatus::Indeterminate, None),
    }
}

/// Effective leakage area in square inches, LBL single-orifice model:
/// the fit's flow at 4 Pa converted to the equivalent sharp-edged orifice
/// area via `A = Q · sqrt(ρ / 2ΔP)` with a discharge coefficient of 1.
fn effective_leakage_area(fit: &PowerLawFit) -> f64 {
    let q4_m3_s = fit.flow_at(ELA_REFERENCE_PA) * CFM_TO_M3_PER_S;
    let area_m2 = q4_m3_s * (AIR_DENSITY_KG_M3 / (2.0 * ELA_REFERENCE_PA)).sqrt();
    area_m2 * SQ_M_TO_SQ_IN
}

/// Run the full pipeline over an immutable snapshot of inputs.
///
/// Excluded points are carried through to the result with their issue so
/// the caller can render per-point validity. Corrections scale the flow
/// series before the fit; metrics then come from the corrected fit.
pub fn compute_result(
    points: &[TestPoint],
    building: &BuildingProfile,
    weather: &WeatherConditions,
    threshold_ach50: f64,
) -> Result<TestResult, CalculationError> {
    let corrections = FlowCorrections::from_weather(weather);
    let factor = corrections.combined();

    let mut evaluated = Vec::with_capacity(points.len());
    let mut pairs = Vec::with_capacity(points.len());

    for point in points {
        let issue = validate_point(point);
        let cfm = match issue {
            Some(_) => None,
            None => {
                let cfm = point.ring.flow_cfm(point.fan_pa) * factor;
                pairs.push((point.target_pa, cfm));
                Some(cfm)
            }
        };
        evaluated.push(PointResult {
            index: point.index,
            target_pa: point.target_pa,
            fan_pa: point.fan_pa,
            ring: point.ring,
            cfm,
            issue,
        });
    }

    if pairs.len() < MIN_VALID_POINTS {
        return Err(CalculationError::InsufficientPoints {
            valid: pairs.len(),
        });
    }

    let fit = fit_power_law(&pairs)?;
    let cfm50 = fit.flow_at(REFERENCE_PRESSURE_PA);

    let ach50 = building
        .volume_cu_ft
        .filter(|v| *v > 0.0)
        .map(|v| ach50_from(cfm50, v));

    let all_points_valid = pairs.len() == points.len();
    let ela_sq_in = if all_points_valid && building.has_volume() {
        Some(effective_leakage_area(&fit))
    } else {
        None
    };

    let (compliance, margin_ach50) = evaluate_compliance(ach50, threshold_ach50);

    Ok(TestResult {
        cfm50,
        ach50,
        ela_sq_in,
        fit,
        weather_corrected: corrections.weather_corrected,
        temperature_correction_factor: corrections.temperature_factor,
        altitude_corrected: corrections.altitude_corrected,
        altitude_correction_factor: corrections.altitude_factor,
        threshold_ach50,
        compliance,
        margin_ach50,
        points: evaluated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calibration::FanRing;

    fn open_points(readings: &[(f64, f64)]) -> Vec<TestPoint> {
        readings
            .iter()
            .enumerate()
            .map(|(i, (target, fan))| TestPoint {
                index: i as u32 + 1,
                target_pa: *target,
                fan_pa: *fan,
                ring: FanRing::Open,
            })
            .collect()
    }

    /// The standard five-point depressurization sequence used across tests
    fn standard_points() -> Vec<TestPoint> {
        open_points(&[
            (50.0, 45.0),
            (45.0, 40.0),
            (40.0, 35.0),
            (35.0, 30.0),
            (30.0, 25.0),
        ])
    }

    fn building_with_volume(volume: f64) -> BuildingProfile {
        BuildingProfile {
            volume_cu_ft: Some(volume),
            ..BuildingProfile::default()
        }
    }

    fn no_weather() -> WeatherConditions {
        WeatherConditions::default()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let result = compute_result(
            &standard_points(),
            &building_with_volume(12000.0),
            &no_weather(),
            3.0,
        )
        .unwrap();

        let ach50 = result.ach50.unwrap();
        assert!(ach50 > 2.0 && ach50 < 3.0, "ach50 = {}", ach50);
        assert_eq!(result.compliance, ComplianceStatus::Pass);
        assert!(result.margin_ach50.unwrap() > 0.0);

        // Physically sensible fit for clean synthetic data
        assert!(result.fit.flow_exponent > 0.5 && result.fit.flow_exponent < 1.0);
        assert!(result.fit.r_squared > 0.99);
        assert_eq!(result.fit.point_count, 5);

        // No weather data: factors reported as identity, flags off
        assert!(!result.weather_corrected);
        assert_eq!(result.temperature_correction_factor, 1.0);
        assert!(!result.altitude_corrected);
        assert_eq!(result.altitude_correction_factor, 1.0);

        // Full valid point set plus volume makes ELA available
        assert!(result.ela_sq_in.unwrap() > 0.0);
    }

    #[test]
    fn test_minimum_points_gate_at_four_and_five() {
        let mut points = standard_points();
        points.pop();
        let err = compute_result(&points, &building_with_volume(12000.0), &no_weather(), 3.0)
            .unwrap_err();
        assert_eq!(err, CalculationError::InsufficientPoints { valid: 4 });

        assert!(compute_result(
            &standard_points(),
            &building_with_volume(12000.0),
            &no_weather(),
            3.0
        )
        .is_ok());
    }

    #[test]
    fn test_exclusion_can_drop_below_gate() {
        let mut points = standard_points();
        points[2].fan_pa = -5.0;
        let err = compute_result(&points, &building_with_volume(12000.0), &no_weather(), 3.0)
            .unwrap_err();
        assert_eq!(err, CalculationError::InsufficientPoints { valid: 4 });
    }

    #[test]
    fn test_invalid_points_retained_in_result() {
        let mut points = standard_points();
        points.push(TestPoint {
            index: 6,
            target_pa: 25.0,
            fan_pa: 0.0,
            ring: FanRing::Open,
        });

        let result =
            compute_result(&points, &building_with_volume(12000.0), &no_weather(), 3.0).unwrap();

        assert_eq!(result.points.len(), 6);
        assert_eq!(result.fit.point_count, 5);
        let excluded = &result.points[5];
        assert!(!excluded.is_valid());
        assert_eq!(excluded.issue, Some(PointIssue::NonPositiveFanPressure));
        assert_eq!(excluded.cfm, None);
        assert!(result.points[..5].iter().all(|p| p.is_valid()));
        // A partial point set makes ELA unavailable
        assert_eq!(result.ela_sq_in, None);
    }

    #[test]
    fn test_deterministic_rerun() {
        let points = standard_points();
        let building = building_with_volume(12000.0);
        let mut weather = no_weather();
        weather.indoor_temp_f = Some(70.0);
        weather.outdoor_temp_f = Some(18.0);
        weather.altitude_ft = Some(920.0);

        let first = compute_result(&points, &building, &weather, 3.0).unwrap();
        let second = compute_result(&points, &building, &weather, 3.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ach50_arithmetic() {
        assert_eq!(ach50_from(500.0, 12000.0), 2.5);
        assert_eq!(ach50_from(750.0, 15000.0), 3.0);
        assert_eq!(ach50_from(300.0, 9000.0), 2.0);
    }

    #[test]
    fn test_compliance_boundary() {
        let (status, margin) = evaluate_compliance(Some(3.0), 3.0);
        assert_eq!(status, ComplianceStatus::Pass);
        assert_eq!(margin, Some(0.0));

        let (status, margin) = evaluate_compliance(Some(3.2), 3.0);
        assert_eq!(status, ComplianceStatus::Fail);
        assert!((margin.unwrap() + 0.2).abs() < 1e-9);

        let (status, margin) = evaluate_compliance(Some(2.5), 3.0);
        assert_eq!(status, ComplianceStatus::Pass);
        assert!((margin.unwrap() - 0.5).abs() < 1e-9);

        let (status, margin) = evaluate_compliance(None, 3.0);
        assert_eq!(status, ComplianceStatus::Indeterminate);
        assert_eq!(margin, None);
    }

    #[test]
    fn test_missing_volume_gives_partial_result() {
        for building in [BuildingProfile::default(), building_with_volume(0.0)] {
            let result =
                compute_result(&standard_points(), &building, &no_weather(), 3.0).unwrap();
            assert!(result.cfm50 > 0.0);
            assert_eq!(result.ach50, None);
            assert_eq!(result.ela_sq_in, None);
            assert_eq!(result.compliance, ComplianceStatus::Indeterminate);
            assert_eq!(result.margin_ach50, None);
        }
    }

    #[test]
    fn test_weather_correction_opt_in() {
        let points = standard_points();
        let building = building_with_volume(12000.0);

        let baseline = compute_result(&points, &building, &no_weather(), 3.0).unwrap();

        // One temperature is not enough to correct
        let mut half = no_weather();
        half.indoor_temp_f = Some(70.0);
        let uncorrected = compute_result(&points, &building, &half, 3.0).unwrap();
        assert!(!uncorrected.weather_corrected);
        assert_eq!(uncorrected.cfm50, baseline.cfm50);

        // Both temperatures with a real differential change CFM50 by the factor
        let mut full = no_weather();
        full.indoor_temp_f = Some(70.0);
        full.outdoor_temp_f = Some(20.0);
        let corrected = compute_result(&points, &building, &full, 3.0).unwrap();
        assert!(corrected.weather_corrected);
        assert!(corrected.temperature_correction_factor > 1.0);
        assert!((corrected.cfm50 - baseline.cfm50).abs() > 1.0);
        let expected = baseline.cfm50 * corrected.temperature_correction_factor;
        assert!((corrected.cfm50 - expected).abs() / expected < 1e-9);

        // Zero differential corrects with an identity factor
        let mut equal = no_weather();
        equal.indoor_temp_f = Some(68.0);
        equal.outdoor_temp_f = Some(68.0);
        let noop = compute_result(&points, &building, &equal, 3.0).unwrap();
        assert!(noop.weather_corrected);
        assert!((noop.cfm50 - baseline.cfm50).abs() < 1e-9);
    }

    #[test]
    fn test_altitude_identity_still_reported() {
        let points = standard_points();
        let building = building_with_volume(12000.0);

        let mut sea_level = no_weather();
        sea_level.altitude_ft = Some(0.0);
        let result = compute_result(&points, &building, &sea_level, 3.0).unwrap();
        assert!(result.altitude_corrected);
        assert!((result.altitude_correction_factor - 1.0).abs() < 1e-9);

        let absent = compute_result(&points, &building, &no_weather(), 3.0).unwrap();
        assert!(!absent.altitude_corrected);
        assert_eq!(absent.altitude_correction_factor, 1.0);
    }

    #[test]
    fn test_no_pressure_spread_surfaces() {
        let points = open_points(&[
            (50.0, 45.0),
            (50.0, 44.0),
            (50.0, 46.0),
            (50.0, 45.5),
            (50.0, 44.5),
        ]);
        let err = compute_result(&points, &building_with_volume(12000.0), &no_weather(), 3.0)
            .unwrap_err();
        assert_eq!(err, CalculationError::NoPressureSpread);
    }

    #[test]
    fn test_threshold_is_an_input() {
        let points = standard_points();
        let building = building_with_volume(12000.0);

        let lenient = compute_result(&points, &building, &no_weather(), 3.0).unwrap();
        assert_eq!(lenient.compliance, ComplianceStatus::Pass);

        let strict = compute_result(&points, &building, &no_weather(), 2.0).unwrap();
        assert_eq!(strict.compliance, ComplianceStatus::Fail);
        assert!(strict.margin_ach50.unwrap() < 0.0);
        assert_eq!(strict.threshold_ach50, 2.0);
    }
}
