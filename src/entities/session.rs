//! Test session entity - one blower door test on one building
//!
//! A session collects everything a field technician enters (building
//! profile, weather block, raw measurement points) plus the stored result of
//! the last calculation. Inputs and results are kept separate: editing any
//! input clears the stored result and drops the session back to data entry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::calibration::FanRing;
use crate::core::engine::{compute_result, validate_point, CalculationError};
use crate::core::identity::EntityId;

/// Workflow stage of a session
///
/// Stages advance monotonically during normal data entry; editing inputs
/// after a calculation resets Results/Report back to MultiPoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Building profile entry
    #[default]
    Setup,
    /// Weather block entry
    Weather,
    /// Measurement point entry
    MultiPoint,
    /// A calculation has been stored
    Results,
    /// Results have been exported or reported out
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Setup => write!(f, "setup"),
            Stage::Weather => write!(f, "weather"),
            Stage::MultiPoint => write!(f, "multipoint"),
            Stage::Results => write!(f, "results"),
            Stage::Report => write!(f, "report"),
        }
    }
}

/// Review status of the session document, independent of the workflow stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Draft,
    Review,
    Approved,
    Released,
    Obsolete,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Draft => write!(f, "draft"),
            Status::Review => write!(f, "review"),
            Status::Approved => write!(f, "approved"),
            Status::Released => write!(f, "released"),
            Status::Obsolete => write!(f, "obsolete"),
        }
    }
}

/// Basement/foundation conditioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasementType {
    None,
    Unconditioned,
    Conditioned,
}

impl std::fmt::Display for BasementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BasementType::None => write!(f, "none"),
            BasementType::Unconditioned => write!(f, "unconditioned"),
            BasementType::Conditioned => write!(f, "conditioned"),
        }
    }
}

/// Building geometry for the tested envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingProfile {
    /// Conditioned volume in cubic feet; required for ACH50
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_cu_ft: Option<f64>,

    /// Conditioned floor area in square feet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditioned_area_sq_ft: Option<f64>,

    /// Envelope surface area in square feet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_area_sq_ft: Option<f64>,

    /// Stories above grade
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stories: Option<u32>,

    /// Basement/foundation type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basement: Option<BasementType>,
}

impl BuildingProfile {
    /// Whether a usable volume is present (positive, not just supplied)
    pub fn has_volume(&self) -> bool {
        matches!(self.volume_cu_ft, Some(v) if v > 0.0)
    }
}

/// Weather observations around the test
///
/// Every field is optional; each correction stage checks the fields it
/// needs and skips itself when they are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outdoor_temp_f: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indoor_temp_f: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outdoor_humidity_pct: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indoor_humidity_pct: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_mph: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barometric_in_hg: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_ft: Option<f64>,
}

impl WeatherConditions {
    /// Both temperatures present (the stack correction's requirement)
    pub fn has_temperature_pair(&self) -> bool {
        self.indoor_temp_f.is_some() && self.outdoor_temp_f.is_some()
    }

    /// No field supplied at all
    pub fn is_empty(&self) -> bool {
        *self == WeatherConditions::default()
    }
}

/// One raw measurement: fan pressure at an induced building pressure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestPoint {
    /// Stable position identifier (display order, not regression order)
    pub index: u32,

    /// Induced building pressure target, Pa
    pub target_pa: f64,

    /// Fan pressure reading, Pa
    pub fan_pa: f64,

    /// Ring installed for this reading
    pub ring: FanRing,
}

/// Why a point was excluded from the regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointIssue {
    NonPositiveFanPressure,
    NonPositiveTargetPressure,
}

impl std::fmt::Display for PointIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointIssue::NonPositiveFanPressure => write!(f, "fan pressure not positive"),
            PointIssue::NonPositiveTargetPressure => write!(f, "target pressure not positive"),
        }
    }
}

/// One input point as the pipeline evaluated it
///
/// Excluded points are retained here with their issue so a caller can render
/// a per-point validity indicator next to the raw reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointResult {
    pub index: u32,
    pub target_pa: f64,
    pub fan_pa: f64,
    pub ring: FanRing,

    /// Corrected airflow for valid points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfm: Option<f64>,

    /// Present iff the point was excluded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<PointIssue>,
}

impl PointResult {
    pub fn is_valid(&self) -> bool {
        self.issue.is_none()
    }
}

/// Fitted power-law model `Q = C · ΔP^n`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLawFit {
    /// Flow coefficient C, CFM at 1 Pa
    pub flow_coefficient: f64,

    /// Flow exponent n, near 0.5-1.0 for real leakage paths
    pub flow_exponent: f64,

    /// r² of the log-log fit
    pub r_squared: f64,

    /// Valid points behind the fit, always >= 5
    pub point_count: usize,
}

impl PowerLawFit {
    /// Model flow at a given envelope pressure
    pub fn flow_at(&self, pressure_pa: f64) -> f64 {
        self.flow_coefficient * pressure_pa.powf(self.flow_exponent)
    }
}

/// Code-compliance verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Pass,
    Fail,
    /// ACH50 could not be computed (missing building volume)
    Indeterminate,
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplianceStatus::Pass => write!(f, "pass"),
            ComplianceStatus::Fail => write!(f, "fail"),
            ComplianceStatus::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

/// The assembled, immutable outcome of one calculation
///
/// Carries no timestamps and no randomness: identical inputs reproduce an
/// identical result. The session records when it stored a result separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Flow at the 50 Pa reference pressure, CFM
    pub cfm50: f64,

    /// Air changes per hour at 50 Pa; absent without a building volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ach50: Option<f64>,

    /// Effective leakage area at 4 Pa, square inches; absent when any point
    /// was excluded or the volume is missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ela_sq_in: Option<f64>,

    /// The fitted model behind the metrics
    pub fit: PowerLawFit,

    /// Whether the stack correction was applied
    pub weather_corrected: bool,

    /// Stack correction factor (1.0 when not applied)
    pub temperature_correction_factor: f64,

    /// Whether altitude or station pressure data was present
    pub altitude_corrected: bool,

    /// Density correction factor, reported even when it is the identity
    pub altitude_correction_factor: f64,

    /// Threshold the verdict was evaluated against, ACH50
    pub threshold_ach50: f64,

    /// Pass/fail verdict
    pub compliance: ComplianceStatus,

    /// threshold - ach50; positive is headroom, absent when Indeterminate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_ach50: Option<f64>,

    /// Every input point with its computed flow or exclusion reason
    pub points: Vec<PointResult>,
}

/// A blower door test session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSession {
    /// Unique identifier
    pub id: EntityId,

    /// Short title
    pub title: String,

    /// Current status
    #[serde(default)]
    pub status: Status,

    /// Workflow stage
    #[serde(default)]
    pub stage: Stage,

    /// Customer or builder name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,

    /// Site address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_address: Option<String>,

    /// Date the test was performed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_date: Option<NaiveDate>,

    /// Building geometry
    #[serde(default)]
    pub building: BuildingProfile,

    /// Weather observations
    #[serde(default)]
    pub weather: WeatherConditions,

    /// Raw measurement points
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<TestPoint>,

    /// Stored result of the last calculation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<TestResult>,

    /// When the stored result was calculated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this session)
    pub author: String,
}

impl TestSession {
    /// Create a new session with the given title and author
    pub fn new(title: String, author: String) -> Self {
        Self {
            id: EntityId::new(crate::core::EntityPrefix::Session),
            title,
            status: Status::default(),
            stage: Stage::default(),
            customer: None,
            site_address: None,
            test_date: None,
            building: BuildingProfile::default(),
            weather: WeatherConditions::default(),
            points: Vec::new(),
            results: None,
            calculated_at: None,
            created: Utc::now(),
            author,
        }
    }

    /// Next free point index (1-based display numbering)
    pub fn next_point_index(&self) -> u32 {
        self.points.iter().map(|p| p.index).max().map_or(1, |m| m + 1)
    }

    /// Points that would survive validation
    pub fn valid_point_count(&self) -> usize {
        self.points
            .iter()
            .filter(|p| validate_point(p).is_none())
            .count()
    }

    /// Advance the workflow stage, never moving backwards
    pub fn advance_stage(&mut self, to: Stage) {
        self.stage = self.stage.max(to);
    }

    /// Drop any stored result after an input edit.
    ///
    /// Also walks the stage back to MultiPoint so a stale Results/Report
    /// stage can never coexist with cleared results.
    pub fn invalidate_results(&mut self) {
        self.results = None;
        self.calculated_at = None;
        if self.stage > Stage::MultiPoint {
            self.stage = Stage::MultiPoint;
        }
    }

    /// Append a measurement point
    pub fn add_point(&mut self, point: TestPoint) {
        self.invalidate_results();
        self.points.push(point);
        self.advance_stage(Stage::MultiPoint);
    }

    /// Remove the point with the given index; true if one was removed
    pub fn remove_point(&mut self, index: u32) -> bool {
        let before = self.points.len();
        self.points.retain(|p| p.index != index);
        let removed = self.points.len() != before;
        if removed {
            self.invalidate_results();
        }
        removed
    }

    /// Run the calculation pipeline over this session's inputs
    pub fn calculate(&self, threshold_ach50: f64) -> Result<TestResult, CalculationError> {
        compute_result(&self.points, &self.building, &self.weather, threshold_ach50)
    }

    /// Store a freshly computed result and advance to Results
    pub fn record_results(&mut self, result: TestResult) {
        self.results = Some(result);
        self.calculated_at = Some(Utc::now());
        self.advance_stage(Stage::Results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(index: u32, target_pa: f64, fan_pa: f64) -> TestPoint {
        TestPoint {
            index,
            target_pa,
            fan_pa,
            ring: FanRing::Open,
        }
    }

    fn session() -> TestSession {
        TestSession::new("1427 Alder St".to_string(), "test".to_string())
    }

    #[test]
    fn test_session_creation() {
        let s = session();
        assert!(s.id.to_string().starts_with("SES-"));
        assert_eq!(s.title, "1427 Alder St");
        assert_eq!(s.status, Status::Draft);
        assert_eq!(s.stage, Stage::Setup);
        assert!(s.points.is_empty());
        assert!(s.results.is_none());
    }

    #[test]
    fn test_session_roundtrip() {
        let mut s = session();
        s.customer = Some("Hearthstone Builders".to_string());
        s.building.volume_cu_ft = Some(14800.0);
        s.building.basement = Some(BasementType::Conditioned);
        s.weather.indoor_temp_f = Some(70.0);
        s.weather.outdoor_temp_f = Some(18.0);
        s.add_point(point(1, 50.0, 44.0));
        s.add_point(point(2, 45.0, 39.5));

        let yaml = serde_yml::to_string(&s).unwrap();
        let parsed: TestSession = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(parsed.id, s.id);
        assert_eq!(parsed.building, s.building);
        assert_eq!(parsed.weather, s.weather);
        assert_eq!(parsed.points, s.points);
        assert_eq!(parsed.stage, Stage::MultiPoint);
    }

    #[test]
    fn test_minimal_yaml_parses_with_defaults() {
        let yaml = r#"
id: SES-01J8ME0QGKXV3T4C8YQBW0F7EZ
title: Bare session
created: 2026-01-12T15:30:00Z
author: test
"#;
        let parsed: TestSession = serde_yml::from_str(yaml).unwrap();
        assert_eq!(parsed.stage, Stage::Setup);
        assert_eq!(parsed.building, BuildingProfile::default());
        assert!(parsed.weather.is_empty());
        assert!(parsed.points.is_empty());
    }

    #[test]
    fn test_stage_advances_monotonically() {
        let mut s = session();
        s.advance_stage(Stage::Weather);
        assert_eq!(s.stage, Stage::Weather);
        s.advance_stage(Stage::Setup);
        assert_eq!(s.stage, Stage::Weather);
        s.advance_stage(Stage::Results);
        assert_eq!(s.stage, Stage::Results);
    }

    #[test]
    fn test_next_point_index() {
        let mut s = session();
        assert_eq!(s.next_point_index(), 1);
        s.add_point(point(1, 50.0, 44.0));
        s.add_point(point(2, 45.0, 39.5));
        assert_eq!(s.next_point_index(), 3);
        s.remove_point(1);
        assert_eq!(s.next_point_index(), 3);
    }

    #[test]
    fn test_valid_point_count_excludes_bad_readings() {
        let mut s = session();
        s.add_point(point(1, 50.0, 44.0));
        s.add_point(point(2, 45.0, -3.0));
        s.add_point(point(3, 0.0, 39.0));
        assert_eq!(s.valid_point_count(), 1);
    }

    #[test]
    fn test_point_edits_clear_results() {
        let mut s = session();
        s.building.volume_cu_ft = Some(12000.0);
        for (i, (target, fan)) in [(50.0, 45.0), (45.0, 40.0), (40.0, 35.0), (35.0, 30.0), (30.0, 25.0)]
            .iter()
            .enumerate()
        {
            s.add_point(point(i as u32 + 1, *target, *fan));
        }
        let result = s.calculate(3.0).unwrap();
        s.record_results(result);
        assert_eq!(s.stage, Stage::Results);
        assert!(s.calculated_at.is_some());

        s.add_point(point(6, 25.0, 20.0));
        assert_eq!(s.stage, Stage::MultiPoint);
        assert!(s.results.is_none());
        assert!(s.calculated_at.is_none());
    }

    #[test]
    fn test_remove_point() {
        let mut s = session();
        s.add_point(point(1, 50.0, 44.0));
        assert!(s.remove_point(1));
        assert!(!s.remove_point(7));
        assert!(s.points.is_empty());
    }
}
