//! Core module - fundamental types and the calculation pipeline

pub mod calibration;
pub mod config;
pub mod corrections;
pub mod engine;
pub mod identity;
pub mod project;
pub mod regression;
pub mod shortid;

pub use calibration::{FanRing, RingCurve, RingParseError};
pub use config::Config;
pub use corrections::FlowCorrections;
pub use engine::{compute_result, evaluate_compliance, validate_point, CalculationError};
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use project::{Project, ProjectError};
pub use regression::{fit_power_law, MIN_VALID_POINTS};
pub use shortid::ShortIdIndex;
