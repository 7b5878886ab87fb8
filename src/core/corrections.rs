//! Environmental corrections - density scalings for measured airflow
//!
//! Two independent, opportunistic corrections. Each is a constant scaling of
//! the measured flow series, applied before the regression so corrected
//! metrics come from a corrected fit (a constant factor moves the flow
//! coefficient and leaves the exponent and r² untouched). Missing weather
//! data never blocks a result; the affected correction simply stays at 1.0
//! and is reported as not applied.

use crate::entities::session::WeatherConditions;

/// Rankine offset for Fahrenheit temperatures
const RANKINE_OFFSET_F: f64 = 459.67;

/// Standard sea-level barometric pressure, inches of mercury
pub const STANDARD_PRESSURE_IN_HG: f64 = 29.921;

/// Standard-atmosphere density lapse, per foot of elevation
const DENSITY_LAPSE_PER_FT: f64 = 6.8756e-6;

/// Standard-atmosphere density-ratio exponent (troposphere)
const DENSITY_EXPONENT: f64 = 4.2559;

/// Flow scaling factors derived from a session's weather block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowCorrections {
    /// Indoor/outdoor temperature (stack) factor; 1.0 when not applied
    pub temperature_factor: f64,
    /// True when both temperatures were present and the factor was applied
    pub weather_corrected: bool,
    /// Altitude/barometric density factor; 1.0 when not applied
    pub altitude_factor: f64,
    /// True when station pressure or altitude was present
    pub altitude_corrected: bool,
}

impl FlowCorrections {
    /// No corrections applied
    pub fn identity() -> Self {
        Self {
            temperature_factor: 1.0,
            weather_corrected: false,
            altitude_factor: 1.0,
            altitude_corrected: false,
        }
    }

    /// Derive both factors from whatever weather data is present.
    ///
    /// Each field decides independently: a half-supplied temperature pair
    /// leaves the stack correction off without affecting the altitude one.
    pub fn from_weather(weather: &WeatherConditions) -> Self {
        let mut corrections = Self::identity();

        if let (Some(indoor), Some(outdoor)) = (weather.indoor_temp_f, weather.outdoor_temp_f) {
            if let Some(factor) = temperature_factor(indoor, outdoor) {
                corrections.temperature_factor = factor;
                corrections.weather_corrected = true;
            }
        }

        // Measured station pressure wins over elevation-derived density
        if let Some(in_hg) = weather.barometric_in_hg.filter(|p| *p > 0.0) {
            corrections.altitude_factor = pressure_factor(in_hg);
            corrections.altitude_corrected = true;
        } else if let Some(altitude_ft) = weather.altitude_ft {
            corrections.altitude_factor = altitude_factor(altitude_ft);
            corrections.altitude_corrected = true;
        }

        corrections
    }

    /// Combined multiplier for the flow series
    pub fn combined(&self) -> f64 {
        self.temperature_factor * self.altitude_factor
    }
}

/// Stack-effect flow factor from the indoor/outdoor differential.
///
/// Air moving through the fan is at indoor density while the calibration
/// assumes outdoor-equivalent conditions, so the factor is the square root
/// of the absolute temperature ratio. Equal temperatures give exactly 1.0.
/// Temperatures at or below absolute zero are treated as absent.
pub fn temperature_factor(indoor_f: f64, outdoor_f: f64) -> Option<f64> {
    let indoor_r = indoor_f + RANKINE_OFFSET_F;
    let outdoor_r = outdoor_f + RANKINE_OFFSET_F;
    if indoor_r <= 0.0 || outdoor_r <= 0.0 {
        return None;
    }
    Some((indoor_r / outdoor_r).sqrt())
}

/// Density flow factor from elevation, standard-atmosphere model.
///
/// Thinner air at altitude means the fan moves more volume for the same
/// calibrated pressure signal, so the factor is >= 1 above sea level and
/// exactly the inverse square root of the density ratio.
pub fn altitude_factor(altitude_ft: f64) -> f64 {
    // Model holds through the troposphere; clamp keeps powf off negative bases
    let base = (1.0 - DENSITY_LAPSE_PER_FT * altitude_ft).max(0.0);
    let density_ratio = base.powf(DENSITY_EXPONENT);
    1.0 / density_ratio.sqrt()
}

/// Density flow factor from measured station pressure
pub fn pressure_factor(in_hg: f64) -> f64 {
    (STANDARD_PRESSURE_IN_HG / in_hg).sqrt()
}
