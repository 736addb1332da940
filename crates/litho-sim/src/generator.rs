//! Metric Generation Model
//!
//! Maps the six control parameters to six derived process quantities with
//! bounded uniform noise, then checks fixed alert thresholds.
//!
//! ```text
//!  alignmentPrecision ──► overlay ─────────┐
//!  opticalPower ──┬─────► focus ───────────┼──► throughput (× waferThroughput)
//!  vibrationCtrl ─┴─────► vibration        │
//!  thermalStability ────► temperature ─────┘
//!  vacuumPressure ──────► vacuum
//! ```
//!
//! Randomness is drawn from the caller's [`Rng`] in a fixed order
//! (overlay, focus, temperature, vibration, vacuum) so identically seeded
//! sources reproduce identical readings.

use crate::core::{Alert, ControlParameters, Metric, Parameter, Reading, Severity};
use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::{Builder, Uuid};

// Physical floors: no derived quantity may reach zero
pub const OVERLAY_FLOOR_NM: f64 = 0.5;
pub const FOCUS_FLOOR_NM: f64 = 1.0;
pub const TEMPERATURE_FLOOR_MK: f64 = 0.1;
pub const VIBRATION_FLOOR_NM: f64 = 0.1;
pub const VACUUM_FLOOR_MBAR: f64 = 1e-7;
pub const THROUGHPUT_FLOOR: f64 = 1.0;

// Noise half-widths (vacuum noise is one-sided)
const OVERLAY_NOISE: f64 = 0.25;
const FOCUS_NOISE: f64 = 1.0;
const TEMPERATURE_NOISE: f64 = 0.1;
const VIBRATION_NOISE: f64 = 0.2;
const VACUUM_NOISE: f64 = 1e-7;

/// Unrounded output of one derivation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    pub overlay_accuracy: f64,
    pub focus_stability: f64,
    pub throughput_rate: f64,
    pub temperature_variation: f64,
    pub vibration_level: f64,
    pub vacuum_quality: f64,
}

impl Measurements {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::OverlayAccuracy => self.overlay_accuracy,
            Metric::FocusStability => self.focus_stability,
            Metric::ThroughputRate => self.throughput_rate,
            Metric::TemperatureVariation => self.temperature_variation,
            Metric::VibrationLevel => self.vibration_level,
            Metric::VacuumQuality => self.vacuum_quality,
        }
    }

    /// Apply display rounding and stamp the reading
    pub fn to_reading(&self, timestamp: DateTime<Utc>) -> Reading {
        Reading {
            timestamp,
            overlay_accuracy: round_decimals(self.overlay_accuracy, 2),
            focus_stability: round_decimals(self.focus_stability, 1),
            throughput_rate: self.throughput_rate.round() as u32,
            temperature_variation: round_decimals(self.temperature_variation, 2),
            vibration_level: round_decimals(self.vibration_level, 2),
            vacuum_quality: round_significant(self.vacuum_quality),
        }
    }
}

/// Result of one generation step
#[derive(Debug, Clone)]
pub struct Generation {
    pub reading: Reading,
    pub alerts: Vec<Alert>,
}

/// One fixed alert rule
pub struct Threshold {
    pub metric: Metric,
    /// Fires when the derived value is strictly greater than this
    pub limit: f64,
    pub severity: Severity,
    describe: fn(f64) -> String,
}

impl Threshold {
    pub fn is_exceeded(&self, measurements: &Measurements) -> bool {
        measurements.value(self.metric) > self.limit
    }

    pub fn message(&self, value: f64) -> String {
        (self.describe)(value)
    }
}

pub static THRESHOLDS: [Threshold; 5] = [
    Threshold {
        metric: Metric::OverlayAccuracy,
        limit: 3.0,
        severity: Severity::Error,
        describe: |v| format!("Overlay accuracy out of spec: {:.2} nm", v),
    },
    Threshold {
        metric: Metric::FocusStability,
        limit: 12.0,
        severity: Severity::Error,
        describe: |v| format!("Focus stability out of spec: {:.1} nm", v),
    },
    Threshold {
        metric: Metric::TemperatureVariation,
        limit: 1.2,
        severity: Severity::Warning,
        describe: |v| format!("Temperature variation elevated: {:.2} mK", v),
    },
    Threshold {
        metric: Metric::VibrationLevel,
        limit: 2.5,
        severity: Severity::Warning,
        describe: |v| format!("Vibration level elevated: {:.2} nm RMS", v),
    },
    Threshold {
        metric: Metric::VacuumQuality,
        limit: 2e-6,
        severity: Severity::Error,
        describe: |v| format!("Vacuum pressure out of spec: {:.0e} mbar", v),
    },
];

/// Run the model once: derive, round, and evaluate thresholds
pub fn generate<R: Rng + ?Sized>(
    params: &ControlParameters,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Generation {
    let measurements = derive(params, rng);
    let alerts = check_thresholds(&measurements, rng, now);
    Generation {
        reading: measurements.to_reading(now),
        alerts,
    }
}

/// Derive the six quantities from the control parameters
pub fn derive<R: Rng + ?Sized>(params: &ControlParameters, rng: &mut R) -> Measurements {
    let alignment = params.fraction(Parameter::AlignmentPrecision);
    let optical = params.fraction(Parameter::OpticalPower);
    let vibration_ctl = params.fraction(Parameter::VibrationControl);
    let thermal = params.fraction(Parameter::ThermalStability);
    let vacuum = params.fraction(Parameter::VacuumPressure);

    let overlay_accuracy = (2.5 * (1.0 - alignment)
        + rng.random_range(-OVERLAY_NOISE..=OVERLAY_NOISE))
    .max(OVERLAY_FLOOR_NM);

    let focus_stability = (10.0 * (1.0 - optical) * (2.0 - vibration_ctl)
        + rng.random_range(-FOCUS_NOISE..=FOCUS_NOISE))
    .max(FOCUS_FLOOR_NM);

    let temperature_variation = (1.0 * (1.0 - thermal)
        + rng.random_range(-TEMPERATURE_NOISE..=TEMPERATURE_NOISE))
    .max(TEMPERATURE_FLOOR_MK);

    let vibration_level = (3.0 * (1.0 - vibration_ctl)
        + rng.random_range(-VIBRATION_NOISE..=VIBRATION_NOISE))
    .max(VIBRATION_FLOOR_NM);

    let vacuum_quality =
        (1e-6 * (2.0 - vacuum) + rng.random_range(0.0..VACUUM_NOISE)).max(VACUUM_FLOOR_MBAR);

    // Yield penalties from out-of-band overlay, focus and temperature
    let overlay_penalty = 1.0 - (overlay_accuracy - 2.0).max(0.0) / 10.0;
    let focus_penalty = 1.0 - (focus_stability - 8.0).max(0.0) / 20.0;
    let thermal_penalty = 1.0 - (temperature_variation - 0.8).max(0.0) / 5.0;
    let throughput_rate = (params.wafer_throughput as f64
        * overlay_penalty
        * focus_penalty
        * thermal_penalty)
        .max(THROUGHPUT_FLOOR);

    Measurements {
        overlay_accuracy,
        focus_stability,
        throughput_rate,
        temperature_variation,
        vibration_level,
        vacuum_quality,
    }
}

/// Evaluate every threshold independently against unrounded values
pub fn check_thresholds<R: Rng + ?Sized>(
    measurements: &Measurements,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    THRESHOLDS
        .iter()
        .filter(|t| t.is_exceeded(measurements))
        .map(|t| Alert {
            id: alert_id(rng),
            severity: t.severity,
            message: t.message(measurements.value(t.metric)),
            timestamp: now,
        })
        .collect()
}

fn alert_id<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    Builder::from_random_bytes(bytes).into_uuid()
}

fn round_decimals(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round to one significant digit (via scientific notation)
fn round_significant(value: f64) -> f64 {
    format!("{:.0e}", value).parse().unwrap_or(value)
}
