//! Core Types for litho-sim
//!
//! Control inputs, per-tick readings, alerts and the presentation-side
//! selectors. Types are co-located here as the single source of truth.

use crate::error::SimError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

// ============================================================================
// Control Parameters
// ============================================================================

/// One of the six user-adjustable control knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Parameter {
    WaferThroughput,
    AlignmentPrecision,
    ThermalStability,
    VibrationControl,
    VacuumPressure,
    OpticalPower,
}

impl Parameter {
    pub const ALL: [Parameter; 6] = [
        Parameter::WaferThroughput,
        Parameter::AlignmentPrecision,
        Parameter::ThermalStability,
        Parameter::VibrationControl,
        Parameter::VacuumPressure,
        Parameter::OpticalPower,
    ];

    /// Wire name (camelCase)
    pub fn name(&self) -> &'static str {
        match self {
            Parameter::WaferThroughput => "waferThroughput",
            Parameter::AlignmentPrecision => "alignmentPrecision",
            Parameter::ThermalStability => "thermalStability",
            Parameter::VibrationControl => "vibrationControl",
            Parameter::VacuumPressure => "vacuumPressure",
            Parameter::OpticalPower => "opticalPower",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Parameter::WaferThroughput => "Wafer Throughput",
            Parameter::AlignmentPrecision => "Alignment Precision",
            Parameter::ThermalStability => "Thermal Stability",
            Parameter::VibrationControl => "Vibration Control",
            Parameter::VacuumPressure => "Vacuum Pressure",
            Parameter::OpticalPower => "Optical Power",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Parameter {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_name(s);
        Parameter::ALL
            .into_iter()
            .find(|p| normalize_name(p.name()) == key)
            .ok_or_else(|| SimError::UnknownParameter(s.to_string()))
    }
}

/// Six integer percentages in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlParameters {
    #[serde(deserialize_with = "deserialize_percent")]
    pub wafer_throughput: u8,
    #[serde(deserialize_with = "deserialize_percent")]
    pub alignment_precision: u8,
    #[serde(deserialize_with = "deserialize_percent")]
    pub thermal_stability: u8,
    #[serde(deserialize_with = "deserialize_percent")]
    pub vibration_control: u8,
    #[serde(deserialize_with = "deserialize_percent")]
    pub vacuum_pressure: u8,
    #[serde(deserialize_with = "deserialize_percent")]
    pub optical_power: u8,
}

/// Any integer is accepted and clamped to [0, 100], same as `set`
fn deserialize_percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    Ok(value.clamp(0, ControlParameters::MAX as i64) as u8)
}

impl Default for ControlParameters {
    fn default() -> Self {
        Self {
            wafer_throughput: 70,
            alignment_precision: 80,
            thermal_stability: 75,
            vibration_control: 85,
            vacuum_pressure: 90,
            optical_power: 65,
        }
    }
}

impl ControlParameters {
    pub const MAX: u8 = 100;

    pub fn get(&self, parameter: Parameter) -> u8 {
        match parameter {
            Parameter::WaferThroughput => self.wafer_throughput,
            Parameter::AlignmentPrecision => self.alignment_precision,
            Parameter::ThermalStability => self.thermal_stability,
            Parameter::VibrationControl => self.vibration_control,
            Parameter::VacuumPressure => self.vacuum_pressure,
            Parameter::OpticalPower => self.optical_power,
        }
    }

    /// Set a parameter, clamping the input to [0, 100]. Returns the stored value.
    pub fn set(&mut self, parameter: Parameter, value: i64) -> u8 {
        let clamped = value.clamp(0, Self::MAX as i64) as u8;
        let slot = match parameter {
            Parameter::WaferThroughput => &mut self.wafer_throughput,
            Parameter::AlignmentPrecision => &mut self.alignment_precision,
            Parameter::ThermalStability => &mut self.thermal_stability,
            Parameter::VibrationControl => &mut self.vibration_control,
            Parameter::VacuumPressure => &mut self.vacuum_pressure,
            Parameter::OpticalPower => &mut self.optical_power,
        };
        *slot = clamped;
        clamped
    }

    /// Builder-style setter
    pub fn with(mut self, parameter: Parameter, value: i64) -> Self {
        self.set(parameter, value);
        self
    }

    /// Clamp every field into range (struct literals can hold values above 100)
    pub fn clamped(self) -> Self {
        let mut out = self;
        for p in Parameter::ALL {
            out.set(p, self.get(p) as i64);
        }
        out
    }

    /// Fraction in [0, 1] for use in the metric model
    pub fn fraction(&self, parameter: Parameter) -> f64 {
        self.get(parameter) as f64 / Self::MAX as f64
    }

    pub fn iter(&self) -> impl Iterator<Item = (Parameter, u8)> + '_ {
        Parameter::ALL.into_iter().map(|p| (p, self.get(p)))
    }
}

// ============================================================================
// Readings
// ============================================================================

/// One tick of derived process telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    /// nm
    pub overlay_accuracy: f64,
    /// nm
    pub focus_stability: f64,
    /// wafers/hour
    pub throughput_rate: u32,
    /// mK
    pub temperature_variation: f64,
    /// nm RMS
    pub vibration_level: f64,
    /// mbar
    pub vacuum_quality: f64,
}

impl Reading {
    /// Wall-clock label used on chart axes
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    pub fn value(&self, metric: Metric) -> f64 {
        metric.value_of(self)
    }
}

/// One of the six charted reading series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    OverlayAccuracy,
    FocusStability,
    ThroughputRate,
    TemperatureVariation,
    VibrationLevel,
    VacuumQuality,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::OverlayAccuracy,
        Metric::FocusStability,
        Metric::ThroughputRate,
        Metric::TemperatureVariation,
        Metric::VibrationLevel,
        Metric::VacuumQuality,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::OverlayAccuracy => "overlayAccuracy",
            Metric::FocusStability => "focusStability",
            Metric::ThroughputRate => "throughputRate",
            Metric::TemperatureVariation => "temperatureVariation",
            Metric::VibrationLevel => "vibrationLevel",
            Metric::VacuumQuality => "vacuumQuality",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::OverlayAccuracy => "Overlay Accuracy",
            Metric::FocusStability => "Focus Stability",
            Metric::ThroughputRate => "Throughput Rate",
            Metric::TemperatureVariation => "Temperature Variation",
            Metric::VibrationLevel => "Vibration Level",
            Metric::VacuumQuality => "Vacuum Quality",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::OverlayAccuracy | Metric::FocusStability => "nm",
            Metric::ThroughputRate => "wafers/h",
            Metric::TemperatureVariation => "mK",
            Metric::VibrationLevel => "nm RMS",
            Metric::VacuumQuality => "mbar",
        }
    }

    pub fn value_of(&self, reading: &Reading) -> f64 {
        match self {
            Metric::OverlayAccuracy => reading.overlay_accuracy,
            Metric::FocusStability => reading.focus_stability,
            Metric::ThroughputRate => reading.throughput_rate as f64,
            Metric::TemperatureVariation => reading.temperature_variation,
            Metric::VibrationLevel => reading.vibration_level,
            Metric::VacuumQuality => reading.vacuum_quality,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_name(s);
        Metric::ALL
            .into_iter()
            .find(|m| normalize_name(m.name()) == key)
            .ok_or_else(|| SimError::UnknownMetric(s.to_string()))
    }
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// Threshold alert raised by the metric model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Presentation Selectors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Area,
    Bar,
}

impl ChartKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Area => "area",
            ChartKind::Bar => "bar",
        }
    }
}

impl FromStr for ChartKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "line" => Ok(ChartKind::Line),
            "area" => Ok(ChartKind::Area),
            "bar" => Ok(ChartKind::Bar),
            _ => Err(SimError::UnknownChartKind(s.to_string())),
        }
    }
}

/// Selectable tick periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum TickInterval {
    Fast,
    #[default]
    Normal,
    Slow,
}

impl TickInterval {
    pub const ALL: [TickInterval; 3] = [TickInterval::Fast, TickInterval::Normal, TickInterval::Slow];

    pub fn as_millis(&self) -> u64 {
        match self {
            TickInterval::Fast => 500,
            TickInterval::Normal => 1000,
            TickInterval::Slow => 2000,
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.as_millis())
    }
}

impl TryFrom<u64> for TickInterval {
    type Error = SimError;

    fn try_from(ms: u64) -> Result<Self, Self::Error> {
        TickInterval::ALL
            .into_iter()
            .find(|i| i.as_millis() == ms)
            .ok_or(SimError::UnsupportedTickInterval(ms))
    }
}

impl From<TickInterval> for u64 {
    fn from(interval: TickInterval) -> Self {
        interval.as_millis()
    }
}

/// Accept both `vacuumPressure` and `vacuum_pressure` spellings
fn normalize_name(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
