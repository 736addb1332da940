//! Dashboard Engine
//!
//! Explicit state container for the simulation: control parameters,
//! rolling history, alert log, run state and presentation selectors.
//! Nothing here knows about timers; [`crate::driver`] decides when
//! [`Dashboard::tick`] runs.
//!
//! ```text
//!              start()
//!        ┌──────────────────┐
//!        │                  ▼
//!    ┌──────┐           ┌─────────┐
//!    │ Idle │◄──────────│ Running │──┐ tick(): generate → History, AlertLog
//!    └──────┘  pause()  └─────────┘◄─┘
//!        ▲      reset()      │
//!        └───────────────────┘
//! ```

use crate::buffer::{AlertLog, History};
use crate::config::DashboardConfig;
use crate::core::{
    Alert, ChartKind, ControlParameters, Metric, Parameter, Reading, Severity, TickInterval,
};
use crate::error::{Result, SimError};
use crate::generator;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

/// Engine running state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

/// Engine statistics (cumulative since the last reset)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub tick_count: u64,
    pub alerts_raised: u64,
}

/// Output of a single tick, broadcast to renderers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickOutcome {
    pub tick: u64,
    pub reading: Reading,
    pub alerts: Vec<Alert>,
}

/// Presentation-side write surface as discrete commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DashboardCommand {
    SetParameter { name: String, value: i64 },
    Start,
    Pause,
    Reset,
    SetTickInterval { interval_ms: u64 },
    ToggleVisibleMetric { name: String },
    SetChartKind { kind: String },
}

/// Read surface for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub state: RunState,
    pub parameters: ControlParameters,
    /// Oldest to newest
    pub history: Vec<Reading>,
    /// Newest first
    pub alerts: Vec<Alert>,
    pub tick_interval: TickInterval,
    pub chart_kind: ChartKind,
    pub visible_metrics: Vec<Metric>,
    pub stats: DashboardStats,
}

impl DashboardSnapshot {
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }
}

/// Simulation state container, generic over its randomness source
pub struct Dashboard<R> {
    params: ControlParameters,
    history: History,
    alerts: AlertLog,
    state: RunState,
    tick_interval: TickInterval,
    chart_kind: ChartKind,
    visible: BTreeSet<Metric>,
    stats: DashboardStats,
    rng: R,
}

impl<R: Rng> Dashboard<R> {
    pub fn new(rng: R) -> Self {
        Self {
            params: ControlParameters::default(),
            history: History::new(),
            alerts: AlertLog::new(),
            state: RunState::Idle,
            tick_interval: TickInterval::default(),
            chart_kind: ChartKind::default(),
            visible: Metric::ALL.into_iter().collect(),
            stats: DashboardStats::default(),
            rng,
        }
    }

    /// Build from configuration; fails on an unsupported tick interval
    pub fn from_config(config: &DashboardConfig, rng: R) -> Result<Self> {
        let mut dashboard = Self::new(rng);
        dashboard.params = config.parameters.clamped();
        dashboard.tick_interval = TickInterval::try_from(config.tick_interval_ms)?;
        dashboard.chart_kind = config.chart_kind;
        if let Some(metrics) = &config.visible_metrics {
            dashboard.visible = metrics.iter().copied().collect();
        }
        Ok(dashboard)
    }

    // ------------------------------------------------------------------
    // Write surface
    // ------------------------------------------------------------------

    /// Set a control parameter; out-of-range values are clamped
    pub fn set_parameter(&mut self, parameter: Parameter, value: i64) -> u8 {
        let stored = self.params.set(parameter, value);
        if stored as i64 != value {
            debug!(parameter = %parameter, requested = value, stored, "Parameter clamped");
        }
        info!(parameter = %parameter, value = stored, "Parameter updated");
        stored
    }

    /// Idle → Running. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.state == RunState::Running {
            return false;
        }
        self.state = RunState::Running;
        info!(interval_ms = self.tick_interval.as_millis(), "Simulation started");
        true
    }

    /// Running → Idle. Returns false if already idle.
    pub fn pause(&mut self) -> bool {
        if self.state == RunState::Idle {
            return false;
        }
        self.state = RunState::Idle;
        info!(ticks = self.stats.tick_count, "Simulation paused");
        true
    }

    /// Back to Idle with empty history/alerts and default parameters
    pub fn reset(&mut self) {
        self.state = RunState::Idle;
        self.history.clear();
        self.alerts.clear();
        self.params = ControlParameters::default();
        self.stats = DashboardStats::default();
        info!("Simulation reset");
    }

    /// Applies to future ticks only
    pub fn set_tick_interval(&mut self, interval: TickInterval) {
        self.tick_interval = interval;
        info!(interval_ms = interval.as_millis(), "Tick interval changed");
    }

    /// Flip a metric's visibility; returns whether it is now visible
    pub fn toggle_visible_metric(&mut self, metric: Metric) -> bool {
        let visible = if self.visible.remove(&metric) {
            false
        } else {
            self.visible.insert(metric);
            true
        };
        debug!(metric = %metric, visible, "Metric visibility toggled");
        visible
    }

    pub fn set_chart_kind(&mut self, kind: ChartKind) {
        self.chart_kind = kind;
        debug!(kind = kind.name(), "Chart kind changed");
    }

    /// Dispatch a serialized command from the presentation layer
    pub fn apply(&mut self, command: DashboardCommand) -> Result<()> {
        match command {
            DashboardCommand::SetParameter { name, value } => {
                self.set_parameter(name.parse()?, value);
            }
            DashboardCommand::Start => {
                self.start();
            }
            DashboardCommand::Pause => {
                self.pause();
            }
            DashboardCommand::Reset => self.reset(),
            DashboardCommand::SetTickInterval { interval_ms } => {
                self.set_tick_interval(TickInterval::try_from(interval_ms)?);
            }
            DashboardCommand::ToggleVisibleMetric { name } => {
                self.toggle_visible_metric(name.parse()?);
            }
            DashboardCommand::SetChartKind { kind } => {
                self.set_chart_kind(kind.parse()?);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Generate one reading if running
    pub fn tick(&mut self) -> Option<TickOutcome> {
        self.tick_at(Utc::now())
    }

    /// Generate one reading stamped with `now`, if running
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Option<TickOutcome> {
        if self.state != RunState::Running {
            return None;
        }

        let generation = generator::generate(&self.params, &mut self.rng, now);
        self.stats.tick_count += 1;
        self.stats.alerts_raised += generation.alerts.len() as u64;

        let reading = &generation.reading;
        debug!(
            tick = self.stats.tick_count,
            overlay_nm = reading.overlay_accuracy,
            focus_nm = reading.focus_stability,
            throughput = reading.throughput_rate,
            temperature_mk = reading.temperature_variation,
            vibration_nm = reading.vibration_level,
            vacuum_mbar = reading.vacuum_quality,
            "Reading generated"
        );
        for alert in &generation.alerts {
            match alert.severity {
                Severity::Error => error!(id = %alert.id, "{}", alert.message),
                Severity::Warning => warn!(id = %alert.id, "{}", alert.message),
                Severity::Info => info!(id = %alert.id, "{}", alert.message),
            }
        }

        self.history.push(generation.reading.clone());
        self.alerts.extend(generation.alerts.iter().cloned());

        Some(TickOutcome {
            tick: self.stats.tick_count,
            reading: generation.reading,
            alerts: generation.alerts,
        })
    }

    // ------------------------------------------------------------------
    // Read surface
    // ------------------------------------------------------------------

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn parameters(&self) -> &ControlParameters {
        &self.params
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn alerts(&self) -> &AlertLog {
        &self.alerts
    }

    pub fn tick_interval(&self) -> TickInterval {
        self.tick_interval
    }

    pub fn chart_kind(&self) -> ChartKind {
        self.chart_kind
    }

    pub fn is_visible(&self, metric: Metric) -> bool {
        self.visible.contains(&metric)
    }

    pub fn stats(&self) -> &DashboardStats {
        &self.stats
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            state: self.state,
            parameters: self.params,
            history: self.history.to_vec(),
            alerts: self.alerts.to_vec(),
            tick_interval: self.tick_interval,
            chart_kind: self.chart_kind,
            visible_metrics: self.visible.iter().copied().collect(),
            stats: self.stats,
        }
    }

    /// Output as JSON string
    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Parse a `name=value` parameter assignment (CLI `--set`)
pub fn parse_assignment(input: &str) -> Result<(Parameter, i64)> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| SimError::InvalidAssignment(input.to_string()))?;
    let parameter = name.parse()?;
    let value = value
        .trim()
        .parse()
        .map_err(|_| SimError::InvalidAssignment(input.to_string()))?;
    Ok((parameter, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{ALERT_LOG_CAPACITY, HISTORY_CAPACITY};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dashboard() -> Dashboard<StdRng> {
        Dashboard::new(StdRng::seed_from_u64(17))
    }

    #[test]
    fn test_engine_lifecycle() {
        let mut d = dashboard();
        assert_eq!(d.state(), RunState::Idle);

        assert!(d.start());
        assert!(!d.start());
        assert_eq!(d.state(), RunState::Running);

        assert!(d.pause());
        assert!(!d.pause());
        assert_eq!(d.state(), RunState::Idle);
    }

    #[test]
    fn test_tick_only_while_running() {
        let mut d = dashboard();
        assert!(d.tick().is_none());
        assert!(d.history().is_empty());

        d.start();
        let outcome = d.tick().unwrap();
        assert_eq!(outcome.tick, 1);
        assert_eq!(d.history().len(), 1);
        assert_eq!(d.history().latest(), Some(&outcome.reading));

        d.pause();
        assert!(d.tick().is_none());
        assert_eq!(d.history().len(), 1);
    }

    #[test]
    fn test_history_and_alerts_stay_bounded() {
        let mut d = dashboard();
        // Degraded tool: focus, vibration and vacuum alerts every tick
        d.set_parameter(Parameter::OpticalPower, 0);
        d.set_parameter(Parameter::VibrationControl, 0);
        d.set_parameter(Parameter::VacuumPressure, 0);
        d.start();

        for _ in 0..40 {
            d.tick();
            assert!(d.history().len() <= HISTORY_CAPACITY);
            assert!(d.alerts().len() <= ALERT_LOG_CAPACITY);
        }
        assert_eq!(d.history().len(), HISTORY_CAPACITY);
        assert_eq!(d.alerts().len(), ALERT_LOG_CAPACITY);
        assert_eq!(d.stats().tick_count, 40);
        assert!(d.stats().alerts_raised >= 80);
    }

    #[test]
    fn test_alerts_repeat_every_tick() {
        let mut d = dashboard();
        d.set_parameter(Parameter::VibrationControl, 0);
        d.start();
        let first = d.tick().unwrap();
        let second = d.tick().unwrap();
        let count = |o: &TickOutcome| {
            o.alerts
                .iter()
                .filter(|a| a.message.starts_with("Vibration"))
                .count()
        };
        assert_eq!(count(&first), 1);
        assert_eq!(count(&second), 1);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut d = dashboard();
        d.set_parameter(Parameter::VacuumPressure, 0);
        d.set_parameter(Parameter::WaferThroughput, 12);
        d.start();
        for _ in 0..5 {
            d.tick();
        }
        assert!(!d.alerts().is_empty());

        d.reset();
        assert_eq!(d.state(), RunState::Idle);
        assert!(d.history().is_empty());
        assert!(d.alerts().is_empty());
        assert_eq!(*d.parameters(), ControlParameters::default());
        let values: Vec<u8> = d.parameters().iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec![70, 80, 75, 85, 90, 65]);
        assert_eq!(d.stats().tick_count, 0);
    }

    #[test]
    fn test_reset_keeps_presentation_preferences() {
        let mut d = dashboard();
        d.set_chart_kind(ChartKind::Bar);
        d.set_tick_interval(TickInterval::Slow);
        d.toggle_visible_metric(Metric::VacuumQuality);
        d.reset();
        assert_eq!(d.chart_kind(), ChartKind::Bar);
        assert_eq!(d.tick_interval(), TickInterval::Slow);
        assert!(!d.is_visible(Metric::VacuumQuality));
    }

    #[test]
    fn test_toggle_visible_metric() {
        let mut d = dashboard();
        assert!(d.is_visible(Metric::FocusStability));
        assert!(!d.toggle_visible_metric(Metric::FocusStability));
        assert!(!d.is_visible(Metric::FocusStability));
        assert!(d.toggle_visible_metric(Metric::FocusStability));
        assert_eq!(d.snapshot().visible_metrics.len(), 6);
    }

    #[test]
    fn test_apply_commands() {
        let mut d = dashboard();
        d.apply(DashboardCommand::SetParameter {
            name: "opticalPower".to_string(),
            value: 140,
        })
        .unwrap();
        assert_eq!(d.parameters().optical_power, 100);

        d.apply(DashboardCommand::SetTickInterval { interval_ms: 500 })
            .unwrap();
        assert_eq!(d.tick_interval(), TickInterval::Fast);

        assert!(matches!(
            d.apply(DashboardCommand::SetTickInterval { interval_ms: 42 }),
            Err(SimError::UnsupportedTickInterval(42))
        ));
        assert!(matches!(
            d.apply(DashboardCommand::ToggleVisibleMetric {
                name: "humidity".to_string()
            }),
            Err(SimError::UnknownMetric(_))
        ));

        d.apply(DashboardCommand::SetChartKind {
            kind: "area".to_string(),
        })
        .unwrap();
        assert_eq!(d.chart_kind(), ChartKind::Area);

        d.apply(DashboardCommand::Start).unwrap();
        assert!(d.is_running());
        d.apply(DashboardCommand::Reset).unwrap();
        assert!(!d.is_running());
    }

    #[test]
    fn test_command_wire_format() {
        let cmd: DashboardCommand =
            serde_json::from_str(r#"{"type":"setParameter","name":"thermalStability","value":5}"#)
                .unwrap();
        let mut d = dashboard();
        d.apply(cmd).unwrap();
        assert_eq!(d.parameters().thermal_stability, 5);

        let cmd: DashboardCommand = serde_json::from_str(r#"{"type":"pause"}"#).unwrap();
        assert!(matches!(cmd, DashboardCommand::Pause));
    }

    #[test]
    fn test_snapshot_orders() {
        let mut d = dashboard();
        d.set_parameter(Parameter::VibrationControl, 0);
        d.start();
        let t0 = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        for i in 0..3 {
            d.tick_at(t0 + chrono::Duration::seconds(i));
        }
        let snap = d.snapshot();
        assert!(snap.is_running());
        assert_eq!(snap.history.len(), 3);
        assert!(snap.history[0].timestamp < snap.history[2].timestamp);
        assert!(snap.alerts[0].timestamp >= snap.alerts[snap.alerts.len() - 1].timestamp);

        let json: serde_json::Value = serde_json::from_str(&d.snapshot_json()).unwrap();
        assert_eq!(json["state"], "running");
        assert_eq!(json["tickInterval"], 1000);
        assert!(json["history"][0]["overlayAccuracy"].is_number());
    }

    #[test]
    fn test_from_config() {
        let config = DashboardConfig {
            tick_interval_ms: 2000,
            chart_kind: ChartKind::Bar,
            visible_metrics: Some(vec![Metric::ThroughputRate]),
            parameters: ControlParameters::default().with(Parameter::OpticalPower, 10),
            ..Default::default()
        };
        let d = Dashboard::from_config(&config, StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(d.tick_interval(), TickInterval::Slow);
        assert_eq!(d.parameters().optical_power, 10);
        assert!(d.is_visible(Metric::ThroughputRate));
        assert!(!d.is_visible(Metric::OverlayAccuracy));
    }

    #[test]
    fn test_parse_assignment() {
        let (p, v) = parse_assignment("alignment_precision=0").unwrap();
        assert_eq!(p, Parameter::AlignmentPrecision);
        assert_eq!(v, 0);
        assert!(matches!(
            parse_assignment("alignmentPrecision"),
            Err(SimError::InvalidAssignment(_))
        ));
        assert!(matches!(
            parse_assignment("alignmentPrecision=high"),
            Err(SimError::InvalidAssignment(_))
        ));
        assert!(matches!(
            parse_assignment("laser=5"),
            Err(SimError::UnknownParameter(_))
        ));
    }
}
