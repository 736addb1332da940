//! Dashboard configuration.
//!
//! Loaded from an optional JSON file; every field has a default so a
//! partial file (or none at all) is valid. CLI flags override file values.

use crate::core::{ChartKind, ControlParameters, Metric, TickInterval};
use crate::error::{Result, SimError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardConfig {
    /// Tick period in milliseconds (500, 1000 or 2000; default: 1000)
    pub tick_interval_ms: u64,
    /// Control parameters at startup (default: 70/80/75/85/90/65)
    pub parameters: ControlParameters,
    /// Initial chart kind (default: line)
    pub chart_kind: ChartKind,
    /// Initially visible metrics (default: all)
    pub visible_metrics: Option<Vec<Metric>>,
    /// Seed for reproducible runs (default: OS entropy)
    pub seed: Option<u64>,
    /// Fallback log filter when RUST_LOG is unset (default: info)
    pub log_level: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TickInterval::default().as_millis(),
            parameters: ControlParameters::default(),
            chart_kind: ChartKind::default(),
            visible_metrics: None,
            seed: None,
            log_level: "info".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Read and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SimError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| SimError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        TickInterval::try_from(self.tick_interval_ms)?;
        Ok(())
    }

    pub fn tick_interval(&self) -> Result<TickInterval> {
        TickInterval::try_from(self.tick_interval_ms)
    }

    /// Randomness source: seeded when configured, OS entropy otherwise
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "litho-sim-{}-{}.json",
            name,
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.parameters, ControlParameters::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let path = write_temp(
            "partial",
            r#"{"tickIntervalMs": 500, "parameters": {"opticalPower": 20}, "seed": 9}"#,
        );
        let config = DashboardConfig::load(&path).unwrap();
        assert_eq!(config.tick_interval().unwrap(), TickInterval::Fast);
        assert_eq!(config.parameters.optical_power, 20);
        assert_eq!(config.parameters.wafer_throughput, 70);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.log_level, "info");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_clamps_out_of_range_parameters() {
        let path = write_temp(
            "clamp",
            r#"{"parameters": {"opticalPower": 300, "vacuumPressure": -5}}"#,
        );
        let config = DashboardConfig::load(&path).unwrap();
        assert_eq!(config.parameters.optical_power, 100);
        assert_eq!(config.parameters.vacuum_pressure, 0);
        assert_eq!(config.parameters.thermal_stability, 75);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_rejects_bad_interval() {
        let path = write_temp("interval", r#"{"tickIntervalMs": 250}"#);
        assert!(matches!(
            DashboardConfig::load(&path),
            Err(SimError::UnsupportedTickInterval(250))
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_reports_parse_and_io_errors() {
        let path = write_temp("garbage", "{ not json");
        assert!(matches!(
            DashboardConfig::load(&path),
            Err(SimError::ConfigParse { .. })
        ));
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            DashboardConfig::load("/nonexistent/litho-sim.json"),
            Err(SimError::ConfigIo { .. })
        ));
    }

    #[test]
    fn test_seeded_rng_reproducible() {
        let config = DashboardConfig {
            seed: Some(123),
            ..Default::default()
        };
        let a: u64 = config.rng().random();
        let b: u64 = config.rng().random();
        assert_eq!(a, b);
    }
}
