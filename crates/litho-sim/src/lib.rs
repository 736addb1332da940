//! # litho-sim - Lithography Tool Telemetry Simulator
//!
//! Synthetic process telemetry for a lithography scanner: six control
//! parameters drive six derived quantities with bounded noise, a rolling
//! history feeds the charts, and fixed thresholds raise alerts.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           litho-sim                              │
//! │                                                                  │
//! │   DriverHandle ──commands──► SimulationDriver (single task)      │
//! │                                   │                              │
//! │                                   ▼                              │
//! │                 ┌──────────────────────────────────┐             │
//! │                 │            Dashboard             │             │
//! │                 │  ControlParameters  RunState     │             │
//! │                 │        │                         │             │
//! │                 │        ▼                         │             │
//! │                 │   generator::generate(rng)       │             │
//! │                 │     │               │            │             │
//! │                 │     ▼               ▼            │             │
//! │                 │  History (21)   AlertLog (5)     │             │
//! │                 └──────────────────────────────────┘             │
//! │                                   │                              │
//! │                                   ▼                              │
//! │                 DashboardSnapshot / TickOutcome stream           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use litho_sim::{Dashboard, Parameter};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut dashboard = Dashboard::new(StdRng::seed_from_u64(7));
//! dashboard.set_parameter(Parameter::VibrationControl, 10);
//! dashboard.start();
//!
//! for _ in 0..10 {
//!     if let Some(outcome) = dashboard.tick() {
//!         for alert in &outcome.alerts {
//!             println!("[{}] {}", alert.severity, alert.message);
//!         }
//!     }
//! }
//! ```
//!
//! ## Alert Thresholds
//!
//! | Metric                | Fires when | Severity |
//! |-----------------------|------------|----------|
//! | Overlay accuracy      | > 3.0 nm   | error    |
//! | Focus stability       | > 12 nm    | error    |
//! | Temperature variation | > 1.2 mK   | warning  |
//! | Vibration level       | > 2.5 nm   | warning  |
//! | Vacuum quality        | > 2e-6 mbar| error    |

pub mod buffer;
pub mod config;
pub mod core;
pub mod driver;
pub mod engine;
pub mod error;
pub mod generator;
pub mod logging;

pub use buffer::{ALERT_LOG_CAPACITY, AlertLog, BoundedBuffer, HISTORY_CAPACITY, History};
pub use config::DashboardConfig;
pub use crate::core::{
    Alert, ChartKind, ControlParameters, Metric, Parameter, Reading, Severity, TickInterval,
};
pub use driver::{DriverHandle, SimulationDriver};
pub use engine::{
    Dashboard, DashboardCommand, DashboardSnapshot, DashboardStats, RunState, TickOutcome,
};
pub use error::{Result, SimError};
pub use generator::{Generation, Measurements, generate};
