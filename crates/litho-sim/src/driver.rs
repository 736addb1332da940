//! Simulation Driver
//!
//! A single tokio task owns the [`Dashboard`] and is the only code that
//! mutates it. Presentation calls arrive over a channel and are answered
//! through oneshot replies, so they interleave with ticks one at a time.
//!
//! ```text
//!  DriverHandle ──Command──► ┌──────────────────────────┐
//!  DriverHandle ──Command──► │ SimulationDriver (task)  │──TickOutcome──► subscribers
//!                            │  select! {               │
//!                            │    command => handle     │
//!                            │    pending sleep => tick │
//!                            │  }                       │
//!                            └──────────────────────────┘
//! ```
//!
//! Timing: `start` arms one sleep for the current interval. Each fired tick
//! arms the next sleep using the interval in effect at that moment, so
//! `set_tick_interval` never reschedules a wait already in flight. `pause`
//! and `reset` drop the pending sleep before replying; once the awaited
//! call returns, no further tick can fire.

use crate::core::{ChartKind, Metric, Parameter, TickInterval};
use crate::engine::{Dashboard, DashboardCommand, DashboardSnapshot, TickOutcome};
use crate::error::{Result, SimError};
use rand::Rng;
use std::pin::Pin;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep};
use tracing::{debug, info};

const COMMAND_QUEUE: usize = 64;
const EVENT_QUEUE: usize = 256;

enum Command {
    SetParameter {
        parameter: Parameter,
        value: i64,
        reply: oneshot::Sender<u8>,
    },
    Start {
        reply: oneshot::Sender<bool>,
    },
    Pause {
        reply: oneshot::Sender<bool>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    SetTickInterval {
        interval: TickInterval,
        reply: oneshot::Sender<()>,
    },
    ToggleVisibleMetric {
        metric: Metric,
        reply: oneshot::Sender<bool>,
    },
    SetChartKind {
        kind: ChartKind,
        reply: oneshot::Sender<()>,
    },
    Apply {
        command: DashboardCommand,
        reply: oneshot::Sender<Result<()>>,
    },
    Snapshot {
        reply: oneshot::Sender<DashboardSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<DashboardSnapshot>,
    },
}

/// Timer-driven owner of the dashboard state
pub struct SimulationDriver<R> {
    dashboard: Dashboard<R>,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<TickOutcome>,
    /// The one in-flight wait, if running
    pending: Option<Pin<Box<Sleep>>>,
}

impl<R: Rng + Send + 'static> SimulationDriver<R> {
    /// Spawn the driver task. The join handle yields the dashboard on exit.
    pub fn spawn(dashboard: Dashboard<R>) -> (DriverHandle, JoinHandle<Dashboard<R>>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        let (events, _) = broadcast::channel(EVENT_QUEUE);

        let mut driver = SimulationDriver {
            dashboard,
            commands: rx,
            events: events.clone(),
            pending: None,
        };
        // A dashboard configured as already running keeps its schedule
        if driver.dashboard.is_running() {
            driver.arm(Instant::now());
        }

        let handle = DriverHandle { tx, events };
        let task = tokio::spawn(driver.run());
        (handle, task)
    }

    async fn run(mut self) -> Dashboard<R> {
        info!("Simulation driver started");
        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(command) => {
                        if !self.handle(command) {
                            break;
                        }
                    }
                    // Every handle dropped
                    None => break,
                },

                deadline = fire(&mut self.pending) => self.on_tick(deadline),
            }
        }
        self.pending = None;
        info!(ticks = self.dashboard.stats().tick_count, "Simulation driver stopped");
        self.dashboard
    }

    /// Returns false when the driver should exit
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::SetParameter {
                parameter,
                value,
                reply,
            } => {
                let _ = reply.send(self.dashboard.set_parameter(parameter, value));
            }
            Command::Start { reply } => {
                let _ = reply.send(self.start());
            }
            Command::Pause { reply } => {
                let _ = reply.send(self.pause());
            }
            Command::Reset { reply } => {
                self.reset();
                let _ = reply.send(());
            }
            Command::SetTickInterval { interval, reply } => {
                self.dashboard.set_tick_interval(interval);
                let _ = reply.send(());
            }
            Command::ToggleVisibleMetric { metric, reply } => {
                let _ = reply.send(self.dashboard.toggle_visible_metric(metric));
            }
            Command::SetChartKind { kind, reply } => {
                self.dashboard.set_chart_kind(kind);
                let _ = reply.send(());
            }
            Command::Apply { command, reply } => {
                let _ = reply.send(self.apply(command));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.dashboard.snapshot());
            }
            Command::Shutdown { reply } => {
                self.pause();
                let _ = reply.send(self.dashboard.snapshot());
                return false;
            }
        }
        true
    }

    fn apply(&mut self, command: DashboardCommand) -> Result<()> {
        match command {
            DashboardCommand::Start => {
                self.start();
                Ok(())
            }
            DashboardCommand::Pause => {
                self.pause();
                Ok(())
            }
            DashboardCommand::Reset => {
                self.reset();
                Ok(())
            }
            other => self.dashboard.apply(other),
        }
    }

    fn start(&mut self) -> bool {
        let started = self.dashboard.start();
        if started {
            self.arm(Instant::now());
        }
        started
    }

    fn pause(&mut self) -> bool {
        self.pending = None;
        self.dashboard.pause()
    }

    fn reset(&mut self) {
        self.pending = None;
        self.dashboard.reset();
    }

    fn on_tick(&mut self, deadline: Instant) {
        self.pending = None;
        if let Some(outcome) = self.dashboard.tick() {
            // No subscribers is fine
            let _ = self.events.send(outcome);
        }
        if self.dashboard.is_running() {
            self.arm(deadline);
        }
    }

    /// Schedule the next tick one interval after `from`
    fn arm(&mut self, from: Instant) {
        let interval = self.dashboard.tick_interval();
        debug!(interval_ms = interval.as_millis(), "Next tick scheduled");
        self.pending = Some(Box::pin(tokio::time::sleep_until(
            from + interval.as_duration(),
        )));
    }
}

/// Resolves with the fired deadline, or never if nothing is pending
async fn fire(pending: &mut Option<Pin<Box<Sleep>>>) -> Instant {
    match pending {
        Some(sleep) => {
            let deadline = sleep.deadline();
            sleep.as_mut().await;
            deadline
        }
        None => std::future::pending().await,
    }
}

/// Cloneable handle used by the presentation layer
#[derive(Clone)]
pub struct DriverHandle {
    tx: mpsc::Sender<Command>,
    events: broadcast::Sender<TickOutcome>,
}

impl DriverHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| SimError::DriverStopped)?;
        rx.await.map_err(|_| SimError::DriverStopped)
    }

    /// Returns the stored (clamped) value
    pub async fn set_parameter(&self, parameter: Parameter, value: i64) -> Result<u8> {
        self.request(|reply| Command::SetParameter {
            parameter,
            value,
            reply,
        })
        .await
    }

    pub async fn start(&self) -> Result<bool> {
        self.request(|reply| Command::Start { reply }).await
    }

    /// Once this returns, no further reading is appended
    pub async fn pause(&self) -> Result<bool> {
        self.request(|reply| Command::Pause { reply }).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.request(|reply| Command::Reset { reply }).await
    }

    pub async fn set_tick_interval(&self, interval: TickInterval) -> Result<()> {
        self.request(|reply| Command::SetTickInterval { interval, reply })
            .await
    }

    pub async fn toggle_visible_metric(&self, metric: Metric) -> Result<bool> {
        self.request(|reply| Command::ToggleVisibleMetric { metric, reply })
            .await
    }

    pub async fn set_chart_kind(&self, kind: ChartKind) -> Result<()> {
        self.request(|reply| Command::SetChartKind { kind, reply })
            .await
    }

    /// Apply a serialized command
    pub async fn apply(&self, command: DashboardCommand) -> Result<()> {
        self.request(|reply| Command::Apply { command, reply })
            .await?
    }

    pub async fn snapshot(&self) -> Result<DashboardSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Stream of tick outcomes
    pub fn subscribe(&self) -> broadcast::Receiver<TickOutcome> {
        self.events.subscribe()
    }

    /// Stop the driver task, returning the final state
    pub async fn shutdown(&self) -> Result<DashboardSnapshot> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}
