// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! Supervisory retry loop
//!
//! ```text
//! IDLE -> ATTEMPTING -> RUNNING
//!             ^   |
//!             |   v
//!            FAILED (sleep retry delay)
//! ```
//!
//! Every attempt starts from scratch: devices are re-enumerated and
//! re-probed, nothing carries over from a failed attempt. Failures are
//! retried forever with a fixed delay, except [`Error::Configuration`] which
//! ends [`Supervisor::run`]. Once a pipeline plays, the supervisor idles and
//! leaves the engine alone.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};

use crate::config::Config;
use crate::engine::ExecutionEngine;
use crate::format::select_format;
use crate::pipeline::PipelineConfig;
use crate::v4l2::{CapabilityQuery, DeviceEnumerator, DeviceProbe};
use crate::Error;

/// Period of the no-op wait while the pipeline runs.
pub const RUNNING_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Longest single sleep, bounding how late a termination request is noticed.
const SLEEP_SLICE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Attempting,
    Running,
    Failed,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SupervisorState::Idle => "IDLE",
            SupervisorState::Attempting => "ATTEMPTING",
            SupervisorState::Running => "RUNNING",
            SupervisorState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Blocking delay, replaceable in tests.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// [`Sleeper`] backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Outer control loop of the daemon.
pub struct Supervisor<Q, E, S = ThreadSleeper> {
    config: Config,
    query: Q,
    engine: E,
    sleeper: S,
    state: SupervisorState,
    attempts: u64,
    terminate: Arc<AtomicBool>,
}

impl<Q, E> Supervisor<Q, E, ThreadSleeper>
where
    Q: CapabilityQuery,
    E: ExecutionEngine,
{
    pub fn new(config: Config, query: Q, engine: E) -> Self {
        Supervisor {
            config,
            query,
            engine,
            sleeper: ThreadSleeper,
            state: SupervisorState::Idle,
            attempts: 0,
            terminate: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<Q, E, S> Supervisor<Q, E, S>
where
    Q: CapabilityQuery,
    E: ExecutionEngine,
    S: Sleeper,
{
    /// Replace the sleeper.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> Supervisor<Q, E, S2> {
        Supervisor {
            config: self.config,
            query: self.query,
            engine: self.engine,
            sleeper,
            state: self.state,
            attempts: self.attempts,
            terminate: self.terminate,
        }
    }

    /// Share a termination flag (set from a signal handler).
    pub fn with_termination(mut self, terminate: Arc<AtomicBool>) -> Self {
        self.terminate = terminate;
        self
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Number of construction attempts started so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn terminated(&self) -> bool {
        self.terminate.load(Ordering::Relaxed)
    }

    fn transition(&mut self, state: SupervisorState) {
        debug!("Supervisor state {} -> {}", self.state, state);
        self.state = state;
    }

    /// Run until a pipeline is playing and the process is asked to stop.
    ///
    /// Returns `Ok(())` only after termination has been requested.
    ///
    /// # Errors
    ///
    /// Only [`Error::Configuration`]; every other failure is retried.
    pub fn run(&mut self) -> Result<(), Error> {
        info!("Starting visiond");
        let delay = self.config.retry_delay();

        while !self.terminated() {
            match self.attempt() {
                Ok(pipeline) => {
                    self.transition(SupervisorState::Running);
                    self.idle(pipeline);
                }
                Err(e) if !e.is_retryable() => {
                    error!("{}", e);
                    return Err(e);
                }
                Err(e) => {
                    self.transition(SupervisorState::Failed);
                    error!("{}, retrying in {} sec", e, delay.as_secs());
                    self.wait(delay);
                }
            }
        }

        info!("Termination requested, stopping");
        Ok(())
    }

    /// One construction attempt, manual or automatic.
    pub fn attempt(&mut self) -> Result<E::Handle, Error> {
        self.transition(SupervisorState::Attempting);
        self.attempts += 1;

        match self.config.pipeline_override.clone() {
            Some(description) => {
                info!("pipeline_override set, constructing manual pipeline");
                self.manual_construct(&description)
            }
            None => {
                info!("pipeline_override is not set, auto-constructing pipeline");
                self.auto_construct()
            }
        }
    }

    fn manual_construct(&mut self, description: &str) -> Result<E::Handle, Error> {
        if description.trim().is_empty() {
            return Err(Error::Configuration(
                "manual construction requested but pipeline_override is empty".into(),
            ));
        }

        info!("Creating pipeline from config: {}", description);
        self.start(description).map_err(|e| match e {
            Error::PipelineConstruction(msg) => {
                Error::PipelineConstruction(format!("manual pipeline: {}", msg))
            }
            other => other,
        })
    }

    fn auto_construct(&mut self) -> Result<E::Handle, Error> {
        let config = self.resolve()?;
        info!("Creating stream object - {}", config);
        let description = config.launch_description();
        debug!("Launch description: {}", description);
        self.start(&description)
    }

    /// Device selection, probing and format selection for the auto path.
    pub fn resolve(&self) -> Result<PipelineConfig, Error> {
        let enumerator = DeviceEnumerator::new(&self.query);
        let probe = DeviceProbe::new(&self.query);

        let camera = enumerator.select_camera(self.config.camera_device.as_deref())?;
        let capability = probe.camera_capability(&camera).ok_or_else(|| {
            error!("Specified camera {} not valid", camera);
            Error::NoCameraFound
        })?;

        // Detection is advisory; the encoder below is not derived from it.
        let _hardware_encoder = enumerator.find_hardware_encoder();

        let selection = select_format(&capability, &self.config.format_overrides())?;

        PipelineConfig::build(
            camera,
            selection,
            self.config.geometry(),
            self.config.brightness,
            &self.config.output_settings(),
        )
    }

    fn start(&mut self, description: &str) -> Result<E::Handle, Error> {
        let pipeline = self.engine.build_pipeline(description)?;
        self.engine.set_playing(&pipeline)?;
        Ok(pipeline)
    }

    /// Hold the pipeline until termination is requested.
    fn idle(&mut self, pipeline: E::Handle) {
        info!("Pipeline playing");
        while !self.terminated() {
            self.sleeper.sleep(RUNNING_POLL_INTERVAL);
        }
        drop(pipeline);
    }

    /// Sleep `total`, returning early on termination.
    fn wait(&mut self, total: Duration) {
        let mut remaining = total;
        while !remaining.is_zero() && !self.terminated() {
            let slice = remaining.min(SLEEP_SLICE);
            self.sleeper.sleep(slice);
            remaining -= slice;
        }
    }
}
