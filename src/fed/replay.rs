//! Deterministic in-process runtime for standalone runs and tests.

use std::collections::HashMap;

use super::runtime::{CosimRuntime, RuntimeError};

/// A [`CosimRuntime`] that replays configured input schedules.
///
/// Grants time in exact requested steps (optionally capped, to exercise the
/// granted-less-than-requested contract), serves each input channel from a
/// per-channel schedule indexed by granted tick (wrapping when the schedule
/// is shorter than the run), and records every published value for later
/// inspection.
///
/// # Examples
///
/// ```
/// use ng_federate::fed::{CosimRuntime, ReplayRuntime};
///
/// let mut runtime = ReplayRuntime::new(1.0);
/// runtime.add_schedule("node.2.requested", vec![500.0, 650.0]);
/// runtime.enter_execution_mode().unwrap();
/// assert_eq!(runtime.request_time(1.0).unwrap(), 1.0);
/// assert_eq!(runtime.read_input("node.2.requested").unwrap(), 500.0);
/// ```
#[derive(Debug, Default)]
pub struct ReplayRuntime {
    update_interval: f64,
    max_advance: Option<f64>,
    time: f64,
    ticks: usize,
    executing: bool,
    disconnected: bool,
    inputs: HashMap<String, Vec<f64>>,
    outputs: HashMap<String, Vec<f64>>,
}

impl ReplayRuntime {
    /// Creates a runtime granting time in steps of `update_interval`.
    ///
    /// # Panics
    ///
    /// Panics if `update_interval` is not positive.
    pub fn new(update_interval: f64) -> Self {
        assert!(update_interval > 0.0, "update_interval must be > 0");
        Self {
            update_interval,
            ..Self::default()
        }
    }

    /// Caps how far a single grant may advance simulated time.
    ///
    /// With a cap below the federate's requested step, grants come back
    /// smaller than requested, which is legal under the synchronization
    /// contract.
    pub fn set_max_advance(&mut self, max_advance: f64) {
        assert!(max_advance > 0.0, "max_advance must be > 0");
        self.max_advance = Some(max_advance);
    }

    /// Registers the replay schedule for one input channel.
    pub fn add_schedule(&mut self, channel: &str, values: Vec<f64>) {
        assert!(!values.is_empty(), "schedule must not be empty");
        self.inputs.insert(channel.to_string(), values);
    }

    /// Values published on a channel so far, in publish order.
    pub fn published(&self, channel: &str) -> &[f64] {
        self.outputs.get(channel).map_or(&[], Vec::as_slice)
    }

    /// Granted ticks completed so far.
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Whether the federate has disconnected.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl CosimRuntime for ReplayRuntime {
    fn enter_execution_mode(&mut self) -> Result<(), RuntimeError> {
        if self.executing {
            return Err(RuntimeError::Sync(
                "already in execution mode".to_string(),
            ));
        }
        self.executing = true;
        Ok(())
    }

    fn update_interval(&self) -> Result<f64, RuntimeError> {
        Ok(self.update_interval)
    }

    fn request_time(&mut self, target_time: f64) -> Result<f64, RuntimeError> {
        if !self.executing {
            return Err(RuntimeError::Sync("not in execution mode".to_string()));
        }
        // The teardown release request saturates instead of advancing.
        if target_time >= f64::MAX {
            return Ok(self.time);
        }
        let step = match self.max_advance {
            Some(cap) => (target_time - self.time).min(cap),
            None => target_time - self.time,
        };
        self.time += step;
        self.ticks += 1;
        Ok(self.time)
    }

    fn read_input(&mut self, channel: &str) -> Result<f64, RuntimeError> {
        if !self.executing {
            return Err(RuntimeError::Sync("not in execution mode".to_string()));
        }
        let schedule = self
            .inputs
            .get(channel)
            .ok_or_else(|| RuntimeError::UnknownChannel(channel.to_string()))?;
        let index = self.ticks.saturating_sub(1) % schedule.len();
        Ok(schedule[index])
    }

    fn write_output(&mut self, channel: &str, value: f64) -> Result<(), RuntimeError> {
        if !self.executing {
            return Err(RuntimeError::Sync("not in execution mode".to_string()));
        }
        self.outputs.entry(channel.to_string()).or_default().push(value);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), RuntimeError> {
        if self.disconnected {
            return Err(RuntimeError::Sync("already disconnected".to_string()));
        }
        self.disconnected = true;
        Ok(())
    }

    fn release(&mut self) -> Result<(), RuntimeError> {
        Ok(())
    }
}
