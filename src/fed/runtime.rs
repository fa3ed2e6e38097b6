//! Boundary trait for the external co-simulation runtime.
//!
//! The federate never owns registration, transport, or time negotiation; it
//! consumes them through this trait. A production implementation would wrap a
//! co-simulation broker client; this crate ships only the deterministic
//! [`ReplayRuntime`](super::replay::ReplayRuntime) used for standalone runs
//! and tests.

use thiserror::Error;

/// Time value used to release the federate from the synchronization barrier
/// during teardown.
pub const TIME_MAX: f64 = f64::MAX;

/// Failure at the runtime boundary.
///
/// Every variant is fatal for the federate: each step's correctness depends
/// on both ends of the exchange, so there is no retry and no partial-result
/// recovery.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A read or write referenced a channel the runtime does not know.
    #[error("unknown exchange channel \"{0}\"")]
    UnknownChannel(String),
    /// The runtime rejected a call, e.g. out of lifecycle order.
    #[error("co-simulation runtime error: {0}")]
    Sync(String),
}

/// Request/grant time API plus scalar value exchange, as provided by a
/// co-simulation runtime.
///
/// Channel names follow the convention `node.<id>.requested` for inputs and
/// `node.<id>.avail` for outputs.
pub trait CosimRuntime {
    /// Moves the federate into execution mode. Called exactly once, before
    /// the first time request.
    fn enter_execution_mode(&mut self) -> Result<(), RuntimeError>;

    /// The negotiated update interval between granted ticks. Queried once at
    /// startup.
    fn update_interval(&self) -> Result<f64, RuntimeError>;

    /// Blocks until the runtime grants a simulated time.
    ///
    /// The granted time may be less than `target_time` but never exceeds it.
    /// Blocking here indefinitely is barrier semantics, not a failure; the
    /// call returns only when every coupled federate has caught up.
    fn request_time(&mut self, target_time: f64) -> Result<f64, RuntimeError>;

    /// Reads the current value on a named input channel.
    fn read_input(&mut self, channel: &str) -> Result<f64, RuntimeError>;

    /// Publishes a value on a named output channel.
    fn write_output(&mut self, channel: &str, value: f64) -> Result<(), RuntimeError>;

    /// Disconnects from the federation. Called exactly once, after the
    /// simulated interval is exhausted.
    fn disconnect(&mut self) -> Result<(), RuntimeError>;

    /// Releases runtime resources. Called exactly once, last.
    fn release(&mut self) -> Result<(), RuntimeError>;
}
