//! Federate orchestration: runtime boundary, per-node coupling, and the
//! synchronized exchange loop.

/// Exchange step loop over granted ticks.
pub mod controller;
/// Per-node channel naming and curve ownership.
pub mod node;
pub mod replay;
/// Co-simulation runtime boundary trait.
pub mod runtime;
pub mod types;

// Re-export the main types for convenience
pub use controller::ExchangeLoop;
pub use controller::FederateError;
pub use node::NodeCoupling;
pub use replay::ReplayRuntime;
pub use runtime::CosimRuntime;
pub use runtime::RuntimeError;
pub use runtime::TIME_MAX;
pub use types::FederateParams;
pub use types::NodeExchange;
