//! Exchange step loop: the synchronized read-convert-clamp-solve-publish
//! protocol, run once per node per granted tick.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{PowerSolver, SolveError};

use super::node::NodeCoupling;
use super::runtime::{CosimRuntime, RuntimeError, TIME_MAX};
use super::types::{FederateParams, NodeExchange};

/// Failure of the exchange loop. All variants are fatal.
#[derive(Debug, Error)]
pub enum FederateError {
    /// The runtime boundary failed; the step cannot complete.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    /// The power solve for one node failed.
    #[error("power solve failed for node {node_id} at t={time}: {source}")]
    Solve {
        /// Node whose solve failed.
        node_id: String,
        /// Granted time of the failing step.
        time: f64,
        /// Underlying solver failure.
        source: SolveError,
    },
}

/// Drives the per-timestep exchange protocol for a set of network nodes.
///
/// The loop is single-threaded and step-synchronized: the only suspension
/// point is the runtime's blocking time request, and all per-node work within
/// a granted tick runs sequentially. Node results never interact.
pub struct ExchangeLoop {
    params: FederateParams,
    nodes: Vec<NodeCoupling>,
}

impl ExchangeLoop {
    /// Creates the loop over the registered nodes.
    ///
    /// # Panics
    ///
    /// Panics if `nodes` is empty.
    pub fn new(params: FederateParams, nodes: Vec<NodeCoupling>) -> Self {
        assert!(!nodes.is_empty(), "at least one node must be registered");
        Self { params, nodes }
    }

    /// Runs the full simulated interval against the given runtime and
    /// returns every node exchange in execution order.
    ///
    /// Termination is decided on the *granted* time, which may trail the
    /// requested time. On orderly exit the loop releases the time barrier,
    /// disconnects, and frees the runtime, once each.
    ///
    /// # Errors
    ///
    /// Returns the first [`FederateError`] encountered; no teardown is
    /// attempted after a failure.
    pub fn run(&self, runtime: &mut impl CosimRuntime) -> Result<Vec<NodeExchange>, FederateError> {
        runtime.enter_execution_mode()?;
        let update_interval = runtime.update_interval()?;
        info!(
            nodes = self.nodes.len(),
            update_interval,
            total_interval = self.params.total_interval,
            "entered execution mode"
        );

        let mut records = Vec::new();
        let mut granted = 0.0;
        while granted < self.params.total_interval {
            let requested = granted + update_interval;
            debug!(requested, "requesting time");
            granted = runtime.request_time(requested)?;
            debug!(granted, "granted time");

            for node in &self.nodes {
                records.push(self.step_node(runtime, node, granted)?);
            }
        }

        // Release the barrier before disconnecting, then tear down once.
        runtime.request_time(TIME_MAX)?;
        runtime.disconnect()?;
        runtime.release()?;
        info!("federate finalized");

        Ok(records)
    }

    /// Runs one node's exchange for one granted tick.
    fn step_node(
        &self,
        runtime: &mut impl CosimRuntime,
        node: &NodeCoupling,
        granted: f64,
    ) -> Result<NodeExchange, FederateError> {
        // 1. Receive the requested electrical power for this node
        let requested_mw = runtime.read_input(node.input_channel())?;
        debug!(node = node.id(), requested_mw, "received requested power");

        // 2. Heat rate at the request, thermal flow, required gas flow
        let heat_rate = node.curve().heat_rate(requested_mw);
        let thermal_mw = heat_rate * requested_mw / self.params.unit_factor;
        let flow_required = thermal_mw / self.params.gcv_mj_m3;
        debug!(
            node = node.id(),
            flow_m3s = flow_required,
            "flow required by the request"
        );

        // 3. Clamp to the deliverable range (upper bound first)
        let flow_delivered = self.params.clamp_flow(flow_required);
        debug!(
            node = node.id(),
            flow_m3s = flow_delivered,
            "flow deliverable"
        );

        // 4. Thermal flow actually deliverable from the clamped gas flow
        let thermal_avail = self.params.gcv_mj_m3 * flow_delivered;

        // 5. Recover achievable power, seeded from the current request
        // rather than any previous step's solution
        let solver = PowerSolver::new(node.curve(), self.params.unit_factor);
        let solution = solver
            .solve(thermal_avail, requested_mw)
            .map_err(|source| FederateError::Solve {
                node_id: node.id().to_string(),
                time: granted,
                source,
            })?;
        if !solution.converged {
            warn!(
                node = node.id(),
                iterations = solution.iterations,
                "solve hit the iteration cap; publishing the last iterate"
            );
        }

        // 6. Publish the achievable power back to the participant
        runtime.write_output(node.output_channel(), solution.power_mw)?;
        debug!(
            node = node.id(),
            available_mw = solution.power_mw,
            "published available power"
        );

        Ok(NodeExchange {
            granted_time: granted,
            node_id: node.id().to_string(),
            requested_mw,
            heat_rate_mj_kwh: heat_rate,
            flow_required_m3s: flow_required,
            flow_delivered_m3s: flow_delivered,
            available_mw: solution.power_mw,
            iterations: solution.iterations,
            converged: solution.converged,
        })
    }

    /// Registered node couplings, in execution order.
    pub fn nodes(&self) -> &[NodeCoupling] {
        &self.nodes
    }

    /// Process-wide parameters.
    pub fn params(&self) -> &FederateParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fed::replay::ReplayRuntime;
    use crate::model::HeatRateCurve;

    fn baseline_curve() -> HeatRateCurve {
        HeatRateCurve::new(20.0, -0.075, 0.001)
    }

    fn single_node_loop(total_interval: f64) -> ExchangeLoop {
        ExchangeLoop::new(
            FederateParams::new(3.6, 39.0, 0.0, 1000.0, total_interval),
            vec![NodeCoupling::new("2", baseline_curve())],
        )
    }

    #[test]
    fn one_read_and_one_publish_per_node_per_tick() {
        let fed = ExchangeLoop::new(
            FederateParams::new(3.6, 39.0, 0.0, 1000.0, 3.0),
            vec![
                NodeCoupling::new("2", baseline_curve()),
                NodeCoupling::new("3", baseline_curve()),
            ],
        );
        let mut rt = ReplayRuntime::new(1.0);
        rt.add_schedule("node.2.requested", vec![500.0]);
        rt.add_schedule("node.3.requested", vec![300.0]);

        let records = fed.run(&mut rt).unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(rt.published("node.2.avail").len(), 3);
        assert_eq!(rt.published("node.3.avail").len(), 3);
        assert!(rt.is_disconnected());
    }

    #[test]
    fn termination_uses_the_granted_time() {
        let fed = single_node_loop(1.0);
        let mut rt = ReplayRuntime::new(1.0);
        rt.set_max_advance(0.5);
        rt.add_schedule("node.2.requested", vec![500.0]);

        let records = fed.run(&mut rt).unwrap();
        // Grants of 0.5 mean two ticks are needed to cover the interval.
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].granted_time, 0.5);
        assert_eq!(records[1].granted_time, 1.0);
    }

    #[test]
    fn degenerate_solve_aborts_the_run() {
        // The flow limit forces a clamp, so the solve starts away from its
        // root, and these coefficients zero the residual derivative exactly
        // at the 1.0 MW guess.
        let fed = ExchangeLoop::new(
            FederateParams::new(3.6, 39.0, 0.0, 0.001, 1.0),
            vec![NodeCoupling::new("2", HeatRateCurve::new(3.0, 0.0, -1.0))],
        );
        let mut rt = ReplayRuntime::new(1.0);
        rt.add_schedule("node.2.requested", vec![1.0]);

        let err = fed.run(&mut rt).unwrap_err();
        assert!(matches!(err, FederateError::Solve { .. }));
        assert!(rt.published("node.2.avail").is_empty());
    }

    #[test]
    fn missing_input_channel_aborts_the_run() {
        let fed = single_node_loop(1.0);
        let mut rt = ReplayRuntime::new(1.0);

        let err = fed.run(&mut rt).unwrap_err();
        assert!(matches!(
            err,
            FederateError::Runtime(RuntimeError::UnknownChannel(_))
        ));
    }
}
