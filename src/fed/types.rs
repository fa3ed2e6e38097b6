//! Core federate types: process-wide parameters and step records.

use std::fmt;

/// Process-wide conversion constants and operating limits.
///
/// Fixed for the lifetime of the federate and shared read-only by every
/// node computation.
///
/// # Examples
///
/// ```
/// use ng_federate::fed::FederateParams;
///
/// let params = FederateParams::new(3.6, 39.0, 0.0, 1000.0, 1.0);
/// assert_eq!(params.clamp_flow(1200.0), 1000.0);
/// assert_eq!(params.clamp_flow(-5.0), 0.0);
/// assert_eq!(params.clamp_flow(827.99), 827.99);
/// ```
#[derive(Debug, Clone)]
pub struct FederateParams {
    /// MJ/kWh to MJ/MWh conversion factor.
    pub unit_factor: f64,
    /// Gross calorific value of the fuel (MJ/m³).
    pub gcv_mj_m3: f64,
    /// Minimum deliverable volumetric flow (m³/s).
    pub flow_min_m3s: f64,
    /// Maximum deliverable volumetric flow (m³/s).
    pub flow_max_m3s: f64,
    /// Total simulated interval the exchange loop runs for.
    pub total_interval: f64,
}

impl FederateParams {
    /// Creates the parameter set.
    ///
    /// # Panics
    ///
    /// Panics if `unit_factor` or `gcv_mj_m3` is not positive, if the flow
    /// bounds are inverted, or if `total_interval` is not positive.
    pub fn new(
        unit_factor: f64,
        gcv_mj_m3: f64,
        flow_min_m3s: f64,
        flow_max_m3s: f64,
        total_interval: f64,
    ) -> Self {
        assert!(unit_factor > 0.0, "unit_factor must be > 0");
        assert!(gcv_mj_m3 > 0.0, "gcv_mj_m3 must be > 0");
        assert!(
            flow_min_m3s <= flow_max_m3s,
            "flow_min_m3s must be <= flow_max_m3s"
        );
        assert!(total_interval > 0.0, "total_interval must be > 0");
        Self {
            unit_factor,
            gcv_mj_m3,
            flow_min_m3s,
            flow_max_m3s,
            total_interval,
        }
    }

    /// Clamps a volumetric flow to the deliverable range.
    ///
    /// The upper bound is checked first, then the lower; at most one bound
    /// can bind per call.
    pub fn clamp_flow(&self, flow_m3s: f64) -> f64 {
        if flow_m3s > self.flow_max_m3s {
            self.flow_max_m3s
        } else if flow_m3s < self.flow_min_m3s {
            self.flow_min_m3s
        } else {
            flow_m3s
        }
    }
}

/// Complete record of one node exchange within one granted tick.
#[derive(Debug, Clone)]
pub struct NodeExchange {
    /// Simulated time actually granted by the runtime for this tick.
    pub granted_time: f64,
    /// Network node identity (channel name suffix).
    pub node_id: String,
    /// Power requested by the paired transmission participant (MW).
    pub requested_mw: f64,
    /// Instantaneous heat rate at the requested power (MJ/kWh).
    pub heat_rate_mj_kwh: f64,
    /// Volumetric flow required to serve the request (m³/s).
    pub flow_required_m3s: f64,
    /// Volumetric flow after clamping to the deliverable range (m³/s).
    pub flow_delivered_m3s: f64,
    /// Achievable power published back to the participant (MW).
    pub available_mw: f64,
    /// Newton steps the power solve took.
    pub iterations: u32,
    /// Whether the power solve met its residual tolerance.
    pub converged: bool,
}

impl NodeExchange {
    /// Whether a flow bound was binding this step.
    pub fn limited(&self) -> bool {
        self.flow_delivered_m3s != self.flow_required_m3s
    }
}

impl fmt::Display for NodeExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>6.2} node {:>3} | req={:>9.2} MW  HR={:>8.2} MJ/kWh  \
             flow={:>9.2} -> {:>8.2} m3/s | avail={:>9.2} MW ({} iters, {})",
            self.granted_time,
            self.node_id,
            self.requested_mw,
            self.heat_rate_mj_kwh,
            self.flow_required_m3s,
            self.flow_delivered_m3s,
            self.available_mw,
            self.iterations,
            if self.converged { "converged" } else { "cap" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> FederateParams {
        FederateParams::new(3.6, 39.0, 0.0, 1000.0, 1.0)
    }

    #[test]
    fn clamp_is_idempotent_on_in_range_flows() {
        let p = params();
        assert_eq!(p.clamp_flow(827.99), 827.99);
        assert_eq!(p.clamp_flow(p.clamp_flow(1200.0)), 1000.0);
        assert_eq!(p.clamp_flow(p.clamp_flow(-3.0)), 0.0);
    }

    #[test]
    fn clamp_is_monotone() {
        let p = params();
        let samples = [-50.0, 0.0, 1.0, 500.0, 999.9, 1000.0, 2000.0];
        for pair in samples.windows(2) {
            assert!(p.clamp_flow(pair[0]) <= p.clamp_flow(pair[1]));
        }
    }

    #[test]
    fn clamp_binds_exactly_at_the_bounds() {
        let p = params();
        assert_eq!(p.clamp_flow(1000.0 + f64::EPSILON * 1000.0), 1000.0);
        assert_eq!(p.clamp_flow(-f64::MIN_POSITIVE), 0.0);
    }

    #[test]
    #[should_panic]
    fn inverted_flow_bounds_panic() {
        FederateParams::new(3.6, 39.0, 10.0, 5.0, 1.0);
    }

    #[test]
    fn exchange_display_does_not_panic() {
        let record = NodeExchange {
            granted_time: 1.0,
            node_id: "2".to_string(),
            requested_mw: 500.0,
            heat_rate_mj_kwh: 232.5,
            flow_required_m3s: 827.99,
            flow_delivered_m3s: 827.99,
            available_mw: 500.0,
            iterations: 0,
            converged: true,
        };
        let s = format!("{record}");
        assert!(!s.is_empty());
        assert!(!record.limited());
    }
}
