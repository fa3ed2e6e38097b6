//! Per-node coupling to a transmission network participant.

use crate::model::HeatRateCurve;

/// One network node's exchange channels and conversion curve.
///
/// Each registered node gets an independent copy of the heat-rate curve;
/// node computations never share state within or across steps.
#[derive(Debug, Clone)]
pub struct NodeCoupling {
    id: String,
    input_channel: String,
    output_channel: String,
    curve: HeatRateCurve,
}

impl NodeCoupling {
    /// Creates the coupling for one node.
    ///
    /// Channel names are derived from the node id: `node.<id>.requested` for
    /// the inbound power request and `node.<id>.avail` for the outbound
    /// achievable power.
    pub fn new(id: &str, curve: HeatRateCurve) -> Self {
        Self {
            id: id.to_string(),
            input_channel: format!("node.{id}.requested"),
            output_channel: format!("node.{id}.avail"),
            curve,
        }
    }

    /// Node identity (channel name suffix).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Inbound requested-power channel name.
    pub fn input_channel(&self) -> &str {
        &self.input_channel
    }

    /// Outbound achievable-power channel name.
    pub fn output_channel(&self) -> &str {
        &self.output_channel
    }

    /// This node's heat-rate curve.
    pub fn curve(&self) -> HeatRateCurve {
        self.curve
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_follow_the_convention() {
        let node = NodeCoupling::new("2", HeatRateCurve::new(20.0, -0.075, 0.001));
        assert_eq!(node.id(), "2");
        assert_eq!(node.input_channel(), "node.2.requested");
        assert_eq!(node.output_channel(), "node.2.avail");
    }

    #[test]
    fn each_coupling_owns_its_curve() {
        let a = NodeCoupling::new("2", HeatRateCurve::new(20.0, -0.075, 0.001));
        let b = NodeCoupling::new("3", HeatRateCurve::new(18.0, -0.05, 0.002));
        assert_ne!(a.curve(), b.curve());
    }
}
