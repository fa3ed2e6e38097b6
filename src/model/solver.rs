//! Newton-Raphson recovery of electrical power from a thermal flow target.

use thiserror::Error;

use super::heat_rate::HeatRateCurve;

/// Maximum number of Newton steps per solve.
pub const MAX_ITERATIONS: u32 = 20;

/// Absolute convergence tolerance on the thermal-balance residual.
pub const RESIDUAL_TOLERANCE: f64 = 1e-4;

/// Smallest residual derivative magnitude accepted for a Newton step.
const DERIVATIVE_FLOOR: f64 = 1e-12;

/// Outcome of one power solve.
///
/// `converged == false` means the iteration cap was reached and `power_mw`
/// holds the last iterate; the residual there may exceed
/// [`RESIDUAL_TOLERANCE`]. The caller decides whether an unconverged value is
/// usable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Recovered electrical power (MW).
    pub power_mw: f64,
    /// Newton steps taken before returning.
    pub iterations: u32,
    /// Whether the residual met [`RESIDUAL_TOLERANCE`].
    pub converged: bool,
}

/// Failure of a power solve.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The residual derivative vanished at the current iterate, leaving the
    /// Newton step undefined. Failing here keeps NaN/infinity out of the
    /// published values.
    #[error(
        "residual derivative {derivative:.3e} too close to zero at iterate {power_mw:.3} MW"
    )]
    DegenerateDerivative {
        /// Iterate at which the derivative vanished (MW).
        power_mw: f64,
        /// The offending derivative value.
        derivative: f64,
    },
}

/// Recovers the electrical power consistent with a target thermal flow.
///
/// Wraps a [`HeatRateCurve`] together with the energy-unit conversion factor
/// and runs a capped Newton-Raphson iteration against the curve's
/// thermal-balance residual.
///
/// # Examples
///
/// ```
/// use ng_federate::model::{HeatRateCurve, PowerSolver};
///
/// let curve = HeatRateCurve::new(20.0, -0.075, 0.001);
/// let solver = PowerSolver::new(curve, 3.6);
/// let thermal = curve.heat_rate(500.0) * 500.0 / 3.6;
/// let solution = solver.solve(thermal, 500.0).unwrap();
/// assert!(solution.converged);
/// assert!((solution.power_mw - 500.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PowerSolver {
    curve: HeatRateCurve,
    unit_factor: f64,
}

impl PowerSolver {
    /// Creates a solver over the given curve.
    ///
    /// # Arguments
    ///
    /// * `curve` - Heat-rate curve defining the residual
    /// * `unit_factor` - MJ/kWh to MJ/MWh conversion factor (must be > 0)
    ///
    /// # Panics
    ///
    /// Panics if `unit_factor` is not positive.
    pub fn new(curve: HeatRateCurve, unit_factor: f64) -> Self {
        assert!(unit_factor > 0.0, "unit_factor must be > 0");
        Self { curve, unit_factor }
    }

    /// Finds the power whose thermal-balance residual is (near) zero.
    ///
    /// The initial guess is also captured as the fixed `power_base` of the
    /// residual's coupling term, so the fixed point reached depends on where
    /// the solve started. Each step re-seeds nothing: callers wanting the
    /// per-request contract pass the current request, never a previous
    /// solution.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::DegenerateDerivative`] if the residual
    /// derivative magnitude drops below an internal floor.
    pub fn solve(&self, thermal_mw: f64, initial_guess_mw: f64) -> Result<Solution, SolveError> {
        let power_base = initial_guess_mw;
        let mut power = initial_guess_mw;

        for iteration in 0..MAX_ITERATIONS {
            let residual = self
                .curve
                .residual(thermal_mw, self.unit_factor, power, power_base);
            if residual.abs() <= RESIDUAL_TOLERANCE {
                return Ok(Solution {
                    power_mw: power,
                    iterations: iteration,
                    converged: true,
                });
            }

            let derivative = self.curve.residual_derivative(power);
            if derivative.abs() < DERIVATIVE_FLOOR {
                return Err(SolveError::DegenerateDerivative {
                    power_mw: power,
                    derivative,
                });
            }

            power -= residual / derivative;
        }

        // Cap reached: hand back the last iterate and let the caller decide.
        Ok(Solution {
            power_mw: power,
            iterations: MAX_ITERATIONS,
            converged: false,
        })
    }

    /// The curve this solver iterates against.
    pub fn curve(&self) -> HeatRateCurve {
        self.curve
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline_solver() -> PowerSolver {
        PowerSolver::new(HeatRateCurve::new(20.0, -0.075, 0.001), 3.6)
    }

    #[test]
    fn recovers_requested_power_when_flow_is_feasible() {
        let solver = baseline_solver();
        // 500 MW at baseline coefficients: heat rate 232.5 MJ/kWh,
        // thermal flow ~32291.7 MJ/s, already inside [0, 1000] m^3/s at
        // GCV 39, so the solve should give 500 back.
        let thermal = solver.curve().heat_rate(500.0) * 500.0 / 3.6;
        let solution = solver.solve(thermal, 500.0).unwrap();
        assert!(solution.converged);
        assert!(solution.iterations <= MAX_ITERATIONS);
        assert!((solution.power_mw - 500.0).abs() < 1e-3);
    }

    #[test]
    fn solved_root_satisfies_the_residual_tolerance() {
        let solver = baseline_solver();
        // Thermal target from a clamped flow of 1000 m^3/s at GCV 39,
        // initial guess well above the achievable level.
        let thermal = 39.0 * 1000.0;
        let guess = 1500.0;
        let solution = solver.solve(thermal, guess).unwrap();
        assert!(solution.converged);
        let residual = solver
            .curve()
            .residual(thermal, 3.6, solution.power_mw, guess);
        assert!(residual.abs() <= RESIDUAL_TOLERANCE);
        assert!(solution.power_mw < guess);
    }

    #[test]
    fn zero_thermal_target_drives_power_to_zero() {
        let solver = baseline_solver();
        let solution = solver.solve(0.0, -100.0).unwrap();
        assert!(solution.converged);
        assert!(solution.power_mw.abs() < 1e-2);
    }

    #[test]
    fn degenerate_derivative_fails_fast() {
        // -(hr0 + 2*hr1*p + 3*hr2*p^2) == 0 exactly at p = 1 for these
        // coefficients, and the residual there is far from tolerance.
        let solver = PowerSolver::new(HeatRateCurve::new(3.0, 0.0, -1.0), 3.6);
        let result = solver.solve(10.0, 1.0);
        match result {
            Err(SolveError::DegenerateDerivative { power_mw, .. }) => {
                assert_eq!(power_mw, 1.0);
            }
            other => panic!("expected DegenerateDerivative, got {other:?}"),
        }
    }

    #[test]
    fn iteration_cap_is_reported_not_hidden() {
        let solver = baseline_solver();
        // A target twelve orders of magnitude above the guess: Newton
        // shrinks the overshoot by ~1/3 per step, which cannot close the
        // gap within the cap.
        let solution = solver.solve(1e18, 500.0).unwrap();
        assert!(!solution.converged);
        assert_eq!(solution.iterations, MAX_ITERATIONS);
        assert!(solution.power_mw.is_finite());
    }

    #[test]
    fn no_warm_start_between_solves() {
        let solver = baseline_solver();
        let thermal = 39.0 * 1000.0;
        // Repeated solves from the same request are bitwise identical; no
        // state survives a solve.
        let a = solver.solve(thermal, 1500.0).unwrap();
        let b = solver.solve(thermal, 1500.0).unwrap();
        assert_eq!(a.power_mw, b.power_mw);
        assert_eq!(a.iterations, b.iterations);
    }
}
