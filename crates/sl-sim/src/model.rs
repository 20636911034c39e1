//! TransientModel trait for pluggable dynamic systems.

use sl_core::Real;

use crate::error::SimResult;
use crate::events::PostStep;
use crate::state::StateVector;

/// Trait for transient (dynamic) system models.
///
/// A TransientModel must implement:
/// - Initial state derived from its parameters
/// - RHS (right-hand side) computation: x_dot = f(t, x)
/// - Post-step policy: clamp the state back into its physical domain and
///   report stop conditions
pub trait TransientModel {
    /// Number of state components.
    fn dim(&self) -> usize;

    /// Return the initial state at t=0.
    fn initial_state(&self) -> StateVector;

    /// Compute state derivative dxdt = f(t, x).
    ///
    /// Evaluated once per step at the current state; a zero or negative
    /// physical denominator yields a zero component instead of a non-finite one.
    fn rhs(&self, t: Real, x: &StateVector) -> SimResult<StateVector>;

    /// Clamp `x` (the freshly integrated state at time `t`) and decide whether
    /// the run ends. `prev` is the state before the step.
    fn post_step(&self, t: Real, prev: &StateVector, x: &mut StateVector) -> PostStep;
}
