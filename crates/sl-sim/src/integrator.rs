//! Fixed-step time integrators.

use sl_core::Real;

use crate::error::SimResult;
use crate::model::TransientModel;
use crate::state::StateVector;

/// Trait for time integrators.
pub trait Integrator {
    /// Advance state by one time step using the transient model.
    fn step<M: TransientModel + ?Sized>(
        &self,
        model: &M,
        t: Real,
        x: &StateVector,
        dt: Real,
    ) -> SimResult<StateVector>;
}

/// Forward Euler (explicit, 1st order).
///
/// x_new = x + dt * rhs(t, x), with the derivative evaluated once at the
/// start of the step.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel + ?Sized>(
        &self,
        model: &M,
        t: Real,
        x: &StateVector,
        dt: Real,
    ) -> SimResult<StateVector> {
        let xdot = model.rhs(t, x)?;
        x.add_scaled(&xdot, dt)
    }
}
