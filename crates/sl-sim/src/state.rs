//! Numeric state vector shared by every model.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use sl_core::Real;

use crate::error::{SimError, SimResult};

/// Small fixed-size vector of physical unknowns.
///
/// The length is fixed by the model that created it; arithmetic between
/// vectors of different length is an error rather than a silent truncation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateVector(Vec<Real>);

impl StateVector {
    pub fn new(values: Vec<Real>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Real] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Real> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<Real> {
        self.0.get(index).copied()
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// `self + scale * other`, component-wise.
    pub fn add_scaled(&self, other: &StateVector, scale: Real) -> SimResult<StateVector> {
        other.expect_len(self.len())?;
        Ok(Self(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| a + scale * b)
                .collect(),
        ))
    }

    /// Error unless the vector has exactly `expected` components.
    pub fn expect_len(&self, expected: usize) -> SimResult<()> {
        if self.0.len() != expected {
            return Err(SimError::DimensionMismatch {
                expected,
                actual: self.0.len(),
            });
        }
        Ok(())
    }
}

impl Index<usize> for StateVector {
    type Output = Real;

    fn index(&self, index: usize) -> &Real {
        &self.0[index]
    }
}

impl IndexMut<usize> for StateVector {
    fn index_mut(&mut self, index: usize) -> &mut Real {
        &mut self.0[index]
    }
}

impl From<Vec<Real>> for StateVector {
    fn from(values: Vec<Real>) -> Self {
        Self(values)
    }
}

impl<const N: usize> From<[Real; N]> for StateVector {
    fn from(values: [Real; N]) -> Self {
        Self(values.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_scaled_component_wise() {
        let x = StateVector::from([1.0, 2.0]);
        let dx = StateVector::from([-2.0, 0.5]);
        let y = x.add_scaled(&dx, 0.1).unwrap();
        assert_eq!(y, StateVector::from([1.0 - 0.2, 2.0 + 0.05]));
    }

    #[test]
    fn add_scaled_rejects_mismatch() {
        let x = StateVector::from([1.0, 2.0]);
        let dx = StateVector::from([1.0]);
        assert_eq!(
            x.add_scaled(&dx, 1.0).unwrap_err(),
            SimError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }
}
