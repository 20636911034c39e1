use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, CoreError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(CoreError::InvalidArg { what });
    }
    Ok(v)
}

/// Divide, substituting zero when the denominator is not a positive finite number.
///
/// Physical denominators here (area * height, inductance, mass) are never
/// legitimately negative, so a non-positive value means "no dynamics".
#[inline]
pub fn guarded_div(num: Real, den: Real) -> Real {
    if den > 0.0 && den.is_finite() {
        num / den
    } else {
        0.0
    }
}

/// Square root of the non-negative part of `v`.
#[inline]
pub fn sqrt_pos(v: Real) -> Real {
    v.max(0.0).sqrt()
}

/// Clamp `v` at zero from below. Returns true when the value was changed.
#[inline]
pub fn clamp_non_negative(v: &mut Real) -> bool {
    if *v < 0.0 {
        *v = 0.0;
        true
    } else {
        false
    }
}
