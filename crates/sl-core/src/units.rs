// sl-core/src/units.rs

use uom::si::f64::{
    Acceleration as UomAcceleration, Area as UomArea, Length as UomLength, Velocity as UomVelocity,
};

// Public canonical unit types (SI, f64)
pub type Accel = UomAcceleration;
pub type Area = UomArea;
pub type Length = UomLength;
pub type Velocity = UomVelocity;

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

/// Cross-section of a circular opening of the given diameter.
#[inline]
pub fn circle_area(diameter: Length) -> Area {
    diameter * diameter * std::f64::consts::PI / 4.0
}

/// Torricelli outflow speed sqrt(2 g h) for a liquid column of height `h`.
///
/// Negative heights are treated as an empty column.
pub fn torricelli_speed(h: Length) -> Velocity {
    use uom::si::velocity::meter_per_second;
    let g = constants::g0().value;
    Velocity::new::<meter_per_second>((2.0 * g * h.value.max(0.0)).sqrt())
}

pub mod constants {
    use super::*;

    pub const G0_MPS2: f64 = 9.806_65;

    #[inline]
    pub fn g0() -> Accel {
        use uom::si::acceleration::meter_per_second_squared;
        Accel::new::<meter_per_second_squared>(G0_MPS2)
    }
}
