//! sl-core: shared foundation for simlab.
//!
//! Contains:
//! - numeric (Real + tolerances + guarded float helpers)
//! - units (uom SI types + constructors)
//! - params (declared parameter ranges and text-entry parsing)
//! - pacing (frame rate limiter for the cooperative loop)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod pacing;
pub mod params;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use pacing::RateLimiter;
pub use params::{ParamSpec, ParameterSet, parse_entry};
