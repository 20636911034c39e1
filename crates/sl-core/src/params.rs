//! Declared parameter ranges and numeric text entry.
//!
//! Every tunable model input is described by a [`ParamSpec`]: the same
//! name/label/unit/range information a slider or text field needs. Range
//! checks and text parsing live here so a rejected entry never reaches a
//! model.

use crate::error::{CoreError, CoreResult};
use crate::numeric::Real;

/// Declared range and default for one named parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParamSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub min: Real,
    pub max: Real,
    pub default: Real,
}

impl ParamSpec {
    pub const fn new(
        name: &'static str,
        label: &'static str,
        unit: &'static str,
        min: Real,
        max: Real,
        default: Real,
    ) -> Self {
        Self {
            name,
            label,
            unit,
            min,
            max,
            default,
        }
    }

    /// Accept `value` if it is finite and inside `[min, max]`.
    pub fn check(&self, value: Real) -> CoreResult<Real> {
        if !value.is_finite() {
            return Err(CoreError::NonFinite {
                what: self.name,
                value,
            });
        }
        if value < self.min || value > self.max {
            return Err(CoreError::OutOfRange {
                what: self.name,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(value)
    }

    /// Parse a text entry and range-check it.
    pub fn parse(&self, text: &str) -> CoreResult<Real> {
        self.check(parse_entry(text, self.name)?)
    }
}

/// Parse a numeric text entry. Blank, non-numeric and non-finite input is rejected.
pub fn parse_entry(text: &str, what: &str) -> CoreResult<Real> {
    let trimmed = text.trim();
    let value: Real = trimmed.parse().map_err(|_| CoreError::Parse {
        what: what.to_string(),
        input: text.to_string(),
    })?;
    if !value.is_finite() {
        return Err(CoreError::Parse {
            what: what.to_string(),
            input: text.to_string(),
        });
    }
    Ok(value)
}

/// Find a spec by name.
pub fn find_spec<'a>(specs: &'a [ParamSpec], name: &str) -> CoreResult<&'a ParamSpec> {
    specs
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| CoreError::UnknownParam {
            name: name.to_string(),
        })
}

/// A set of named numeric parameters with declared ranges.
pub trait ParameterSet {
    /// Declared ranges, in display order.
    fn specs(&self) -> &'static [ParamSpec];

    /// Current value of a parameter.
    fn get(&self, name: &str) -> Option<Real>;

    /// Overwrite one parameter. Unknown names are an error.
    fn set(&mut self, name: &str, value: Real) -> CoreResult<()>;

    /// Names accepted by `get`/`set`. Defaults to the spec names.
    fn names(&self) -> Vec<String> {
        self.specs().iter().map(|s| s.name.to_string()).collect()
    }

    /// Spec governing a settable name. Defaults to an exact match.
    fn spec_for(&self, name: &str) -> CoreResult<&'static ParamSpec> {
        find_spec(self.specs(), name)
    }

    /// Range-check every value against its declared spec.
    fn check_ranges(&self) -> CoreResult<()> {
        for name in self.names() {
            let spec = self.spec_for(&name)?;
            let value = self
                .get(&name)
                .ok_or_else(|| CoreError::UnknownParam { name: name.clone() })?;
            spec.check(value)?;
        }
        Ok(())
    }

    /// Parse `text` as the new value of `name`, range-check it, and apply it.
    ///
    /// On error the set is left untouched.
    fn set_from_text(&mut self, name: &str, text: &str) -> CoreResult<Real> {
        let spec = self.spec_for(name)?;
        let value = spec.parse(text)?;
        self.set(name, value)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECS: [ParamSpec; 2] = [
        ParamSpec::new("k", "Drain constant", "1/s", 0.05, 1.5, 0.4),
        ParamSpec::new("r", "Radius", "m", 0.2, 2.5, 0.5),
    ];

    #[derive(Debug, Clone, PartialEq)]
    struct Pair {
        k: Real,
        r: Real,
    }

    impl ParameterSet for Pair {
        fn specs(&self) -> &'static [ParamSpec] {
            &SPECS
        }

        fn get(&self, name: &str) -> Option<Real> {
            match name {
                "k" => Some(self.k),
                "r" => Some(self.r),
                _ => None,
            }
        }

        fn set(&mut self, name: &str, value: Real) -> CoreResult<()> {
            match name {
                "k" => self.k = value,
                "r" => self.r = value,
                _ => {
                    return Err(CoreError::UnknownParam {
                        name: name.to_string(),
                    });
                }
            }
            Ok(())
        }
    }

    #[test]
    fn parse_entry_accepts_padded_numbers() {
        assert_eq!(parse_entry(" 0.25 ", "k").unwrap(), 0.25);
        assert_eq!(parse_entry("1e-2", "k").unwrap(), 0.01);
    }

    #[test]
    fn parse_entry_rejects_garbage() {
        assert!(matches!(
            parse_entry("abc", "k"),
            Err(CoreError::Parse { .. })
        ));
        assert!(parse_entry("", "k").is_err());
        assert!(parse_entry("NaN", "k").is_err());
        assert!(parse_entry("inf", "k").is_err());
    }

    #[test]
    fn spec_range_check() {
        let spec = &SPECS[1];
        assert!(spec.check(0.2).is_ok());
        assert!(spec.check(2.5).is_ok());
        let err = spec.check(3.0).unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { what: "r", .. }));
    }

    #[test]
    fn set_from_text_leaves_value_on_error() {
        let mut p = Pair { k: 0.4, r: 0.5 };
        assert!(p.set_from_text("k", "oops").is_err());
        assert!(p.set_from_text("k", "9.0").is_err());
        assert!(p.set_from_text("missing", "1.0").is_err());
        assert_eq!(p, Pair { k: 0.4, r: 0.5 });

        assert_eq!(p.set_from_text("k", "0.8").unwrap(), 0.8);
        assert_eq!(p.k, 0.8);
        assert!(p.check_ranges().is_ok());
    }
}
