// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::units::{parse_number, parse_number_list};

/// A transfer function type.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransferFunctionType {
    Identity,
    Table,
    Discrete,
    Linear,
    Gamma,
}

impl Default for TransferFunctionType {
    fn default() -> Self {
        TransferFunctionType::Identity
    }
}

impl TransferFunctionType {
    /// Returns the attribute value.
    pub fn to_str(self) -> &'static str {
        match self {
            TransferFunctionType::Identity => "identity",
            TransferFunctionType::Table => "table",
            TransferFunctionType::Discrete => "discrete",
            TransferFunctionType::Linear => "linear",
            TransferFunctionType::Gamma => "gamma",
        }
    }
}

/// An `feFuncR/G/B/A` element.
///
/// All parameters are kept regardless of the type, so switching the type back
/// restores previously set values.
#[allow(missing_docs)]
#[derive(Clone, PartialEq, Debug)]
pub struct TransferFunction {
    pub kind: TransferFunctionType,
    pub table_values: Vec<f32>,
    pub slope: f32,
    pub intercept: f32,
    pub amplitude: f32,
    pub exponent: f32,
    pub offset: f32,
}

impl Default for TransferFunction {
    fn default() -> Self {
        TransferFunction {
            kind: TransferFunctionType::Identity,
            table_values: Vec::new(),
            slope: 1.0,
            intercept: 0.0,
            amplitude: 1.0,
            exponent: 1.0,
            offset: 0.0,
        }
    }
}

impl TransferFunction {
    /// Checks that the function leaves a channel unchanged.
    ///
    /// `table` and `discrete` with no values are identity too.
    pub fn is_identity(&self) -> bool {
        match self.kind {
            TransferFunctionType::Identity => true,
            TransferFunctionType::Table | TransferFunctionType::Discrete => {
                self.table_values.is_empty()
            }
            TransferFunctionType::Linear | TransferFunctionType::Gamma => false,
        }
    }

    /// Evaluates the function for a channel value in the 0..1 range.
    ///
    /// The result is clamped to 0..1.
    pub fn evaluate(&self, c: f32) -> f32 {
        let v = &self.table_values;
        let c = match self.kind {
            TransferFunctionType::Identity => c,
            TransferFunctionType::Table if v.len() == 1 => v[0],
            TransferFunctionType::Table if !v.is_empty() => {
                let n = (v.len() - 1) as f32;
                let k = ((c * n).floor() as usize).min(v.len() - 1);
                if k == v.len() - 1 {
                    v[k]
                } else {
                    let t = c * n - k as f32;
                    v[k] + t * (v[k + 1] - v[k])
                }
            }
            TransferFunctionType::Discrete if !v.is_empty() => {
                let n = v.len();
                v[((c * n as f32).floor() as usize).min(n - 1)]
            }
            TransferFunctionType::Table | TransferFunctionType::Discrete => c,
            TransferFunctionType::Linear => self.slope * c + self.intercept,
            TransferFunctionType::Gamma => self.amplitude * c.powf(self.exponent) + self.offset,
        };

        if c.is_finite() {
            c.max(0.0).min(1.0)
        } else {
            0.0
        }
    }

    /// Applies an `feFuncX` attribute.
    pub fn set_attribute(&mut self, key: &str, value: Option<&str>) -> bool {
        let number = |default: f32| match value {
            Some(v) => parse_number(v).unwrap_or_else(|| {
                log::warn!("Invalid {} '{}'.", key, v);
                default
            }),
            None => default,
        };

        match key {
            "type" => {
                self.kind = match value {
                    Some("identity") | None => TransferFunctionType::Identity,
                    Some("table") => TransferFunctionType::Table,
                    Some("discrete") => TransferFunctionType::Discrete,
                    Some("linear") => TransferFunctionType::Linear,
                    Some("gamma") => TransferFunctionType::Gamma,
                    Some(v) => {
                        log::warn!("Unknown transfer function type '{}'.", v);
                        TransferFunctionType::Identity
                    }
                };
            }
            "tableValues" => {
                self.table_values = value.and_then(parse_number_list).unwrap_or_default();
            }
            "slope" => self.slope = number(1.0),
            "intercept" => self.intercept = number(0.0),
            "amplitude" => self.amplitude = number(1.0),
            "exponent" => self.exponent = number(1.0),
            "offset" => self.offset = number(0.0),
            _ => return false,
        }

        true
    }
}

/// A transfer function channel.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransferChannel {
    R,
    G,
    B,
    A,
}

impl TransferChannel {
    pub(crate) fn from_element_name(name: &str) -> Option<Self> {
        match name {
            "feFuncR" => Some(TransferChannel::R),
            "feFuncG" => Some(TransferChannel::G),
            "feFuncB" => Some(TransferChannel::B),
            "feFuncA" => Some(TransferChannel::A),
            _ => None,
        }
    }

    pub(crate) fn element_name(self) -> &'static str {
        match self {
            TransferChannel::R => "feFuncR",
            TransferChannel::G => "feFuncG",
            TransferChannel::B => "feFuncB",
            TransferChannel::A => "feFuncA",
        }
    }
}

/// An `feComponentTransfer` filter primitive.
#[allow(missing_docs)]
#[derive(Clone, Default, Debug)]
pub struct ComponentTransfer {
    pub func_r: TransferFunction,
    pub func_g: TransferFunction,
    pub func_b: TransferFunction,
    pub func_a: TransferFunction,
}

impl ComponentTransfer {
    /// Returns a channel transfer function.
    pub fn function(&self, channel: TransferChannel) -> &TransferFunction {
        match channel {
            TransferChannel::R => &self.func_r,
            TransferChannel::G => &self.func_g,
            TransferChannel::B => &self.func_b,
            TransferChannel::A => &self.func_a,
        }
    }

    /// Returns a channel transfer function, for modification.
    pub fn function_mut(&mut self, channel: TransferChannel) -> &mut TransferFunction {
        match channel {
            TransferChannel::R => &mut self.func_r,
            TransferChannel::G => &mut self.func_g,
            TransferChannel::B => &mut self.func_b,
            TransferChannel::A => &mut self.func_a,
        }
    }

    /// Applies an attribute of an `feFuncX` child.
    pub fn set_function_attribute(
        &mut self,
        channel: TransferChannel,
        key: &str,
        value: Option<&str>,
    ) -> bool {
        self.function_mut(channel).set_attribute(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn func(kind: &str, values: &str) -> TransferFunction {
        let mut f = TransferFunction::default();
        f.set_attribute("type", Some(kind));
        f.set_attribute("tableValues", Some(values));
        f
    }

    #[test]
    fn table() {
        let f = func("table", "0 1 0");
        assert_eq!(f.evaluate(0.0), 0.0);
        assert_eq!(f.evaluate(0.25), 0.5);
        assert_eq!(f.evaluate(0.5), 1.0);
        assert_eq!(f.evaluate(1.0), 0.0);
    }

    #[test]
    fn discrete() {
        let f = func("discrete", "0.2 0.8");
        assert_eq!(f.evaluate(0.1), 0.2);
        assert_eq!(f.evaluate(0.6), 0.8);
        assert_eq!(f.evaluate(1.0), 0.8);
    }

    #[test]
    fn empty_table_is_identity() {
        let f = func("table", "");
        assert!(f.is_identity());
        assert_eq!(f.evaluate(0.3), 0.3);
    }

    #[test]
    fn linear_and_gamma_are_clamped() {
        let mut f = TransferFunction::default();
        f.set_attribute("type", Some("linear"));
        f.set_attribute("slope", Some("2"));
        f.set_attribute("intercept", Some("0.5"));
        assert_eq!(f.evaluate(0.5), 1.0);

        f.set_attribute("type", Some("gamma"));
        f.set_attribute("amplitude", Some("1"));
        f.set_attribute("exponent", Some("2"));
        f.set_attribute("offset", Some("-0.5"));
        assert_eq!(f.evaluate(0.5), 0.0);
    }
}
