// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::units::parse_number;
use crate::{Slot, SlotNamespace};

/// An `feComposite` operator.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompositeOperator {
    Over,
    In,
    Out,
    Atop,
    Xor,
    Arithmetic,
    Lighter,
}

impl Default for CompositeOperator {
    fn default() -> Self {
        CompositeOperator::Over
    }
}

impl CompositeOperator {
    /// Parses an `operator` value.
    pub fn parse(text: &str) -> Option<Self> {
        let op = match text {
            "over" => CompositeOperator::Over,
            "in" => CompositeOperator::In,
            "out" => CompositeOperator::Out,
            "atop" => CompositeOperator::Atop,
            "xor" => CompositeOperator::Xor,
            "arithmetic" => CompositeOperator::Arithmetic,
            "lighter" => CompositeOperator::Lighter,
            _ => return None,
        };

        Some(op)
    }

    /// Returns the attribute value.
    pub fn to_str(self) -> &'static str {
        match self {
            CompositeOperator::Over => "over",
            CompositeOperator::In => "in",
            CompositeOperator::Out => "out",
            CompositeOperator::Atop => "atop",
            CompositeOperator::Xor => "xor",
            CompositeOperator::Arithmetic => "arithmetic",
            CompositeOperator::Lighter => "lighter",
        }
    }
}

/// An `feComposite` filter primitive.
///
/// `k1`-`k4` are used only by the arithmetic operator.
#[derive(Clone, Debug)]
pub struct Composite {
    pub(crate) input2: Slot,
    pub(crate) operator: CompositeOperator,
    pub(crate) k1: f32,
    pub(crate) k2: f32,
    pub(crate) k3: f32,
    pub(crate) k4: f32,
}

impl Default for Composite {
    fn default() -> Self {
        Composite {
            input2: Slot::NOT_SET,
            operator: CompositeOperator::Over,
            k1: 0.0,
            k2: 0.0,
            k3: 0.0,
            k4: 0.0,
        }
    }
}

impl Composite {
    /// The `in2` slot.
    pub fn input2(&self) -> Slot {
        self.input2
    }

    /// The `operator` attribute.
    pub fn operator(&self) -> CompositeOperator {
        self.operator
    }

    /// Returns `[k1, k2, k3, k4]`.
    pub fn coefficients(&self) -> [f32; 4] {
        [self.k1, self.k2, self.k3, self.k4]
    }

    pub(crate) fn set_attribute(
        &mut self,
        key: &str,
        value: Option<&str>,
        ns: &mut SlotNamespace,
    ) -> bool {
        match key {
            "operator" => {
                self.operator = match value {
                    Some(v) => CompositeOperator::parse(v).unwrap_or_else(|| {
                        log::warn!("Unknown composite operator '{}'. Fallback to 'over'.", v);
                        CompositeOperator::Over
                    }),
                    None => CompositeOperator::Over,
                };
            }
            "k1" | "k2" | "k3" | "k4" => {
                let k = match value {
                    Some(v) => parse_number(v).unwrap_or_else(|| {
                        log::warn!("Invalid {} value '{}'. Fallback to 0.", key, v);
                        0.0
                    }),
                    None => 0.0,
                };

                match key {
                    "k1" => self.k1 = k,
                    "k2" => self.k2 = k,
                    "k3" => self.k3 = k,
                    _ => self.k4 = k,
                }
            }
            "in2" => {
                self.input2 = value
                    .map(|v| ns.slot_for_input_name(v))
                    .unwrap_or(Slot::NOT_SET);
            }
            _ => return false,
        }

        true
    }
}
