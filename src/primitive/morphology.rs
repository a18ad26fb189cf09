// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use strict_num::PositiveF32;
use tiny_skia::Transform;

use crate::geom::expansion;
use crate::units::parse_number_pair;
use crate::{Rect, ScreenRect};

/// An `feMorphology` operator.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MorphologyOperator {
    Erode,
    Dilate,
}

impl Default for MorphologyOperator {
    fn default() -> Self {
        MorphologyOperator::Erode
    }
}

impl MorphologyOperator {
    /// Returns the attribute value.
    pub fn to_str(self) -> &'static str {
        match self {
            MorphologyOperator::Erode => "erode",
            MorphologyOperator::Dilate => "dilate",
        }
    }
}

/// An `feMorphology` filter primitive.
///
/// A zero radius on both axes disables the effect.
#[derive(Clone, Debug)]
pub struct Morphology {
    pub(crate) operator: MorphologyOperator,
    pub(crate) radius_x: PositiveF32,
    pub(crate) radius_y: PositiveF32,
}

impl Default for Morphology {
    fn default() -> Self {
        Morphology {
            operator: MorphologyOperator::Erode,
            radius_x: PositiveF32::ZERO,
            radius_y: PositiveF32::ZERO,
        }
    }
}

impl Morphology {
    /// The `operator` attribute.
    pub fn operator(&self) -> MorphologyOperator {
        self.operator
    }

    /// Returns `(radius_x, radius_y)` in primitive units.
    pub fn radius(&self) -> (f32, f32) {
        (self.radius_x.get(), self.radius_y.get())
    }

    pub(crate) fn set_attribute(&mut self, key: &str, value: Option<&str>) -> bool {
        match key {
            "operator" => {
                self.operator = match value {
                    Some("erode") | None => MorphologyOperator::Erode,
                    Some("dilate") => MorphologyOperator::Dilate,
                    Some(v) => {
                        log::warn!("Unknown morphology operator '{}'. Fallback to 'erode'.", v);
                        MorphologyOperator::Erode
                    }
                };
            }
            "radius" => {
                let (rx, ry) = match value {
                    Some(v) => match parse_number_pair(v) {
                        Some((rx, ry)) if rx >= 0.0 && ry >= 0.0 => (rx, ry),
                        _ => {
                            log::warn!("Invalid morphology radius '{}'.", v);
                            (0.0, 0.0)
                        }
                    },
                    None => (0.0, 0.0),
                };

                self.radius_x = PositiveF32::new(rx).unwrap_or(PositiveF32::ZERO);
                self.radius_y = PositiveF32::new(ry).unwrap_or(PositiveF32::ZERO);
            }
            _ => return false,
        }

        true
    }

    pub(crate) fn affected_region(&self, region: Rect) -> Rect {
        region.expand(self.radius_x.get(), self.radius_y.get())
    }

    pub(crate) fn area_enlarge(&self, area: &mut ScreenRect, ts: Transform) {
        let (ex, ey) = expansion(ts);
        let dx = (self.radius_x.get() * ex).ceil() as i32;
        let dy = (self.radius_y.get() * ey).ceil() as i32;
        area.expand(dx, dy, dx, dy);
    }

    pub(crate) fn complexity(&self, ex: f32, ey: f32) -> f64 {
        f64::from(self.radius_x.get() * ex) * f64::from(self.radius_y.get() * ey)
    }
}
