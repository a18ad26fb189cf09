// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use float_cmp::ApproxEqUlps;
use strict_num::PositiveF32;
use tiny_skia::Transform;

use crate::geom::expansion;
use crate::units::parse_number_pair;
use crate::{Rect, ScreenRect};

/// An `feGaussianBlur` filter primitive.
#[derive(Clone, Debug)]
pub struct GaussianBlur {
    pub(crate) std_dev_x: PositiveF32,
    pub(crate) std_dev_y: PositiveF32,
}

impl Default for GaussianBlur {
    fn default() -> Self {
        GaussianBlur {
            std_dev_x: PositiveF32::ZERO,
            std_dev_y: PositiveF32::ZERO,
        }
    }
}

impl GaussianBlur {
    /// Returns `(std_dev_x, std_dev_y)` in primitive units.
    pub fn std_deviation(&self) -> (f32, f32) {
        (self.std_dev_x.get(), self.std_dev_y.get())
    }

    /// Sets the standard deviation.
    ///
    /// A negative or non-finite value disables the blur.
    pub fn set_std_deviation(&mut self, x: f32, y: f32) {
        match (PositiveF32::new(x), PositiveF32::new(y)) {
            (Some(x), Some(y)) => {
                self.std_dev_x = x;
                self.std_dev_y = y;
            }
            _ => {
                self.std_dev_x = PositiveF32::ZERO;
                self.std_dev_y = PositiveF32::ZERO;
            }
        }
    }

    pub(crate) fn set_attribute(&mut self, key: &str, value: Option<&str>) -> bool {
        if key != "stdDeviation" {
            return false;
        }

        let (x, y) = match value {
            Some(v) => match parse_number_pair(v) {
                Some((x, y)) if x >= 0.0 && y >= 0.0 => (x, y),
                _ => {
                    log::warn!("Invalid stdDeviation '{}'. Blur is disabled.", v);
                    (0.0, 0.0)
                }
            },
            None => (0.0, 0.0),
        };

        self.set_std_deviation(x, y);
        true
    }

    pub(crate) fn is_isotropic(&self) -> bool {
        self.std_dev_x.get().approx_eq_ulps(&self.std_dev_y.get(), 4)
    }

    pub(crate) fn affected_region(&self, region: Rect) -> Rect {
        region.expand(self.std_dev_x.get() * 3.0, self.std_dev_y.get() * 3.0)
    }

    pub(crate) fn area_enlarge(&self, area: &mut ScreenRect, ts: Transform) {
        let (ex, ey) = expansion(ts);
        let dx = (self.std_dev_x.get() * 3.0 * ex).ceil();
        let dy = (self.std_dev_y.get() * 3.0 * ey).ceil();
        // Rotation mixes axes, so the larger deviation covers both.
        let d = dx.max(dy) as i32;
        area.expand_by(d);
    }

    pub(crate) fn complexity(&self, ex: f32, ey: f32) -> f64 {
        let ax = (f64::from(self.std_dev_x.get()) * 3.0 * f64::from(ex)).ceil();
        let ay = (f64::from(self.std_dev_y.get()) * 3.0 * f64::from(ey)).ceil();
        2.0 * ax * ay
    }
}
