// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tiny_skia::Transform;

use crate::units::parse_number;
use crate::{Rect, ScreenRect};

/// An `feOffset` filter primitive.
#[derive(Clone, Default, Debug)]
pub struct Offset {
    pub(crate) dx: f32,
    pub(crate) dy: f32,
}

impl Offset {
    /// The `dx` attribute, in primitive units.
    pub fn dx(&self) -> f32 {
        self.dx
    }

    /// The `dy` attribute, in primitive units.
    pub fn dy(&self) -> f32 {
        self.dy
    }

    /// Sets both offsets.
    pub fn set_offset(&mut self, dx: f32, dy: f32) {
        self.dx = if dx.is_finite() { dx } else { 0.0 };
        self.dy = if dy.is_finite() { dy } else { 0.0 };
    }

    pub(crate) fn set_attribute(&mut self, key: &str, value: Option<&str>) -> bool {
        let n = match value {
            Some(v) => parse_number(v).unwrap_or_else(|| {
                log::warn!("Invalid offset '{}'. Fallback to 0.", v);
                0.0
            }),
            None => 0.0,
        };

        match key {
            "dx" => self.dx = n,
            "dy" => self.dy = n,
            _ => return false,
        }

        true
    }

    pub(crate) fn affected_region(&self, region: Rect) -> Rect {
        region.translate(self.dx, self.dy).unwrap_or(region)
    }

    /// Grows the area only on the side the content is pulled from.
    pub(crate) fn area_enlarge(&self, area: &mut ScreenRect, ts: Transform) {
        let ox = ts.sx * self.dx + ts.kx * self.dy;
        let oy = ts.ky * self.dx + ts.sy * self.dy;

        let (left, right) = if ox > 0.0 {
            (ox.ceil() as i32, 0)
        } else {
            (0, (-ox).ceil() as i32)
        };

        let (top, bottom) = if oy > 0.0 {
            (oy.ceil() as i32, 0)
        } else {
            (0, (-oy).ceil() as i32)
        };

        area.expand(left, top, right, bottom);
    }
}
