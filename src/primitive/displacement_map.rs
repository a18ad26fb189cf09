// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tiny_skia::Transform;

use crate::units::parse_number;
use crate::{Rect, ScreenRect, Slot, SlotNamespace};

/// A color channel.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ColorChannel {
    R,
    G,
    B,
    A,
}

impl Default for ColorChannel {
    fn default() -> Self {
        ColorChannel::A
    }
}

impl ColorChannel {
    /// Parses a channel selector by its first character.
    ///
    /// Falls back to `A` with a warning.
    pub fn parse(text: &str) -> Self {
        match text.chars().next() {
            Some('R') => ColorChannel::R,
            Some('G') => ColorChannel::G,
            Some('B') => ColorChannel::B,
            Some('A') => ColorChannel::A,
            _ => {
                log::warn!("Invalid channel selector '{}'. Fallback to 'A'.", text);
                ColorChannel::A
            }
        }
    }

    /// Returns the attribute value.
    pub fn to_str(self) -> &'static str {
        match self {
            ColorChannel::R => "R",
            ColorChannel::G => "G",
            ColorChannel::B => "B",
            ColorChannel::A => "A",
        }
    }
}

/// An `feDisplacementMap` filter primitive.
#[derive(Clone, Debug)]
pub struct DisplacementMap {
    pub(crate) input2: Slot,
    pub(crate) scale: f32,
    pub(crate) x_channel: ColorChannel,
    pub(crate) y_channel: ColorChannel,
}

impl Default for DisplacementMap {
    fn default() -> Self {
        DisplacementMap {
            input2: Slot::NOT_SET,
            scale: 0.0,
            x_channel: ColorChannel::A,
            y_channel: ColorChannel::A,
        }
    }
}

impl DisplacementMap {
    /// The `in2` slot, i.e. the displacement map.
    pub fn input2(&self) -> Slot {
        self.input2
    }

    /// The `scale` attribute, in primitive units.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// The `xChannelSelector` attribute.
    pub fn x_channel(&self) -> ColorChannel {
        self.x_channel
    }

    /// The `yChannelSelector` attribute.
    pub fn y_channel(&self) -> ColorChannel {
        self.y_channel
    }

    pub(crate) fn set_attribute(
        &mut self,
        key: &str,
        value: Option<&str>,
        ns: &mut SlotNamespace,
    ) -> bool {
        match key {
            "scale" => {
                self.scale = match value {
                    Some(v) => parse_number(v).unwrap_or_else(|| {
                        log::warn!("Invalid displacement scale '{}'. Fallback to 0.", v);
                        0.0
                    }),
                    None => 0.0,
                };
            }
            "xChannelSelector" => {
                self.x_channel = value.map(ColorChannel::parse).unwrap_or_default();
            }
            "yChannelSelector" => {
                self.y_channel = value.map(ColorChannel::parse).unwrap_or_default();
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

    pub(crate) fn affected_region(&self, region: Rect) -> Rect {
        let d = self.scale.abs() / 2.0;
        region.expand(d, d)
    }

    pub(crate) fn area_enlarge(&self, area: &mut ScreenRect, ts: Transform) {
        let half = self.scale.abs() / 2.0;
        let dx = (half * (ts.sx.abs() + ts.ky.abs()) + 2.0).ceil() as i32;
        let dy = (half * (ts.kx.abs() + ts.sy.abs()) + 2.0).ceil() as i32;
        area.expand(dx, dy, dx, dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_selector_fallback() {
        assert_eq!(ColorChannel::parse("R"), ColorChannel::R);
        assert_eq!(ColorChannel::parse("Green"), ColorChannel::G);
        assert_eq!(ColorChannel::parse("x"), ColorChannel::A);
        assert_eq!(ColorChannel::parse(""), ColorChannel::A);
    }

    #[test]
    fn enlarge_by_half_scale() {
        let mut fe = DisplacementMap::default();
        let mut ns = SlotNamespace::new();
        fe.set_attribute("scale", Some("20"), &mut ns);

        let mut area = ScreenRect::from_xywh(0, 0, 10, 10);
        fe.area_enlarge(&mut area, Transform::from_scale(2.0, 1.0));
        assert_eq!(area, ScreenRect { left: -22, top: -12, right: 32, bottom: 22 });
    }
}
