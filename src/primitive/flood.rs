// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

use svgtypes::Color;

use crate::units::parse_number;

/// An `feFlood` filter primitive.
#[derive(Clone, Debug)]
pub struct Flood {
    pub(crate) color: Color,
    pub(crate) opacity: f32,
}

impl Default for Flood {
    fn default() -> Self {
        Flood {
            color: Color::black(),
            opacity: 1.0,
        }
    }
}

impl Flood {
    /// The `flood-color` attribute.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Flood opacity in the 0..1 range.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Returns the flood color with opacity applied.
    pub(crate) fn to_skia_color(&self) -> tiny_skia::Color {
        let alpha = f32::from(self.color.alpha) / 255.0 * self.opacity;
        let mut color =
            tiny_skia::Color::from_rgba8(self.color.red, self.color.green, self.color.blue, 255);
        color.set_alpha(alpha);
        color
    }

    pub(crate) fn set_attribute(&mut self, key: &str, value: Option<&str>) -> bool {
        match key {
            "flood-color" => {
                self.color = match value {
                    Some(v) => parse_color(v).unwrap_or_else(|| {
                        log::warn!("Invalid flood-color '{}'. Fallback to black.", v);
                        Color::black()
                    }),
                    None => Color::black(),
                };
            }
            "flood-opacity" => {
                self.opacity = value.map(parse_opacity).unwrap_or(1.0);
            }
            _ => return false,
        }

        true
    }
}

pub(crate) fn parse_color(text: &str) -> Option<Color> {
    Color::from_str(text.trim()).ok()
}

pub(crate) fn color_to_string(color: Color) -> String {
    if color.alpha == 255 {
        format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
    } else {
        let alpha = f32::from(color.alpha) / 255.0;
        format!("rgba({},{},{},{})", color.red, color.green, color.blue, alpha)
    }
}

/// Parses an opacity number or percentage, clamped to 0..1.
pub(crate) fn parse_opacity(text: &str) -> f32 {
    let text = text.trim();
    let n = match text.strip_suffix('%') {
        Some(n) => parse_number(n).map(|n| n / 100.0),
        None => parse_number(text),
    };

    match n {
        Some(n) => n.max(0.0).min(1.0),
        None => {
            log::warn!("Invalid opacity '{}'. Fallback to 1.", text);
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flood_attributes() {
        let mut fe = Flood::default();
        fe.set_attribute("flood-color", Some("#ff0000"));
        fe.set_attribute("flood-opacity", Some("1.5"));
        assert_eq!(fe.color(), Color::new_rgb(255, 0, 0));
        assert_eq!(fe.opacity(), 1.0);

        fe.set_attribute("flood-opacity", Some("50%"));
        assert_eq!(fe.opacity(), 0.5);

        fe.set_attribute("flood-color", Some("nope"));
        assert_eq!(fe.color(), Color::black());
    }

    #[test]
    fn color_formatting() {
        assert_eq!(color_to_string(Color::new_rgb(255, 16, 0)), "#ff1000");
    }
}
