// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Slot, SlotNamespace};

/// An `feBlend` mode.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Darken,
    Lighten,
    Overlay,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl Default for BlendMode {
    fn default() -> Self {
        BlendMode::Normal
    }
}

impl BlendMode {
    /// Parses a mode name. Case-sensitive.
    pub fn parse(text: &str) -> Option<Self> {
        let mode = match text {
            "normal" => BlendMode::Normal,
            "multiply" => BlendMode::Multiply,
            "screen" => BlendMode::Screen,
            "darken" => BlendMode::Darken,
            "lighten" => BlendMode::Lighten,
            "overlay" => BlendMode::Overlay,
            "color-dodge" => BlendMode::ColorDodge,
            "color-burn" => BlendMode::ColorBurn,
            "hard-light" => BlendMode::HardLight,
            "soft-light" => BlendMode::SoftLight,
            "difference" => BlendMode::Difference,
            "exclusion" => BlendMode::Exclusion,
            "hue" => BlendMode::Hue,
            "saturation" => BlendMode::Saturation,
            "color" => BlendMode::Color,
            "luminosity" => BlendMode::Luminosity,
            _ => return None,
        };

        Some(mode)
    }

    /// Parses a mode name, falling back to `normal`.
    pub fn parse_or_normal(text: &str) -> Self {
        BlendMode::parse(text).unwrap_or_else(|| {
            log::warn!("Unknown blend mode '{}'. Fallback to 'normal'.", text);
            BlendMode::Normal
        })
    }

    /// Returns the attribute value.
    pub fn to_str(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::Overlay => "overlay",
            BlendMode::ColorDodge => "color-dodge",
            BlendMode::ColorBurn => "color-burn",
            BlendMode::HardLight => "hard-light",
            BlendMode::SoftLight => "soft-light",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::Hue => "hue",
            BlendMode::Saturation => "saturation",
            BlendMode::Color => "color",
            BlendMode::Luminosity => "luminosity",
        }
    }

    pub(crate) fn to_skia(self) -> tiny_skia::BlendMode {
        match self {
            BlendMode::Normal => tiny_skia::BlendMode::SourceOver,
            BlendMode::Multiply => tiny_skia::BlendMode::Multiply,
            BlendMode::Screen => tiny_skia::BlendMode::Screen,
            BlendMode::Darken => tiny_skia::BlendMode::Darken,
            BlendMode::Lighten => tiny_skia::BlendMode::Lighten,
            BlendMode::Overlay => tiny_skia::BlendMode::Overlay,
            BlendMode::ColorDodge => tiny_skia::BlendMode::ColorDodge,
            BlendMode::ColorBurn => tiny_skia::BlendMode::ColorBurn,
            BlendMode::HardLight => tiny_skia::BlendMode::HardLight,
            BlendMode::SoftLight => tiny_skia::BlendMode::SoftLight,
            BlendMode::Difference => tiny_skia::BlendMode::Difference,
            BlendMode::Exclusion => tiny_skia::BlendMode::Exclusion,
            BlendMode::Hue => tiny_skia::BlendMode::Hue,
            BlendMode::Saturation => tiny_skia::BlendMode::Saturation,
            BlendMode::Color => tiny_skia::BlendMode::Color,
            BlendMode::Luminosity => tiny_skia::BlendMode::Luminosity,
        }
    }
}

/// An `feBlend` filter primitive.
#[derive(Clone, Debug)]
pub struct Blend {
    pub(crate) input2: Slot,
    pub(crate) mode: BlendMode,
}

impl Default for Blend {
    fn default() -> Self {
        Blend {
            input2: Slot::NOT_SET,
            mode: BlendMode::Normal,
        }
    }
}

impl Blend {
    /// The `in2` slot.
    pub fn input2(&self) -> Slot {
        self.input2
    }

    /// The `mode` attribute.
    pub fn mode(&self) -> BlendMode {
        self.mode
    }

    /// Sets the blend mode.
    pub fn set_mode(&mut self, mode: BlendMode) {
        self.mode = mode;
    }

    pub(crate) fn set_attribute(
        &mut self,
        key: &str,
        value: Option<&str>,
        ns: &mut SlotNamespace,
    ) -> bool {
        match key {
            "mode" => {
                self.mode = value.map(BlendMode::parse_or_normal).unwrap_or_default();
                true
            }
            "in2" => {
                self.input2 = value
                    .map(|v| ns.slot_for_input_name(v))
                    .unwrap_or(Slot::NOT_SET);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mode_is_normal() {
        assert_eq!(BlendMode::parse_or_normal("Multiply"), BlendMode::Normal);
        assert_eq!(BlendMode::parse_or_normal("plus-darker"), BlendMode::Normal);
        assert_eq!(BlendMode::parse_or_normal("soft-light"), BlendMode::SoftLight);
    }

    #[test]
    fn mode_serialization_is_stable() {
        for text in [
            "normal", "multiply", "screen", "darken", "lighten", "overlay", "color-dodge",
            "color-burn", "hard-light", "soft-light", "difference", "exclusion", "hue",
            "saturation", "color", "luminosity", "bogus", "",
        ] {
            let mode = BlendMode::parse_or_normal(text);
            assert_eq!(BlendMode::parse_or_normal(mode.to_str()), mode);
        }
    }
}
