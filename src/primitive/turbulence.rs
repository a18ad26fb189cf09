// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use strict_num::PositiveF32;

use crate::units::{parse_number, parse_number_pair};

/// A turbulence noise type.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TurbulenceKind {
    FractalNoise,
    Turbulence,
}

impl Default for TurbulenceKind {
    fn default() -> Self {
        TurbulenceKind::Turbulence
    }
}

impl TurbulenceKind {
    /// Returns the attribute value.
    pub fn to_str(self) -> &'static str {
        match self {
            TurbulenceKind::FractalNoise => "fractalNoise",
            TurbulenceKind::Turbulence => "turbulence",
        }
    }
}

/// An `feTurbulence` filter primitive.
#[derive(Clone, Debug)]
pub struct Turbulence {
    pub(crate) base_frequency_x: PositiveF32,
    pub(crate) base_frequency_y: PositiveF32,
    pub(crate) num_octaves: u32,
    pub(crate) seed: i32,
    pub(crate) stitch_tiles: bool,
    pub(crate) kind: TurbulenceKind,
}

impl Default for Turbulence {
    fn default() -> Self {
        Turbulence {
            base_frequency_x: PositiveF32::ZERO,
            base_frequency_y: PositiveF32::ZERO,
            num_octaves: 1,
            seed: 0,
            stitch_tiles: false,
            kind: TurbulenceKind::Turbulence,
        }
    }
}

impl Turbulence {
    /// Returns `(x, y)` base frequencies.
    pub fn base_frequency(&self) -> (f32, f32) {
        (self.base_frequency_x.get(), self.base_frequency_y.get())
    }

    /// The `numOctaves` attribute.
    pub fn num_octaves(&self) -> u32 {
        self.num_octaves
    }

    /// The `seed` attribute, rounded.
    pub fn seed(&self) -> i32 {
        self.seed
    }

    /// The `stitchTiles` attribute.
    pub fn stitch_tiles(&self) -> bool {
        self.stitch_tiles
    }

    /// The `type` attribute.
    pub fn kind(&self) -> TurbulenceKind {
        self.kind
    }

    pub(crate) fn set_attribute(&mut self, key: &str, value: Option<&str>) -> bool {
        match key {
            "baseFrequency" => {
                let (x, y) = match value {
                    Some(v) => match parse_number_pair(v) {
                        Some((x, y)) if x >= 0.0 && y >= 0.0 => (x, y),
                        _ => {
                            log::warn!("Invalid baseFrequency '{}'.", v);
                            (0.0, 0.0)
                        }
                    },
                    None => (0.0, 0.0),
                };

                self.base_frequency_x = PositiveF32::new(x).unwrap_or(PositiveF32::ZERO);
                self.base_frequency_y = PositiveF32::new(y).unwrap_or(PositiveF32::ZERO);
            }
            "numOctaves" => {
                self.num_octaves = match value.and_then(parse_number) {
                    Some(n) if n.is_sign_negative() => 0,
                    Some(n) => n.round() as u32,
                    None => 1,
                };
            }
            "seed" => {
                self.seed = value.and_then(parse_number).unwrap_or(0.0).trunc() as i32;
            }
            "stitchTiles" => {
                self.stitch_tiles = value == Some("stitch");
            }
            "type" => {
                self.kind = match value {
                    Some("turbulence") | None => TurbulenceKind::Turbulence,
                    Some("fractalNoise") => TurbulenceKind::FractalNoise,
                    Some(v) => {
                        log::warn!("Unknown turbulence type '{}'. Fallback to 'turbulence'.", v);
                        TurbulenceKind::Turbulence
                    }
                };
            }
            _ => return false,
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes() {
        let mut fe = Turbulence::default();
        fe.set_attribute("baseFrequency", Some("0.05 0.1"));
        fe.set_attribute("numOctaves", Some("2.6"));
        fe.set_attribute("seed", Some("-3.7"));
        fe.set_attribute("stitchTiles", Some("stitch"));
        fe.set_attribute("type", Some("fractalNoise"));

        assert_eq!(fe.base_frequency(), (0.05, 0.1));
        assert_eq!(fe.num_octaves(), 3);
        assert_eq!(fe.seed(), -3);
        assert!(fe.stitch_tiles());
        assert_eq!(fe.kind(), TurbulenceKind::FractalNoise);

        fe.set_attribute("baseFrequency", Some("-1"));
        assert_eq!(fe.base_frequency(), (0.0, 0.0));
    }
}
