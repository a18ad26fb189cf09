// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::units::parse_number_list;

/// A `type` attribute of `feColorMatrix`.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ColorMatrixType {
    Matrix,
    Saturate,
    HueRotate,
    LuminanceToAlpha,
}

impl Default for ColorMatrixType {
    fn default() -> Self {
        ColorMatrixType::Matrix
    }
}

impl ColorMatrixType {
    /// Returns the attribute value.
    pub fn to_str(self) -> &'static str {
        match self {
            ColorMatrixType::Matrix => "matrix",
            ColorMatrixType::Saturate => "saturate",
            ColorMatrixType::HueRotate => "hueRotate",
            ColorMatrixType::LuminanceToAlpha => "luminanceToAlpha",
        }
    }
}

/// A resolved color matrix operation.
#[derive(Clone, PartialEq, Debug)]
pub enum ColorMatrixKind {
    /// A 4x5 row-major matrix.
    Matrix(Vec<f32>),
    /// Saturation in the 0..1 range.
    Saturate(f32),
    /// Hue rotation in degrees.
    HueRotate(f32),
    /// Moves luminance into alpha.
    LuminanceToAlpha,
}

impl Default for ColorMatrixKind {
    fn default() -> Self {
        ColorMatrixKind::Matrix(vec![
            1.0, 0.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }
}

/// An `feColorMatrix` filter primitive.
#[derive(Clone, Default, Debug)]
pub struct ColorMatrix {
    pub(crate) matrix_type: ColorMatrixType,
    pub(crate) values: Option<Vec<f32>>,
}

impl ColorMatrix {
    /// The `type` attribute.
    pub fn matrix_type(&self) -> ColorMatrixType {
        self.matrix_type
    }

    /// Raw `values` as written.
    pub fn values(&self) -> Option<&[f32]> {
        self.values.as_deref()
    }

    /// Resolves `type` and `values` into an operation.
    ///
    /// Missing or malformed values produce the identity of each type.
    pub fn kind(&self) -> ColorMatrixKind {
        let first = self.values.as_ref().and_then(|v| v.first().copied());
        match self.matrix_type {
            ColorMatrixType::Matrix => match self.values {
                Some(ref list) if list.len() == 20 => ColorMatrixKind::Matrix(list.clone()),
                _ => ColorMatrixKind::default(),
            },
            ColorMatrixType::Saturate => {
                ColorMatrixKind::Saturate(first.unwrap_or(1.0).max(0.0).min(1.0))
            }
            ColorMatrixType::HueRotate => ColorMatrixKind::HueRotate(first.unwrap_or(0.0)),
            ColorMatrixType::LuminanceToAlpha => ColorMatrixKind::LuminanceToAlpha,
        }
    }

    pub(crate) fn set_attribute(&mut self, key: &str, value: Option<&str>) -> bool {
        match key {
            "type" => {
                self.matrix_type = match value {
                    Some("matrix") | None => ColorMatrixType::Matrix,
                    Some("saturate") => ColorMatrixType::Saturate,
                    Some("hueRotate") => ColorMatrixType::HueRotate,
                    Some("luminanceToAlpha") => ColorMatrixType::LuminanceToAlpha,
                    Some(v) => {
                        log::warn!("Unknown color matrix type '{}'. Fallback to 'matrix'.", v);
                        ColorMatrixType::Matrix
                    }
                };
            }
            "values" => {
                self.values = value.and_then(|v| {
                    let list = parse_number_list(v);
                    if list.is_none() {
                        log::warn!("Invalid color matrix values '{}'.", v);
                    }
                    list
                });
            }
            _ => return false,
        }

        true
    }
}
