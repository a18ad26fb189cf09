// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::units::{parse_number, parse_number_list, parse_number_pair};
use crate::{ApproxZero, ScreenRect};

/// An `feConvolveMatrix` edge mode.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EdgeMode {
    None,
    Duplicate,
    Wrap,
}

impl Default for EdgeMode {
    fn default() -> Self {
        EdgeMode::Duplicate
    }
}

impl EdgeMode {
    /// Returns the attribute value.
    pub fn to_str(self) -> &'static str {
        match self {
            EdgeMode::None => "none",
            EdgeMode::Duplicate => "duplicate",
            EdgeMode::Wrap => "wrap",
        }
    }
}

/// An `feConvolveMatrix` filter primitive.
///
/// Attributes are stored as written. An inconsistent combination is detected
/// at render time and produces a transparent result.
#[derive(Clone, Debug)]
pub struct ConvolveMatrix {
    pub(crate) order_x: u32,
    pub(crate) order_y: u32,
    pub(crate) kernel: Vec<f32>,
    pub(crate) divisor: Option<f32>,
    pub(crate) bias: f32,
    pub(crate) target_x: Option<i32>,
    pub(crate) target_y: Option<i32>,
    pub(crate) edge_mode: EdgeMode,
    pub(crate) preserve_alpha: bool,
    pub(crate) kernel_unit_length: Option<(f32, f32)>,
}

impl Default for ConvolveMatrix {
    fn default() -> Self {
        ConvolveMatrix {
            order_x: 3,
            order_y: 3,
            kernel: Vec::new(),
            divisor: None,
            bias: 0.0,
            target_x: None,
            target_y: None,
            edge_mode: EdgeMode::Duplicate,
            preserve_alpha: false,
            kernel_unit_length: None,
        }
    }
}

/// A validated convolution kernel.
#[derive(Clone, Debug)]
pub(crate) struct Kernel<'a> {
    pub columns: u32,
    pub rows: u32,
    pub target_x: u32,
    pub target_y: u32,
    pub data: &'a [f32],
    pub divisor: f32,
    pub bias: f32,
    pub edge_mode: EdgeMode,
    pub preserve_alpha: bool,
}

impl Kernel<'_> {
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.columns + x) as usize]
    }
}

impl ConvolveMatrix {
    /// Returns `(columns, rows)`.
    pub fn order(&self) -> (u32, u32) {
        (self.order_x, self.order_y)
    }

    /// The `kernelMatrix` values, in row-major order.
    pub fn kernel_matrix(&self) -> &[f32] {
        &self.kernel
    }

    /// The `edgeMode` attribute.
    pub fn edge_mode(&self) -> EdgeMode {
        self.edge_mode
    }

    /// The `preserveAlpha` attribute.
    pub fn preserve_alpha(&self) -> bool {
        self.preserve_alpha
    }

    fn default_target(order: u32) -> i32 {
        (order / 2) as i32
    }

    fn target(&self) -> (i32, i32) {
        (
            self.target_x.unwrap_or_else(|| Self::default_target(self.order_x)),
            self.target_y.unwrap_or_else(|| Self::default_target(self.order_y)),
        )
    }

    pub(crate) fn set_attribute(&mut self, key: &str, value: Option<&str>) -> bool {
        match key {
            "order" => {
                let (x, y) = match value {
                    Some(v) => match parse_number_pair(v) {
                        Some((x, y)) if x >= 1.0 && y >= 1.0 && x.fract() == 0.0 && y.fract() == 0.0 => {
                            (x as u32, y as u32)
                        }
                        _ => {
                            log::warn!("Invalid convolve matrix order '{}'. Fallback to 3.", v);
                            (3, 3)
                        }
                    },
                    None => (3, 3),
                };

                self.order_x = x;
                self.order_y = y;
            }
            "kernelMatrix" => {
                self.kernel = match value {
                    Some(v) => parse_number_list(v).unwrap_or_else(|| {
                        log::warn!("Invalid kernelMatrix '{}'.", v);
                        Vec::new()
                    }),
                    None => Vec::new(),
                };
            }
            "divisor" => {
                self.divisor = value.and_then(|v| {
                    let n = parse_number(v);
                    if n.is_none() {
                        log::warn!("Invalid divisor '{}'.", v);
                    }
                    n
                });
            }
            "bias" => {
                self.bias = value.and_then(parse_number).unwrap_or(0.0);
            }
            "targetX" | "targetY" => {
                let target = value.and_then(|v| match parse_number(v) {
                    Some(n) => Some(n as i32),
                    None => {
                        log::warn!("Invalid {} '{}'.", key, v);
                        None
                    }
                });

                if key == "targetX" {
                    self.target_x = target;
                } else {
                    self.target_y = target;
                }
            }
            "edgeMode" => {
                self.edge_mode = match value {
                    Some("duplicate") | None => EdgeMode::Duplicate,
                    Some("wrap") => EdgeMode::Wrap,
                    Some("none") => EdgeMode::None,
                    Some(v) => {
                        log::warn!("Unknown edgeMode '{}'. Fallback to 'duplicate'.", v);
                        EdgeMode::Duplicate
                    }
                };
            }
            "preserveAlpha" => {
                self.preserve_alpha = value == Some("true");
            }
            "kernelUnitLength" => {
                self.kernel_unit_length = value.and_then(parse_number_pair);
            }
            _ => return false,
        }

        true
    }

    /// Returns a kernel ready for rendering or `None` when attributes are inconsistent.
    pub(crate) fn validated(&self) -> Option<Kernel> {
        if self.kernel.len() != (self.order_x * self.order_y) as usize {
            return None;
        }

        let (tx, ty) = self.target();
        if tx < 0 || tx >= self.order_x as i32 || ty < 0 || ty >= self.order_y as i32 {
            return None;
        }

        let divisor = match self.divisor {
            Some(d) => d,
            None => {
                let sum: f32 = self.kernel.iter().sum();
                // Round to avoid a near-zero sum from float noise.
                let sum = (sum * 1_000_000.0).round() / 1_000_000.0;
                if sum.is_fuzzy_zero() {
                    1.0
                } else {
                    sum
                }
            }
        };

        if divisor.is_fuzzy_zero() {
            return None;
        }

        Some(Kernel {
            columns: self.order_x,
            rows: self.order_y,
            target_x: tx as u32,
            target_y: ty as u32,
            data: &self.kernel,
            divisor,
            bias: self.bias,
            edge_mode: self.edge_mode,
            preserve_alpha: self.preserve_alpha,
        })
    }

    pub(crate) fn area_enlarge(&self, area: &mut ScreenRect) {
        let (tx, ty) = self.target();
        let right = self.order_x as i32 - tx - 1;
        let bottom = self.order_y as i32 - ty - 1;
        area.expand(tx, ty, right, bottom);
    }

    pub(crate) fn complexity(&self) -> f64 {
        f64::from(self.order_x) * f64::from(self.order_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_divisor_is_kernel_sum() {
        let mut fe = ConvolveMatrix::default();
        fe.set_attribute("kernelMatrix", Some("1 1 1 1 1 1 1 1 1"));
        let kernel = fe.validated().unwrap();
        assert_eq!(kernel.divisor, 9.0);
        assert_eq!((kernel.target_x, kernel.target_y), (1, 1));

        fe.set_attribute("kernelMatrix", Some("1 -1 0 0 0 0 0 0 0"));
        assert_eq!(fe.validated().unwrap().divisor, 1.0);
    }

    #[test]
    fn invalid_configurations() {
        let mut fe = ConvolveMatrix::default();
        assert!(fe.validated().is_none());

        fe.set_attribute("kernelMatrix", Some("0 0 0 0 1 0 0 0 0"));
        fe.set_attribute("targetX", Some("3"));
        assert!(fe.validated().is_none());

        fe.set_attribute("targetX", None);
        fe.set_attribute("divisor", Some("0"));
        assert!(fe.validated().is_none());
    }

    #[test]
    fn enlarge_around_target() {
        let mut fe = ConvolveMatrix::default();
        fe.set_attribute("order", Some("4 3"));
        fe.set_attribute("targetX", Some("0"));

        let mut area = ScreenRect::from_xywh(0, 0, 10, 10);
        fe.area_enlarge(&mut area);
        assert_eq!(area, ScreenRect { left: 0, top: -1, right: 13, bottom: 11 });
        assert_eq!(fe.complexity(), 12.0);
    }
}
