// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{f32_bound, ImageRefMut};
use crate::primitive::ColorMatrixKind;

/// Applies a color matrix filter.
///
/// Input image pixels should have an **unpremultiplied alpha**.
pub fn apply(kind: &ColorMatrixKind, src: ImageRefMut) {
    let m = to_matrix(kind);
    for pixel in src.data {
        let v = [
            pixel.r as f32 / 255.0,
            pixel.g as f32 / 255.0,
            pixel.b as f32 / 255.0,
            pixel.a as f32 / 255.0,
        ];

        let row = |i: usize| {
            let r = &m[i * 5..i * 5 + 5];
            let c = r[0] * v[0] + r[1] * v[1] + r[2] * v[2] + r[3] * v[3] + r[4];
            (f32_bound(0.0, c, 1.0) * 255.0 + 0.5) as u8
        };

        let (r, g, b, a) = (row(0), row(1), row(2), row(3));
        pixel.r = r;
        pixel.g = g;
        pixel.b = b;
        pixel.a = a;
    }
}

/// Expands any matrix kind into a 4x5 row-major matrix.
fn to_matrix(kind: &ColorMatrixKind) -> [f32; 20] {
    match *kind {
        ColorMatrixKind::Matrix(ref values) => {
            let mut m = [0.0; 20];
            for (d, s) in m.iter_mut().zip(values.iter()) {
                *d = *s;
            }
            m
        }
        ColorMatrixKind::Saturate(s) => [
            0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s, 0.0, 0.0,
            0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s, 0.0, 0.0,
            0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0, 0.0,
        ],
        ColorMatrixKind::HueRotate(deg) => {
            let (sin, cos) = deg.to_radians().sin_cos();
            [
                0.213 + cos * 0.787 - sin * 0.213,
                0.715 - cos * 0.715 - sin * 0.715,
                0.072 - cos * 0.072 + sin * 0.928,
                0.0,
                0.0,
                0.213 - cos * 0.213 + sin * 0.143,
                0.715 + cos * 0.285 + sin * 0.140,
                0.072 - cos * 0.072 - sin * 0.283,
                0.0,
                0.0,
                0.213 - cos * 0.213 - sin * 0.787,
                0.715 - cos * 0.715 + sin * 0.715,
                0.072 + cos * 0.928 + sin * 0.072,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
                0.0,
            ]
        }
        ColorMatrixKind::LuminanceToAlpha => [
            0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0,
            0.2125, 0.7154, 0.0721, 0.0, 0.0,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb::RGBA8;

    #[test]
    fn identity() {
        let mut data = [RGBA8::new(10, 20, 30, 40)];
        apply(&ColorMatrixKind::default(), ImageRefMut::new(1, 1, &mut data));
        assert_eq!(data[0], RGBA8::new(10, 20, 30, 40));
    }

    #[test]
    fn zero_saturation_is_grayscale() {
        let mut data = [RGBA8::new(255, 0, 0, 255)];
        apply(&ColorMatrixKind::Saturate(0.0), ImageRefMut::new(1, 1, &mut data));
        assert_eq!(data[0].r, data[0].g);
        assert_eq!(data[0].g, data[0].b);
        assert_eq!(data[0].a, 255);
    }

    #[test]
    fn luminance_to_alpha() {
        let mut data = [RGBA8::new(255, 255, 255, 10)];
        apply(&ColorMatrixKind::LuminanceToAlpha, ImageRefMut::new(1, 1, &mut data));
        assert_eq!(data[0], RGBA8::new(0, 0, 0, 255));
    }
}
