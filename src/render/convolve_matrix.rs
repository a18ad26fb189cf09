// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use rgb::RGBA8;

use super::{f32_bound, ImageRefMut};
use crate::primitive::{EdgeMode, Kernel};

/// Applies a convolve matrix.
///
/// Input image pixels should have a **premultiplied alpha** when `preserve_alpha=false`
/// and an **unpremultiplied alpha** otherwise.
///
/// The kernel is rotated by 180 degrees, as in a true convolution.
///
/// # Allocations
///
/// This method will allocate a copy of the `src` image as a back buffer.
pub fn apply(kernel: &Kernel, src: ImageRefMut) {
    let w = src.width as i32;
    let h = src.height as i32;
    let copy = src.data.to_vec();

    let fetch = |x: i32, y: i32| -> Option<RGBA8> {
        let (x, y) = match kernel.edge_mode {
            EdgeMode::None => {
                if x < 0 || x >= w || y < 0 || y >= h {
                    return None;
                }
                (x, y)
            }
            EdgeMode::Duplicate => (x.max(0).min(w - 1), y.max(0).min(h - 1)),
            EdgeMode::Wrap => (x.rem_euclid(w), y.rem_euclid(h)),
        };

        Some(copy[(y * w + x) as usize])
    };

    for (idx, out) in src.data.iter_mut().enumerate() {
        let x = idx as i32 % w;
        let y = idx as i32 / w;

        let mut sum = [0.0f32; 4];
        for ky in 0..kernel.rows {
            for kx in 0..kernel.columns {
                let sx = x - kernel.target_x as i32 + kx as i32;
                let sy = y - kernel.target_y as i32 + ky as i32;
                let p = match fetch(sx, sy) {
                    Some(p) => p,
                    None => continue,
                };

                let k = kernel.get(kernel.columns - kx - 1, kernel.rows - ky - 1);
                sum[0] += p.r as f32 / 255.0 * k;
                sum[1] += p.g as f32 / 255.0 * k;
                sum[2] += p.b as f32 / 255.0 * k;
                sum[3] += p.a as f32 / 255.0 * k;
            }
        }

        let calc = |v: f32, max: f32| f32_bound(0.0, v / kernel.divisor + kernel.bias, max);

        if kernel.preserve_alpha {
            out.r = (calc(sum[0], 1.0) * 255.0 + 0.5) as u8;
            out.g = (calc(sum[1], 1.0) * 255.0 + 0.5) as u8;
            out.b = (calc(sum[2], 1.0) * 255.0 + 0.5) as u8;
        } else {
            let a = calc(sum[3], 1.0);
            let a8 = (a * 255.0 + 0.5) as u8;
            *out = RGBA8 {
                r: ((calc(sum[0], a) * 255.0 + 0.5) as u8).min(a8),
                g: ((calc(sum[1], a) * 255.0 + 0.5) as u8).min(a8),
                b: ((calc(sum[2], a) * 255.0 + 0.5) as u8).min(a8),
                a: a8,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::ConvolveMatrix;

    fn matrix(attrs: &[(&str, &str)]) -> ConvolveMatrix {
        let mut fe = ConvolveMatrix::default();
        for (k, v) in attrs {
            fe.set_attribute(k, Some(*v));
        }
        fe
    }

    #[test]
    fn identity_kernel() {
        let fe = matrix(&[("kernelMatrix", "0 0 0 0 1 0 0 0 0")]);
        let kernel = fe.validated().unwrap();

        let mut data: Vec<RGBA8> = (0..9).map(|i| RGBA8::new(i * 10, 0, 0, 255)).collect();
        let expected = data.clone();
        apply(&kernel, ImageRefMut::new(3, 3, &mut data));
        assert_eq!(data, expected);
    }

    #[test]
    fn kernel_is_rotated() {
        // Takes the left neighbour after rotation.
        let fe = matrix(&[("order", "3 1"), ("kernelMatrix", "0 0 1")]);
        let kernel = fe.validated().unwrap();

        let mut data = vec![
            RGBA8::new(255, 0, 0, 255),
            RGBA8::new(0, 0, 0, 255),
            RGBA8::new(0, 0, 0, 255),
        ];
        apply(&kernel, ImageRefMut::new(3, 1, &mut data));
        assert_eq!(data[1].r, 255);
        // Duplicate edge mode repeats the first pixel.
        assert_eq!(data[0].r, 255);
    }

    #[test]
    fn edge_none_is_transparent() {
        let fe = matrix(&[
            ("order", "3 1"),
            ("kernelMatrix", "0 0 1"),
            ("edgeMode", "none"),
        ]);
        let kernel = fe.validated().unwrap();

        let mut data = vec![RGBA8::new(0, 0, 0, 255); 3];
        apply(&kernel, ImageRefMut::new(3, 1, &mut data));
        assert_eq!(data[0].a, 0);
        assert_eq!(data[1].a, 255);
    }
}
