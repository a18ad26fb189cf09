// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An exact separable gaussian blur.
//!
//! Used for small deviations, where the box approximation is visibly off.

use rgb::RGBA8;

use super::ImageRefMut;

/// Applies a gaussian blur.
///
/// Input image pixels should have a **premultiplied alpha**.
///
/// An axis with a zero deviation is left untouched.
pub fn apply(sigma_x: f64, sigma_y: f64, mut src: ImageRefMut) {
    let width = src.width as usize;
    let height = src.height as usize;

    if let Some(kernel) = make_kernel(sigma_x) {
        let mut line = vec![RGBA8::default(); width];
        for y in 0..height {
            let row = &mut src.data[y * width..(y + 1) * width];
            line.copy_from_slice(row);
            convolve_line(&kernel, &line, row);
        }
    }

    if let Some(kernel) = make_kernel(sigma_y) {
        let mut line = vec![RGBA8::default(); height];
        let mut out = vec![RGBA8::default(); height];
        for x in 0..width {
            for (y, p) in line.iter_mut().enumerate() {
                *p = src.data[y * width + x];
            }

            convolve_line(&kernel, &line, &mut out);

            for (y, p) in out.iter().enumerate() {
                src.data[y * width + x] = *p;
            }
        }
    }
}

/// Builds normalized weights for `-radius..=radius`.
fn make_kernel(sigma: f64) -> Option<Vec<f64>> {
    if !(sigma > 0.0) {
        return None;
    }

    let radius = (sigma * 3.0).ceil() as i64;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|i| (-((i * i) as f64) / denom).exp())
        .collect();

    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }

    Some(kernel)
}

fn convolve_line(kernel: &[f64], src: &[RGBA8], dst: &mut [RGBA8]) {
    let radius = (kernel.len() / 2) as isize;
    let len = src.len() as isize;

    for x in 0..len {
        let mut sum = [0.0f64; 4];
        for (k, w) in kernel.iter().enumerate() {
            let i = x + k as isize - radius;
            if i < 0 || i >= len {
                continue;
            }

            let p = src[i as usize];
            sum[0] += f64::from(p.r) * w;
            sum[1] += f64::from(p.g) * w;
            sum[2] += f64::from(p.b) * w;
            sum[3] += f64::from(p.a) * w;
        }

        let a = to_u8(sum[3]);
        dst[x as usize] = RGBA8 {
            r: to_u8(sum[0]).min(a),
            g: to_u8(sum[1]).min(a),
            b: to_u8(sum[2]).min(a),
            a,
        };
    }
}

#[inline]
fn to_u8(v: f64) -> u8 {
    (v + 0.5).max(0.0).min(255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalized() {
        let kernel = make_kernel(1.0).unwrap();
        assert_eq!(kernel.len(), 7);
        let sum: f64 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(kernel[3] > kernel[2]);
        assert!(make_kernel(0.0).is_none());
    }

    #[test]
    fn horizontal_only() {
        let mut data = vec![RGBA8::default(); 5 * 5];
        data[2 * 5 + 2] = RGBA8::new(255, 255, 255, 255);
        apply(1.0, 0.0, ImageRefMut::new(5, 5, &mut data));

        // Rows other than the middle one stay empty.
        assert_eq!(data[1 * 5 + 2].a, 0);
        assert!(data[2 * 5 + 1].a > 0);
        assert!(data[2 * 5 + 2].a < 255);
    }
}
