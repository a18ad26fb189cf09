// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Gaussian blur approximated by three successive box blurs.
//!
//! The box size is `d = floor(s * 3 * sqrt(2 * PI) / 4 + 0.5)`.
//! An odd `d` uses three centered boxes. An even `d` uses two boxes of size `d`,
//! shifted half a pixel left and right, followed by a centered box of size `d + 1`.
//!
//! Pixels outside the image are transparent black.

use rgb::RGBA8;

use super::ImageRefMut;

/// Applies a box blur.
///
/// Input image pixels should have a **premultiplied alpha**.
pub fn apply(sigma_x: f64, sigma_y: f64, mut src: ImageRefMut) {
    let width = src.width as usize;
    let height = src.height as usize;

    let passes_x = box_passes(sigma_x, width);
    let passes_y = box_passes(sigma_y, height);

    if let Some(passes) = passes_x {
        let mut line = vec![RGBA8::default(); width];
        let mut tmp = vec![RGBA8::default(); width];
        for y in 0..height {
            let row = &mut src.data[y * width..(y + 1) * width];
            line.copy_from_slice(row);
            blur_line(&passes, &mut line, &mut tmp);
            row.copy_from_slice(&line);
        }
    }

    if let Some(passes) = passes_y {
        let mut line = vec![RGBA8::default(); height];
        let mut tmp = vec![RGBA8::default(); height];
        for x in 0..width {
            for (y, p) in line.iter_mut().enumerate() {
                *p = src.data[y * width + x];
            }

            blur_line(&passes, &mut line, &mut tmp);

            for (y, p) in line.iter().enumerate() {
                src.data[y * width + x] = *p;
            }
        }
    }
}

/// A single box pass: window size and the number of pixels before the target one.
#[derive(Clone, Copy, PartialEq, Debug)]
struct BoxPass {
    size: usize,
    before: usize,
}

/// Computes box passes for a line of `len` pixels.
///
/// A window over `510 * len` pixels makes every value round down to zero,
/// so larger windows are clamped to that size.
fn box_passes(sigma: f64, len: usize) -> Option<[BoxPass; 3]> {
    let d = (sigma * 3.0 * (2.0 * std::f64::consts::PI).sqrt() / 4.0 + 0.5).floor();
    if !(d >= 2.0) {
        return None;
    }

    let max = len.saturating_mul(510).saturating_add(2);
    let d = d.min(max as f64) as usize;
    let passes = if d % 2 == 1 {
        let pass = BoxPass {
            size: d,
            before: d / 2,
        };
        [pass, pass, pass]
    } else {
        [
            BoxPass {
                size: d,
                before: d / 2,
            },
            BoxPass {
                size: d,
                before: d / 2 - 1,
            },
            BoxPass {
                size: d + 1,
                before: d / 2,
            },
        ]
    };

    Some(passes)
}

fn blur_line(passes: &[BoxPass; 3], line: &mut [RGBA8], tmp: &mut [RGBA8]) {
    for pass in passes {
        box_pass(*pass, line, tmp);
        line.copy_from_slice(tmp);
    }
}

fn box_pass(pass: BoxPass, src: &[RGBA8], dst: &mut [RGBA8]) {
    let len = src.len() as isize;
    let size = pass.size as isize;
    let before = pass.before as isize;
    let n = pass.size as u64;
    let half = n / 2;

    let mut sum = [0u32; 4];
    let add = |sum: &mut [u32; 4], p: RGBA8| {
        sum[0] += u32::from(p.r);
        sum[1] += u32::from(p.g);
        sum[2] += u32::from(p.b);
        sum[3] += u32::from(p.a);
    };

    let start = (-before).max(0);
    let end = (size - before).min(len);
    for i in start..end {
        add(&mut sum, src[i as usize]);
    }

    let avg = |v: u32| ((u64::from(v) + half) / n) as u8;
    for x in 0..len {
        dst[x as usize] = RGBA8 {
            r: avg(sum[0]),
            g: avg(sum[1]),
            b: avg(sum[2]),
            a: avg(sum[3]),
        };

        let out = x - before;
        if out >= 0 && out < len {
            let p = src[out as usize];
            sum[0] -= u32::from(p.r);
            sum[1] -= u32::from(p.g);
            sum[2] -= u32::from(p.b);
            sum[3] -= u32::from(p.a);
        }

        let inc = x - before + size;
        if inc >= 0 && inc < len {
            add(&mut sum, src[inc as usize]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_layout() {
        assert_eq!(box_passes(0.5, 100), None);

        // d = floor(2 * 1.88 + 0.5) = 4
        let passes = box_passes(2.0, 100).unwrap();
        assert_eq!(passes[0], BoxPass { size: 4, before: 2 });
        assert_eq!(passes[1], BoxPass { size: 4, before: 1 });
        assert_eq!(passes[2], BoxPass { size: 5, before: 2 });

        // d = floor(3 * 1.88 + 0.5) = 6
        let passes = box_passes(3.0, 100).unwrap();
        assert_eq!(passes[2].size, 7);

        // d = floor(4 * 1.88 + 0.5) = 8, 5 gives 9
        let passes = box_passes(5.0, 100).unwrap();
        assert_eq!(passes, [BoxPass { size: 9, before: 4 }; 3]);
    }

    #[test]
    fn single_pass_preserves_mass() {
        let mut src = vec![RGBA8::default(); 9];
        src[4] = RGBA8::new(0, 0, 0, 255);
        let mut dst = vec![RGBA8::default(); 9];
        box_pass(BoxPass { size: 3, before: 1 }, &src, &mut dst);
        assert_eq!(dst[3].a, 85);
        assert_eq!(dst[4].a, 85);
        assert_eq!(dst[5].a, 85);
        assert_eq!(dst[2].a, 0);
    }

    #[test]
    fn huge_sigma() {
        let passes = box_passes(1e30, 4).unwrap();
        assert_eq!(passes[0].size, 4 * 510 + 2);

        let mut data = vec![RGBA8::new(0, 0, 0, 255); 5 * 5];
        apply(1e12, 1e12, ImageRefMut::new(5, 5, &mut data));
        assert!(data.iter().all(|p| p.a == 0));
    }

    #[test]
    fn flat_area_stays_flat() {
        let mut data = vec![RGBA8::new(100, 100, 100, 200); 15 * 15];
        apply(3.0, 3.0, ImageRefMut::new(15, 15, &mut data));
        assert_eq!(data[7 * 15 + 7], RGBA8::new(100, 100, 100, 200));
        assert!(data[0].a < 200);
    }
}
