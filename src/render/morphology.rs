// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use rgb::RGBA8;

use super::ImageRefMut;
use crate::primitive::MorphologyOperator;

/// Applies a morphology filter.
///
/// `src` pixels should have a **premultiplied alpha**.
///
/// The window is `2 * r + 1` pixels wide on each axis. Both passes are separable,
/// since a min/max over a rectangle equals a min/max of per-row min/max values.
/// Pixels outside the image are transparent black.
pub fn apply(operator: MorphologyOperator, rx: f32, ry: f32, mut src: ImageRefMut) {
    let width = src.width as usize;
    let height = src.height as usize;

    // A window wider than the line covers all of it and the outside anyway.
    let rx = (rx.round().max(0.0) as usize).min(width);
    let ry = (ry.round().max(0.0) as usize).min(height);

    let mut line = vec![RGBA8::default(); width];
    for y in 0..height {
        let row = &mut src.data[y * width..(y + 1) * width];
        line.copy_from_slice(row);
        morph_line(operator, rx, &line, row);
    }

    let mut line = vec![RGBA8::default(); height];
    let mut out = vec![RGBA8::default(); height];
    for x in 0..width {
        for (y, p) in line.iter_mut().enumerate() {
            *p = src.data[y * width + x];
        }

        morph_line(operator, ry, &line, &mut out);

        for (y, p) in out.iter().enumerate() {
            src.data[y * width + x] = *p;
        }
    }
}

fn morph_line(operator: MorphologyOperator, radius: usize, src: &[RGBA8], dst: &mut [RGBA8]) {
    let len = src.len() as isize;
    let radius = radius as isize;

    for x in 0..len {
        let (mut r, mut g, mut b, mut a) = match operator {
            MorphologyOperator::Erode => (255u8, 255u8, 255u8, 255u8),
            MorphologyOperator::Dilate => (0, 0, 0, 0),
        };

        for i in (x - radius)..=(x + radius) {
            let p = if i < 0 || i >= len {
                RGBA8::default()
            } else {
                src[i as usize]
            };

            match operator {
                MorphologyOperator::Erode => {
                    r = r.min(p.r);
                    g = g.min(p.g);
                    b = b.min(p.b);
                    a = a.min(p.a);
                }
                MorphologyOperator::Dilate => {
                    r = r.max(p.r);
                    g = g.max(p.g);
                    b = b.max(p.b);
                    a = a.max(p.a);
                }
            }
        }

        dst[x as usize] = RGBA8 { r, g, b, a };
    }
}
