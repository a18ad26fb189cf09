// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use rgb::RGBA8;

use super::{f32_bound, ImageRef, ImageRefMut};

/// Performs an arithmetic composition.
///
/// `result = k1 * i1 * i2 + k2 * i1 + k3 * i2 + k4` per channel.
///
/// - `src1` and `src2` image pixels should have a **premultiplied alpha**.
/// - `dest` image pixels will have a **premultiplied alpha**.
///
/// # Panics
///
/// When `src1`, `src2` and `dest` have different sizes.
pub fn arithmetic(k: [f32; 4], src1: ImageRef, src2: ImageRef, dest: ImageRefMut) {
    assert!(src1.width == src2.width && src1.width == dest.width);
    assert!(src1.height == src2.height && src1.height == dest.height);

    let [k1, k2, k3, k4] = k;
    let calc = |i1: u8, i2: u8, max: f32| {
        let i1 = i1 as f32 / 255.0;
        let i2 = i2 as f32 / 255.0;
        let result = k1 * i1 * i2 + k2 * i1 + k3 * i2 + k4;
        f32_bound(0.0, result, max)
    };

    for ((c1, c2), out) in src1.data.iter().zip(src2.data).zip(dest.data.iter_mut()) {
        let a = calc(c1.a, c2.a, 1.0);
        if a * 255.0 < 0.5 {
            *out = RGBA8::default();
            continue;
        }

        let r = (calc(c1.r, c2.r, a) * 255.0 + 0.5) as u8;
        let g = (calc(c1.g, c2.g, a) * 255.0 + 0.5) as u8;
        let b = (calc(c1.b, c2.b, a) * 255.0 + 0.5) as u8;
        let a = (a * 255.0 + 0.5) as u8;

        *out = RGBA8 {
            r: r.min(a),
            g: g.min(a),
            b: b.min(a),
            a,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_of_inputs() {
        let src1 = [RGBA8::new(100, 0, 0, 100)];
        let src2 = [RGBA8::new(0, 50, 0, 100)];
        let mut dest = [RGBA8::default()];
        arithmetic(
            [0.0, 1.0, 1.0, 0.0],
            ImageRef::new(1, 1, &src1),
            ImageRef::new(1, 1, &src2),
            ImageRefMut::new(1, 1, &mut dest),
        );
        assert_eq!(dest[0], RGBA8::new(100, 50, 0, 200));
    }

    #[test]
    fn color_never_exceeds_alpha() {
        let src1 = [RGBA8::new(0, 0, 0, 0)];
        let src2 = [RGBA8::new(0, 0, 0, 0)];
        let mut dest = [RGBA8::default()];
        arithmetic(
            [0.0, 0.0, 0.0, 0.5],
            ImageRef::new(1, 1, &src1),
            ImageRef::new(1, 1, &src2),
            ImageRefMut::new(1, 1, &mut dest),
        );
        assert_eq!(dest[0], RGBA8::new(128, 128, 128, 128));

        arithmetic(
            [0.0, 0.0, 0.0, -1.0],
            ImageRef::new(1, 1, &src1),
            ImageRef::new(1, 1, &src2),
            ImageRefMut::new(1, 1, &mut dest),
        );
        assert_eq!(dest[0], RGBA8::default());
    }
}
