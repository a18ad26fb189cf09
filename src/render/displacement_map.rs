// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use rgb::RGBA8;

use super::{ImageRef, ImageRefMut};
use crate::primitive::{ColorChannel, DisplacementMap};

/// Applies a displacement map.
///
/// - `map` pixels should have an **unpremultiplied alpha**.
/// - `src` pixels can have any alpha method.
///
/// `sx` and `sy` are the displacement scale already mapped into the canvas space.
/// Pixels displaced from outside of `src` are transparent black.
///
/// # Panics
///
/// When `src`, `map` and `dest` have different sizes.
pub fn apply(
    fe: &DisplacementMap,
    sx: f32,
    sy: f32,
    src: ImageRef,
    map: ImageRef,
    dest: ImageRefMut,
) {
    assert!(src.width == map.width && src.width == dest.width);
    assert!(src.height == map.height && src.height == dest.height);

    let w = src.width as i32;
    let h = src.height as i32;

    let channel = |p: RGBA8, c: ColorChannel| {
        let v = match c {
            ColorChannel::R => p.r,
            ColorChannel::G => p.g,
            ColorChannel::B => p.b,
            ColorChannel::A => p.a,
        };

        v as f32 / 255.0 - 0.5
    };

    for (idx, out) in dest.data.iter_mut().enumerate() {
        let x = idx as i32 % w;
        let y = idx as i32 / w;
        let p = map.data[idx];

        let ox = (x as f32 + sx * channel(p, fe.x_channel())).round() as i32;
        let oy = (y as f32 + sy * channel(p, fe.y_channel())).round() as i32;

        *out = if ox >= 0 && ox < w && oy >= 0 && oy < h {
            src.data[(oy * w + ox) as usize]
        } else {
            RGBA8::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SlotNamespace;

    #[test]
    fn shifts_by_channel() {
        let mut ns = SlotNamespace::new();
        let mut fe = DisplacementMap::default();
        fe.set_attribute("xChannelSelector", Some("R"), &mut ns);
        fe.set_attribute("yChannelSelector", Some("G"), &mut ns);

        let src: Vec<RGBA8> = (0..9).map(|i| RGBA8::new(i, 0, 0, 255)).collect();
        // R = 255 moves sampling one pixel right with scale 2, G = 128 keeps y.
        let map = vec![RGBA8::new(255, 128, 0, 255); 9];
        let mut dest = vec![RGBA8::default(); 9];

        apply(
            &fe,
            2.0,
            2.0,
            ImageRef::new(3, 3, &src),
            ImageRef::new(3, 3, &map),
            ImageRefMut::new(3, 3, &mut dest),
        );

        assert_eq!(dest[0].r, 1);
        assert_eq!(dest[4].r, 5);
        assert_eq!(dest[2], RGBA8::default());
    }
}
