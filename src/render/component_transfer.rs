// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::ImageRefMut;
use crate::primitive::{ComponentTransfer, TransferFunction};

/// Applies component transfer functions for each `src` image channel.
///
/// Input image pixels should have an **unpremultiplied alpha**.
pub fn apply(fe: &ComponentTransfer, src: ImageRefMut) {
    let r = lookup_table(&fe.func_r);
    let g = lookup_table(&fe.func_g);
    let b = lookup_table(&fe.func_b);
    let a = lookup_table(&fe.func_a);

    if r.is_none() && g.is_none() && b.is_none() && a.is_none() {
        return;
    }

    for pixel in src.data {
        if let Some(ref t) = r {
            pixel.r = t[pixel.r as usize];
        }

        if let Some(ref t) = g {
            pixel.g = t[pixel.g as usize];
        }

        if let Some(ref t) = b {
            pixel.b = t[pixel.b as usize];
        }

        if let Some(ref t) = a {
            pixel.a = t[pixel.a as usize];
        }
    }
}

/// Precomputes a function for all 8-bit values. `None` for identity functions.
fn lookup_table(func: &TransferFunction) -> Option<[u8; 256]> {
    if func.is_identity() {
        return None;
    }

    let mut table = [0u8; 256];
    for (i, v) in table.iter_mut().enumerate() {
        *v = (func.evaluate(i as f32 / 255.0) * 255.0 + 0.5) as u8;
    }

    Some(table)
}
