// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Perlin noise as defined by the SVG `feTurbulence` reference algorithm.

use super::{f32_bound, ImageRefMut};
use crate::primitive::{Turbulence, TurbulenceKind};

const RAND_M: i32 = 2147483647; // 2**31 - 1
const RAND_A: i32 = 16807; // 7**5; primitive root of m
const RAND_Q: i32 = 127773; // m / a
const RAND_R: i32 = 2836; // m % a
const B_SIZE: usize = 0x100;
const B_SIZE_32: i32 = 0x100;
const B_LEN: usize = B_SIZE + B_SIZE + 2;
const BM: i32 = 0xff;
const PERLIN_N: i32 = 0x1000;

#[derive(Clone, Copy)]
struct StitchInfo {
    width: i32,
    height: i32,
    wrap_x: i32,
    wrap_y: i32,
}

/// Precomputed permutation and gradient tables for a seed.
struct Lattice {
    selector: Vec<usize>,
    gradient: Vec<Vec<[f64; 2]>>,
}

impl Lattice {
    fn new(seed: i32) -> Self {
        let mut seed = setup_seed(seed);
        let mut selector = vec![0usize; B_LEN];
        let mut gradient = vec![vec![[0.0f64; 2]; B_LEN]; 4];

        for channel in gradient.iter_mut() {
            for g in channel.iter_mut().take(B_SIZE) {
                for v in g.iter_mut() {
                    seed = random(seed);
                    *v = ((seed % (B_SIZE_32 + B_SIZE_32)) - B_SIZE_32) as f64 / B_SIZE_32 as f64;
                }

                let s = (g[0] * g[0] + g[1] * g[1]).sqrt();
                if s != 0.0 {
                    g[0] /= s;
                    g[1] /= s;
                }
            }
        }

        for (i, s) in selector.iter_mut().take(B_SIZE).enumerate() {
            *s = i;
        }

        for i in (1..B_SIZE).rev() {
            seed = random(seed);
            let j = (seed % B_SIZE_32) as usize;
            selector.swap(i, j);
        }

        for i in 0..B_SIZE + 2 {
            selector[B_SIZE + i] = selector[i];
            for channel in gradient.iter_mut() {
                channel[B_SIZE + i] = channel[i];
            }
        }

        Lattice { selector, gradient }
    }
}

fn setup_seed(mut seed: i32) -> i32 {
    if seed <= 0 {
        seed = -(seed % (RAND_M - 1)) + 1;
    }

    if seed > RAND_M - 1 {
        seed = RAND_M - 1;
    }

    seed
}

fn random(seed: i32) -> i32 {
    let mut seed = RAND_A * (seed % RAND_Q) - RAND_R * (seed / RAND_Q);
    if seed <= 0 {
        seed += RAND_M;
    }

    seed
}

#[inline]
fn s_curve(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

fn noise2(
    channel: usize,
    vec: [f64; 2],
    lattice: &Lattice,
    stitch: Option<StitchInfo>,
) -> f64 {
    let t = vec[0] + PERLIN_N as f64;
    let mut bx0 = t as i32;
    let mut bx1 = bx0 + 1;
    let rx0 = t - t as i64 as f64;
    let rx1 = rx0 - 1.0;

    let t = vec[1] + PERLIN_N as f64;
    let mut by0 = t as i32;
    let mut by1 = by0 + 1;
    let ry0 = t - t as i64 as f64;
    let ry1 = ry0 - 1.0;

    if let Some(info) = stitch {
        if bx0 >= info.wrap_x {
            bx0 -= info.width;
        }

        if bx1 >= info.wrap_x {
            bx1 -= info.width;
        }

        if by0 >= info.wrap_y {
            by0 -= info.height;
        }

        if by1 >= info.wrap_y {
            by1 -= info.height;
        }
    }

    let bx0 = (bx0 & BM) as usize;
    let bx1 = (bx1 & BM) as usize;
    let by0 = (by0 & BM) as usize;
    let by1 = (by1 & BM) as usize;

    let sel = &lattice.selector;
    let i = sel[bx0];
    let j = sel[bx1];
    let b00 = sel[i + by0];
    let b10 = sel[j + by0];
    let b01 = sel[i + by1];
    let b11 = sel[j + by1];

    let sx = s_curve(rx0);
    let sy = s_curve(ry0);

    let grad = &lattice.gradient[channel];
    let dot = |g: [f64; 2], x: f64, y: f64| x * g[0] + y * g[1];

    let u = dot(grad[b00], rx0, ry0);
    let v = dot(grad[b10], rx1, ry0);
    let a = lerp(sx, u, v);

    let u = dot(grad[b01], rx0, ry1);
    let v = dot(grad[b11], rx1, ry1);
    let b = lerp(sx, u, v);

    lerp(sy, a, b)
}

/// Computes the turbulence value of a single channel at a point.
fn turbulence(
    channel: usize,
    point: [f64; 2],
    tile: (f64, f64, f64, f64),
    fe: &Turbulence,
    lattice: &Lattice,
) -> f64 {
    let (tile_x, tile_y, tile_width, tile_height) = tile;
    let (mut base_x, mut base_y) = {
        let (x, y) = fe.base_frequency();
        (x as f64, y as f64)
    };

    let mut stitch = None;
    if fe.stitch_tiles() {
        // Adjust the base frequencies so that the tile contains an integral number of periods.
        if base_x != 0.0 {
            let lo = (tile_width * base_x).floor() / tile_width;
            let hi = (tile_width * base_x).ceil() / tile_width;
            base_x = if base_x / lo < hi / base_x { lo } else { hi };
        }

        if base_y != 0.0 {
            let lo = (tile_height * base_y).floor() / tile_height;
            let hi = (tile_height * base_y).ceil() / tile_height;
            base_y = if base_y / lo < hi / base_y { lo } else { hi };
        }

        let width = (tile_width * base_x + 0.5) as i32;
        let height = (tile_height * base_y + 0.5) as i32;
        stitch = Some(StitchInfo {
            width,
            height,
            wrap_x: (tile_x * base_x + PERLIN_N as f64 + width as f64) as i32,
            wrap_y: (tile_y * base_y + PERLIN_N as f64 + height as f64) as i32,
        });
    }

    let mut sum = 0.0;
    let mut vec = [point[0] * base_x, point[1] * base_y];
    let mut ratio = 1.0;
    for _ in 0..fe.num_octaves() {
        let n = noise2(channel, vec, lattice, stitch);
        sum += match fe.kind() {
            TurbulenceKind::FractalNoise => n / ratio,
            TurbulenceKind::Turbulence => n.abs() / ratio,
        };

        vec[0] *= 2.0;
        vec[1] *= 2.0;
        ratio *= 2.0;

        if let Some(ref mut info) = stitch {
            // Subtracting PerlinN before the multiplication and adding it afterward
            // keeps the wrap points in the same lattice cell.
            info.width *= 2;
            info.wrap_x = 2 * info.wrap_x - PERLIN_N;
            info.height *= 2;
            info.wrap_y = 2 * info.wrap_y - PERLIN_N;
        }
    }

    sum
}

/// Fills an image with turbulence noise.
///
/// - `offset_x` and `offset_y` map canvas pixels back into the user space
///   together with `sx` and `sy` scale.
/// - `tile` is the primitive subregion in user space, used for stitching.
/// - `dest` will have an **unpremultiplied alpha**.
pub fn apply(
    fe: &Turbulence,
    offset_x: f64,
    offset_y: f64,
    sx: f64,
    sy: f64,
    tile: (f64, f64, f64, f64),
    dest: ImageRefMut,
) {
    let lattice = Lattice::new(fe.seed());
    let width = dest.width as usize;

    for (idx, pixel) in dest.data.iter_mut().enumerate() {
        let x = (idx % width) as f64;
        let y = (idx / width) as f64;
        let point = [(x - offset_x) / sx, (y - offset_y) / sy];

        let channel = |c: usize| {
            let n = turbulence(c, point, tile, fe, &lattice);
            let n = match fe.kind() {
                TurbulenceKind::FractalNoise => (n * 255.0 + 255.0) / 2.0,
                TurbulenceKind::Turbulence => n * 255.0,
            };

            (f32_bound(0.0, n as f32, 255.0) + 0.5) as u8
        };

        pixel.r = channel(0);
        pixel.g = channel(1);
        pixel.b = channel(2);
        pixel.a = channel(3);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgb::RGBA8;

    #[test]
    fn seed_setup() {
        assert_eq!(setup_seed(0), 1);
        assert_eq!(setup_seed(-5), 6);
        assert_eq!(setup_seed(42), 42);
    }

    #[test]
    fn lcg_sequence() {
        assert_eq!(random(1), 16807);
        assert_eq!(random(16807), 282475249);
    }

    #[test]
    fn zero_frequency_is_flat() {
        let fe = Turbulence::default();
        let mut data = vec![RGBA8::new(1, 2, 3, 4); 4];
        apply(
            &fe,
            0.0,
            0.0,
            1.0,
            1.0,
            (0.0, 0.0, 2.0, 2.0),
            ImageRefMut::new(2, 2, &mut data),
        );
        assert_eq!(data[0], RGBA8::new(0, 0, 0, 0));
        assert_eq!(data[3], RGBA8::new(0, 0, 0, 0));
    }

    #[test]
    fn deterministic() {
        let mut fe = Turbulence::default();
        fe.set_attribute("baseFrequency", Some("0.05"));
        fe.set_attribute("numOctaves", Some("2"));
        fe.set_attribute("seed", Some("7"));

        let mut a = vec![RGBA8::default(); 16 * 16];
        let mut b = vec![RGBA8::default(); 16 * 16];
        let tile = (0.0, 0.0, 16.0, 16.0);
        apply(&fe, 0.0, 0.0, 1.0, 1.0, tile, ImageRefMut::new(16, 16, &mut a));
        apply(&fe, 0.0, 0.0, 1.0, 1.0, tile, ImageRefMut::new(16, 16, &mut b));
        assert_eq!(a, b);
        assert!(a.iter().any(|p| p.a != 0));
    }
}
