// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use rgb::{RGB8, RGBA8};

use super::{f32_bound, ImageRef, ImageRefMut};
use crate::primitive::{DiffuseLighting, LightSource, SpecularLighting};
use crate::ApproxZero;

#[derive(Clone, Copy, Debug)]
struct Vector3 {
    x: f32,
    y: f32,
    z: f32,
}

impl Vector3 {
    #[inline]
    fn new(x: f32, y: f32, z: f32) -> Self {
        Vector3 { x, y, z }
    }

    #[inline]
    fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    fn normalized(&self) -> Option<Self> {
        let len = self.length();
        if len.is_fuzzy_zero() {
            return None;
        }

        Some(Vector3::new(self.x / len, self.y / len, self.z / len))
    }
}

impl core::ops::Add for Vector3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl core::ops::Sub for Vector3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Renders a diffuse lighting.
///
/// - `src` pixels can have any alpha method, since only the alpha channel is used.
/// - `dest` will have an **unpremultiplied alpha**.
///
/// `light_source` must be already mapped into the canvas coordinates
/// and `lighting_color` into the working color space.
///
/// # Panics
///
/// When `src` and `dest` have different sizes.
pub fn diffuse_lighting(
    fe: &DiffuseLighting,
    light_source: LightSource,
    lighting_color: RGB8,
    src: ImageRef,
    dest: ImageRefMut,
) {
    let kd = fe.diffuse_constant();
    let light_factor = |normal: Vector3, light: Vector3| kd * normal.dot(&light);

    apply(
        fe.surface_scale(),
        light_source,
        lighting_color,
        &light_factor,
        &|_, _, _| 255,
        src,
        dest,
    );
}

/// Renders a specular lighting.
///
/// - `src` pixels can have any alpha method, since only the alpha channel is used.
/// - `dest` will have an **unpremultiplied alpha**.
///
/// `light_source` must be already mapped into the canvas coordinates
/// and `lighting_color` into the working color space.
///
/// # Panics
///
/// When `src` and `dest` have different sizes.
pub fn specular_lighting(
    fe: &SpecularLighting,
    light_source: LightSource,
    lighting_color: RGB8,
    src: ImageRef,
    dest: ImageRefMut,
) {
    let ks = fe.specular_constant();
    let exponent = fe.specular_exponent();
    let light_factor = |normal: Vector3, light: Vector3| {
        let eye = Vector3::new(0.0, 0.0, 1.0);
        let h = match (light + eye).normalized() {
            Some(h) => h,
            None => return 0.0,
        };

        let n_dot_h = normal.dot(&h);
        if n_dot_h <= 0.0 {
            return 0.0;
        }

        ks * n_dot_h.powf(exponent)
    };

    apply(
        fe.surface_scale(),
        light_source,
        lighting_color,
        &light_factor,
        &|r, g, b| r.max(g).max(b),
        src,
        dest,
    );
}

fn apply(
    surface_scale: f32,
    light_source: LightSource,
    lighting_color: RGB8,
    light_factor: &dyn Fn(Vector3, Vector3) -> f32,
    calc_alpha: &dyn Fn(u8, u8, u8) -> u8,
    src: ImageRef,
    dest: ImageRefMut,
) {
    assert!(src.width == dest.width && src.height == dest.height);

    let w = src.width as i32;
    let h = src.height as i32;
    if w == 0 || h == 0 {
        return;
    }

    let alpha = |x: i32, y: i32| src.data[(y * w + x) as usize].a as f32 / 255.0;

    let distant = match light_source {
        LightSource::Distant { azimuth, elevation } => {
            let az = azimuth.to_radians();
            let el = elevation.to_radians();
            Some(Vector3::new(az.cos() * el.cos(), az.sin() * el.cos(), el.sin()))
        }
        _ => None,
    };

    for (idx, out) in dest.data.iter_mut().enumerate() {
        let x = idx as i32 % w;
        let y = idx as i32 / w;

        let normal = surface_normal(x, y, w, h, surface_scale, &alpha);

        let surface = Vector3::new(x as f32, y as f32, surface_scale * alpha(x, y));
        let (light, color) = match light_source {
            LightSource::Distant { .. } => (
                distant.unwrap_or(Vector3::new(0.0, 0.0, 1.0)),
                lighting_color,
            ),
            LightSource::Point { x: lx, y: ly, z: lz } => {
                let l = Vector3::new(lx, ly, lz) - surface;
                (l.normalized().unwrap_or(l), lighting_color)
            }
            LightSource::Spot {
                x: lx,
                y: ly,
                z: lz,
                points_at_x,
                points_at_y,
                points_at_z,
                specular_exponent,
                limiting_cone_angle,
            } => {
                let origin = Vector3::new(lx, ly, lz);
                let l = origin - surface;
                let l = l.normalized().unwrap_or(l);

                let s = Vector3::new(points_at_x, points_at_y, points_at_z) - origin;
                let color = match s.normalized() {
                    Some(s) => {
                        let minus_l_dot_s = -l.dot(&s);
                        let inside_cone = match limiting_cone_angle {
                            Some(angle) => minus_l_dot_s >= angle.to_radians().cos().abs(),
                            None => true,
                        };

                        if minus_l_dot_s <= 0.0 || !inside_cone {
                            RGB8::new(0, 0, 0)
                        } else {
                            let k = minus_l_dot_s.powf(specular_exponent);
                            scale_color(lighting_color, k)
                        }
                    }
                    None => RGB8::new(0, 0, 0),
                };

                (l, color)
            }
        };

        let factor = light_factor(normal, light);
        let channel = |c: u8| (f32_bound(0.0, factor * c as f32, 255.0) + 0.5) as u8;

        let r = channel(color.r);
        let g = channel(color.g);
        let b = channel(color.b);
        *out = RGBA8 {
            r,
            g,
            b,
            a: calc_alpha(r, g, b),
        };
    }
}

/// Computes a surface normal with a Sobel operator.
///
/// Pixels outside the image are not sampled.
/// The normalization factor is `2 / (span * weight_sum)`, which gives
/// 1/4 inside, 1/3 and 1/2 on edges and 2/3 in corners.
fn surface_normal(
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    surface_scale: f32,
    alpha: &dyn Fn(i32, i32) -> f32,
) -> Vector3 {
    let left = (x - 1).max(0);
    let right = (x + 1).min(w - 1);
    let top = (y - 1).max(0);
    let bottom = (y + 1).min(h - 1);

    let weight = |d: i32| if d == 0 { 2.0 } else { 1.0 };

    let mut nx = 0.0;
    let mut wsum_x = 0.0;
    for ry in top..=bottom {
        let k = weight(ry - y);
        nx += k * (alpha(right, ry) - alpha(left, ry));
        wsum_x += k;
    }

    let mut ny = 0.0;
    let mut wsum_y = 0.0;
    for rx in left..=right {
        let k = weight(rx - x);
        ny += k * (alpha(rx, bottom) - alpha(rx, top));
        wsum_y += k;
    }

    let span_x = (right - left) as f32;
    let span_y = (bottom - top) as f32;
    let fx = if span_x > 0.0 { 2.0 / (span_x * wsum_x) } else { 0.0 };
    let fy = if span_y > 0.0 { 2.0 / (span_y * wsum_y) } else { 0.0 };

    let n = Vector3::new(-surface_scale * fx * nx, -surface_scale * fy * ny, 1.0);
    n.normalized().unwrap_or(n)
}

fn scale_color(color: RGB8, k: f32) -> RGB8 {
    let c = |v: u8| (f32_bound(0.0, v as f32 * k, 255.0) + 0.5) as u8;
    RGB8::new(c(color.r), c(color.g), c(color.b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(alpha: u8) -> Vec<RGBA8> {
        vec![RGBA8::new(0, 0, 0, alpha); 5 * 5]
    }

    #[test]
    fn flat_surface_normal() {
        let data = flat(255);
        let alpha = |x: i32, y: i32| data[(y * 5 + x) as usize].a as f32 / 255.0;
        let n = surface_normal(0, 0, 5, 5, 3.0, &alpha);
        assert_eq!((n.x, n.y, n.z), (0.0, 0.0, 1.0));
    }

    #[test]
    fn slope_normal_points_down_hill() {
        // Alpha grows to the right, so the normal leans left.
        let mut data = vec![RGBA8::default(); 3 * 3];
        for y in 0..3 {
            for x in 0..3 {
                data[y * 3 + x].a = (x * 100) as u8;
            }
        }

        let alpha = |x: i32, y: i32| data[(y * 3 + x) as usize].a as f32 / 255.0;
        let n = surface_normal(1, 1, 3, 3, 1.0, &alpha);
        assert!(n.x < 0.0);
        assert!(n.y.abs() < 1e-6);
    }

    #[test]
    fn diffuse_overhead_light() {
        let mut fe = DiffuseLighting::default();
        fe.set_attribute("diffuseConstant", Some("1"));

        let src = flat(255);
        let mut dest = flat(0);
        diffuse_lighting(
            &fe,
            LightSource::Distant {
                azimuth: 0.0,
                elevation: 90.0,
            },
            RGB8::new(255, 128, 0),
            ImageRef::new(5, 5, &src),
            ImageRefMut::new(5, 5, &mut dest),
        );

        assert_eq!(dest[12], RGBA8::new(255, 128, 0, 255));
    }

    #[test]
    fn specular_alpha_is_max_channel() {
        let fe = SpecularLighting::default();

        let src = flat(255);
        let mut dest = flat(0);
        specular_lighting(
            &fe,
            LightSource::Distant {
                azimuth: 0.0,
                elevation: 90.0,
            },
            RGB8::new(0, 200, 100),
            ImageRef::new(5, 5, &src),
            ImageRefMut::new(5, 5, &mut dest),
        );

        assert_eq!(dest[12], RGBA8::new(0, 200, 100, 200));
    }

    #[test]
    fn spot_outside_cone_is_black() {
        let fe = DiffuseLighting::default();

        let src = flat(0);
        let mut dest = flat(0);
        diffuse_lighting(
            &fe,
            LightSource::Spot {
                x: 2.0,
                y: 2.0,
                z: 10.0,
                points_at_x: 100.0,
                points_at_y: 2.0,
                points_at_z: 10.0,
                specular_exponent: 1.0,
                limiting_cone_angle: Some(10.0),
            },
            RGB8::new(255, 255, 255),
            ImageRef::new(5, 5, &src),
            ImageRefMut::new(5, 5, &mut dest),
        );

        assert_eq!(dest[12], RGBA8::new(0, 0, 0, 255));
    }
}
