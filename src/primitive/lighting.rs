// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use svgtypes::Color;

use super::flood::parse_color;
use crate::units::{parse_number, parse_number_pair};

/// A light source of a lighting primitive.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LightSource {
    /// `feDistantLight`. Angles are in degrees.
    Distant { azimuth: f32, elevation: f32 },
    /// `fePointLight`.
    Point { x: f32, y: f32, z: f32 },
    /// `feSpotLight`.
    Spot {
        x: f32,
        y: f32,
        z: f32,
        points_at_x: f32,
        points_at_y: f32,
        points_at_z: f32,
        specular_exponent: f32,
        limiting_cone_angle: Option<f32>,
    },
}

impl LightSource {
    /// Creates a light source with default parameters from an element name.
    pub fn from_element_name(name: &str) -> Option<Self> {
        match name {
            "feDistantLight" => Some(LightSource::Distant {
                azimuth: 0.0,
                elevation: 0.0,
            }),
            "fePointLight" => Some(LightSource::Point {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            }),
            "feSpotLight" => Some(LightSource::Spot {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                points_at_x: 0.0,
                points_at_y: 0.0,
                points_at_z: 0.0,
                specular_exponent: 1.0,
                limiting_cone_angle: None,
            }),
            _ => None,
        }
    }

    /// Returns the light source element name.
    pub fn element_name(&self) -> &'static str {
        match self {
            LightSource::Distant { .. } => "feDistantLight",
            LightSource::Point { .. } => "fePointLight",
            LightSource::Spot { .. } => "feSpotLight",
        }
    }

    /// Applies a light source attribute.
    pub fn set_attribute(&mut self, key: &str, value: Option<&str>) -> bool {
        let n = value.and_then(|v| {
            let n = parse_number(v);
            if n.is_none() {
                log::warn!("Invalid light source {} '{}'.", key, v);
            }
            n
        });

        match (self, key) {
            (LightSource::Distant { azimuth, .. }, "azimuth") => *azimuth = n.unwrap_or(0.0),
            (LightSource::Distant { elevation, .. }, "elevation") => *elevation = n.unwrap_or(0.0),
            (LightSource::Point { x, .. }, "x") | (LightSource::Spot { x, .. }, "x") => {
                *x = n.unwrap_or(0.0)
            }
            (LightSource::Point { y, .. }, "y") | (LightSource::Spot { y, .. }, "y") => {
                *y = n.unwrap_or(0.0)
            }
            (LightSource::Point { z, .. }, "z") | (LightSource::Spot { z, .. }, "z") => {
                *z = n.unwrap_or(0.0)
            }
            (LightSource::Spot { points_at_x, .. }, "pointsAtX") => *points_at_x = n.unwrap_or(0.0),
            (LightSource::Spot { points_at_y, .. }, "pointsAtY") => *points_at_y = n.unwrap_or(0.0),
            (LightSource::Spot { points_at_z, .. }, "pointsAtZ") => *points_at_z = n.unwrap_or(0.0),
            (LightSource::Spot { specular_exponent, .. }, "specularExponent") => {
                *specular_exponent = match n {
                    Some(n) if n > 0.0 => n,
                    _ => 1.0,
                };
            }
            (LightSource::Spot { limiting_cone_angle, .. }, "limitingConeAngle") => {
                *limiting_cone_angle = n;
            }
            _ => return false,
        }

        true
    }
}

/// Parses `lighting-color`. The alpha is ignored.
fn parse_lighting_color(value: Option<&str>) -> Color {
    match value {
        Some(v) => match parse_color(v) {
            Some(c) => Color::new_rgb(c.red, c.green, c.blue),
            None => {
                log::warn!("Failed to parse lighting-color value: '{}'.", v);
                Color::white()
            }
        },
        None => Color::white(),
    }
}

/// An `feDiffuseLighting` filter primitive.
///
/// Without a light source the result is transparent black.
#[derive(Clone, Debug)]
pub struct DiffuseLighting {
    pub(crate) surface_scale: f32,
    pub(crate) diffuse_constant: f32,
    pub(crate) lighting_color: Color,
    pub(crate) light_source: Option<LightSource>,
    pub(crate) kernel_unit_length: Option<(f32, f32)>,
}

impl Default for DiffuseLighting {
    fn default() -> Self {
        DiffuseLighting {
            surface_scale: 1.0,
            diffuse_constant: 1.0,
            lighting_color: Color::white(),
            light_source: None,
            kernel_unit_length: None,
        }
    }
}

impl DiffuseLighting {
    /// The `surfaceScale` attribute.
    pub fn surface_scale(&self) -> f32 {
        self.surface_scale
    }

    /// The `diffuseConstant` attribute.
    pub fn diffuse_constant(&self) -> f32 {
        self.diffuse_constant
    }

    /// The `lighting-color` attribute.
    pub fn lighting_color(&self) -> Color {
        self.lighting_color
    }

    /// The first light source child, if any.
    pub fn light_source(&self) -> Option<LightSource> {
        self.light_source
    }

    /// The light source, for modification.
    pub fn light_source_mut(&mut self) -> Option<&mut LightSource> {
        self.light_source.as_mut()
    }

    /// Replaces the light source.
    pub fn set_light_source(&mut self, light: Option<LightSource>) {
        self.light_source = light;
    }

    pub(crate) fn set_attribute(&mut self, key: &str, value: Option<&str>) -> bool {
        match key {
            "surfaceScale" => self.surface_scale = value.and_then(parse_number).unwrap_or(1.0),
            "diffuseConstant" => {
                self.diffuse_constant = match value.and_then(parse_number) {
                    Some(n) if n >= 0.0 => n,
                    _ => 1.0,
                };
            }
            "lighting-color" => self.lighting_color = parse_lighting_color(value),
            "kernelUnitLength" => self.kernel_unit_length = value.and_then(parse_number_pair),
            _ => return false,
        }

        true
    }
}

/// An `feSpecularLighting` filter primitive.
///
/// Without a light source the result is transparent black.
#[derive(Clone, Debug)]
pub struct SpecularLighting {
    pub(crate) surface_scale: f32,
    pub(crate) specular_constant: f32,
    pub(crate) specular_exponent: f32,
    pub(crate) lighting_color: Color,
    pub(crate) light_source: Option<LightSource>,
    pub(crate) kernel_unit_length: Option<(f32, f32)>,
}

impl Default for SpecularLighting {
    fn default() -> Self {
        SpecularLighting {
            surface_scale: 1.0,
            specular_constant: 1.0,
            specular_exponent: 1.0,
            lighting_color: Color::white(),
            light_source: None,
            kernel_unit_length: None,
        }
    }
}

impl SpecularLighting {
    /// The `surfaceScale` attribute.
    pub fn surface_scale(&self) -> f32 {
        self.surface_scale
    }

    /// The `specularConstant` attribute.
    pub fn specular_constant(&self) -> f32 {
        self.specular_constant
    }

    /// Always in the 1..128 range.
    pub fn specular_exponent(&self) -> f32 {
        self.specular_exponent
    }

    /// The `lighting-color` attribute.
    pub fn lighting_color(&self) -> Color {
        self.lighting_color
    }

    /// The first light source child, if any.
    pub fn light_source(&self) -> Option<LightSource> {
        self.light_source
    }

    /// The light source, for modification.
    pub fn light_source_mut(&mut self) -> Option<&mut LightSource> {
        self.light_source.as_mut()
    }

    /// Replaces the light source.
    pub fn set_light_source(&mut self, light: Option<LightSource>) {
        self.light_source = light;
    }

    pub(crate) fn set_attribute(&mut self, key: &str, value: Option<&str>) -> bool {
        match key {
            "surfaceScale" => self.surface_scale = value.and_then(parse_number).unwrap_or(1.0),
            "specularConstant" => {
                self.specular_constant = match value.and_then(parse_number) {
                    Some(n) if n >= 0.0 => n,
                    _ => 1.0,
                };
            }
            "specularExponent" => {
                self.specular_exponent = match value.and_then(parse_number) {
                    Some(n) if (1.0..=128.0).contains(&n) => n,
                    Some(n) => {
                        log::warn!("specularExponent {} is out of the 1..128 range.", n);
                        n.max(1.0).min(128.0)
                    }
                    None => 1.0,
                };
            }
            "lighting-color" => self.lighting_color = parse_lighting_color(value),
            "kernelUnitLength" => self.kernel_unit_length = value.and_then(parse_number_pair),
            _ => return false,
        }

        true
    }
}
