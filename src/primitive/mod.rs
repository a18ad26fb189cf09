// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Filter primitives.

use svgtypes::Length;
use tiny_skia::Transform;

use crate::geom::{expansion, is_rectilinear};
use crate::units::parse_length;
use crate::{Rect, ScreenRect, Slot, SlotNamespace};

mod blend;
mod color_matrix;
mod component_transfer;
mod composite;
mod convolve_matrix;
mod displacement_map;
mod flood;
mod gaussian_blur;
mod image;
mod lighting;
mod merge;
mod morphology;
mod offset;
mod tile;
mod turbulence;

pub use blend::{Blend, BlendMode};
pub use color_matrix::{ColorMatrix, ColorMatrixKind, ColorMatrixType};
pub use component_transfer::{
    ComponentTransfer, TransferChannel, TransferFunction, TransferFunctionType,
};
pub use composite::{Composite, CompositeOperator};
pub use convolve_matrix::{ConvolveMatrix, EdgeMode};
pub(crate) use convolve_matrix::Kernel;
pub use displacement_map::{ColorChannel, DisplacementMap};
pub use flood::Flood;
pub(crate) use flood::color_to_string;
pub use gaussian_blur::GaussianBlur;
pub use image::{Image, ImageSource};
pub(crate) use image::aspect_to_string;
pub use lighting::{DiffuseLighting, LightSource, SpecularLighting};
pub use merge::Merge;
pub use morphology::{Morphology, MorphologyOperator};
pub use offset::Offset;
pub use tile::Tile;
pub use turbulence::{Turbulence, TurbulenceKind};

/// A color space used by a filter primitive.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ColorInterpolation {
    SRGB,
    LinearRGB,
}

impl Default for ColorInterpolation {
    fn default() -> Self {
        ColorInterpolation::LinearRGB
    }
}

impl ColorInterpolation {
    /// Parses a `color-interpolation-filters` value.
    ///
    /// `auto` is `None`, meaning "inherit from the filter".
    pub(crate) fn parse(text: &str) -> Option<Option<Self>> {
        match text {
            "auto" => Some(None),
            "sRGB" => Some(Some(ColorInterpolation::SRGB)),
            "linearRGB" => Some(Some(ColorInterpolation::LinearRGB)),
            _ => None,
        }
    }

    pub(crate) fn to_str(self) -> &'static str {
        match self {
            ColorInterpolation::SRGB => "sRGB",
            ColorInterpolation::LinearRGB => "linearRGB",
        }
    }
}

/// A filter primitive kind.
#[allow(missing_docs)]
#[derive(Debug)]
pub enum Kind {
    Blend(Blend),
    ColorMatrix(ColorMatrix),
    ComponentTransfer(ComponentTransfer),
    Composite(Composite),
    ConvolveMatrix(ConvolveMatrix),
    DiffuseLighting(DiffuseLighting),
    DisplacementMap(DisplacementMap),
    Flood(Flood),
    GaussianBlur(GaussianBlur),
    Image(Image),
    Merge(Merge),
    Morphology(Morphology),
    Offset(Offset),
    SpecularLighting(SpecularLighting),
    Tile(Tile),
    Turbulence(Turbulence),
}

impl Kind {
    /// Creates a primitive kind with default parameters from an element name.
    pub fn from_element_name(name: &str) -> Option<Self> {
        let kind = match name {
            "feBlend" => Kind::Blend(Blend::default()),
            "feColorMatrix" => Kind::ColorMatrix(ColorMatrix::default()),
            "feComponentTransfer" => Kind::ComponentTransfer(ComponentTransfer::default()),
            "feComposite" => Kind::Composite(Composite::default()),
            "feConvolveMatrix" => Kind::ConvolveMatrix(ConvolveMatrix::default()),
            "feDiffuseLighting" => Kind::DiffuseLighting(DiffuseLighting::default()),
            "feDisplacementMap" => Kind::DisplacementMap(DisplacementMap::default()),
            "feFlood" => Kind::Flood(Flood::default()),
            "feGaussianBlur" => Kind::GaussianBlur(GaussianBlur::default()),
            "feImage" => Kind::Image(Image::default()),
            "feMerge" => Kind::Merge(Merge::default()),
            "feMorphology" => Kind::Morphology(Morphology::default()),
            "feOffset" => Kind::Offset(Offset::default()),
            "feSpecularLighting" => Kind::SpecularLighting(SpecularLighting::default()),
            "feTile" => Kind::Tile(Tile::default()),
            "feTurbulence" => Kind::Turbulence(Turbulence::default()),
            _ => return None,
        };

        Some(kind)
    }

    /// Returns the SVG element name.
    pub fn element_name(&self) -> &'static str {
        match self {
            Kind::Blend(..) => "feBlend",
            Kind::ColorMatrix(..) => "feColorMatrix",
            Kind::ComponentTransfer(..) => "feComponentTransfer",
            Kind::Composite(..) => "feComposite",
            Kind::ConvolveMatrix(..) => "feConvolveMatrix",
            Kind::DiffuseLighting(..) => "feDiffuseLighting",
            Kind::DisplacementMap(..) => "feDisplacementMap",
            Kind::Flood(..) => "feFlood",
            Kind::GaussianBlur(..) => "feGaussianBlur",
            Kind::Image(..) => "feImage",
            Kind::Merge(..) => "feMerge",
            Kind::Morphology(..) => "feMorphology",
            Kind::Offset(..) => "feOffset",
            Kind::SpecularLighting(..) => "feSpecularLighting",
            Kind::Tile(..) => "feTile",
            Kind::Turbulence(..) => "feTurbulence",
        }
    }

    /// Checks that the primitive reads its `in` attribute.
    ///
    /// Generators and `feMerge` do not.
    pub fn has_input(&self) -> bool {
        !matches!(
            self,
            Kind::Flood(..) | Kind::Image(..) | Kind::Merge(..) | Kind::Turbulence(..)
        )
    }

    /// Returns the second input of two-input primitives.
    pub fn input2(&self) -> Option<Slot> {
        match self {
            Kind::Blend(ref fe) => Some(fe.input2),
            Kind::Composite(ref fe) => Some(fe.input2),
            Kind::DisplacementMap(ref fe) => Some(fe.input2),
            _ => None,
        }
    }

    pub(crate) fn set_input2(&mut self, slot: Slot) {
        match self {
            Kind::Blend(ref mut fe) => fe.input2 = slot,
            Kind::Composite(ref mut fe) => fe.input2 = slot,
            Kind::DisplacementMap(ref mut fe) => fe.input2 = slot,
            _ => {}
        }
    }
}

/// A filter primitive.
///
/// Owns its kind-specific parameters, input and output slots and an optional subregion.
#[derive(Debug)]
pub struct Primitive {
    pub(crate) input: Slot,
    pub(crate) result: Slot,
    pub(crate) x: Option<Length>,
    pub(crate) y: Option<Length>,
    pub(crate) width: Option<Length>,
    pub(crate) height: Option<Length>,
    pub(crate) color_interpolation: Option<ColorInterpolation>,
    pub(crate) kind: Kind,
}

impl Primitive {
    /// Creates a primitive with unset inputs, output and subregion.
    pub fn new(kind: Kind) -> Self {
        Primitive {
            input: Slot::NOT_SET,
            result: Slot::NOT_SET,
            x: None,
            y: None,
            width: None,
            height: None,
            color_interpolation: None,
            kind,
        }
    }

    /// Creates a primitive from an element name.
    pub fn from_element_name(name: &str) -> Option<Self> {
        Kind::from_element_name(name).map(Primitive::new)
    }

    /// Kind-specific parameters.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Kind-specific parameters, for modification.
    pub fn kind_mut(&mut self) -> &mut Kind {
        &mut self.kind
    }

    /// The `in` slot.
    pub fn input(&self) -> Slot {
        self.input
    }

    /// Sets the `in` slot.
    pub fn set_input(&mut self, slot: Slot) {
        self.input = slot;
    }

    /// The `result` slot.
    pub fn result(&self) -> Slot {
        self.result
    }

    /// Sets the `result` slot.
    pub fn set_result(&mut self, slot: Slot) {
        self.result = slot;
    }

    /// A primitive-level `color-interpolation-filters`. `None` inherits the filter one.
    pub fn color_interpolation(&self) -> Option<ColorInterpolation> {
        self.color_interpolation
    }

    /// Returns the slots this primitive reads, in order.
    ///
    /// Unset inputs are reported as [`Slot::NOT_SET`], which reads the previous result.
    pub fn declared_inputs(&self) -> Vec<Slot> {
        let mut list = Vec::new();
        if self.kind.has_input() {
            list.push(self.input);
        }

        if let Some(slot) = self.kind.input2() {
            list.push(slot);
        }

        if let Kind::Merge(ref fe) = self.kind {
            list.extend_from_slice(fe.inputs());
        }

        list
    }

    /// Returns the slot this primitive writes to.
    pub fn declared_output(&self) -> Slot {
        self.result
    }

    /// Returns subregion lengths as `[x, y, width, height]`.
    ///
    /// Each unset field defaults to the corresponding edge of the filter region.
    pub fn subregion(&self) -> [Option<Length>; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Sets subregion lengths as `[x, y, width, height]`.
    pub fn set_subregion(&mut self, subregion: [Option<Length>; 4]) {
        self.x = subregion[0];
        self.y = subregion[1];
        self.width = subregion[2];
        self.height = subregion[3];
    }

    /// Applies an attribute change.
    ///
    /// `None` removes the attribute, restoring its default.
    /// Invalid values fall back to defaults and are logged.
    /// Returns `false` for attributes this primitive does not know.
    pub fn set_attribute(&mut self, key: &str, value: Option<&str>, ns: &mut SlotNamespace) -> bool {
        match key {
            "in" => {
                self.input = value
                    .map(|v| ns.slot_for_input_name(v))
                    .unwrap_or(Slot::NOT_SET);
                return true;
            }
            "result" => {
                self.result = value
                    .map(|v| ns.slot_for_result_name(v))
                    .unwrap_or(Slot::NOT_SET);
                return true;
            }
            "x" | "y" | "width" | "height" => {
                let length = value.and_then(|v| {
                    let length = parse_length(v);
                    if length.is_none() {
                        log::warn!("Invalid primitive subregion {}: '{}'.", key, v);
                    }
                    length
                });

                match key {
                    "x" => self.x = length,
                    "y" => self.y = length,
                    "width" => self.width = length,
                    _ => self.height = length,
                }
                return true;
            }
            "color-interpolation-filters" => {
                self.color_interpolation = match value.map(ColorInterpolation::parse) {
                    Some(Some(v)) => v,
                    Some(None) => {
                        log::warn!("Invalid color-interpolation-filters value.");
                        None
                    }
                    None => None,
                };
                return true;
            }
            _ => {}
        }

        match self.kind {
            Kind::Blend(ref mut fe) => fe.set_attribute(key, value, ns),
            Kind::ColorMatrix(ref mut fe) => fe.set_attribute(key, value),
            Kind::ComponentTransfer(..) => false,
            Kind::Composite(ref mut fe) => fe.set_attribute(key, value, ns),
            Kind::ConvolveMatrix(ref mut fe) => fe.set_attribute(key, value),
            Kind::DiffuseLighting(ref mut fe) => fe.set_attribute(key, value),
            Kind::DisplacementMap(ref mut fe) => fe.set_attribute(key, value, ns),
            Kind::Flood(ref mut fe) => fe.set_attribute(key, value),
            Kind::GaussianBlur(ref mut fe) => fe.set_attribute(key, value),
            Kind::Image(ref mut fe) => fe.set_attribute(key, value),
            Kind::Merge(..) => false,
            Kind::Morphology(ref mut fe) => fe.set_attribute(key, value),
            Kind::Offset(ref mut fe) => fe.set_attribute(key, value),
            Kind::SpecularLighting(ref mut fe) => fe.set_attribute(key, value),
            Kind::Tile(..) => false,
            Kind::Turbulence(ref mut fe) => fe.set_attribute(key, value),
        }
    }

    /// Returns the region this primitive can paint into, given its input region.
    ///
    /// Used by the automatic filter region.
    pub fn affected_region(&self, region: Rect) -> Rect {
        match self.kind {
            Kind::GaussianBlur(ref fe) => fe.affected_region(region),
            Kind::Morphology(ref fe) => fe.affected_region(region),
            Kind::Offset(ref fe) => fe.affected_region(region),
            Kind::DisplacementMap(ref fe) => fe.affected_region(region),
            Kind::DiffuseLighting(..) | Kind::SpecularLighting(..) => region.expand(1.0, 1.0),
            _ => region,
        }
    }

    /// Grows a device area so that rendering it yields correct pixels inside the original one.
    pub fn area_enlarge(&self, area: &mut ScreenRect, ts: Transform) {
        match self.kind {
            Kind::GaussianBlur(ref fe) => fe.area_enlarge(area, ts),
            Kind::Morphology(ref fe) => fe.area_enlarge(area, ts),
            Kind::Offset(ref fe) => fe.area_enlarge(area, ts),
            Kind::DisplacementMap(ref fe) => fe.area_enlarge(area, ts),
            Kind::ConvolveMatrix(ref fe) => fe.area_enlarge(area),
            Kind::DiffuseLighting(..) | Kind::SpecularLighting(..) => area.expand_by(1),
            _ => {}
        }
    }

    /// Returns a relative rendering cost. Never less than 1.
    pub fn complexity(&self, ts: Transform) -> f64 {
        let (ex, ey) = expansion(ts);
        let c = match self.kind {
            Kind::GaussianBlur(ref fe) => fe.complexity(ex, ey),
            Kind::Morphology(ref fe) => fe.complexity(ex, ey),
            Kind::ConvolveMatrix(ref fe) => fe.complexity(),
            Kind::DisplacementMap(..) => 3.0,
            Kind::DiffuseLighting(..) | Kind::SpecularLighting(..) => 9.0,
            Kind::Blend(..) | Kind::Composite(..) | Kind::Image(..) => 1.1,
            Kind::Merge(..) | Kind::Offset(..) => 1.02,
            Kind::ColorMatrix(..) | Kind::ComponentTransfer(..) => 2.0,
            Kind::Flood(..) | Kind::Tile(..) | Kind::Turbulence(..) => 1.0,
        };

        if c.is_finite() {
            c.max(1.0)
        } else {
            1.0
        }
    }

    /// Checks that the primitive renders correctly under `ts` in device space.
    ///
    /// When this is `false` the filter is rendered in a filter-aligned space.
    pub fn can_handle_affine(&self, ts: Transform) -> bool {
        if is_rectilinear(ts) {
            // Kernels are not mirrored.
            return match self.kind {
                Kind::ConvolveMatrix(..) => ts.sx > 0.0 && ts.sy > 0.0,
                _ => true,
            };
        }

        match self.kind {
            Kind::GaussianBlur(ref fe) => fe.is_isotropic(),
            Kind::Morphology(..)
            | Kind::Offset(..)
            | Kind::DisplacementMap(..)
            | Kind::DiffuseLighting(..)
            | Kind::SpecularLighting(..)
            | Kind::Turbulence(..)
            | Kind::ConvolveMatrix(..)
            | Kind::Tile(..) => false,
            _ => true,
        }
    }

    /// Checks that the primitive reads `BackgroundImage` or `BackgroundAlpha`.
    pub fn uses_background(&self) -> bool {
        self.declared_inputs().iter().any(|slot| slot.is_background())
    }

    /// Checks that the primitive can be used on the element with `id`.
    ///
    /// `feImage` referencing the element itself would recurse.
    pub fn valid_for(&self, id: &str) -> bool {
        match self.kind {
            Kind::Image(ref fe) => fe.valid_for(id),
            _ => true,
        }
    }
}
