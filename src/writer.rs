// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt::Display;

use svgtypes::{Color, Length};
use xmlwriter::XmlWriter;

use crate::primitive::{
    aspect_to_string, color_to_string, BlendMode, ColorChannel, ColorInterpolation,
    ColorMatrixType, CompositeOperator, EdgeMode, Kind, LightSource, MorphologyOperator,
    Primitive, TransferChannel, TransferFunction, TurbulenceKind,
};
use crate::units::{length_to_string, Units};
use crate::{FilterGraph, Indent, Slot, SlotNamespace};

pub(crate) const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub(crate) const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
pub(crate) const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";

impl FilterGraph {
    /// Writes the filter back to a `filter` element.
    ///
    /// Only non-default values are written.
    pub fn to_string(&self, opt: &WriteOptions) -> String {
        convert(self, opt)
    }
}

/// XML writing options.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// An `id` of the `filter` element.
    ///
    /// Default: `None`
    pub id: Option<String>,

    /// Use single quote marks instead of double quote.
    ///
    /// Default: disabled
    pub use_single_quote: bool,

    /// Set XML nodes indention.
    ///
    /// Default: 4 spaces
    pub indent: Indent,

    /// Set XML attributes indention.
    ///
    /// Default: `None`
    pub attributes_indent: Indent,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            id: None,
            use_single_quote: false,
            indent: Indent::Spaces(4),
            attributes_indent: Indent::None,
        }
    }
}

fn convert(graph: &FilterGraph, opt: &WriteOptions) -> String {
    let mut xml = XmlWriter::new(xmlwriter::Options {
        use_single_quote: opt.use_single_quote,
        indent: opt.indent,
        attributes_indent: opt.attributes_indent,
    });

    xml.start_element("filter");
    if let Some(ref id) = opt.id {
        xml.write_attribute("id", id);
    }

    xml.write_attribute("xmlns", SVG_NS);
    if has_xlink(graph) {
        xml.write_attribute("xmlns:xlink", XLINK_NS);
    }

    if !graph.auto_region {
        xml.write_attribute("xmlns:inkscape", INKSCAPE_NS);
        xml.write_attribute("inkscape:auto-region", "false");
    }

    xml.write_units("filterUnits", graph.filter_units, Units::ObjectBoundingBox);
    xml.write_units("primitiveUnits", graph.primitive_units, Units::UserSpaceOnUse);
    xml.write_region(graph.region);

    match graph.resolution {
        Some((x, Some(y))) => xml.write_attribute_fmt("filterRes", format_args!("{} {}", x, y)),
        Some((x, None)) => xml.write_attribute("filterRes", &x),
        None => {}
    }

    if graph.color_interpolation != ColorInterpolation::default() {
        xml.write_attribute(
            "color-interpolation-filters",
            graph.color_interpolation.to_str(),
        );
    }

    for primitive in &graph.primitives {
        write_primitive(primitive, &graph.namespace, &mut xml);
    }

    xml.end_document()
}

fn has_xlink(graph: &FilterGraph) -> bool {
    graph.primitives.iter().any(|p| match p.kind {
        Kind::Image(ref fe) => fe.source().to_href().is_some(),
        _ => false,
    })
}

fn write_primitive(primitive: &Primitive, ns: &SlotNamespace, xml: &mut XmlWriter) {
    xml.start_element(primitive.kind.element_name());

    if primitive.kind.has_input() {
        xml.write_input("in", primitive.input, ns);
    }

    if let Some(slot) = primitive.kind.input2() {
        xml.write_input("in2", slot, ns);
    }

    xml.write_region(primitive.subregion());

    if let Some(ci) = primitive.color_interpolation {
        xml.write_attribute("color-interpolation-filters", ci.to_str());
    }

    match primitive.kind {
        Kind::Blend(ref fe) => {
            if fe.mode != BlendMode::Normal {
                xml.write_attribute("mode", fe.mode.to_str());
            }
        }
        Kind::ColorMatrix(ref fe) => {
            if fe.matrix_type != ColorMatrixType::Matrix {
                xml.write_attribute("type", fe.matrix_type.to_str());
            }

            if let Some(ref values) = fe.values {
                xml.write_numbers("values", values);
            }
        }
        Kind::ComponentTransfer(ref fe) => {
            let channels = [
                (TransferChannel::R, &fe.func_r),
                (TransferChannel::G, &fe.func_g),
                (TransferChannel::B, &fe.func_b),
                (TransferChannel::A, &fe.func_a),
            ];

            for (channel, func) in channels {
                if *func != TransferFunction::default() {
                    xml.write_transfer_function(channel, func);
                }
            }
        }
        Kind::Composite(ref fe) => {
            if fe.operator != CompositeOperator::Over {
                xml.write_attribute("operator", fe.operator.to_str());
            }

            for (name, k) in [("k1", fe.k1), ("k2", fe.k2), ("k3", fe.k3), ("k4", fe.k4)] {
                xml.write_non_default(name, k, 0.0);
            }
        }
        Kind::ConvolveMatrix(ref fe) => {
            if (fe.order_x, fe.order_y) != (3, 3) {
                xml.write_attribute_fmt("order", format_args!("{} {}", fe.order_x, fe.order_y));
            }

            if !fe.kernel.is_empty() {
                xml.write_numbers("kernelMatrix", &fe.kernel);
            }

            if let Some(divisor) = fe.divisor {
                xml.write_attribute("divisor", &divisor);
            }

            xml.write_non_default("bias", fe.bias, 0.0);

            if let Some(x) = fe.target_x {
                xml.write_attribute("targetX", &x);
            }

            if let Some(y) = fe.target_y {
                xml.write_attribute("targetY", &y);
            }

            if fe.edge_mode != EdgeMode::Duplicate {
                xml.write_attribute("edgeMode", fe.edge_mode.to_str());
            }

            if fe.preserve_alpha {
                xml.write_attribute("preserveAlpha", "true");
            }

            xml.write_kernel_unit_length(fe.kernel_unit_length);
        }
        Kind::DiffuseLighting(ref fe) => {
            xml.write_non_default("surfaceScale", fe.surface_scale, 1.0);
            xml.write_non_default("diffuseConstant", fe.diffuse_constant, 1.0);
            xml.write_lighting_color(fe.lighting_color);
            xml.write_kernel_unit_length(fe.kernel_unit_length);
            if let Some(light) = fe.light_source {
                xml.write_light_source(light);
            }
        }
        Kind::DisplacementMap(ref fe) => {
            xml.write_non_default("scale", fe.scale, 0.0);
            if fe.x_channel != ColorChannel::A {
                xml.write_attribute("xChannelSelector", fe.x_channel.to_str());
            }
            if fe.y_channel != ColorChannel::A {
                xml.write_attribute("yChannelSelector", fe.y_channel.to_str());
            }
        }
        Kind::Flood(ref fe) => {
            if fe.color != Color::black() {
                xml.write_attribute("flood-color", &color_to_string(fe.color));
            }
            xml.write_non_default("flood-opacity", fe.opacity, 1.0);
        }
        Kind::GaussianBlur(ref fe) => {
            let (x, y) = fe.std_deviation();
            if x == y {
                xml.write_non_default("stdDeviation", x, 0.0);
            } else {
                xml.write_attribute_fmt("stdDeviation", format_args!("{} {}", x, y));
            }
        }
        Kind::Image(ref fe) => {
            if let Some(href) = fe.source().to_href() {
                xml.write_attribute("xlink:href", &href);
            }

            if fe.aspect() != svgtypes::AspectRatio::default() {
                xml.write_attribute("preserveAspectRatio", &aspect_to_string(fe.aspect()));
            }
        }
        Kind::Merge(ref fe) => {
            for slot in fe.inputs() {
                xml.start_element("feMergeNode");
                xml.write_input("in", *slot, ns);
                xml.end_element();
            }
        }
        Kind::Morphology(ref fe) => {
            if fe.operator != MorphologyOperator::Erode {
                xml.write_attribute("operator", fe.operator.to_str());
            }

            let (x, y) = fe.radius();
            if x == y {
                xml.write_non_default("radius", x, 0.0);
            } else {
                xml.write_attribute_fmt("radius", format_args!("{} {}", x, y));
            }
        }
        Kind::Offset(ref fe) => {
            xml.write_non_default("dx", fe.dx, 0.0);
            xml.write_non_default("dy", fe.dy, 0.0);
        }
        Kind::SpecularLighting(ref fe) => {
            xml.write_non_default("surfaceScale", fe.surface_scale, 1.0);
            xml.write_non_default("specularConstant", fe.specular_constant, 1.0);
            xml.write_non_default("specularExponent", fe.specular_exponent, 1.0);
            xml.write_lighting_color(fe.lighting_color);
            xml.write_kernel_unit_length(fe.kernel_unit_length);
            if let Some(light) = fe.light_source {
                xml.write_light_source(light);
            }
        }
        Kind::Tile(..) => {}
        Kind::Turbulence(ref fe) => {
            let (x, y) = fe.base_frequency();
            if x == y {
                xml.write_non_default("baseFrequency", x, 0.0);
            } else {
                xml.write_attribute_fmt("baseFrequency", format_args!("{} {}", x, y));
            }

            if fe.num_octaves != 1 {
                xml.write_attribute("numOctaves", &fe.num_octaves);
            }

            if fe.seed != 0 {
                xml.write_attribute("seed", &fe.seed);
            }

            if fe.stitch_tiles {
                xml.write_attribute("stitchTiles", "stitch");
            }

            if fe.kind != TurbulenceKind::Turbulence {
                xml.write_attribute("type", fe.kind.to_str());
            }
        }
    }

    xml.write_input("result", primitive.result, ns);
    xml.end_element();
}

trait XmlWriterExt {
    fn write_non_default<V: Display + PartialEq>(&mut self, name: &str, value: V, def: V);
    fn write_input(&mut self, name: &str, slot: Slot, ns: &SlotNamespace);
    fn write_units(&mut self, name: &str, units: Units, def: Units);
    fn write_region(&mut self, region: [Option<Length>; 4]);
    fn write_numbers(&mut self, name: &str, list: &[f32]);
    fn write_lighting_color(&mut self, color: Color);
    fn write_kernel_unit_length(&mut self, value: Option<(f32, f32)>);
    fn write_light_source(&mut self, light: LightSource);
    fn write_transfer_function(&mut self, channel: TransferChannel, func: &TransferFunction);
}

impl XmlWriterExt for XmlWriter {
    fn write_non_default<V: Display + PartialEq>(&mut self, name: &str, value: V, def: V) {
        if value != def {
            self.write_attribute(name, &value);
        }
    }

    fn write_input(&mut self, name: &str, slot: Slot, ns: &SlotNamespace) {
        if let Some(value) = ns.name_for_slot(slot) {
            self.write_attribute(name, value);
        }
    }

    fn write_units(&mut self, name: &str, units: Units, def: Units) {
        if units != def {
            self.write_attribute(name, units.to_str());
        }
    }

    fn write_region(&mut self, region: [Option<Length>; 4]) {
        for (name, length) in ["x", "y", "width", "height"].iter().zip(region) {
            if let Some(length) = length {
                self.write_attribute(name, &length_to_string(length));
            }
        }
    }

    fn write_numbers(&mut self, name: &str, list: &[f32]) {
        let mut text = String::new();
        for (i, n) in list.iter().enumerate() {
            if i != 0 {
                text.push(' ');
            }
            text.push_str(&n.to_string());
        }

        self.write_attribute(name, &text);
    }

    fn write_lighting_color(&mut self, color: Color) {
        if color != Color::white() {
            self.write_attribute("lighting-color", &color_to_string(color));
        }
    }

    fn write_kernel_unit_length(&mut self, value: Option<(f32, f32)>) {
        if let Some((x, y)) = value {
            self.write_attribute_fmt("kernelUnitLength", format_args!("{} {}", x, y));
        }
    }

    fn write_light_source(&mut self, light: LightSource) {
        self.start_element(light.element_name());
        match light {
            LightSource::Distant { azimuth, elevation } => {
                self.write_non_default("azimuth", azimuth, 0.0);
                self.write_non_default("elevation", elevation, 0.0);
            }
            LightSource::Point { x, y, z } => {
                self.write_non_default("x", x, 0.0);
                self.write_non_default("y", y, 0.0);
                self.write_non_default("z", z, 0.0);
            }
            LightSource::Spot {
                x,
                y,
                z,
                points_at_x,
                points_at_y,
                points_at_z,
                specular_exponent,
                limiting_cone_angle,
            } => {
                self.write_non_default("x", x, 0.0);
                self.write_non_default("y", y, 0.0);
                self.write_non_default("z", z, 0.0);
                self.write_non_default("pointsAtX", points_at_x, 0.0);
                self.write_non_default("pointsAtY", points_at_y, 0.0);
                self.write_non_default("pointsAtZ", points_at_z, 0.0);
                self.write_non_default("specularExponent", specular_exponent, 1.0);
                if let Some(angle) = limiting_cone_angle {
                    self.write_attribute("limitingConeAngle", &angle);
                }
            }
        }
        self.end_element();
    }

    fn write_transfer_function(&mut self, channel: TransferChannel, func: &TransferFunction) {
        self.start_element(channel.element_name());
        self.write_attribute("type", func.kind.to_str());
        if !func.table_values.is_empty() {
            self.write_numbers("tableValues", &func.table_values);
        }
        self.write_non_default("slope", func.slope, 1.0);
        self.write_non_default("intercept", func.intercept, 0.0);
        self.write_non_default("amplitude", func.amplitude, 1.0);
        self.write_non_default("exponent", func.exponent, 1.0);
        self.write_non_default("offset", func.offset, 0.0);
        self.end_element();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter() {
        let graph = FilterGraph::new();
        let opt = WriteOptions {
            indent: Indent::None,
            ..WriteOptions::default()
        };
        assert_eq!(
            graph.to_string(&opt),
            "<filter xmlns=\"http://www.w3.org/2000/svg\"/>"
        );
    }

    #[test]
    fn default_values_are_skipped() {
        let mut graph = FilterGraph::new();
        let idx = graph.add_primitive(Primitive::from_element_name("feOffset").unwrap());
        graph.set_primitive_attribute(idx, "dx", Some("4"));

        let opt = WriteOptions {
            indent: Indent::None,
            ..WriteOptions::default()
        };
        assert_eq!(
            graph.to_string(&opt),
            "<filter xmlns=\"http://www.w3.org/2000/svg\"><feOffset dx=\"4\"/></filter>"
        );
    }
}
