// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use svgtypes::Length;
use tiny_skia::Transform;

use crate::primitive::{ColorInterpolation, Kind, LightSource, Primitive, TransferChannel};
use crate::region::resolve_filter_region;
use crate::units::{parse_length, parse_number_list, Units};
use crate::{
    DrawingItem, DrawingSurface, ElementRegistry, Error, Options, OptionLog, Rect,
    RenderContext, ScreenRect, Slot, SlotNamespace,
};

/// A filter lifecycle state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FilterState {
    /// Not attached to any item or definition.
    Unattached,
    /// Attached and rendered with the current settings.
    Configured,
    /// Attached and modified since the last render.
    Dirty,
}

/// A filter element: an ordered chain of primitives plus region, units and resolution.
///
/// Rendering takes `&self`, so a single graph can be shared between items.
/// All per-render state is call-local.
pub struct FilterGraph {
    pub(crate) primitives: Vec<Primitive>,
    pub(crate) namespace: SlotNamespace,
    pub(crate) filter_units: Units,
    pub(crate) primitive_units: Units,
    pub(crate) region: [Option<Length>; 4],
    pub(crate) resolution: Option<(f32, Option<f32>)>,
    pub(crate) output: Slot,
    pub(crate) auto_region: bool,
    pub(crate) color_interpolation: ColorInterpolation,
    registry: Option<Arc<dyn ElementRegistry + Send + Sync>>,
    dirty: Arc<AtomicBool>,
}

impl Default for FilterGraph {
    fn default() -> Self {
        FilterGraph {
            primitives: Vec::new(),
            namespace: SlotNamespace::new(),
            filter_units: Units::ObjectBoundingBox,
            primitive_units: Units::UserSpaceOnUse,
            region: [None; 4],
            resolution: None,
            output: Slot::NOT_SET,
            auto_region: true,
            color_interpolation: ColorInterpolation::default(),
            registry: None,
            dirty: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl std::fmt::Debug for FilterGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FilterGraph")
            .field("primitives", &self.primitives)
            .field("filter_units", &self.filter_units)
            .field("primitive_units", &self.primitive_units)
            .field("region", &self.region)
            .field("resolution", &self.resolution)
            .field("output", &self.output)
            .field("state", &self.state())
            .finish()
    }
}

impl FilterGraph {
    /// Creates an empty, unattached filter.
    pub fn new() -> Self {
        FilterGraph::default()
    }

    /// Returns primitives in execution order.
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Returns a primitive by index.
    pub fn primitive(&self, index: usize) -> Option<&Primitive> {
        self.primitives.get(index)
    }

    /// Returns a primitive for modification.
    ///
    /// Marks the filter dirty.
    pub fn primitive_mut(&mut self, index: usize) -> Option<&mut Primitive> {
        self.mark_dirty();
        self.primitives.get_mut(index)
    }

    /// Appends a primitive to the end of the chain and returns its index.
    pub fn add_primitive(&mut self, mut primitive: Primitive) -> usize {
        if let (Some(registry), Kind::Image(fe)) = (&self.registry, &mut primitive.kind) {
            fe.connect(registry.as_ref(), &self.dirty);
        }

        self.primitives.push(primitive);
        self.mark_dirty();
        self.primitives.len() - 1
    }

    /// Removes all primitives.
    ///
    /// Result names stay allocated, so slot numbers are never reused.
    pub fn clear_primitives(&mut self) {
        self.primitives.clear();
        self.mark_dirty();
    }

    /// Returns the result names namespace.
    pub fn namespace(&self) -> &SlotNamespace {
        &self.namespace
    }

    /// Applies a primitive attribute change.
    ///
    /// Returns `false` for an unknown primitive index or attribute.
    pub fn set_primitive_attribute(&mut self, index: usize, key: &str, value: Option<&str>) -> bool {
        let primitive = match self.primitives.get_mut(index) {
            Some(v) => v,
            None => return false,
        };

        let known = primitive.set_attribute(key, value, &mut self.namespace);
        if known {
            if let (Some(registry), Kind::Image(fe)) = (&self.registry, &mut primitive.kind)
            {
                if !fe.is_observed() {
                    fe.connect(registry.as_ref(), &self.dirty);
                }
            }

            self.mark_dirty();
        }

        known
    }

    /// Appends an `feMergeNode` with the `in` value to an `feMerge` primitive.
    pub fn push_merge_input(&mut self, index: usize, input: Option<&str>) -> bool {
        let slot = input
            .map(|v| self.namespace.slot_for_input_name(v))
            .unwrap_or(Slot::NOT_SET);

        match self.primitives.get_mut(index).map(|p| &mut p.kind) {
            Some(Kind::Merge(fe)) => {
                fe.push_input(slot);
                self.mark_dirty();
                true
            }
            _ => false,
        }
    }

    /// Applies an `feFuncX` attribute of an `feComponentTransfer` primitive.
    pub fn set_transfer_function_attribute(
        &mut self,
        index: usize,
        channel: TransferChannel,
        key: &str,
        value: Option<&str>,
    ) -> bool {
        match self.primitives.get_mut(index).map(|p| &mut p.kind) {
            Some(Kind::ComponentTransfer(fe)) => {
                let known = fe.set_function_attribute(channel, key, value);
                self.mark_dirty();
                known
            }
            _ => false,
        }
    }

    /// Sets a light source of a lighting primitive.
    pub fn set_light_source(&mut self, index: usize, light: Option<LightSource>) -> bool {
        match self.primitives.get_mut(index).map(|p| &mut p.kind) {
            Some(Kind::DiffuseLighting(fe)) => fe.set_light_source(light),
            Some(Kind::SpecularLighting(fe)) => fe.set_light_source(light),
            _ => return false,
        }

        self.mark_dirty();
        true
    }

    /// Applies a light source attribute of a lighting primitive.
    pub fn set_light_source_attribute(&mut self, index: usize, key: &str, value: Option<&str>) -> bool {
        let light = match self.primitives.get_mut(index).map(|p| &mut p.kind) {
            Some(Kind::DiffuseLighting(fe)) => fe.light_source_mut(),
            Some(Kind::SpecularLighting(fe)) => fe.light_source_mut(),
            _ => None,
        };

        let known = match light {
            Some(light) => light.set_attribute(key, value),
            None => return false,
        };

        self.mark_dirty();
        known
    }

    /// The slot read as the filter result.
    ///
    /// [`Slot::NOT_SET`] means the last primitive output.
    pub fn output(&self) -> Slot {
        self.output
    }

    /// Designates the filter output.
    ///
    /// Reserved slots are rejected, except `NOT_SET`, which restores the default.
    pub fn set_output(&mut self, slot: Slot) {
        if slot.is_reserved() && slot != Slot::NOT_SET {
            log::warn!("A reserved slot cannot be a filter output.");
            return;
        }

        self.output = slot;
        self.mark_dirty();
    }

    /// Designates the filter output by a `result` name.
    pub fn set_output_name(&mut self, name: &str) {
        let slot = self.namespace.slot_for_input_name(name);
        if slot == Slot::NOT_SET {
            log::warn!("Unknown filter output '{}'.", name);
            return;
        }

        self.set_output(slot);
    }

    /// Returns the region lengths as `[x, y, width, height]`.
    ///
    /// Unset fields use the SVG default.
    pub fn region(&self) -> [Option<Length>; 4] {
        self.region
    }

    /// Sets the filter region. Each field is independent.
    pub fn set_region(
        &mut self,
        x: Option<Length>,
        y: Option<Length>,
        width: Option<Length>,
        height: Option<Length>,
    ) {
        self.region = [x, y, width, height];
        self.mark_dirty();
    }

    /// Restores the default region.
    pub fn reset_region(&mut self) {
        self.region = [None; 4];
        self.mark_dirty();
    }

    /// Returns an explicit `filterRes`.
    pub fn resolution(&self) -> Option<(f32, Option<f32>)> {
        self.resolution
    }

    /// Sets an explicit raster resolution.
    ///
    /// Without `y`, the height follows the region aspect ratio.
    /// Negative values are ignored.
    pub fn set_resolution(&mut self, x: f32, y: Option<f32>) {
        let valid = |v: f32| v.is_finite() && v >= 0.0;
        if !valid(x) || !y.map(valid).unwrap_or(true) {
            log::warn!("Invalid filter resolution. Ignored.");
            return;
        }

        self.resolution = Some((x, y));
        self.mark_dirty();
    }

    /// Restores automatic resolution selection.
    pub fn reset_resolution(&mut self) {
        self.resolution = None;
        self.mark_dirty();
    }

    /// The `filterUnits` of the filter region.
    pub fn filter_units(&self) -> Units {
        self.filter_units
    }

    /// Sets `filterUnits`.
    pub fn set_filter_units(&mut self, units: Units) {
        self.filter_units = units;
        self.mark_dirty();
    }

    /// The `primitiveUnits` of primitive subregions and lengths.
    pub fn primitive_units(&self) -> Units {
        self.primitive_units
    }

    /// Sets `primitiveUnits`.
    pub fn set_primitive_units(&mut self, units: Units) {
        self.primitive_units = units;
        self.mark_dirty();
    }

    /// Checks that the automatic region is enabled.
    pub fn auto_region(&self) -> bool {
        self.auto_region
    }

    /// Enables or disables the automatic region.
    pub fn set_auto_region(&mut self, flag: bool) {
        self.auto_region = flag;
        self.mark_dirty();
    }

    /// A filter-level `color-interpolation-filters`.
    pub fn color_interpolation(&self) -> ColorInterpolation {
        self.color_interpolation
    }

    /// Sets the filter-level `color-interpolation-filters`.
    pub fn set_color_interpolation(&mut self, color_interpolation: ColorInterpolation) {
        self.color_interpolation = color_interpolation;
        self.mark_dirty();
    }

    /// Applies a `filter` element attribute change.
    ///
    /// `None` removes the attribute. Invalid values keep the previous setting.
    /// Returns `false` for unknown attributes.
    pub fn set_attribute(&mut self, key: &str, value: Option<&str>) -> bool {
        match key {
            "filterUnits" | "primitiveUnits" => {
                let units = match value {
                    Some(v) => match Units::parse(v) {
                        Some(units) => units,
                        None => {
                            log::warn!("Invalid {} value '{}'. Ignored.", key, v);
                            return true;
                        }
                    },
                    None if key == "filterUnits" => Units::ObjectBoundingBox,
                    None => Units::UserSpaceOnUse,
                };

                if key == "filterUnits" {
                    self.set_filter_units(units);
                } else {
                    self.set_primitive_units(units);
                }
            }
            "x" | "y" | "width" | "height" => {
                let length = value.and_then(|v| {
                    parse_length(v).log_none(|| log::warn!("Invalid filter {}: '{}'.", key, v))
                });

                let idx = match key {
                    "x" => 0,
                    "y" => 1,
                    "width" => 2,
                    _ => 3,
                };
                self.region[idx] = length;
                self.mark_dirty();
            }
            "filterRes" => match value {
                Some(v) => match parse_number_list(v).as_deref() {
                    Some([x]) => self.set_resolution(*x, None),
                    Some([x, y]) => self.set_resolution(*x, Some(*y)),
                    _ => log::warn!("Invalid filterRes '{}'. Ignored.", v),
                },
                None => self.reset_resolution(),
            },
            "inkscape:auto-region" => {
                let flag = !matches!(value, Some("false") | Some("0"));
                self.set_auto_region(flag);
            }
            "color-interpolation-filters" => {
                let ci = match value.map(ColorInterpolation::parse) {
                    Some(Some(Some(v))) => v,
                    Some(Some(None)) | None => ColorInterpolation::default(),
                    Some(None) => {
                        log::warn!("Invalid color-interpolation-filters value. Ignored.");
                        return true;
                    }
                };
                self.set_color_interpolation(ci);
            }
            _ => return false,
        }

        true
    }

    /// Resolves unset `in2` inputs and stores them.
    ///
    /// An unset `in2` reads the previous primitive output, which gets a
    /// fresh `resultN` name when it has none. The first primitive reads `SourceGraphic`.
    pub fn update(&mut self) {
        let mut changed = false;
        for i in 0..self.primitives.len() {
            if self.primitives[i].kind.input2() != Some(Slot::NOT_SET) {
                continue;
            }

            let slot = if i == 0 {
                Slot::SOURCE_GRAPHIC
            } else {
                let prev = &mut self.primitives[i - 1];
                if prev.result.is_reserved() {
                    let name = self.namespace.next_available_result_name();
                    prev.result = self.namespace.slot_for_result_name(&name);
                    log::debug!("Named an implicit result '{}'.", name);
                }
                prev.result
            };

            self.primitives[i].kind.set_input2(slot);
            changed = true;
        }

        if changed {
            self.mark_dirty();
        }
    }

    /// Grows a device `area` so that a filtered render covers the original one.
    ///
    /// Primitive enlargements are applied in chain order.
    pub fn area_enlarge(&self, area: &mut ScreenRect, item: &dyn DrawingItem) {
        let ts = item.ctm();
        for primitive in &self.primitives {
            primitive.area_enlarge(area, ts);
        }
    }

    /// Returns the filter effects region in user space.
    ///
    /// `None` when the region is invalid for this `bbox`.
    pub fn filter_effect_area(&self, bbox: Option<Rect>, opt: &Options) -> Option<Rect> {
        resolve_filter_region(self.filter_units, self.region, bbox, opt)
    }

    /// Returns a relative rendering cost under `ts`.
    ///
    /// Never decreases when primitives are added.
    pub fn complexity(&self, ts: Transform) -> f64 {
        self.primitives
            .iter()
            .fold(1.0, |acc, p| acc + p.complexity(ts) - 1.0)
    }

    /// Checks that any primitive reads the background.
    pub fn uses_background(&self) -> bool {
        self.primitives.iter().any(|p| p.uses_background())
    }

    /// Checks that the filter can be applied to the element with `id`.
    pub fn valid_for(&self, id: &str) -> bool {
        self.primitives.iter().all(|p| p.valid_for(id))
    }

    /// Computes the region that covers the item and everything primitives paint.
    ///
    /// The result is expressed in fractions of the item geometric bbox.
    pub fn automatic_region(&self, item: &dyn DrawingItem) -> Option<Rect> {
        let g_box = item.geometric_bbox()?;
        let v_box = item.visual_bbox()?;
        if g_box.is_empty() {
            return None;
        }

        let outbox = self
            .primitives
            .iter()
            .fold(v_box, |r, p| p.affected_region(r))
            .union(&v_box);

        let ts = Transform::from_row(
            1.0 / g_box.width(),
            0.0,
            0.0,
            1.0 / g_box.height(),
            -g_box.x() / g_box.width(),
            -g_box.y() / g_box.height(),
        );
        outbox.transform(ts)
    }

    /// Rewrites the region to cover all `items`.
    ///
    /// Does nothing in `userSpaceOnUse` or when the automatic region is disabled.
    pub fn update_filter_all_regions(&mut self, items: &[&dyn DrawingItem]) {
        if !self.auto_region || self.filter_units == Units::UserSpaceOnUse {
            return;
        }

        let region = items
            .iter()
            .filter_map(|item| self.automatic_region(*item))
            .reduce(|a, b| a.union(&b));

        if let Some(r) = region {
            if r.is_empty() {
                return;
            }

            log::debug!(
                "Automatic filter region: {} {} {} {}.",
                r.x(),
                r.y(),
                r.width(),
                r.height()
            );

            let n = |v: f32| Some(Length::new_number(v as f64));
            self.set_region(n(r.x()), n(r.y()), n(r.width()), n(r.height()));
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> FilterState {
        if self.registry.is_none() {
            FilterState::Unattached
        } else if self.dirty.load(Ordering::Acquire) {
            FilterState::Dirty
        } else {
            FilterState::Configured
        }
    }

    /// Attaches the filter to a document and observes feImage references.
    pub fn attach(&mut self, registry: Arc<dyn ElementRegistry + Send + Sync>) {
        for primitive in &mut self.primitives {
            if let Kind::Image(ref mut fe) = primitive.kind {
                fe.connect(registry.as_ref(), &self.dirty);
            }
        }

        self.registry = Some(registry);
        self.dirty.store(false, Ordering::Release);
    }

    /// Detaches the filter and drops all observers.
    pub fn detach(&mut self) {
        for primitive in &mut self.primitives {
            if let Kind::Image(ref mut fe) = primitive.kind {
                fe.disconnect();
            }
        }

        self.registry = None;
    }

    /// Renders the filtered `item`.
    ///
    /// `dest` contains the unfiltered item on input and is replaced by the result.
    /// `background` is required only when [`uses_background`](Self::uses_background) is set.
    pub fn render(
        &self,
        item: &dyn DrawingItem,
        dest: &mut DrawingSurface,
        background: Option<&DrawingSurface>,
        ctx: &RenderContext,
    ) -> Result<(), Error> {
        let res = crate::render::render(self, item, dest, background, ctx);
        self.dirty.store(false, Ordering::Release);
        res
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(names: &[&str]) -> FilterGraph {
        let mut graph = FilterGraph::new();
        for name in names {
            graph.add_primitive(Primitive::from_element_name(name).unwrap());
        }
        graph
    }

    #[test]
    fn in2_resolution_names_previous_result() {
        let mut graph = graph(&["feFlood", "feComposite"]);
        graph.update();

        let flood_result = graph.primitives[0].result();
        assert!(!flood_result.is_reserved());
        assert_eq!(graph.namespace.name_for_slot(flood_result), Some("result1"));
        assert_eq!(graph.primitives[1].kind().input2(), Some(flood_result));
    }

    #[test]
    fn in2_of_first_primitive_is_source() {
        let mut graph = graph(&["feBlend"]);
        graph.update();
        assert_eq!(graph.primitives[0].kind().input2(), Some(Slot::SOURCE_GRAPHIC));
    }

    #[test]
    fn filter_attributes() {
        let mut graph = FilterGraph::new();
        assert!(graph.set_attribute("filterUnits", Some("userSpaceOnUse")));
        assert!(graph.set_attribute("filterUnits", Some("oops")));
        assert_eq!(graph.filter_units(), Units::UserSpaceOnUse);

        graph.set_attribute("filterRes", Some("40 20"));
        assert_eq!(graph.resolution(), Some((40.0, Some(20.0))));
        graph.set_attribute("filterRes", Some("-1"));
        assert_eq!(graph.resolution(), Some((40.0, Some(20.0))));
        graph.set_attribute("filterRes", None);
        assert_eq!(graph.resolution(), None);

        assert!(!graph.set_attribute("fill", Some("red")));
    }

    #[test]
    fn complexity_accumulates() {
        let graph = graph(&["feFlood", "feOffset", "feBlend"]);
        let c = graph.complexity(Transform::identity());
        assert!((c - 1.12).abs() < 1e-9);
    }
}
