// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::rc::Rc;

use once_cell::sync::Lazy;
use rgb::{FromSlice, RGB8, RGBA8};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::filter::FilterGraph;
use crate::geom::expansion;
use crate::primitive::{self, ColorInterpolation, ImageSource, Kind, LightSource, Primitive};
use crate::region::{filter_resolution, resolve_primitive_subregion};
use crate::units::Units;
use crate::{
    ApproxZero, DrawingItem, DrawingSurface, Error, Options, Rect, RenderContext,
    ResourceProvider, ScreenRect, Slot,
};

mod box_blur;
mod color_matrix;
mod component_transfer;
mod composite;
mod convolve_matrix;
mod displacement_map;
mod gaussian;
mod lighting;
mod morphology;
mod turbulence;

/// An image reference.
///
/// Image pixels should be stored in RGBA order.
///
/// Some filters will require premultipled channels, some not.
/// See specific filter documentation for details.
#[derive(Clone, Copy)]
pub struct ImageRef<'a> {
    data: &'a [RGBA8],
    width: u32,
    height: u32,
}

impl<'a> ImageRef<'a> {
    /// Creates a new image reference.
    ///
    /// Doesn't clone the provided data.
    #[inline]
    pub fn new(width: u32, height: u32, data: &'a [RGBA8]) -> Self {
        ImageRef {
            data,
            width,
            height,
        }
    }
}

/// A mutable `ImageRef` variant.
pub struct ImageRefMut<'a> {
    data: &'a mut [RGBA8],
    width: u32,
    height: u32,
}

impl<'a> ImageRefMut<'a> {
    /// Creates a new mutable image reference.
    ///
    /// Doesn't clone the provided data.
    #[inline]
    pub fn new(width: u32, height: u32, data: &'a mut [RGBA8]) -> Self {
        ImageRefMut {
            data,
            width,
            height,
        }
    }
}

trait PixmapExt: Sized {
    fn try_create(width: u32, height: u32) -> Result<Pixmap, Error>;
    fn copy_region(&self, region: ScreenRect) -> Option<Pixmap>;
    fn clear(&mut self);
    fn into_srgb(&mut self);
    fn into_linear_rgb(&mut self);
}

impl PixmapExt for Pixmap {
    fn try_create(width: u32, height: u32) -> Result<Pixmap, Error> {
        Pixmap::new(width, height).ok_or(Error::SurfaceAllocation { width, height })
    }

    fn copy_region(&self, region: ScreenRect) -> Option<Pixmap> {
        self.clone_rect(region.to_int_rect()?)
    }

    fn clear(&mut self) {
        self.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn into_srgb(&mut self) {
        let data = self.data_mut().as_rgba_mut();
        demultiply_alpha(data);
        apply_table(data, &LINEAR_RGB_TO_SRGB);
        multiply_alpha(data);
    }

    fn into_linear_rgb(&mut self) {
        let data = self.data_mut().as_rgba_mut();
        demultiply_alpha(data);
        apply_table(data, &SRGB_TO_LINEAR_RGB);
        multiply_alpha(data);
    }
}

trait PixmapToImageRef<'a> {
    fn as_image_ref(&'a self) -> ImageRef<'a>;
    fn as_image_ref_mut(&'a mut self) -> ImageRefMut<'a>;
}

impl<'a> PixmapToImageRef<'a> for Pixmap {
    fn as_image_ref(&'a self) -> ImageRef<'a> {
        ImageRef::new(self.width(), self.height(), self.data().as_rgba())
    }

    fn as_image_ref_mut(&'a mut self) -> ImageRefMut<'a> {
        let (w, h) = (self.width(), self.height());
        ImageRefMut::new(w, h, self.data_mut().as_rgba_mut())
    }
}

/// Multiplies provided pixels alpha.
fn multiply_alpha(data: &mut [RGBA8]) {
    for p in data {
        let a = p.a as f32 / 255.0;
        p.r = (p.r as f32 * a + 0.5) as u8;
        p.g = (p.g as f32 * a + 0.5) as u8;
        p.b = (p.b as f32 * a + 0.5) as u8;
    }
}

/// Demultiplies provided pixels alpha.
fn demultiply_alpha(data: &mut [RGBA8]) {
    for p in data {
        if p.a == 0 {
            continue;
        }

        let a = p.a as f32 / 255.0;
        p.r = f32_bound(0.0, p.r as f32 / a + 0.5, 255.0) as u8;
        p.g = f32_bound(0.0, p.g as f32 / a + 0.5, 255.0) as u8;
        p.b = f32_bound(0.0, p.b as f32 / a + 0.5, 255.0) as u8;
    }
}

/// sRGB to LinearRGB, per 8-bit channel value.
static SRGB_TO_LINEAR_RGB: Lazy<[u8; 256]> = Lazy::new(|| {
    build_table(|c| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    })
});

/// LinearRGB to sRGB, per 8-bit channel value.
static LINEAR_RGB_TO_SRGB: Lazy<[u8; 256]> = Lazy::new(|| {
    build_table(|c| {
        if c <= 0.0031308 {
            c * 12.92
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        }
    })
});

fn build_table(f: impl Fn(f64) -> f64) -> [u8; 256] {
    let mut table = [0u8; 256];
    for (i, v) in table.iter_mut().enumerate() {
        let c = f(i as f64 / 255.0);
        *v = (c.max(0.0).min(1.0) * 255.0).round() as u8;
    }
    table
}

/// Maps RGB channels of unpremultiplied pixels. Alpha stays as is.
fn apply_table(data: &mut [RGBA8], table: &[u8; 256]) {
    for p in data {
        p.r = table[p.r as usize];
        p.g = table[p.g as usize];
        p.b = table[p.b as usize];
    }
}

#[inline]
fn f32_bound(min: f32, val: f32, max: f32) -> f32 {
    debug_assert!(min.is_finite());
    debug_assert!(max.is_finite());

    if val > max {
        max
    } else if val < min {
        min
    } else {
        val
    }
}

#[derive(Clone)]
struct Image {
    /// Filter primitive result.
    ///
    /// All images have the same size, which is equal to the working canvas.
    image: Rc<Pixmap>,

    /// Image's region that has actual data, in canvas coordinates.
    ///
    /// Used by `feTile`.
    region: ScreenRect,

    /// The current color space.
    color_space: ColorInterpolation,
}

impl Image {
    fn from_image(image: Pixmap, color_space: ColorInterpolation) -> Self {
        let region = ScreenRect::from_xywh(0, 0, image.width(), image.height());
        Image {
            image: Rc::new(image),
            region,
            color_space,
        }
    }

    fn into_color_space(self, color_space: ColorInterpolation) -> Self {
        if color_space == self.color_space {
            return self;
        }

        let region = self.region;
        let mut image = self.take();
        match color_space {
            ColorInterpolation::SRGB => image.into_srgb(),
            ColorInterpolation::LinearRGB => image.into_linear_rgb(),
        }

        Image {
            image: Rc::new(image),
            region,
            color_space,
        }
    }

    fn take(self) -> Pixmap {
        match Rc::try_unwrap(self.image) {
            Ok(v) => v,
            Err(v) => (*v).clone(),
        }
    }

    fn pixmap(&self) -> &Pixmap {
        &self.image
    }
}

/// Maps user space of the filtered item onto the working canvas.
struct WorkingSpace {
    to_work: Transform,
    canvas: ScreenRect,
    quality: FilterQuality,
}

impl WorkingSpace {
    fn new(
        graph: &FilterGraph,
        region: Rect,
        ctm: Transform,
        dest_area: ScreenRect,
        opt: &Options,
    ) -> Option<Self> {
        let (ex, ey) = expansion(ctm);
        let natural = (region.width() * ex, region.height() * ey);
        let res = filter_resolution(region, natural, graph.resolution, opt)?;

        let needs_aligned_space = graph.primitives.iter().any(|p| !p.can_handle_affine(ctm));

        if res.scaled || needs_aligned_space {
            let sx = res.width as f32 / region.width();
            let sy = res.height as f32 / region.height();
            Some(WorkingSpace {
                to_work: Transform::from_row(sx, 0.0, 0.0, sy, -region.x() * sx, -region.y() * sy),
                canvas: ScreenRect::from_xywh(0, 0, res.width, res.height),
                quality: FilterQuality::Bicubic,
            })
        } else {
            let area = region
                .transform(ctm)?
                .to_screen_rect()
                .intersect(&dest_area)?;
            let to_work =
                Transform::from_translate(-area.x() as f32, -area.y() as f32).pre_concat(ctm);
            Some(WorkingSpace {
                to_work,
                canvas: ScreenRect::from_xywh(0, 0, area.width(), area.height()),
                quality: FilterQuality::Nearest,
            })
        }
    }

    /// Returns a transform from a device surface at `area` onto the canvas.
    fn from_device(&self, ctm_inv: Transform, area: ScreenRect) -> Transform {
        self.to_work
            .pre_concat(ctm_inv)
            .pre_concat(Transform::from_translate(area.x() as f32, area.y() as f32))
    }

    fn draw_surface(&self, surface: &DrawingSurface, ctm_inv: Transform) -> Result<Pixmap, Error> {
        let mut pixmap = Pixmap::try_create(self.canvas.width(), self.canvas.height())?;
        pixmap.draw_pixmap(
            0,
            0,
            surface.pixmap().as_ref(),
            &PixmapPaint {
                quality: self.quality,
                ..PixmapPaint::default()
            },
            self.from_device(ctm_inv, surface.area()),
            None,
        );
        Ok(pixmap)
    }
}

/// Call-local storage of primitive results.
struct SlotTable<'a> {
    canvas: ScreenRect,
    item: &'a dyn DrawingItem,
    source: Image,
    source_alpha: Option<Image>,
    background: Option<Image>,
    background_alpha: Option<Image>,
    results: HashMap<Slot, Image>,
    last: Option<Image>,
}

impl<'a> SlotTable<'a> {
    fn get(&mut self, slot: Slot) -> Result<Image, Error> {
        match slot {
            Slot::NOT_SET | Slot::UNNAMED => Ok(match self.last {
                Some(ref image) => image.clone(),
                None => self.source.clone(),
            }),
            Slot::SOURCE_GRAPHIC => Ok(self.source.clone()),
            Slot::SOURCE_ALPHA => {
                if self.source_alpha.is_none() {
                    self.source_alpha = Some(alpha_only(&self.source));
                }
                self.source_alpha.clone().ok_or(Error::InvalidRegion)
            }
            Slot::BACKGROUND_IMAGE => match self.background {
                Some(ref image) => Ok(image.clone()),
                None => self.transparent(),
            },
            Slot::BACKGROUND_ALPHA => {
                if self.background_alpha.is_none() {
                    self.background_alpha = self.background.as_ref().map(alpha_only);
                }
                match self.background_alpha {
                    Some(ref image) => Ok(image.clone()),
                    None => self.transparent(),
                }
            }
            Slot::FILL_PAINT => self.paint(self.item.fill_paint()),
            Slot::STROKE_PAINT => self.paint(self.item.stroke_paint()),
            _ => match self.results.get(&slot) {
                Some(image) => Ok(image.clone()),
                None => self.transparent(),
            },
        }
    }

    fn set(&mut self, slot: Slot, image: Image) {
        if !slot.is_reserved() {
            self.results.insert(slot, image.clone());
        }

        self.last = Some(image);
    }

    /// Returns the filter result.
    ///
    /// An unknown explicit output falls back to the last result.
    fn output(&self, slot: Slot) -> Image {
        if !slot.is_reserved() {
            if let Some(image) = self.results.get(&slot) {
                return image.clone();
            }
        }

        match self.last {
            Some(ref image) => image.clone(),
            None => self.source.clone(),
        }
    }

    fn transparent(&self) -> Result<Image, Error> {
        let pixmap = Pixmap::try_create(self.canvas.width(), self.canvas.height())?;
        Ok(Image::from_image(pixmap, ColorInterpolation::SRGB))
    }

    fn paint(&self, color: Option<tiny_skia::Color>) -> Result<Image, Error> {
        let mut pixmap = Pixmap::try_create(self.canvas.width(), self.canvas.height())?;
        if let Some(color) = color {
            pixmap.fill(color);
        }
        Ok(Image::from_image(pixmap, ColorInterpolation::SRGB))
    }
}

fn alpha_only(image: &Image) -> Image {
    let mut pixmap = image.pixmap().clone();
    for p in pixmap.data_mut().as_rgba_mut() {
        p.r = 0;
        p.g = 0;
        p.b = 0;
    }

    Image {
        image: Rc::new(pixmap),
        region: image.region,
        color_space: image.color_space,
    }
}

/// Everything a primitive may need besides its inputs.
struct Context<'a> {
    canvas: ScreenRect,
    /// User space to canvas.
    to_work: Transform,
    /// Primitive units to canvas.
    param_ts: Transform,
    options: &'a Options,
    resources: &'a dyn ResourceProvider,
    item: &'a dyn DrawingItem,
}

/// Renders the filter chain over `dest`.
///
/// `dest` holds the unfiltered item on input and the filtered one on output.
pub(crate) fn render(
    graph: &FilterGraph,
    item: &dyn DrawingItem,
    dest: &mut DrawingSurface,
    background: Option<&DrawingSurface>,
    ctx: &RenderContext,
) -> Result<(), Error> {
    if graph.primitives.is_empty() {
        return Ok(());
    }

    let opt = ctx.options;
    let bbox = item.geometric_bbox();
    let region = match graph.filter_effect_area(bbox, opt) {
        Some(v) => v,
        None => {
            log::warn!("Filter has an invalid region.");
            dest.pixmap_mut().clear();
            return Ok(());
        }
    };

    let ctm = item.ctm();
    let ctm_inv = match ctm.invert() {
        Some(v) => v,
        None => {
            log::warn!("Filtered element has a non-invertible transform.");
            dest.pixmap_mut().clear();
            return Ok(());
        }
    };

    let space = match WorkingSpace::new(graph, region, ctm, dest.area(), opt) {
        Some(v) => v,
        None => {
            dest.pixmap_mut().clear();
            return Ok(());
        }
    };

    // External images are decoded before the chain runs.
    for primitive in &graph.primitives {
        if let Kind::Image(ref fe) = primitive.kind {
            if let ImageSource::External(..) = fe.source() {
                fe.decoded_image(ctx.resources);
            }
        }
    }

    let source = Image::from_image(space.draw_surface(dest, ctm_inv)?, ColorInterpolation::SRGB);

    let background = if graph.uses_background() {
        match background {
            Some(surface) => Some(Image::from_image(
                space.draw_surface(surface, ctm_inv)?,
                ColorInterpolation::SRGB,
            )),
            None => {
                log::warn!("Filter requires a background image, but none was provided.");
                None
            }
        }
    } else {
        None
    };

    let units_ts = match (graph.primitive_units, bbox) {
        (Units::ObjectBoundingBox, Some(b)) if !b.is_empty() => {
            Transform::from_row(b.width(), 0.0, 0.0, b.height(), b.x(), b.y())
        }
        _ => Transform::identity(),
    };

    let cx = Context {
        canvas: space.canvas,
        to_work: space.to_work,
        param_ts: space.to_work.pre_concat(units_ts),
        options: opt,
        resources: ctx.resources,
        item,
    };

    let mut table = SlotTable {
        canvas: space.canvas,
        item,
        source,
        source_alpha: None,
        background,
        background_alpha: None,
        results: HashMap::new(),
        last: None,
    };

    for primitive in &graph.primitives {
        let cs = primitive
            .color_interpolation
            .unwrap_or(graph.color_interpolation);

        let user_subregion = resolve_primitive_subregion(
            graph.primitive_units,
            primitive.subregion(),
            region,
            bbox,
            opt,
        )
        .and_then(|r| r.intersect(&region));

        let subregion = user_subregion
            .and_then(|r| r.transform(cx.to_work))
            .and_then(|r| r.to_screen_rect().intersect(&cx.canvas));

        let result = apply_primitive(primitive, cs, user_subregion, &cx, &mut table)?;
        let result = clip_to_subregion(result, subregion);
        table.set(primitive.result, result);
    }

    let output = table.output(graph.output);
    apply_to_canvas(output, dest, ctm, &space)
}

fn apply_primitive(
    primitive: &Primitive,
    cs: ColorInterpolation,
    user_subregion: Option<Rect>,
    cx: &Context,
    table: &mut SlotTable,
) -> Result<Image, Error> {
    match primitive.kind {
        Kind::Blend(ref fe) => {
            let input1 = table.get(primitive.input)?;
            let input2 = table.get(fe.input2())?;
            apply_blend(fe, cs, cx, input1, input2)
        }
        Kind::ColorMatrix(ref fe) => {
            let input = table.get(primitive.input)?;
            apply_color_matrix(fe, cs, input)
        }
        Kind::ComponentTransfer(ref fe) => {
            let input = table.get(primitive.input)?;
            apply_component_transfer(fe, cs, input)
        }
        Kind::Composite(ref fe) => {
            let input1 = table.get(primitive.input)?;
            let input2 = table.get(fe.input2())?;
            apply_composite(fe, cs, cx, input1, input2)
        }
        Kind::ConvolveMatrix(ref fe) => {
            let input = table.get(primitive.input)?;
            apply_convolve_matrix(fe, cs, cx, input)
        }
        Kind::DiffuseLighting(ref fe) => {
            let input = table.get(primitive.input)?;
            apply_diffuse_lighting(fe, cs, cx, input)
        }
        Kind::DisplacementMap(ref fe) => {
            let input1 = table.get(primitive.input)?;
            let input2 = table.get(fe.input2())?;
            apply_displacement_map(fe, cs, cx, input1, input2)
        }
        Kind::Flood(ref fe) => apply_flood(fe, cx),
        Kind::GaussianBlur(ref fe) => {
            let input = table.get(primitive.input)?;
            apply_blur(fe, cs, cx, input)
        }
        Kind::Image(ref fe) => apply_image(fe, user_subregion, cx),
        Kind::Merge(ref fe) => apply_merge(fe, cs, cx, table),
        Kind::Morphology(ref fe) => {
            let input = table.get(primitive.input)?;
            apply_morphology(fe, cs, cx, input)
        }
        Kind::Offset(ref fe) => {
            let input = table.get(primitive.input)?;
            apply_offset(fe, cx, input)
        }
        Kind::SpecularLighting(ref fe) => {
            let input = table.get(primitive.input)?;
            apply_specular_lighting(fe, cs, cx, input)
        }
        Kind::Tile(..) => {
            let input = table.get(primitive.input)?;
            apply_tile(cx, input)
        }
        Kind::Turbulence(ref fe) => apply_turbulence(fe, cs, user_subregion, cx),
    }
}

/// Clears everything outside of the subregion.
fn clip_to_subregion(image: Image, subregion: Option<ScreenRect>) -> Image {
    let (w, h) = (image.pixmap().width(), image.pixmap().height());
    let subregion = subregion.unwrap_or(ScreenRect::from_xywh(0, 0, 0, 0));
    if subregion == ScreenRect::from_xywh(0, 0, w, h) {
        return image;
    }

    let color_space = image.color_space;
    let mut pixmap = image.take();

    let mut paint = tiny_skia::Paint::default();
    paint.set_color(tiny_skia::Color::BLACK);
    paint.blend_mode = tiny_skia::BlendMode::Clear;

    let (w, h) = (w as f32, h as f32);
    let left = subregion.left as f32;
    let top = subregion.top as f32;
    let right = subregion.right as f32;
    let bottom = subregion.bottom as f32;

    let rects = [
        tiny_skia::Rect::from_xywh(0.0, 0.0, w, top),
        tiny_skia::Rect::from_xywh(0.0, 0.0, left, h),
        tiny_skia::Rect::from_xywh(right, 0.0, w - right, h),
        tiny_skia::Rect::from_xywh(0.0, bottom, w, h - bottom),
    ];

    for rect in rects.iter().flatten() {
        pixmap.fill_rect(*rect, &paint, Transform::identity(), None);
    }

    Image {
        image: Rc::new(pixmap),
        region: subregion,
        color_space,
    }
}

fn apply_to_canvas(
    input: Image,
    dest: &mut DrawingSurface,
    ctm: Transform,
    space: &WorkingSpace,
) -> Result<(), Error> {
    let input = input.into_color_space(ColorInterpolation::SRGB);

    let area = dest.area();
    let pixmap = dest.pixmap_mut();
    pixmap.clear();

    let back = match space.to_work.invert() {
        Some(v) => v,
        None => return Ok(()),
    };

    let ts = Transform::from_translate(-area.x() as f32, -area.y() as f32)
        .pre_concat(ctm)
        .pre_concat(back);

    pixmap.draw_pixmap(
        0,
        0,
        input.pixmap().as_ref(),
        &PixmapPaint {
            quality: space.quality,
            ..PixmapPaint::default()
        },
        ts,
        None,
    );

    Ok(())
}

fn draw_over(pixmap: &mut Pixmap, image: &Image, blend_mode: tiny_skia::BlendMode) {
    pixmap.draw_pixmap(
        0,
        0,
        image.pixmap().as_ref(),
        &PixmapPaint {
            blend_mode,
            ..PixmapPaint::default()
        },
        Transform::identity(),
        None,
    );
}

fn apply_blend(
    fe: &primitive::Blend,
    cs: ColorInterpolation,
    cx: &Context,
    input1: Image,
    input2: Image,
) -> Result<Image, Error> {
    let input1 = input1.into_color_space(cs);
    let input2 = input2.into_color_space(cs);

    let mut pixmap = Pixmap::try_create(cx.canvas.width(), cx.canvas.height())?;
    draw_over(&mut pixmap, &input2, tiny_skia::BlendMode::SourceOver);
    draw_over(&mut pixmap, &input1, fe.mode().to_skia());

    Ok(Image::from_image(pixmap, cs))
}

fn apply_composite(
    fe: &primitive::Composite,
    cs: ColorInterpolation,
    cx: &Context,
    input1: Image,
    input2: Image,
) -> Result<Image, Error> {
    use primitive::CompositeOperator as Operator;

    let input1 = input1.into_color_space(cs);
    let input2 = input2.into_color_space(cs);

    let mut pixmap = Pixmap::try_create(cx.canvas.width(), cx.canvas.height())?;

    if fe.operator() == Operator::Arithmetic {
        composite::arithmetic(
            fe.coefficients(),
            input1.pixmap().as_image_ref(),
            input2.pixmap().as_image_ref(),
            pixmap.as_image_ref_mut(),
        );

        return Ok(Image::from_image(pixmap, cs));
    }

    let blend_mode = match fe.operator() {
        Operator::Over | Operator::Arithmetic => tiny_skia::BlendMode::SourceOver,
        Operator::In => tiny_skia::BlendMode::SourceIn,
        Operator::Out => tiny_skia::BlendMode::SourceOut,
        Operator::Atop => tiny_skia::BlendMode::SourceAtop,
        Operator::Xor => tiny_skia::BlendMode::Xor,
        Operator::Lighter => tiny_skia::BlendMode::Plus,
    };

    draw_over(&mut pixmap, &input2, tiny_skia::BlendMode::SourceOver);
    draw_over(&mut pixmap, &input1, blend_mode);

    Ok(Image::from_image(pixmap, cs))
}

fn apply_merge(
    fe: &primitive::Merge,
    cs: ColorInterpolation,
    cx: &Context,
    table: &mut SlotTable,
) -> Result<Image, Error> {
    let mut pixmap = Pixmap::try_create(cx.canvas.width(), cx.canvas.height())?;

    for slot in fe.inputs() {
        let input = table.get(*slot)?.into_color_space(cs);
        draw_over(&mut pixmap, &input, tiny_skia::BlendMode::SourceOver);
    }

    Ok(Image::from_image(pixmap, cs))
}

fn apply_flood(fe: &primitive::Flood, cx: &Context) -> Result<Image, Error> {
    let mut pixmap = Pixmap::try_create(cx.canvas.width(), cx.canvas.height())?;
    pixmap.fill(fe.to_skia_color());
    Ok(Image::from_image(pixmap, ColorInterpolation::SRGB))
}

fn apply_tile(cx: &Context, input: Image) -> Result<Image, Error> {
    let input = input.into_color_space(ColorInterpolation::SRGB);
    let mut pixmap = Pixmap::try_create(cx.canvas.width(), cx.canvas.height())?;

    let tile = match input.pixmap().copy_region(input.region) {
        Some(v) => v,
        None => return Ok(Image::from_image(pixmap, ColorInterpolation::SRGB)),
    };

    let mut paint = tiny_skia::Paint::default();
    paint.shader = tiny_skia::Pattern::new(
        tile.as_ref(),
        tiny_skia::SpreadMode::Repeat,
        FilterQuality::Nearest,
        1.0,
        Transform::from_translate(input.region.x() as f32, input.region.y() as f32),
    );

    if let Some(rect) = cx.canvas.to_rect().to_skia_rect() {
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    Ok(Image::from_image(pixmap, ColorInterpolation::SRGB))
}

fn apply_offset(fe: &primitive::Offset, cx: &Context, input: Image) -> Result<Image, Error> {
    let (dx, dy) = map_vector(fe.dx(), fe.dy(), cx.param_ts);
    if dx.is_fuzzy_zero() && dy.is_fuzzy_zero() {
        return Ok(input);
    }

    let mut pixmap = Pixmap::try_create(cx.canvas.width(), cx.canvas.height())?;
    pixmap.draw_pixmap(
        dx.round() as i32,
        dy.round() as i32,
        input.pixmap().as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );

    Ok(Image::from_image(pixmap, input.color_space))
}

fn apply_blur(
    fe: &primitive::GaussianBlur,
    cs: ColorInterpolation,
    cx: &Context,
    input: Image,
) -> Result<Image, Error> {
    let (std_dx, std_dy) = match resolve_std_dev(fe.std_deviation(), cx.param_ts) {
        Some(v) => v,
        None => return Ok(input),
    };

    let mut pixmap = input.into_color_space(cs).take();

    let threshold = cx.options.blur_quality.exact_kernel_threshold() as f64;
    if std_dx < threshold && std_dy < threshold {
        gaussian::apply(std_dx, std_dy, pixmap.as_image_ref_mut());
    } else {
        box_blur::apply(std_dx, std_dy, pixmap.as_image_ref_mut());
    }

    Ok(Image::from_image(pixmap, cs))
}

fn apply_morphology(
    fe: &primitive::Morphology,
    cs: ColorInterpolation,
    cx: &Context,
    input: Image,
) -> Result<Image, Error> {
    let (rx, ry) = fe.radius();
    let (rx, ry) = scale_coordinates(rx, ry, cx.param_ts);

    // Zero radii disable the primitive.
    if !(rx > 0.0 || ry > 0.0) {
        return Ok(input);
    }

    let mut pixmap = input.into_color_space(cs).take();
    morphology::apply(fe.operator(), rx, ry, pixmap.as_image_ref_mut());

    Ok(Image::from_image(pixmap, cs))
}

fn apply_displacement_map(
    fe: &primitive::DisplacementMap,
    cs: ColorInterpolation,
    cx: &Context,
    input1: Image,
    input2: Image,
) -> Result<Image, Error> {
    let input1 = input1.into_color_space(cs);
    let mut map = input2.into_color_space(cs).take();
    demultiply_alpha(map.data_mut().as_rgba_mut());

    // The working space is always rectilinear here, but may be mirrored.
    let (sx, sy) = (fe.scale() * cx.param_ts.sx, fe.scale() * cx.param_ts.sy);

    let mut pixmap = Pixmap::try_create(cx.canvas.width(), cx.canvas.height())?;
    displacement_map::apply(
        fe,
        sx,
        sy,
        input1.pixmap().as_image_ref(),
        map.as_image_ref(),
        pixmap.as_image_ref_mut(),
    );

    Ok(Image::from_image(pixmap, cs))
}

fn apply_color_matrix(
    fe: &primitive::ColorMatrix,
    cs: ColorInterpolation,
    input: Image,
) -> Result<Image, Error> {
    let mut pixmap = input.into_color_space(cs).take();

    demultiply_alpha(pixmap.data_mut().as_rgba_mut());
    color_matrix::apply(&fe.kind(), pixmap.as_image_ref_mut());
    multiply_alpha(pixmap.data_mut().as_rgba_mut());

    Ok(Image::from_image(pixmap, cs))
}

fn apply_component_transfer(
    fe: &primitive::ComponentTransfer,
    cs: ColorInterpolation,
    input: Image,
) -> Result<Image, Error> {
    let mut pixmap = input.into_color_space(cs).take();

    demultiply_alpha(pixmap.data_mut().as_rgba_mut());
    component_transfer::apply(fe, pixmap.as_image_ref_mut());
    multiply_alpha(pixmap.data_mut().as_rgba_mut());

    Ok(Image::from_image(pixmap, cs))
}

fn apply_convolve_matrix(
    fe: &primitive::ConvolveMatrix,
    cs: ColorInterpolation,
    cx: &Context,
    input: Image,
) -> Result<Image, Error> {
    let kernel = match fe.validated() {
        Some(v) => v,
        None => {
            log::warn!("feConvolveMatrix has inconsistent attributes. Output is transparent.");
            let pixmap = Pixmap::try_create(cx.canvas.width(), cx.canvas.height())?;
            return Ok(Image::from_image(pixmap, cs));
        }
    };

    let mut pixmap = input.into_color_space(cs).take();

    if kernel.preserve_alpha {
        demultiply_alpha(pixmap.data_mut().as_rgba_mut());
    }

    convolve_matrix::apply(&kernel, pixmap.as_image_ref_mut());

    if kernel.preserve_alpha {
        multiply_alpha(pixmap.data_mut().as_rgba_mut());
    }

    Ok(Image::from_image(pixmap, cs))
}

fn apply_turbulence(
    fe: &primitive::Turbulence,
    cs: ColorInterpolation,
    user_subregion: Option<Rect>,
    cx: &Context,
) -> Result<Image, Error> {
    let mut pixmap = Pixmap::try_create(cx.canvas.width(), cx.canvas.height())?;

    let ts = cx.to_work;
    if ts.sx.is_fuzzy_zero() || ts.sy.is_fuzzy_zero() {
        return Ok(Image::from_image(pixmap, cs));
    }

    let tile = match user_subregion {
        Some(r) => (r.x() as f64, r.y() as f64, r.width() as f64, r.height() as f64),
        None => return Ok(Image::from_image(pixmap, cs)),
    };

    turbulence::apply(
        fe,
        ts.tx as f64,
        ts.ty as f64,
        ts.sx as f64,
        ts.sy as f64,
        tile,
        pixmap.as_image_ref_mut(),
    );

    multiply_alpha(pixmap.data_mut().as_rgba_mut());

    Ok(Image::from_image(pixmap, cs))
}

fn apply_diffuse_lighting(
    fe: &primitive::DiffuseLighting,
    cs: ColorInterpolation,
    cx: &Context,
    input: Image,
) -> Result<Image, Error> {
    let mut pixmap = Pixmap::try_create(cx.canvas.width(), cx.canvas.height())?;

    let light_source = match fe.light_source() {
        Some(v) => transform_light_source(v, cx.param_ts),
        None => return Ok(Image::from_image(pixmap, cs)),
    };

    lighting::diffuse_lighting(
        fe,
        light_source,
        lighting_color(fe.lighting_color(), cs),
        input.pixmap().as_image_ref(),
        pixmap.as_image_ref_mut(),
    );
    multiply_alpha(pixmap.data_mut().as_rgba_mut());

    Ok(Image::from_image(pixmap, cs))
}

fn apply_specular_lighting(
    fe: &primitive::SpecularLighting,
    cs: ColorInterpolation,
    cx: &Context,
    input: Image,
) -> Result<Image, Error> {
    let mut pixmap = Pixmap::try_create(cx.canvas.width(), cx.canvas.height())?;

    let light_source = match fe.light_source() {
        Some(v) => transform_light_source(v, cx.param_ts),
        None => return Ok(Image::from_image(pixmap, cs)),
    };

    lighting::specular_lighting(
        fe,
        light_source,
        lighting_color(fe.lighting_color(), cs),
        input.pixmap().as_image_ref(),
        pixmap.as_image_ref_mut(),
    );
    multiply_alpha(pixmap.data_mut().as_rgba_mut());

    Ok(Image::from_image(pixmap, cs))
}

fn apply_image(
    fe: &primitive::Image,
    user_subregion: Option<Rect>,
    cx: &Context,
) -> Result<Image, Error> {
    let mut pixmap = Pixmap::try_create(cx.canvas.width(), cx.canvas.height())?;

    match fe.source() {
        ImageSource::None => {}
        ImageSource::Element(ref id) => {
            if cx.item.id() == Some(id.as_str()) {
                log::warn!("feImage references the filtered element '{}'. Skipped.", id);
            } else if !cx
                .resources
                .render_element(id, cx.to_work, &mut pixmap.as_mut())
            {
                log::warn!("feImage references an unknown element '{}'.", id);
            }
        }
        ImageSource::External(..) => {
            if let (Some(image), Some(rect)) = (fe.decoded_image(cx.resources), user_subregion) {
                let fit = aspect_fit(image.width(), image.height(), fe.aspect(), rect);
                pixmap.draw_pixmap(
                    0,
                    0,
                    Pixmap::as_ref(&image),
                    &PixmapPaint {
                        quality: FilterQuality::Bicubic,
                        ..PixmapPaint::default()
                    },
                    cx.to_work.pre_concat(fit),
                    None,
                );
            }
        }
    }

    Ok(Image::from_image(pixmap, ColorInterpolation::SRGB))
}

/// Places a `width`x`height` image into `rect` according to `preserveAspectRatio`.
fn aspect_fit(width: u32, height: u32, aspect: svgtypes::AspectRatio, rect: Rect) -> Transform {
    use svgtypes::Align;

    let (w, h) = (width as f32, height as f32);
    let sx = rect.width() / w;
    let sy = rect.height() / h;

    let (sx, sy) = if aspect.align == Align::None {
        (sx, sy)
    } else if aspect.slice {
        (sx.max(sy), sx.max(sy))
    } else {
        (sx.min(sy), sx.min(sy))
    };

    let dw = rect.width() - w * sx;
    let dh = rect.height() - h * sy;

    let (dx, dy) = match aspect.align {
        Align::None | Align::XMinYMin => (0.0, 0.0),
        Align::XMidYMin => (dw / 2.0, 0.0),
        Align::XMaxYMin => (dw, 0.0),
        Align::XMinYMid => (0.0, dh / 2.0),
        Align::XMidYMid => (dw / 2.0, dh / 2.0),
        Align::XMaxYMid => (dw, dh / 2.0),
        Align::XMinYMax => (0.0, dh),
        Align::XMidYMax => (dw / 2.0, dh),
        Align::XMaxYMax => (dw, dh),
    };

    Transform::from_row(sx, 0.0, 0.0, sy, rect.x() + dx, rect.y() + dy)
}

/// Converts `lighting-color` into the primitive color space.
fn lighting_color(color: svgtypes::Color, cs: ColorInterpolation) -> RGB8 {
    match cs {
        ColorInterpolation::SRGB => RGB8::new(color.red, color.green, color.blue),
        ColorInterpolation::LinearRGB => RGB8::new(
            SRGB_TO_LINEAR_RGB[color.red as usize],
            SRGB_TO_LINEAR_RGB[color.green as usize],
            SRGB_TO_LINEAR_RGB[color.blue as usize],
        ),
    }
}

/// Maps light source coordinates onto the canvas.
fn transform_light_source(source: LightSource, ts: Transform) -> LightSource {
    use std::f32::consts::SQRT_2;

    let (sx, sy) = ts.get_scale();
    let sz = (sx * sx + sy * sy).sqrt() / SQRT_2;
    let map = |x: f32, y: f32| {
        let mut p = tiny_skia::Point::from_xy(x, y);
        ts.map_point(&mut p);
        (p.x, p.y)
    };

    match source {
        LightSource::Distant { .. } => source,
        LightSource::Point { x, y, z } => {
            let (x, y) = map(x, y);
            LightSource::Point { x, y, z: z * sz }
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
            let (x, y) = map(x, y);
            let (points_at_x, points_at_y) = map(points_at_x, points_at_y);
            LightSource::Spot {
                x,
                y,
                z: z * sz,
                points_at_x,
                points_at_y,
                points_at_z: points_at_z * sz,
                specular_exponent,
                limiting_cone_angle,
            }
        }
    }
}

/// Calculates Gaussian blur sigmas for the canvas.
///
/// Returns `None` when the blur is disabled.
fn resolve_std_dev(std_dev: (f32, f32), ts: Transform) -> Option<(f64, f64)> {
    let (mut std_dx, mut std_dy) = scale_coordinates(std_dev.0, std_dev.1, ts);

    if std_dx.is_fuzzy_zero() && std_dy.is_fuzzy_zero() {
        return None;
    }

    // Tiny sigmas have no visible effect.
    if std_dx < 0.05 {
        std_dx = 0.0;
    }

    if std_dy < 0.05 {
        std_dy = 0.0;
    }

    Some((std_dx as f64, std_dy as f64))
}

fn scale_coordinates(x: f32, y: f32, ts: Transform) -> (f32, f32) {
    let (sx, sy) = ts.get_scale();
    (x * sx, y * sy)
}

/// Maps a direction vector, keeping its sign.
fn map_vector(x: f32, y: f32, ts: Transform) -> (f32, f32) {
    (ts.sx * x + ts.kx * y, ts.ky * x + ts.sy * y)
}
