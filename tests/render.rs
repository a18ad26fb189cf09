// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use fegraph::tiny_skia::{self, Transform};
use fegraph::*;
use once_cell::sync::Lazy;

static OPTIONS: Lazy<Options> = Lazy::new(Options::default);

struct Square;

impl DrawingItem for Square {
    fn geometric_bbox(&self) -> Option<Rect> {
        Rect::from_xywh(0.0, 0.0, 10.0, 10.0)
    }

    fn ctm(&self) -> Transform {
        Transform::identity()
    }

    fn fill_paint(&self) -> Option<tiny_skia::Color> {
        Some(tiny_skia::Color::from_rgba8(0, 0, 255, 255))
    }
}

/// A 20x20 surface with a green 10x10 square at the origin.
fn surface() -> DrawingSurface {
    let mut surface = DrawingSurface::new(ScreenRect::from_xywh(0, 0, 20, 20)).unwrap();
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(0, 255, 0, 255);
    let rect = tiny_skia::Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap();
    surface
        .pixmap_mut()
        .fill_rect(rect, &paint, Transform::identity(), None);
    surface
}

fn render(text: &str) -> DrawingSurface {
    let graph: FilterGraph = text.parse().unwrap();
    let mut dest = surface();
    let ctx = RenderContext::new(&OPTIONS, &NoResources);
    graph.render(&Square, &mut dest, None, &ctx).unwrap();
    dest
}

fn rgba(surface: &DrawingSurface, x: u32, y: u32) -> (u8, u8, u8, u8) {
    let c = surface.pixmap().pixel(x, y).unwrap();
    (c.red(), c.green(), c.blue(), c.alpha())
}

#[test]
fn empty_filter_keeps_the_source() {
    let dest = render("<filter/>");
    assert_eq!(rgba(&dest, 5, 5), (0, 255, 0, 255));
    assert_eq!(rgba(&dest, 15, 15), (0, 0, 0, 0));
}

#[test]
fn flood_fills_the_region() {
    let dest = render("<filter><feFlood flood-color='red'/></filter>");
    assert_eq!(rgba(&dest, 5, 5), (255, 0, 0, 255));
    assert_eq!(rgba(&dest, 10, 10), (255, 0, 0, 255));
    // Outside of -10% -10% 120% 120%.
    assert_eq!(rgba(&dest, 15, 15), (0, 0, 0, 0));
}

#[test]
fn flood_respects_subregion() {
    let dest = render("<filter><feFlood flood-color='red' x='5' width='2'/></filter>");
    assert_eq!(rgba(&dest, 5, 5), (255, 0, 0, 255));
    assert_eq!(rgba(&dest, 2, 5), (0, 0, 0, 0));
    assert_eq!(rgba(&dest, 8, 5), (0, 0, 0, 0));
}

#[test]
fn offset_moves_the_source() {
    let dest = render("<filter><feOffset dx='5'/></filter>");
    assert_eq!(rgba(&dest, 2, 5), (0, 0, 0, 0));
    assert_eq!(rgba(&dest, 10, 5), (0, 255, 0, 255));
}

#[test]
fn merge_draws_inputs_in_order() {
    let dest = render(
        "<filter>
            <feFlood flood-color='red' result='a'/>
            <feFlood flood-color='blue' result='b'/>
            <feMerge>
                <feMergeNode in='a'/>
                <feMergeNode in='b'/>
            </feMerge>
        </filter>",
    );
    assert_eq!(rgba(&dest, 5, 5), (0, 0, 255, 255));
}

#[test]
fn arithmetic_sum() {
    let dest = render(
        "<filter>
            <feFlood flood-color='red' result='a'/>
            <feFlood flood-color='blue' result='b'/>
            <feComposite in='a' in2='b' operator='arithmetic' k2='1' k3='1'/>
        </filter>",
    );
    assert_eq!(rgba(&dest, 5, 5), (255, 0, 255, 255));
}

#[test]
fn arithmetic_of_the_same_source() {
    let dest = render(
        "<filter>
            <feComposite in='SourceGraphic' in2='SourceGraphic' operator='arithmetic' k2='1' k3='1'/>
        </filter>",
    );
    assert_eq!(rgba(&dest, 5, 5), (0, 255, 0, 255));
    assert_eq!(rgba(&dest, 10, 10), (0, 0, 0, 0));
}

#[test]
fn explicit_output() {
    let mut graph: FilterGraph = "
    <filter>
        <feFlood flood-color='red' result='a'/>
        <feFlood flood-color='blue'/>
    </filter>"
        .parse()
        .unwrap();
    graph.set_output_name("a");

    let mut dest = surface();
    graph
        .render(&Square, &mut dest, None, &RenderContext::new(&OPTIONS, &NoResources))
        .unwrap();
    assert_eq!(rgba(&dest, 5, 5), (255, 0, 0, 255));
}

#[test]
fn fill_paint_input() {
    let dest = render("<filter><feOffset in='FillPaint'/></filter>");
    assert_eq!(rgba(&dest, 5, 5), (0, 0, 255, 255));
}

#[test]
fn source_alpha() {
    let dest = render("<filter><feOffset in='SourceAlpha'/></filter>");
    assert_eq!(rgba(&dest, 5, 5), (0, 0, 0, 255));
}

#[test]
fn zero_resolution_disables_the_effect() {
    let dest = render("<filter filterRes='0'><feOffset/></filter>");
    assert_eq!(rgba(&dest, 5, 5), (0, 0, 0, 0));
}

#[test]
fn empty_bbox_disables_the_effect() {
    struct Line;

    impl DrawingItem for Line {
        fn geometric_bbox(&self) -> Option<Rect> {
            Rect::from_xywh(0.0, 0.0, 10.0, 0.0)
        }

        fn ctm(&self) -> Transform {
            Transform::identity()
        }
    }

    let graph: FilterGraph = "<filter><feOffset/></filter>".parse().unwrap();
    let mut dest = surface();
    graph
        .render(&Line, &mut dest, None, &RenderContext::new(&OPTIONS, &NoResources))
        .unwrap();
    assert_eq!(rgba(&dest, 5, 5), (0, 0, 0, 0));
}

/// The same 10x10 square under an arbitrary transform.
struct Shape {
    ts: Transform,
}

impl DrawingItem for Shape {
    fn geometric_bbox(&self) -> Option<Rect> {
        Rect::from_xywh(0.0, 0.0, 10.0, 10.0)
    }

    fn ctm(&self) -> Transform {
        self.ts
    }
}

/// Renders on a 40x40 surface with a green square drawn using `ts`.
fn render_with(text: &str, ts: Transform) -> DrawingSurface {
    let graph: FilterGraph = text.parse().unwrap();

    let mut dest = DrawingSurface::new(ScreenRect::from_xywh(0, 0, 40, 40)).unwrap();
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(0, 255, 0, 255);
    let rect = tiny_skia::Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap();
    dest.pixmap_mut().fill_rect(rect, &paint, ts, None);

    let ctx = RenderContext::new(&OPTIONS, &NoResources);
    graph.render(&Shape { ts }, &mut dest, None, &ctx).unwrap();
    dest
}

fn is_partial(surface: &DrawingSurface, x: u32, y: u32) -> bool {
    let a = rgba(surface, x, y).3;
    a > 0 && a < 255
}

#[test]
fn offset_is_scaled() {
    let dest = render_with("<filter><feOffset dx='5'/></filter>", Transform::from_scale(2.0, 2.0));
    assert_eq!(rgba(&dest, 5, 5), (0, 0, 0, 0));
    assert_eq!(rgba(&dest, 15, 5), (0, 255, 0, 255));
    // Region ends at 22.
    assert_eq!(rgba(&dest, 25, 5), (0, 0, 0, 0));
}

#[test]
fn offset_is_mirrored() {
    let text = "
    <filter filterUnits='userSpaceOnUse' x='-20' y='-20' width='60' height='60'>
        <feOffset dx='5'/>
    </filter>";

    // The square is at 10..20 and moves left.
    let dest = render_with(text, Transform::from_row(-1.0, 0.0, 0.0, 1.0, 20.0, 0.0));
    assert_eq!(rgba(&dest, 7, 5), (0, 255, 0, 255));
    assert_eq!(rgba(&dest, 12, 5), (0, 255, 0, 255));
    assert_eq!(rgba(&dest, 17, 5), (0, 0, 0, 0));
}

#[test]
fn blur_is_scaled() {
    let text = "<filter><feGaussianBlur stdDeviation='1'/></filter>";
    let dest = render_with(text, Transform::from_scale(2.0, 2.0));
    assert!(rgba(&dest, 10, 10).3 > 250);
    assert!(is_partial(&dest, 21, 5));
    assert_eq!(rgba(&dest, 23, 5), (0, 0, 0, 0));
}

#[test]
fn blur_is_mirrored() {
    let text = "<filter><feGaussianBlur stdDeviation='2'/></filter>";
    let dest = render_with(text, Transform::from_row(-1.0, 0.0, 0.0, 1.0, 20.0, 0.0));
    assert!(rgba(&dest, 15, 5).3 > 200);
    assert!(is_partial(&dest, 9, 5));
    assert!(is_partial(&dest, 20, 5));
    // Region is 9..21.
    assert_eq!(rgba(&dest, 22, 5), (0, 0, 0, 0));
}

#[test]
fn bbox_primitive_units() {
    let relative = render(
        "<filter primitiveUnits='objectBoundingBox'><feGaussianBlur stdDeviation='0.1'/></filter>",
    );
    let absolute = render("<filter><feGaussianBlur stdDeviation='1'/></filter>");
    assert_eq!(relative.pixmap().data(), absolute.pixmap().data());
    assert!(is_partial(&relative, 10, 5));
}

#[test]
fn low_resolution() {
    let dest = render("<filter filterRes='5'><feOffset/></filter>");

    let (r, g, _, a) = rgba(&dest, 5, 5);
    assert!(r < 50 && g > 200 && a > 200);
    // Upscaling smears the edge.
    assert!(rgba(&dest, 10, 5).3 > 0);
    assert_eq!(rgba(&dest, 15, 15), (0, 0, 0, 0));
}

#[test]
fn rotation_uses_aligned_space() {
    // (x, y) -> (20 - y, x), so the square is at 10..20 x 0..10
    // and a horizontal offset moves it down.
    let ts = Transform::from_row(0.0, 1.0, -1.0, 0.0, 20.0, 0.0);
    let dest = render_with("<filter><feOffset dx='4'/></filter>", ts);

    let (_, g, _, a) = rgba(&dest, 15, 8);
    assert!(g > 240 && a > 240);
    assert_eq!(rgba(&dest, 15, 0), (0, 0, 0, 0));
    // Region ends at 11.
    assert_eq!(rgba(&dest, 15, 12), (0, 0, 0, 0));
}

#[test]
fn huge_kernels_are_bounded() {
    let dest = render("<filter><feMorphology operator='dilate' radius='1e9'/></filter>");
    assert_eq!(rgba(&dest, 10, 10), (0, 255, 0, 255));
    assert_eq!(rgba(&dest, 15, 15), (0, 0, 0, 0));

    let dest = render("<filter><feGaussianBlur stdDeviation='1e9'/></filter>");
    assert_eq!(rgba(&dest, 5, 5), (0, 0, 0, 0));
}
