// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use fegraph::primitive::{BlendMode, Kind, Primitive};
use fegraph::tiny_skia::Transform;
use fegraph::*;

struct Item {
    bbox: Option<Rect>,
    visual: Option<Rect>,
    ts: Transform,
}

impl Item {
    fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        let bbox = Rect::from_xywh(x, y, w, h);
        Item {
            bbox,
            visual: bbox,
            ts: Transform::identity(),
        }
    }
}

impl DrawingItem for Item {
    fn geometric_bbox(&self) -> Option<Rect> {
        self.bbox
    }

    fn visual_bbox(&self) -> Option<Rect> {
        self.visual
    }

    fn ctm(&self) -> Transform {
        self.ts
    }
}

fn parse(text: &str) -> FilterGraph {
    text.parse().unwrap()
}

#[test]
fn default_region() {
    let graph = FilterGraph::new();
    let bbox = Rect::from_xywh(0.0, 0.0, 100.0, 50.0);
    assert_eq!(
        graph.filter_effect_area(bbox, &Options::default()),
        Rect::from_xywh(-10.0, -5.0, 120.0, 60.0)
    );
}

#[test]
fn user_space_region() {
    let graph = parse("<filter filterUnits='userSpaceOnUse' x='1' y='2' width='30' height='40'/>");
    assert_eq!(
        graph.filter_effect_area(None, &Options::default()),
        Rect::from_xywh(1.0, 2.0, 30.0, 40.0)
    );
}

#[test]
fn offset_then_blur_enlarge() {
    let graph = parse(
        "<filter>
            <feOffset dx='5' dy='-3'/>
            <feGaussianBlur stdDeviation='2'/>
        </filter>",
    );

    let item = Item::new(0.0, 0.0, 100.0, 100.0);
    let mut area = ScreenRect::from_xywh(0, 0, 100, 100);
    graph.area_enlarge(&mut area, &item);
    assert_eq!((area.left, area.top, area.right, area.bottom), (-11, -6, 106, 109));
}

#[test]
fn enlarge_never_shrinks() {
    let graph = parse(
        "<filter>
            <feOffset dx='-7' dy='4'/>
            <feMorphology radius='2 1'/>
            <feDisplacementMap scale='10'/>
            <feConvolveMatrix kernelMatrix='1 1 1 1 1 1 1 1 1'/>
            <feDiffuseLighting><feDistantLight/></feDiffuseLighting>
            <feFlood/>
        </filter>",
    );

    let mut item = Item::new(0.0, 0.0, 20.0, 20.0);
    item.ts = Transform::from_row(0.5, 0.5, -0.5, 0.5, 3.0, 3.0);

    let original = ScreenRect::from_xywh(-5, -5, 40, 40);
    let mut area = original;
    graph.area_enlarge(&mut area, &item);
    assert!(area.contains(&original));
}

#[test]
fn complexity_is_monotonic() {
    let mut graph = FilterGraph::new();
    let ts = Transform::from_scale(2.0, 2.0);
    assert_eq!(graph.complexity(ts), 1.0);

    let mut prev = graph.complexity(ts);
    for name in ["feFlood", "feOffset", "feGaussianBlur", "feColorMatrix", "feMerge"] {
        let idx = graph.add_primitive(Primitive::from_element_name(name).unwrap());
        if name == "feGaussianBlur" {
            graph.set_primitive_attribute(idx, "stdDeviation", Some("3"));
        }

        let c = graph.complexity(ts);
        assert!(c >= prev, "{} decreased complexity", name);
        prev = c;
    }

    assert!(prev > 100.0);
}

#[test]
fn blend_mode_fallback() {
    let graph = parse("<filter><feBlend mode='bogus'/></filter>");
    match graph.primitives()[0].kind() {
        Kind::Blend(fe) => assert_eq!(fe.mode(), BlendMode::Normal),
        _ => panic!("feBlend expected"),
    }
}

#[test]
fn in2_persists_after_update() {
    let mut graph = parse(
        "<filter>
            <feFlood result='result1'/>
            <feFlood/>
            <feComposite/>
        </filter>",
    );

    let second = graph.primitives()[1].result();
    assert_eq!(graph.namespace().name_for_slot(second), Some("result2"));
    assert_eq!(graph.primitives()[2].kind().input2(), Some(second));

    // Already resolved, nothing changes.
    graph.update();
    assert_eq!(graph.primitives()[2].kind().input2(), Some(second));
    assert_eq!(graph.namespace().len(), 2);
}

#[test]
fn output_rejects_reserved_slots() {
    let mut graph = parse("<filter><feFlood result='a'/><feOffset/></filter>");
    graph.set_output(Slot::SOURCE_GRAPHIC);
    assert_eq!(graph.output(), Slot::NOT_SET);

    graph.set_output_name("a");
    let a = graph.namespace().slot_for_input_name("a");
    assert_eq!(graph.output(), a);

    graph.set_output_name("missing");
    assert_eq!(graph.output(), a);

    graph.set_output(Slot::NOT_SET);
    assert_eq!(graph.output(), Slot::NOT_SET);
}

#[test]
fn invalid_resolution_is_ignored() {
    let mut graph = FilterGraph::new();
    graph.set_resolution(-1.0, None);
    assert_eq!(graph.resolution(), None);

    graph.set_resolution(20.0, Some(10.0));
    graph.set_resolution(f32::NAN, None);
    assert_eq!(graph.resolution(), Some((20.0, Some(10.0))));
}

#[test]
fn self_reference() {
    let graph = parse("<filter><feImage href='#me'/><feOffset/></filter>");
    assert!(!graph.valid_for("me"));
    assert!(graph.valid_for("other"));
}

#[test]
fn background_usage() {
    assert!(parse("<filter><feOffset in='BackgroundAlpha'/></filter>").uses_background());
    assert!(parse("<filter><feBlend in2='BackgroundImage'/></filter>").uses_background());
    assert!(!parse("<filter><feOffset in='SourceAlpha'/></filter>").uses_background());
}

#[test]
fn automatic_region() {
    let mut graph = parse("<filter><feGaussianBlur stdDeviation='5'/></filter>");

    let item = Item::new(0.0, 0.0, 100.0, 50.0);
    let r = graph.automatic_region(&item).unwrap();
    assert_rect(r, [-0.15, -0.3, 1.3, 1.6]);

    graph.update_filter_all_regions(&[&item]);
    let r = graph.filter_effect_area(item.bbox, &Options::default()).unwrap();
    assert_rect(r, [-15.0, -15.0, 130.0, 80.0]);
}

#[test]
fn automatic_region_uses_visual_bbox() {
    let graph = FilterGraph::new();
    let mut item = Item::new(0.0, 0.0, 10.0, 10.0);
    item.visual = Rect::from_xywh(-1.0, -1.0, 12.0, 12.0);

    let r = graph.automatic_region(&item).unwrap();
    assert_rect(r, [-0.1, -0.1, 1.2, 1.2]);
}

fn assert_rect(r: Rect, expected: [f32; 4]) {
    let actual = [r.x(), r.y(), r.width(), r.height()];
    for (a, b) in actual.iter().zip(expected) {
        assert!((a - b).abs() < 1e-4, "{:?} != {:?}", actual, expected);
    }
}

#[test]
fn automatic_region_can_be_disabled() {
    let mut graph = FilterGraph::new();
    graph.set_auto_region(false);
    graph.update_filter_all_regions(&[&Item::new(0.0, 0.0, 10.0, 10.0)]);
    assert_eq!(graph.region(), [None; 4]);
}

struct Registry {
    signal: ModifiedSignal,
}

impl ElementRegistry for Registry {
    fn modified_signal(&self, id: &str) -> Option<ModifiedSignal> {
        if id == "shape" {
            Some(self.signal.clone())
        } else {
            None
        }
    }
}

#[test]
fn lifecycle() {
    let signal = ModifiedSignal::new();
    let registry = Arc::new(Registry { signal: signal.clone() });

    let mut graph = parse("<filter><feImage href='#shape'/></filter>");
    assert_eq!(graph.state(), FilterState::Unattached);

    graph.attach(registry);
    assert_eq!(graph.state(), FilterState::Configured);
    assert_eq!(signal.connections(), 1);

    signal.emit();
    assert_eq!(graph.state(), FilterState::Dirty);

    graph.detach();
    assert_eq!(graph.state(), FilterState::Unattached);
    assert_eq!(signal.connections(), 0);
}

#[test]
fn edits_mark_dirty() {
    let registry = Arc::new(Registry { signal: ModifiedSignal::new() });

    let mut graph = parse("<filter><feOffset/></filter>");
    graph.attach(registry);
    assert_eq!(graph.state(), FilterState::Configured);

    graph.set_primitive_attribute(0, "dx", Some("3"));
    assert_eq!(graph.state(), FilterState::Dirty);
}

#[test]
fn thread_safety() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FilterGraph>();
    assert_send_sync::<ModifiedSignal>();
}
