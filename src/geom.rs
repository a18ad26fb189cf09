// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Geometric primitives used by region math.

use tiny_skia::Transform;

use crate::ApproxZero;

/// A rectangle in user or device coordinates.
///
/// Unlike `tiny_skia::Rect`, a zero width or height is allowed,
/// since a region of a zero-area source is still a valid region.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl Rect {
    /// Creates a rect from position and size.
    ///
    /// Returns `None` for a negative size or non-finite values.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Option<Self> {
        Rect::from_ltrb(x, y, x + width, y + height)
    }

    /// Creates a rect from edges.
    pub fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Option<Self> {
        let finite = left.is_finite() && top.is_finite() && right.is_finite() && bottom.is_finite();
        if finite && left <= right && top <= bottom {
            Some(Rect {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    /// Returns the left edge.
    #[inline]
    pub fn x(&self) -> f32 {
        self.left
    }

    /// Returns the top edge.
    #[inline]
    pub fn y(&self) -> f32 {
        self.top
    }

    /// Returns the left edge.
    #[inline]
    pub fn left(&self) -> f32 {
        self.left
    }

    /// Returns the top edge.
    #[inline]
    pub fn top(&self) -> f32 {
        self.top
    }

    /// Returns the right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.right
    }

    /// Returns the bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    /// Returns the width.
    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Returns the height.
    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Checks that the rect has no area.
    pub fn is_empty(&self) -> bool {
        self.width().is_fuzzy_zero() || self.height().is_fuzzy_zero()
    }

    /// Returns the smallest rect containing both rects.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Returns the common part of two rects, if any.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        Rect::from_ltrb(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        )
    }

    /// Moves the rect.
    pub fn translate(&self, dx: f32, dy: f32) -> Option<Rect> {
        Rect::from_ltrb(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    /// Grows the rect on every side.
    ///
    /// Negative amounts are treated as zero, so the result always contains `self`.
    pub fn expand(&self, dx: f32, dy: f32) -> Rect {
        let dx = if dx.is_finite() { dx.max(0.0) } else { 0.0 };
        let dy = if dy.is_finite() { dy.max(0.0) } else { 0.0 };
        Rect {
            left: self.left - dx,
            top: self.top - dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }

    /// Returns the bounding box of the transformed rect.
    pub fn transform(&self, ts: Transform) -> Option<Rect> {
        if ts.is_identity() {
            return Some(*self);
        }

        let mut points = [
            tiny_skia::Point::from_xy(self.left, self.top),
            tiny_skia::Point::from_xy(self.right, self.top),
            tiny_skia::Point::from_xy(self.right, self.bottom),
            tiny_skia::Point::from_xy(self.left, self.bottom),
        ];
        ts.map_points(&mut points);

        let mut r = Rect::from_ltrb(points[0].x, points[0].y, points[0].x, points[0].y)?;
        for p in &points[1..] {
            r = r.union(&Rect::from_ltrb(p.x, p.y, p.x, p.y)?);
        }

        Some(r)
    }

    /// Rounds the rect outwards to whole pixels.
    pub fn to_screen_rect(&self) -> ScreenRect {
        ScreenRect {
            left: self.left.floor() as i32,
            top: self.top.floor() as i32,
            right: self.right.ceil() as i32,
            bottom: self.bottom.ceil() as i32,
        }
    }

    /// Converts into a `tiny_skia::Rect`. Fails on zero area.
    pub fn to_skia_rect(&self) -> Option<tiny_skia::Rect> {
        tiny_skia::Rect::from_ltrb(self.left, self.top, self.right, self.bottom)
    }
}

/// A pixel-aligned area.
///
/// Used for the device area that has to be rasterized.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScreenRect {
    /// Creates an area from position and size.
    pub fn from_xywh(x: i32, y: i32, width: u32, height: u32) -> Self {
        ScreenRect {
            left: x,
            top: y,
            right: x.saturating_add(width as i32),
            bottom: y.saturating_add(height as i32),
        }
    }

    /// Returns the left edge.
    #[inline]
    pub fn x(&self) -> i32 {
        self.left
    }

    /// Returns the top edge.
    #[inline]
    pub fn y(&self) -> i32 {
        self.top
    }

    /// Returns the width. An inverted area has zero width.
    #[inline]
    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    /// Returns the height. An inverted area has zero height.
    #[inline]
    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }

    /// Checks that the area has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Grows the area by a per-side amount.
    ///
    /// Negative values are ignored, an area never shrinks.
    pub fn expand(&mut self, left: i32, top: i32, right: i32, bottom: i32) {
        self.left = self.left.saturating_sub(left.max(0));
        self.top = self.top.saturating_sub(top.max(0));
        self.right = self.right.saturating_add(right.max(0));
        self.bottom = self.bottom.saturating_add(bottom.max(0));
    }

    /// Grows the area by the same amount on every side.
    pub fn expand_by(&mut self, n: i32) {
        self.expand(n, n, n, n);
    }

    /// Checks that `other` is fully inside.
    pub fn contains(&self, other: &ScreenRect) -> bool {
        self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    /// Returns the common part of two areas, if any.
    pub fn intersect(&self, other: &ScreenRect) -> Option<ScreenRect> {
        let r = ScreenRect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };

        if r.is_empty() {
            None
        } else {
            Some(r)
        }
    }

    /// Converts into a float rect.
    pub fn to_rect(&self) -> Rect {
        Rect {
            left: self.left as f32,
            top: self.top as f32,
            right: self.right as f32,
            bottom: self.bottom as f32,
        }
    }

    /// Converts into a tiny-skia rect. `None` when empty.
    pub fn to_int_rect(&self) -> Option<tiny_skia::IntRect> {
        tiny_skia::IntRect::from_xywh(self.left, self.top, self.width(), self.height())
    }
}

/// Returns the scale factors of the transform along each axis.
///
/// Each factor is the length of a transformed unit vector.
pub(crate) fn expansion(ts: Transform) -> (f32, f32) {
    let ex = (ts.sx * ts.sx + ts.ky * ts.ky).sqrt();
    let ey = (ts.kx * ts.kx + ts.sy * ts.sy).sqrt();
    (ex, ey)
}

/// Checks that the transform only scales and translates.
pub(crate) fn is_rectilinear(ts: Transform) -> bool {
    ts.kx.is_fuzzy_zero() && ts.ky.is_fuzzy_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_area_rect_is_valid() {
        let r = Rect::from_xywh(10.0, 10.0, 0.0, 5.0).unwrap();
        assert!(r.is_empty());
        assert!(Rect::from_xywh(0.0, 0.0, -1.0, 1.0).is_none());
        assert!(Rect::from_xywh(f32::NAN, 0.0, 1.0, 1.0).is_none());
    }

    #[test]
    fn expand_never_shrinks() {
        let r = Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap();
        assert_eq!(r.expand(-5.0, f32::NAN), r);
        assert_eq!(r.expand(2.0, 1.0), Rect::from_ltrb(-2.0, -1.0, 12.0, 11.0).unwrap());
    }

    #[test]
    fn transform_bbox() {
        let r = Rect::from_xywh(0.0, 0.0, 10.0, 20.0).unwrap();
        let ts = Transform::from_row(0.0, 1.0, -1.0, 0.0, 0.0, 0.0);
        let r2 = r.transform(ts).unwrap();
        assert_eq!(r2, Rect::from_ltrb(-20.0, 0.0, 0.0, 10.0).unwrap());
    }

    #[test]
    fn round_out() {
        let r = Rect::from_ltrb(0.5, -0.5, 10.1, 9.9).unwrap();
        assert_eq!(
            r.to_screen_rect(),
            ScreenRect {
                left: 0,
                top: -1,
                right: 11,
                bottom: 10
            }
        );
    }

    #[test]
    fn screen_rect_expand() {
        let mut r = ScreenRect::from_xywh(0, 0, 10, 10);
        r.expand(1, 2, -3, 4);
        assert_eq!(r, ScreenRect { left: -1, top: -2, right: 10, bottom: 14 });
        assert!(r.contains(&ScreenRect::from_xywh(0, 0, 10, 10)));
    }
}
