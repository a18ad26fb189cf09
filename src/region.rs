// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Filter effects region, primitive subregions and the working resolution.

use svgtypes::{Length, LengthUnit};

use crate::units::{convert_length, RegionAttribute, Units};
use crate::{Options, Rect};

fn default_region() -> [Length; 4] {
    [
        Length::new(-10.0, LengthUnit::Percent),
        Length::new(-10.0, LengthUnit::Percent),
        Length::new(120.0, LengthUnit::Percent),
        Length::new(120.0, LengthUnit::Percent),
    ]
}

const ATTRIBUTES: [RegionAttribute; 4] = [
    RegionAttribute::X,
    RegionAttribute::Y,
    RegionAttribute::Width,
    RegionAttribute::Height,
];

/// Resolves the filter effects region in user space.
///
/// Each unset field uses the SVG default of `-10% -10% 120% 120%`.
///
/// Returns `None` when `objectBoundingBox` is used without a bbox
/// or when the resulting region has no area.
pub(crate) fn resolve_filter_region(
    units: Units,
    lengths: [Option<Length>; 4],
    bbox: Option<Rect>,
    opt: &Options,
) -> Option<Rect> {
    let reference = match units {
        Units::ObjectBoundingBox => {
            let bbox = bbox?;
            if bbox.is_empty() {
                return None;
            }
            bbox
        }
        Units::UserSpaceOnUse => match bbox.or(opt.viewport) {
            Some(r) => r,
            None => Rect::from_xywh(0.0, 0.0, 0.0, 0.0)?,
        },
    };

    let defaults = default_region();
    let mut values = [0.0f32; 4];
    for i in 0..4 {
        let length = lengths[i].unwrap_or(defaults[i]);
        values[i] = convert_length(length, ATTRIBUTES[i], units, reference, opt);
    }

    let [x, y, width, height] = values;
    if !(width > 0.0 && height > 0.0) {
        return None;
    }

    Rect::from_xywh(x, y, width, height)
}

/// Resolves a primitive subregion in user space.
///
/// Each unset field takes the corresponding edge of the filter `region`.
/// In `objectBoundingBox` mode lengths are relative to `bbox`,
/// or to the filter region when the item has no bbox.
pub(crate) fn resolve_primitive_subregion(
    units: Units,
    lengths: [Option<Length>; 4],
    region: Rect,
    bbox: Option<Rect>,
    opt: &Options,
) -> Option<Rect> {
    let reference = match units {
        Units::ObjectBoundingBox => bbox.filter(|r| !r.is_empty()).unwrap_or(region),
        Units::UserSpaceOnUse => bbox.unwrap_or(region),
    };

    let defaults = [region.x(), region.y(), region.width(), region.height()];
    let mut values = defaults;
    for i in 0..4 {
        if let Some(length) = lengths[i] {
            values[i] = convert_length(length, ATTRIBUTES[i], units, reference, opt);
        }
    }

    let [x, y, width, height] = values;
    Rect::from_xywh(x, y, width, height)
}

/// A working raster size.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct Resolution {
    pub width: u32,
    pub height: u32,
    /// The raster size differs from the device size of the region.
    pub scaled: bool,
}

/// Picks the working resolution of a region.
///
/// - `natural` is the device size of the region.
/// - `explicit` is `filterRes`, with an optional height.
///
/// Returns `None` when an explicit resolution is zero, which disables the effect.
pub(crate) fn filter_resolution(
    region: Rect,
    natural: (f32, f32),
    explicit: Option<(f32, Option<f32>)>,
    opt: &Options,
) -> Option<Resolution> {
    let (mut w, mut h, mut scaled) = match explicit {
        Some((x, y)) => {
            let y = y.unwrap_or(x * region.height() / region.width());
            (x, y, true)
        }
        None => {
            let (w, h) = natural;
            match opt.quality.resolution_limit() {
                Some(limit) if w.max(h) > limit => {
                    let k = limit / w.max(h);
                    (w * k, h * k, true)
                }
                _ => (w, h, false),
            }
        }
    };

    if !(w > 0.0 && h > 0.0) {
        if explicit.is_some() {
            return None;
        }

        w = w.max(1.0);
        h = h.max(1.0);
    }

    let max = opt.max_resolution.max(1) as f32;
    if w.max(h) > max {
        let k = max / w.max(h);
        w *= k;
        h *= k;
        scaled = true;
    }

    let res = Resolution {
        width: to_pixels(w),
        height: to_pixels(h),
        scaled,
    };

    log::debug!("Filter resolution: {}x{}.", res.width, res.height);
    Some(res)
}

/// Rounds up, ignoring float noise right above a whole number.
fn to_pixels(v: f32) -> u32 {
    let r = v.round();
    let v = if (v - r).abs() < 1e-3 { r } else { v.ceil() };
    (v as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::parse_length;
    use crate::FilterQuality;

    fn bbox() -> Option<Rect> {
        Rect::from_xywh(0.0, 0.0, 100.0, 50.0)
    }

    #[test]
    fn default_filter_region() {
        let r = resolve_filter_region(
            Units::ObjectBoundingBox,
            [None; 4],
            bbox(),
            &Options::default(),
        );
        assert_eq!(r, Rect::from_xywh(-10.0, -5.0, 120.0, 60.0));
    }

    #[test]
    fn partial_override() {
        let r = resolve_filter_region(
            Units::ObjectBoundingBox,
            [None, None, parse_length("2"), None],
            bbox(),
            &Options::default(),
        );
        assert_eq!(r, Rect::from_xywh(-10.0, -5.0, 200.0, 60.0));
    }

    #[test]
    fn bbox_units_require_bbox() {
        let opt = Options::default();
        assert!(resolve_filter_region(Units::ObjectBoundingBox, [None; 4], None, &opt).is_none());

        let zero = Rect::from_xywh(0.0, 0.0, 0.0, 10.0);
        assert!(resolve_filter_region(Units::ObjectBoundingBox, [None; 4], zero, &opt).is_none());
    }

    #[test]
    fn user_space_region() {
        let lengths = [
            parse_length("5"),
            parse_length("6"),
            parse_length("50%"),
            parse_length("1in"),
        ];
        let r = resolve_filter_region(Units::UserSpaceOnUse, lengths, bbox(), &Options::default());
        assert_eq!(r, Rect::from_xywh(5.0, 6.0, 50.0, 96.0));

        let zero = [None, None, parse_length("0"), None];
        assert!(
            resolve_filter_region(Units::UserSpaceOnUse, zero, bbox(), &Options::default())
                .is_none()
        );
    }

    #[test]
    fn subregion_defaults_to_region() {
        let region = Rect::from_xywh(-10.0, -5.0, 120.0, 60.0).unwrap();
        let opt = Options::default();
        let r = resolve_primitive_subregion(Units::UserSpaceOnUse, [None; 4], region, bbox(), &opt);
        assert_eq!(r, Some(region));

        let lengths = [parse_length("0.5"), None, parse_length("0.1"), None];
        let r = resolve_primitive_subregion(Units::ObjectBoundingBox, lengths, region, bbox(), &opt);
        assert_eq!(r, Rect::from_xywh(50.0, -5.0, 10.0, 60.0));
    }

    #[test]
    fn automatic_resolution() {
        let region = Rect::from_xywh(0.0, 0.0, 100.0, 50.0).unwrap();
        let mut opt = Options::default();

        let res = filter_resolution(region, (200.0, 100.0), None, &opt).unwrap();
        assert_eq!((res.width, res.height, res.scaled), (200, 100, false));

        opt.quality = FilterQuality::Worse;
        let res = filter_resolution(region, (200.0, 100.0), None, &opt).unwrap();
        assert_eq!((res.width, res.height, res.scaled), (64, 32, true));
    }

    #[test]
    fn explicit_resolution() {
        let region = Rect::from_xywh(0.0, 0.0, 100.0, 50.0).unwrap();
        let mut opt = Options::default();

        let res = filter_resolution(region, (1.0, 1.0), Some((40.0, None)), &opt).unwrap();
        assert_eq!((res.width, res.height), (40, 20));

        opt.max_resolution = 10;
        let res = filter_resolution(region, (1.0, 1.0), Some((40.0, Some(40.0))), &opt).unwrap();
        assert_eq!((res.width, res.height), (10, 10));

        assert!(filter_resolution(region, (1.0, 1.0), Some((0.0, None)), &opt).is_none());
    }
}
