// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

use svgtypes::{Length, LengthUnit as Unit};

use crate::{Options, Rect};

/// A coordinate system of a filter region or primitive subregion.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Units {
    UserSpaceOnUse,
    ObjectBoundingBox,
}

impl Units {
    pub(crate) fn parse(text: &str) -> Option<Self> {
        match text {
            "userSpaceOnUse" => Some(Units::UserSpaceOnUse),
            "objectBoundingBox" => Some(Units::ObjectBoundingBox),
            _ => None,
        }
    }

    pub(crate) fn to_str(self) -> &'static str {
        match self {
            Units::UserSpaceOnUse => "userSpaceOnUse",
            Units::ObjectBoundingBox => "objectBoundingBox",
        }
    }
}

/// A region attribute.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) enum RegionAttribute {
    X,
    Y,
    Width,
    Height,
}

impl RegionAttribute {
    fn is_horizontal(self) -> bool {
        matches!(self, RegionAttribute::X | RegionAttribute::Width)
    }

    fn is_position(self) -> bool {
        matches!(self, RegionAttribute::X | RegionAttribute::Y)
    }
}

/// Converts a region length into user units.
///
/// `bbox` is the reference box for `objectBoundingBox` and the percentage fallback
/// for `userSpaceOnUse` when `Options::viewport` is not set.
pub(crate) fn convert_length(
    length: Length,
    attr: RegionAttribute,
    units: Units,
    bbox: Rect,
    opt: &Options,
) -> f32 {
    let n = length.number as f32;

    match units {
        Units::ObjectBoundingBox => {
            let (origin, extent) = if attr.is_horizontal() {
                (bbox.x(), bbox.width())
            } else {
                (bbox.y(), bbox.height())
            };
            let origin = if attr.is_position() { origin } else { 0.0 };

            if length.unit == Unit::Percent {
                origin + n * extent / 100.0
            } else {
                origin + convert_absolute(length, opt) * extent
            }
        }
        Units::UserSpaceOnUse => {
            if length.unit == Unit::Percent {
                let view = opt.viewport.unwrap_or(bbox);
                let (origin, extent) = if attr.is_horizontal() {
                    (view.x(), view.width())
                } else {
                    (view.y(), view.height())
                };
                let origin = if attr.is_position() { origin } else { 0.0 };
                origin + n * extent / 100.0
            } else {
                convert_absolute(length, opt)
            }
        }
    }
}

/// Converts a non-percentage length into user units.
pub(crate) fn convert_absolute(length: Length, opt: &Options) -> f32 {
    let n = length.number as f32;
    match length.unit {
        Unit::None | Unit::Px => n,
        Unit::Em => n * opt.font_size,
        Unit::Ex => n * opt.font_size / 2.0,
        Unit::In => n * opt.dpi,
        Unit::Cm => n * opt.dpi / 2.54,
        Unit::Mm => n * opt.dpi / 25.4,
        Unit::Pt => n * opt.dpi / 72.0,
        Unit::Pc => n * opt.dpi / 6.0,
        Unit::Percent => n / 100.0,
    }
}

/// Parses a length attribute.
pub(crate) fn parse_length(text: &str) -> Option<Length> {
    Length::from_str(text.trim()).ok()
}

/// Parses a number attribute.
///
/// Trailing data is an error.
pub(crate) fn parse_number(text: &str) -> Option<f32> {
    let mut parser = svgtypes::NumberListParser::from(text);
    let n = parser.next().and_then(|n| n.ok())?;
    if parser.next().is_some() {
        return None;
    }

    let n = n as f32;
    if n.is_finite() {
        Some(n)
    } else {
        None
    }
}

/// Parses a list of one or two numbers.
///
/// A single number is used for both values.
pub(crate) fn parse_number_pair(text: &str) -> Option<(f32, f32)> {
    let list = parse_number_list(text)?;
    match list.as_slice() {
        [n] => Some((*n, *n)),
        [n1, n2] => Some((*n1, *n2)),
        _ => None,
    }
}

/// Parses a list of numbers.
pub(crate) fn parse_number_list(text: &str) -> Option<Vec<f32>> {
    let mut list = Vec::new();
    for n in svgtypes::NumberListParser::from(text) {
        let n = n.ok()? as f32;
        if !n.is_finite() {
            return None;
        }
        list.push(n);
    }

    Some(list)
}

/// Formats a length the way it was written.
pub(crate) fn length_to_string(length: Length) -> String {
    let unit = match length.unit {
        Unit::None => "",
        Unit::Em => "em",
        Unit::Ex => "ex",
        Unit::Px => "px",
        Unit::In => "in",
        Unit::Cm => "cm",
        Unit::Mm => "mm",
        Unit::Pt => "pt",
        Unit::Pc => "pc",
        Unit::Percent => "%",
    };

    format!("{}{}", length.number, unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> Rect {
        Rect::from_xywh(10.0, 20.0, 100.0, 50.0).unwrap()
    }

    #[test]
    fn object_bounding_box_percent() {
        let opt = Options::default();
        let x = convert_length(
            parse_length("-10%").unwrap(),
            RegionAttribute::X,
            Units::ObjectBoundingBox,
            bbox(),
            &opt,
        );
        assert_eq!(x, 0.0);

        let h = convert_length(
            parse_length("120%").unwrap(),
            RegionAttribute::Height,
            Units::ObjectBoundingBox,
            bbox(),
            &opt,
        );
        assert_eq!(h, 60.0);
    }

    #[test]
    fn object_bounding_box_fraction() {
        let opt = Options::default();
        let y = convert_length(
            parse_length("0.5").unwrap(),
            RegionAttribute::Y,
            Units::ObjectBoundingBox,
            bbox(),
            &opt,
        );
        assert_eq!(y, 45.0);
    }

    #[test]
    fn user_space_units() {
        let mut opt = Options::default();
        let w = convert_length(
            parse_length("1in").unwrap(),
            RegionAttribute::Width,
            Units::UserSpaceOnUse,
            bbox(),
            &opt,
        );
        assert_eq!(w, 96.0);

        opt.viewport = Rect::from_xywh(0.0, 0.0, 200.0, 400.0);
        let h = convert_length(
            parse_length("25%").unwrap(),
            RegionAttribute::Height,
            Units::UserSpaceOnUse,
            bbox(),
            &opt,
        );
        assert_eq!(h, 100.0);
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number("2.5"), Some(2.5));
        assert_eq!(parse_number("2.5 3"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number_pair("2"), Some((2.0, 2.0)));
        assert_eq!(parse_number_pair("2, 3"), Some((2.0, 3.0)));
        assert_eq!(parse_number_pair("1 2 3"), None);
    }

    #[test]
    fn length_round_trip() {
        for text in ["-10%", "120%", "5", "2.5mm", "1em"] {
            let length = parse_length(text).unwrap();
            assert_eq!(parse_length(&length_to_string(length)), Some(length));
        }
    }
}
