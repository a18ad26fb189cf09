// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

/// An intermediate image buffer identifier.
///
/// Non-negative values are ordinary buffers allocated by a [`SlotNamespace`].
/// Negative values are reserved for the implicit filter inputs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Slot(i32);

impl Slot {
    /// An input or output that was not specified.
    pub const NOT_SET: Slot = Slot(-1);
    /// The `SourceGraphic` input.
    pub const SOURCE_GRAPHIC: Slot = Slot(-2);
    /// The `SourceAlpha` input.
    pub const SOURCE_ALPHA: Slot = Slot(-3);
    /// The `BackgroundImage` input.
    pub const BACKGROUND_IMAGE: Slot = Slot(-4);
    /// The `BackgroundAlpha` input.
    pub const BACKGROUND_ALPHA: Slot = Slot(-5);
    /// The `FillPaint` input.
    pub const FILL_PAINT: Slot = Slot(-6);
    /// The `StrokePaint` input.
    pub const STROKE_PAINT: Slot = Slot(-7);
    /// An output without a name. Readable only as "the previous result".
    pub const UNNAMED: Slot = Slot(-8);

    /// Creates an ordinary slot.
    #[inline]
    pub fn new(index: u32) -> Self {
        Slot(index.min(i32::MAX as u32) as i32)
    }

    /// Returns the raw slot number.
    #[inline]
    pub fn get(self) -> i32 {
        self.0
    }

    /// Checks that the slot is one of the reserved values.
    #[inline]
    pub fn is_reserved(self) -> bool {
        self.0 < 0
    }

    /// Checks that the slot refers to a background snapshot.
    #[inline]
    pub fn is_background(self) -> bool {
        self == Slot::BACKGROUND_IMAGE || self == Slot::BACKGROUND_ALPHA
    }

    /// Parses a reserved input name.
    ///
    /// Names are case-sensitive.
    pub fn from_reserved_name(name: &str) -> Option<Self> {
        match name {
            "SourceGraphic" => Some(Slot::SOURCE_GRAPHIC),
            "SourceAlpha" => Some(Slot::SOURCE_ALPHA),
            "BackgroundImage" => Some(Slot::BACKGROUND_IMAGE),
            "BackgroundAlpha" => Some(Slot::BACKGROUND_ALPHA),
            "FillPaint" => Some(Slot::FILL_PAINT),
            "StrokePaint" => Some(Slot::STROKE_PAINT),
            _ => None,
        }
    }

    /// Returns the SVG name of a reserved input.
    pub fn reserved_name(self) -> Option<&'static str> {
        match self {
            Slot::SOURCE_GRAPHIC => Some("SourceGraphic"),
            Slot::SOURCE_ALPHA => Some("SourceAlpha"),
            Slot::BACKGROUND_IMAGE => Some("BackgroundImage"),
            Slot::BACKGROUND_ALPHA => Some("BackgroundAlpha"),
            Slot::FILL_PAINT => Some("FillPaint"),
            Slot::STROKE_PAINT => Some("StrokePaint"),
            _ => None,
        }
    }
}

impl Default for Slot {
    fn default() -> Self {
        Slot::NOT_SET
    }
}

/// Maps `result` names to slots within a single filter.
///
/// A name keeps its slot for the namespace lifetime and slot numbers are never reused.
#[derive(Clone, Default, Debug)]
pub struct SlotNamespace {
    names: HashMap<String, Slot>,
    next: u32,
}

impl SlotNamespace {
    /// Creates an empty namespace.
    pub fn new() -> Self {
        SlotNamespace::default()
    }

    /// Returns the slot for a `result` name, allocating a new one when needed.
    pub fn slot_for_result_name(&mut self, name: &str) -> Slot {
        if let Some(slot) = self.names.get(name) {
            return *slot;
        }

        let slot = Slot::new(self.next);
        self.next += 1;
        self.names.insert(name.to_string(), slot);
        slot
    }

    /// Resolves an `in` value.
    ///
    /// Reserved names map to their fixed slots. Unknown names are [`Slot::NOT_SET`].
    pub fn slot_for_input_name(&self, name: &str) -> Slot {
        if let Some(slot) = Slot::from_reserved_name(name) {
            return slot;
        }

        self.names.get(name).copied().unwrap_or(Slot::NOT_SET)
    }

    /// Returns the name of a slot.
    ///
    /// `NOT_SET` and `UNNAMED` have no name.
    pub fn name_for_slot(&self, slot: Slot) -> Option<&str> {
        if let Some(name) = slot.reserved_name() {
            return Some(name);
        }

        if slot.is_reserved() {
            return None;
        }

        self.names
            .iter()
            .find(|(_, s)| **s == slot)
            .map(|(name, _)| name.as_str())
    }

    /// Returns a `resultN` name that is not used yet.
    ///
    /// `N` is one greater than the largest numeric suffix among the known names.
    pub fn next_available_result_name(&self) -> String {
        let max = self
            .names
            .keys()
            .filter_map(|name| name.strip_prefix("result"))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max()
            .unwrap_or(0);

        format!("result{}", max.saturating_add(1))
    }

    /// Returns the number of allocated ordinary slots.
    pub fn len(&self) -> usize {
        self.next as usize
    }

    /// Checks that no ordinary slots were allocated.
    pub fn is_empty(&self) -> bool {
        self.next == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_name_is_idempotent() {
        let mut ns = SlotNamespace::new();
        let a = ns.slot_for_result_name("blur");
        assert_eq!(ns.slot_for_result_name("blur"), a);
        let b = ns.slot_for_result_name("offset");
        assert_ne!(a, b);
        assert_eq!(a, Slot::new(0));
        assert_eq!(b, Slot::new(1));
    }

    #[test]
    fn reserved_inputs_do_not_allocate() {
        let ns = SlotNamespace::new();
        assert_eq!(ns.slot_for_input_name("SourceAlpha"), Slot::SOURCE_ALPHA);
        assert_eq!(ns.slot_for_input_name("StrokePaint"), Slot::STROKE_PAINT);
        assert_eq!(ns.slot_for_input_name("sourcegraphic"), Slot::NOT_SET);
        assert_eq!(ns.slot_for_input_name("missing"), Slot::NOT_SET);
        assert!(ns.is_empty());
    }

    #[test]
    fn reverse_lookup() {
        let mut ns = SlotNamespace::new();
        let slot = ns.slot_for_result_name("glow");
        assert_eq!(ns.name_for_slot(slot), Some("glow"));
        assert_eq!(ns.name_for_slot(Slot::BACKGROUND_ALPHA), Some("BackgroundAlpha"));
        assert_eq!(ns.name_for_slot(Slot::NOT_SET), None);
        assert_eq!(ns.name_for_slot(Slot::UNNAMED), None);
        assert_eq!(ns.name_for_slot(Slot::new(42)), None);
    }

    #[test]
    fn next_result_name() {
        let mut ns = SlotNamespace::new();
        assert_eq!(ns.next_available_result_name(), "result1");
        ns.slot_for_result_name("result7");
        ns.slot_for_result_name("resultX");
        ns.slot_for_result_name("result2");
        let name = ns.next_available_result_name();
        assert_eq!(name, "result8");
        ns.slot_for_result_name(&name);
        assert_eq!(ns.next_available_result_name(), "result9");
    }
}
