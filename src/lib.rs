// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`fegraph` is an SVG filter effects engine.

A [`FilterGraph`] holds an ordered list of filter primitives connected
through named result slots. It resolves the filter region, computes how much
a filter enlarges the painted area, estimates the rendering cost and renders
the chain on top of a [`tiny_skia::Pixmap`].

A filter can be built programmatically or parsed from a `filter` element:

```
let graph: fegraph::FilterGraph = "
<filter>
    <feGaussianBlur stdDeviation='2' result='blur'/>
    <feOffset in='blur' dx='3' dy='3'/>
</filter>".parse().unwrap();

assert_eq!(graph.primitives().len(), 2);
```
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::identity_op)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::wrong_self_convention)]

mod error;
mod filter;
mod geom;
mod item;
mod observer;
mod options;
mod parser;
pub mod primitive;
mod region;
mod render;
mod slot;
mod units;
mod writer;

pub use error::Error;
pub use filter::{FilterGraph, FilterState};
pub use geom::{Rect, ScreenRect};
pub use item::{
    DrawingItem, DrawingSurface, ElementRegistry, NoResources, RenderContext, ResourceProvider,
};
pub use observer::{Connection, ModifiedSignal};
pub use options::{BlurQuality, FilterQuality, Options};
pub use slot::{Slot, SlotNamespace};
pub use units::Units;
pub use writer::WriteOptions;

pub use tiny_skia;
pub use xmlwriter::Indent;

use float_cmp::ApproxEqUlps;

pub(crate) trait ApproxZero: ApproxEqUlps {
    fn is_fuzzy_zero(&self) -> bool;
}

impl ApproxZero for f32 {
    #[inline]
    fn is_fuzzy_zero(&self) -> bool {
        self.approx_eq_ulps(&0.0, 4)
    }
}

impl ApproxZero for f64 {
    #[inline]
    fn is_fuzzy_zero(&self) -> bool {
        self.approx_eq_ulps(&0.0, 4)
    }
}

/// Logs when an optional value is missing.
pub(crate) trait OptionLog {
    fn log_none<F: FnOnce()>(self, f: F) -> Self;
}

impl<T> OptionLog for Option<T> {
    #[inline]
    fn log_none<F: FnOnce()>(self, f: F) -> Self {
        self.or_else(|| {
            f();
            None
        })
    }
}
