// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::Rect;

/// A filter rendering quality.
///
/// Lower levels cap the automatically selected filter resolution.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum FilterQuality {
    Worst,
    Worse,
    Normal,
    Better,
    Best,
}

impl FilterQuality {
    /// Returns the maximum resolution of the longer side, if limited.
    pub fn resolution_limit(self) -> Option<f32> {
        match self {
            FilterQuality::Worst => Some(32.0),
            FilterQuality::Worse => Some(64.0),
            FilterQuality::Normal => Some(256.0),
            FilterQuality::Better | FilterQuality::Best => None,
        }
    }
}

impl Default for FilterQuality {
    fn default() -> Self {
        FilterQuality::Best
    }
}

/// A Gaussian blur rendering quality.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum BlurQuality {
    Worst,
    Worse,
    Normal,
    Better,
    Best,
}

impl BlurQuality {
    /// Standard deviations below this value use an exact Gaussian kernel.
    ///
    /// Larger ones use a three-pass box blur approximation.
    pub fn exact_kernel_threshold(self) -> f32 {
        match self {
            BlurQuality::Worst => 0.0,
            BlurQuality::Worse => 1.0,
            BlurQuality::Normal => 2.0,
            BlurQuality::Better => 4.0,
            BlurQuality::Best => 8.0,
        }
    }
}

impl Default for BlurQuality {
    fn default() -> Self {
        BlurQuality::Best
    }
}

/// Filter rendering options.
#[derive(Clone, Debug)]
pub struct Options {
    /// Filter quality.
    ///
    /// Default: Best
    pub quality: FilterQuality,

    /// Gaussian blur quality.
    ///
    /// Default: Best
    pub blur_quality: BlurQuality,

    /// Target DPI.
    ///
    /// Impacts absolute length units conversion.
    ///
    /// Default: 96.0
    pub dpi: f32,

    /// A font size for `em` and `ex` units.
    ///
    /// Default: 12
    pub font_size: f32,

    /// The nearest viewport in user space.
    ///
    /// Used to resolve percentages in `userSpaceOnUse` mode.
    /// When not set, the item bounding box is used instead.
    ///
    /// Default: `None`
    pub viewport: Option<Rect>,

    /// A maximum width and height of any raster allocated by a filter.
    ///
    /// Applies to an explicit `filterRes` as well.
    ///
    /// Default: 8192
    pub max_resolution: u32,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            quality: FilterQuality::default(),
            blur_quality: BlurQuality::default(),
            dpi: 96.0,
            font_size: 12.0,
            viewport: None,
            max_resolution: 8192,
        }
    }
}
