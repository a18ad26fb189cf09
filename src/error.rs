// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// List of all errors.
#[derive(Debug)]
pub enum Error {
    /// A filter region or a working raster has no area.
    InvalidRegion,

    /// The backend failed to allocate a surface.
    SurfaceAllocation {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Failed to parse an XML data.
    ParsingFailed(roxmltree::Error),

    /// The root element is not a `filter`.
    NotAFilter,
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::ParsingFailed(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::InvalidRegion => {
                write!(f, "filter has an invalid region")
            }
            Error::SurfaceAllocation { width, height } => {
                write!(f, "failed to allocate a {}x{} surface", width, height)
            }
            Error::ParsingFailed(ref e) => {
                write!(f, "SVG data parsing failed cause {}", e)
            }
            Error::NotAFilter => {
                write!(f, "the root element is not a filter")
            }
        }
    }
}

impl std::error::Error for Error {}
