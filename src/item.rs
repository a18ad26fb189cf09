// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Interfaces of the scene graph and the document that filters call into.

use tiny_skia::{Pixmap, PixmapMut, Transform};

use crate::{ModifiedSignal, Options, Rect, ScreenRect};

/// A rendered item a filter is applied to.
pub trait DrawingItem {
    /// The id of the document element behind this item.
    fn id(&self) -> Option<&str> {
        None
    }

    /// The item bounding box without stroke and filters, in user space.
    fn geometric_bbox(&self) -> Option<Rect>;

    /// The item bounding box with stroke, in user space.
    fn visual_bbox(&self) -> Option<Rect> {
        self.geometric_bbox()
    }

    /// User space to device space transform.
    fn ctm(&self) -> Transform;

    /// A color used by the `FillPaint` input.
    fn fill_paint(&self) -> Option<tiny_skia::Color> {
        None
    }

    /// A color used by the `StrokePaint` input.
    fn stroke_paint(&self) -> Option<tiny_skia::Color> {
        None
    }
}

/// A raster surface positioned in device space.
pub struct DrawingSurface {
    pixmap: Pixmap,
    area: ScreenRect,
}

impl DrawingSurface {
    /// Creates a surface covering a device area.
    ///
    /// Returns `None` when the area is empty or too big.
    pub fn new(area: ScreenRect) -> Option<Self> {
        let pixmap = Pixmap::new(area.width(), area.height())?;
        Some(DrawingSurface { pixmap, area })
    }

    /// Wraps a pixmap whose top-left corner is at `(x, y)` in device space.
    pub fn from_pixmap(pixmap: Pixmap, x: i32, y: i32) -> Self {
        let area = ScreenRect::from_xywh(x, y, pixmap.width(), pixmap.height());
        DrawingSurface { pixmap, area }
    }

    /// The device area covered by the surface.
    pub fn area(&self) -> ScreenRect {
        self.area
    }

    /// The surface pixels.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// The surface pixels, for modification.
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Consumes the surface.
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }
}

/// External resources a filter may need during rendering.
pub trait ResourceProvider {
    /// Decodes an external image referenced by `feImage`.
    fn decode_image(&self, href: &str) -> Option<Pixmap> {
        let _ = href;
        None
    }

    /// Renders a document element referenced by `feImage`.
    ///
    /// `transform` maps element user space onto `canvas`.
    /// Returns `false` when the element does not exist.
    fn render_element(&self, id: &str, transform: Transform, canvas: &mut PixmapMut) -> bool {
        let _ = (id, transform, canvas);
        false
    }
}

/// A provider without any resources.
#[derive(Clone, Copy, Default, Debug)]
pub struct NoResources;

impl ResourceProvider for NoResources {}

/// A lookup of element modification signals.
pub trait ElementRegistry {
    /// Returns a signal emitted whenever the element with `id` changes.
    fn modified_signal(&self, id: &str) -> Option<ModifiedSignal>;
}

/// Everything a filter needs from its caller besides the item.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Rendering options.
    pub options: &'a Options,
    /// A source of external images and referenced elements.
    pub resources: &'a dyn ResourceProvider,
}

impl<'a> RenderContext<'a> {
    /// Creates a new context.
    pub fn new(options: &'a Options, resources: &'a dyn ResourceProvider) -> Self {
        RenderContext { options, resources }
    }
}

impl std::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("options", self.options)
            .finish()
    }
}
