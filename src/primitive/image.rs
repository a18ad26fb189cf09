// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use svgtypes::{Align, AspectRatio};
use tiny_skia::Pixmap;

use crate::{Connection, ElementRegistry, ResourceProvider};

/// An `feImage` reference.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ImageSource {
    /// No `href`. Renders nothing.
    None,
    /// A document element, referenced by `#id`. Stores the id without `#`.
    Element(String),
    /// An external raster image.
    External(String),
}

impl ImageSource {
    fn parse(href: &str) -> Self {
        let href = href.trim();
        if href.is_empty() {
            ImageSource::None
        } else if let Some(id) = href.strip_prefix('#') {
            ImageSource::Element(id.to_string())
        } else {
            ImageSource::External(href.to_string())
        }
    }

    pub(crate) fn to_href(&self) -> Option<String> {
        match self {
            ImageSource::None => None,
            ImageSource::Element(ref id) => Some(format!("#{}", id)),
            ImageSource::External(ref href) => Some(href.clone()),
        }
    }
}

/// An `feImage` filter primitive.
pub struct Image {
    pub(crate) source: ImageSource,
    pub(crate) aspect: AspectRatio,
    decoded: OnceCell<Option<Arc<Pixmap>>>,
    connection: Option<Connection>,
}

impl Default for Image {
    fn default() -> Self {
        Image {
            source: ImageSource::None,
            aspect: AspectRatio::default(),
            decoded: OnceCell::new(),
            connection: None,
        }
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("source", &self.source)
            .field("aspect", &self.aspect)
            .field("decoded", &self.decoded.get().map(|v| v.is_some()))
            .field("observed", &self.connection.is_some())
            .finish()
    }
}

impl Image {
    /// The `href` target.
    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// The `preserveAspectRatio` used to place an external image.
    pub fn aspect(&self) -> AspectRatio {
        self.aspect
    }

    /// Checks that the image does not reference the element with `id`.
    pub fn valid_for(&self, id: &str) -> bool {
        match self.source {
            ImageSource::Element(ref element) => element != id,
            _ => true,
        }
    }

    /// Checks that a referenced element is being observed.
    pub fn is_observed(&self) -> bool {
        self.connection.is_some()
    }

    pub(crate) fn set_attribute(&mut self, key: &str, value: Option<&str>) -> bool {
        match key {
            "xlink:href" | "href" => {
                let source = value.map(ImageSource::parse).unwrap_or(ImageSource::None);
                if source != self.source {
                    self.source = source;
                    self.decoded = OnceCell::new();
                    self.connection = None;
                }
            }
            "preserveAspectRatio" => {
                self.aspect = match value {
                    Some(v) => AspectRatio::from_str(v).unwrap_or_else(|_| {
                        log::warn!("Invalid preserveAspectRatio '{}'.", v);
                        AspectRatio::default()
                    }),
                    None => AspectRatio::default(),
                };
            }
            _ => return false,
        }

        true
    }

    /// Subscribes to the referenced element modifications.
    ///
    /// Every emission sets `dirty`. External images are not observed.
    pub(crate) fn connect(&mut self, registry: &dyn ElementRegistry, dirty: &Arc<AtomicBool>) {
        self.connection = None;

        if let ImageSource::Element(ref id) = self.source {
            match registry.modified_signal(id) {
                Some(signal) => {
                    let dirty = dirty.clone();
                    self.connection = Some(signal.connect(move || {
                        dirty.store(true, Ordering::Release);
                    }));
                }
                None => {
                    log::warn!("feImage references an unknown element '{}'.", id);
                }
            }
        }
    }

    pub(crate) fn disconnect(&mut self) {
        self.connection = None;
    }

    /// Returns the decoded external image.
    ///
    /// Decoding happens once per `href`.
    pub(crate) fn decoded_image(&self, resources: &dyn ResourceProvider) -> Option<Arc<Pixmap>> {
        let href = match self.source {
            ImageSource::External(ref href) => href,
            _ => return None,
        };

        self.decoded
            .get_or_init(|| {
                let image = resources.decode_image(href).map(Arc::new);
                if image.is_none() {
                    log::warn!("Failed to load an feImage '{}'.", href);
                }
                image
            })
            .clone()
    }
}

pub(crate) fn aspect_to_string(aspect: AspectRatio) -> String {
    let align = match aspect.align {
        Align::None => "none",
        Align::XMinYMin => "xMinYMin",
        Align::XMidYMin => "xMidYMin",
        Align::XMaxYMin => "xMaxYMin",
        Align::XMinYMid => "xMinYMid",
        Align::XMidYMid => "xMidYMid",
        Align::XMaxYMid => "xMaxYMid",
        Align::XMinYMax => "xMinYMax",
        Align::XMidYMax => "xMidYMax",
        Align::XMaxYMax => "xMaxYMax",
    };

    let mut s = String::new();
    if aspect.defer {
        s.push_str("defer ");
    }
    s.push_str(align);
    if aspect.slice {
        s.push_str(" slice");
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModifiedSignal, NoResources};
    use std::collections::HashMap;

    struct Registry(HashMap<String, ModifiedSignal>);

    impl ElementRegistry for Registry {
        fn modified_signal(&self, id: &str) -> Option<ModifiedSignal> {
            self.0.get(id).cloned()
        }
    }

    #[test]
    fn href_kinds() {
        let mut fe = Image::default();
        fe.set_attribute("xlink:href", Some("#shape"));
        assert_eq!(fe.source(), &ImageSource::Element("shape".to_string()));
        assert!(!fe.valid_for("shape"));
        assert!(fe.valid_for("other"));

        fe.set_attribute("href", Some("image.png"));
        assert_eq!(fe.source(), &ImageSource::External("image.png".to_string()));
        assert!(fe.valid_for("shape"));

        fe.set_attribute("href", None);
        assert_eq!(fe.source(), &ImageSource::None);
    }

    #[test]
    fn aspect_serialization() {
        let mut fe = Image::default();
        fe.set_attribute("preserveAspectRatio", Some("xMinYMax slice"));
        assert_eq!(aspect_to_string(fe.aspect()), "xMinYMax slice");

        fe.set_attribute("preserveAspectRatio", Some("oops"));
        assert_eq!(fe.aspect(), AspectRatio::default());
    }

    #[test]
    fn observer_marks_dirty() {
        let signal = ModifiedSignal::new();
        let mut map = HashMap::new();
        map.insert("shape".to_string(), signal.clone());
        let registry = Registry(map);

        let dirty = Arc::new(AtomicBool::new(false));
        let mut fe = Image::default();
        fe.set_attribute("href", Some("#shape"));
        fe.connect(&registry, &dirty);
        assert!(fe.is_observed());

        signal.emit();
        assert!(dirty.load(Ordering::Acquire));

        fe.disconnect();
        assert_eq!(signal.connections(), 0);
    }

    #[test]
    fn failed_decode_is_cached() {
        let mut fe = Image::default();
        fe.set_attribute("href", Some("missing.png"));
        assert!(fe.decoded_image(&NoResources).is_none());
        assert!(fe.decoded.get().is_some());
    }
}
