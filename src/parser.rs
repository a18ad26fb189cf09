// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::borrow::Cow;
use std::str::FromStr;

use crate::primitive::{LightSource, Primitive, TransferChannel};
use crate::writer::{INKSCAPE_NS, XLINK_NS};
use crate::{Error, FilterGraph};

impl FromStr for FilterGraph {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let doc = roxmltree::Document::parse(text).map_err(Error::ParsingFailed)?;
        FilterGraph::from_node(doc.root_element())
    }
}

impl FilterGraph {
    /// Builds a filter from a `filter` element.
    ///
    /// Unknown children and attributes are skipped. Unset `in2` inputs
    /// are resolved afterwards, just like after [`FilterGraph::update`].
    pub fn from_node(node: roxmltree::Node) -> Result<Self, Error> {
        if node.tag_name().name() != "filter" {
            return Err(Error::NotAFilter);
        }

        let mut graph = FilterGraph::new();
        for (key, value) in attributes(node) {
            if !graph.set_attribute(&key, Some(value)) {
                log::debug!("Unsupported filter attribute '{}'.", key);
            }
        }

        for child in node.children().filter(|n| n.is_element()) {
            let name = child.tag_name().name();
            let primitive = match Primitive::from_element_name(name) {
                Some(v) => v,
                None => {
                    log::warn!("'{}' is not a filter primitive. Skipped.", name);
                    continue;
                }
            };

            let idx = graph.add_primitive(primitive);
            for (key, value) in attributes(child) {
                if !graph.set_primitive_attribute(idx, &key, Some(value)) {
                    log::debug!("Unsupported {} attribute '{}'.", name, key);
                }
            }

            parse_children(&mut graph, idx, child);
        }

        graph.update();
        Ok(graph)
    }
}

fn parse_children(graph: &mut FilterGraph, idx: usize, node: roxmltree::Node) {
    let mut has_light = false;
    for child in node.children().filter(|n| n.is_element()) {
        let name = child.tag_name().name();

        if name == "feMergeNode" {
            let input = child.attribute("in");
            if !graph.push_merge_input(idx, input) {
                log::warn!("feMergeNode outside of feMerge. Skipped.");
            }
        } else if let Some(channel) = TransferChannel::from_element_name(name) {
            for (key, value) in attributes(child) {
                graph.set_transfer_function_attribute(idx, channel, &key, Some(value));
            }
        } else if let Some(light) = LightSource::from_element_name(name) {
            // Only the first light source is used.
            if has_light || !graph.set_light_source(idx, Some(light)) {
                continue;
            }

            has_light = true;
            for (key, value) in attributes(child) {
                graph.set_light_source_attribute(idx, &key, Some(value));
            }
        } else {
            log::warn!("Unexpected '{}' child element. Skipped.", name);
        }
    }
}

/// Returns element attributes with namespace-qualified names.
///
/// Attributes from unknown namespaces are skipped.
fn attributes<'a>(node: roxmltree::Node<'a, '_>) -> Vec<(Cow<'a, str>, &'a str)> {
    node.attributes()
        .filter_map(|attr| {
            let key = match attr.namespace() {
                None => Cow::Borrowed(attr.name()),
                Some(XLINK_NS) => Cow::Owned(format!("xlink:{}", attr.name())),
                Some(INKSCAPE_NS) => Cow::Owned(format!("inkscape:{}", attr.name())),
                Some(_) => return None,
            };

            Some((key, attr.value()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Kind;
    use crate::Slot;

    #[test]
    fn not_a_filter() {
        assert!(matches!(
            "<svg/>".parse::<FilterGraph>(),
            Err(Error::NotAFilter)
        ));
    }

    #[test]
    fn malformed() {
        assert!(matches!(
            "<filter>".parse::<FilterGraph>(),
            Err(Error::ParsingFailed(_))
        ));
    }

    #[test]
    fn unknown_children_are_skipped() {
        let graph: FilterGraph = "<filter><desc/><feOffset dx='2'/></filter>".parse().unwrap();
        assert_eq!(graph.primitives().len(), 1);
    }

    #[test]
    fn merge_nodes() {
        let text = "
        <filter>
            <feFlood result='a'/>
            <feMerge>
                <feMergeNode in='a'/>
                <feMergeNode in='SourceGraphic'/>
                <feMergeNode/>
            </feMerge>
        </filter>";

        let graph: FilterGraph = text.parse().unwrap();
        let a = graph.namespace().slot_for_input_name("a");
        match graph.primitives()[1].kind() {
            Kind::Merge(fe) => {
                assert_eq!(fe.inputs(), &[a, Slot::SOURCE_GRAPHIC, Slot::NOT_SET]);
            }
            _ => panic!("feMerge expected"),
        }
    }

    #[test]
    fn light_source_attributes() {
        let text = "
        <filter>
            <feDiffuseLighting>
                <fePointLight x='1' y='2' z='3'/>
                <feDistantLight/>
            </feDiffuseLighting>
        </filter>";

        let graph: FilterGraph = text.parse().unwrap();
        match graph.primitives()[0].kind() {
            Kind::DiffuseLighting(fe) => assert_eq!(
                fe.light_source(),
                Some(LightSource::Point { x: 1.0, y: 2.0, z: 3.0 })
            ),
            _ => panic!("feDiffuseLighting expected"),
        }
    }

    #[test]
    fn namespaced_attributes() {
        let text = "
        <filter xmlns:xlink='http://www.w3.org/1999/xlink'
                xmlns:inkscape='http://www.inkscape.org/namespaces/inkscape'
                inkscape:auto-region='false'>
            <feImage xlink:href='#shape'/>
        </filter>";

        let graph: FilterGraph = text.parse().unwrap();
        assert!(!graph.auto_region());
        assert!(!graph.valid_for("shape"));
        assert!(graph.valid_for("other"));
    }
}
