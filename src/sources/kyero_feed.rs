use crate::normalizer::{
    descendant_elements, element_text, element_text_any, localized_text, parse_amount,
    parse_count, parse_flag,
};
use crate::sources::FeedParser;
use crate::types::Property;
use roxmltree::{Document, Node};
use tracing::{debug, warn};

/// Parser for the REDSP Kyero feed variant.
///
/// Property records are direct `<property>` children of the document root,
/// title/description/type come as localized per-language blocks, surface
/// areas live under `<surface_area>`, and images are `<image><url>` pairs.
pub struct KyeroParser {
    source: String,
}

impl KyeroParser {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
        }
    }

    fn parse_record(&self, node: Node) -> Property {
        // The feed's `id` is the stable reference; older exports used `ref`.
        let reference = element_text_any(node, &["id", "ref", "reference"]);

        let title = {
            let t = localized_text(node, "title");
            if t.is_empty() && !reference.is_empty() {
                format!("Property {}", reference)
            } else {
                t
            }
        };

        let built_area = {
            let nested = node
                .children()
                .find(|n| n.has_tag_name("surface_area"))
                .map(|n| element_text(n, "built"))
                .unwrap_or_default();
            if nested.is_empty() {
                parse_amount(&element_text_any(node, &["built", "built_size"]))
            } else {
                parse_amount(&nested)
            }
        };

        let plot_area = {
            let nested = node
                .children()
                .find(|n| n.has_tag_name("surface_area"))
                .map(|n| element_text(n, "plot"))
                .unwrap_or_default();
            if nested.is_empty() {
                parse_amount(&element_text_any(node, &["plot", "plot_size"]))
            } else {
                parse_amount(&nested)
            }
        };

        Property {
            reference,
            title,
            description: localized_text(node, "desc"),
            property_type: localized_text(node, "type"),
            bedrooms: parse_count(&element_text_any(node, &["beds", "bedrooms"])),
            bathrooms: parse_count(&element_text_any(node, &["baths", "bathrooms"])),
            built_area,
            plot_area,
            price: parse_amount(&element_text(node, "price")),
            town: element_text(node, "town"),
            province: element_text(node, "province"),
            zone: element_text_any(node, &["location_detail", "zone"]),
            images: extract_images(node),
            features: extract_features(node),
            pool: parse_flag(&element_text(node, "pool")),
            views: element_text(node, "views"),
            orientation: element_text(node, "orientation"),
            source: self.source.clone(),
        }
    }
}

impl FeedParser for KyeroParser {
    fn source(&self) -> &str {
        &self.source
    }

    fn parse(&self, xml: &str) -> Vec<Property> {
        let doc = match Document::parse(xml) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Feed '{}' is not well-formed XML: {}", self.source, e);
                return Vec::new();
            }
        };

        let records: Vec<Property> = doc
            .root_element()
            .children()
            .filter(|n| n.is_element() && n.has_tag_name("property"))
            .map(|n| self.parse_record(n))
            .collect();

        debug!("Parsed {} Kyero records from '{}'", records.len(), self.source);
        records
    }
}

/// Image URLs in document order, tolerating both `<image><url>..</url></image>`
/// and bare `<image>url</image>` shapes.
pub(crate) fn extract_images(node: Node) -> Vec<String> {
    descendant_elements(node, "image")
        .into_iter()
        .filter_map(|img| {
            let url = element_text(img, "url");
            if !url.is_empty() {
                return Some(url);
            }
            img.text()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
        })
        .collect()
}

pub(crate) fn extract_features(node: Node) -> Vec<String> {
    descendant_elements(node, "feature")
        .into_iter()
        .filter_map(|f| {
            f.text()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
        })
        .collect()
}
