use crate::normalizer::{
    element_text, element_text_any, localized_text, parse_amount, parse_count, parse_flag,
};
use crate::sources::kyero_feed::{extract_features, extract_images};
use crate::sources::FeedParser;
use crate::types::Property;
use roxmltree::{Document, Node};
use tracing::{debug, warn};

/// Parser for the Background Properties (Sooprema) feed variant.
///
/// Records live at `sooprema/properties/property`, location fields are
/// nested under `<location>`, bedrooms are `<rooms>`, and only records with
/// `saleType == 1` (new builds) are kept.
pub struct SoopremaParser {
    source: String,
}

impl SoopremaParser {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
        }
    }

    fn parse_record(&self, node: Node) -> Property {
        let location = node.children().find(|n| n.has_tag_name("location"));

        let town = location
            .map(|l| element_text(l, "town"))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| element_text(node, "town"));
        let province = location
            .map(|l| element_text(l, "province"))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| element_text(node, "province"));
        let zone = location
            .map(|l| element_text(l, "zone"))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| element_text(node, "zone"));

        Property {
            reference: element_text(node, "reference"),
            title: localized_text(node, "title"),
            description: localized_text(node, "description"),
            property_type: localized_text(node, "type"),
            bedrooms: parse_count(&element_text_any(node, &["rooms", "bedrooms"])),
            bathrooms: parse_count(&element_text_any(node, &["baths", "bathrooms"])),
            built_area: parse_amount(&element_text(node, "built")),
            plot_area: parse_amount(&element_text(node, "plot")),
            price: parse_amount(&element_text(node, "price")),
            town,
            province,
            zone,
            images: extract_images(node),
            features: extract_features(node),
            pool: parse_flag(&element_text(node, "pool")),
            views: element_text(node, "views"),
            orientation: element_text(node, "orientation"),
            source: self.source.clone(),
        }
    }
}

impl FeedParser for SoopremaParser {
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
            .filter(|n| n.is_element() && n.has_tag_name("properties"))
            .flat_map(|props| {
                props
                    .children()
                    .filter(|n| n.is_element() && n.has_tag_name("property"))
                    .collect::<Vec<_>>()
            })
            .filter(|n| element_text(*n, "saleType") == "1")
            .map(|n| self.parse_record(n))
            .collect();

        debug!(
            "Parsed {} Sooprema records from '{}'",
            records.len(),
            self.source
        );
        records
    }
}
