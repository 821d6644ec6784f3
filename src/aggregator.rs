//! Group-by-key aggregation of canonical properties into area, developer
//! and development rollups. All three algorithms share one shape: group,
//! then fold. Numeric ranges only ever fold strictly positive values, so a
//! group with no data has no range at all.

use crate::mapping::MappingTable;
use crate::normalizer::slugify;
use crate::types::{
    AreaRollup, DeveloperRollup, DevelopmentKey, DevelopmentRollup, Property, RangeStats,
};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

const MAX_ROLLUP_IMAGES: usize = 10;
const DELIVERY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Concatenate feed outputs, resolving cross-feed reference collisions
/// last-write-wins: a later record replaces an earlier one in place, so the
/// merged list keeps the first occurrence's position and the last
/// occurrence's data.
pub fn merge_feeds(batches: Vec<Vec<Property>>) -> Vec<Property> {
    let mut merged: Vec<Property> = Vec::new();
    let mut index_by_ref: HashMap<String, usize> = HashMap::new();

    for property in batches.into_iter().flatten() {
        if property.reference.is_empty() {
            merged.push(property);
            continue;
        }
        match index_by_ref.get(&property.reference).copied() {
            Some(i) => merged[i] = property,
            None => {
                index_by_ref.insert(property.reference.clone(), merged.len());
                merged.push(property);
            }
        }
    }

    merged
}

/// Group by town: count plus min/max over non-zero prices. Properties with
/// an empty town are excluded — they cannot back an area guide.
pub fn aggregate_areas(properties: &[Property]) -> Vec<AreaRollup> {
    struct AreaAcc {
        count: usize,
        price_range: Option<RangeStats>,
        types: BTreeSet<String>,
    }

    let mut groups: HashMap<String, AreaAcc> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for property in properties {
        if property.town.is_empty() {
            continue;
        }
        let acc = groups.entry(property.town.clone()).or_insert_with(|| {
            order.push(property.town.clone());
            AreaAcc {
                count: 0,
                price_range: None,
                types: BTreeSet::new(),
            }
        });
        acc.count += 1;
        acc.price_range = RangeStats::fold(acc.price_range, property.price);
        if !property.property_type.is_empty() {
            acc.types.insert(property.property_type.clone());
        }
    }

    let mut rollups: Vec<AreaRollup> = order
        .into_iter()
        .map(|town| {
            let acc = groups.remove(&town).expect("group for ordered town");
            AreaRollup {
                slug: slugify(&town),
                town,
                property_count: acc.count,
                price_range: acc.price_range,
                property_types: acc.types.into_iter().collect(),
            }
        })
        .collect();

    rollups.sort_by(|a, b| b.property_count.cmp(&a.property_count).then(a.town.cmp(&b.town)));
    info!("Aggregated {} areas", rollups.len());
    rollups
}

/// Group mapped properties by developer: set-union of development names and
/// zones, the full reference list, the delivery window, and the golf flag.
/// Unmapped properties contribute nothing.
pub fn aggregate_developers(
    properties: &[Property],
    mapping: &MappingTable,
) -> Vec<DeveloperRollup> {
    struct DeveloperAcc {
        developments: BTreeSet<String>,
        zones: BTreeSet<String>,
        references: Vec<String>,
        earliest: Option<(NaiveDate, String)>,
        latest: Option<(NaiveDate, String)>,
    }

    let mut groups: HashMap<String, DeveloperAcc> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for property in properties {
        let Some(info) = mapping.lookup(&property.reference) else {
            continue;
        };
        let acc = groups.entry(info.developer.clone()).or_insert_with(|| {
            order.push(info.developer.clone());
            DeveloperAcc {
                developments: BTreeSet::new(),
                zones: BTreeSet::new(),
                references: Vec::new(),
                earliest: None,
                latest: None,
            }
        });
        acc.developments.insert(info.development.clone());
        if let Some(zone) = &info.zone {
            if !zone.is_empty() {
                acc.zones.insert(zone.clone());
            }
        }
        acc.references.push(property.reference.clone());

        if let Ok(date) = NaiveDate::parse_from_str(&info.delivery_date, DELIVERY_DATE_FORMAT) {
            if acc.earliest.as_ref().map_or(true, |(d, _)| date < *d) {
                acc.earliest = Some((date, info.delivery_date.clone()));
            }
            if acc.latest.as_ref().map_or(true, |(d, _)| date > *d) {
                acc.latest = Some((date, info.delivery_date.clone()));
            }
        }
    }

    let mut rollups: Vec<DeveloperRollup> = order
        .into_iter()
        .map(|developer| {
            let acc = groups.remove(&developer).expect("group for ordered developer");
            let is_golf_specialist = acc
                .zones
                .iter()
                .any(|z| z.to_lowercase().contains("golf"));
            DeveloperRollup {
                slug: slugify(&developer),
                developer,
                developments: acc.developments.into_iter().collect(),
                zones: acc.zones.into_iter().collect(),
                references: acc.references,
                is_golf_specialist,
                earliest_delivery: acc.earliest.map(|(_, s)| s),
                latest_delivery: acc.latest.map(|(_, s)| s),
            }
        })
        .collect();

    rollups.sort_by(|a, b| {
        b.references
            .len()
            .cmp(&a.references.len())
            .then(a.developer.cmp(&b.developer))
    });
    info!("Aggregated {} developers", rollups.len());
    rollups
}

/// Group mapped properties by `(developer, development)` and fold ranges,
/// distinct types, the pool flag and a capped deduplicated image list. A
/// rollup whose properties all reported price 0 is discarded: it cannot
/// support pricing-led content.
pub fn aggregate_developments(
    properties: &[Property],
    mapping: &MappingTable,
) -> Vec<DevelopmentRollup> {
    struct DevelopmentAcc {
        count: usize,
        price_range: Option<RangeStats>,
        bedroom_range: Option<RangeStats>,
        bathroom_range: Option<RangeStats>,
        built_area_range: Option<RangeStats>,
        plot_area_range: Option<RangeStats>,
        types: BTreeSet<String>,
        has_pool: bool,
        images: Vec<String>,
        seen_images: HashSet<String>,
        representative_reference: String,
        zone: Option<String>,
        delivery_date: String,
    }

    let mut groups: HashMap<DevelopmentKey, DevelopmentAcc> = HashMap::new();
    let mut order: Vec<DevelopmentKey> = Vec::new();

    for property in properties {
        let Some(info) = mapping.lookup(&property.reference) else {
            continue;
        };
        let key = DevelopmentKey {
            developer: info.developer.clone(),
            development: info.development.clone(),
        };
        let acc = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            DevelopmentAcc {
                count: 0,
                price_range: None,
                bedroom_range: None,
                bathroom_range: None,
                built_area_range: None,
                plot_area_range: None,
                types: BTreeSet::new(),
                has_pool: false,
                images: Vec::new(),
                seen_images: HashSet::new(),
                representative_reference: property.reference.clone(),
                zone: info.zone.clone().filter(|z| !z.is_empty()),
                delivery_date: info.delivery_date.clone(),
            }
        });

        acc.count += 1;
        acc.price_range = RangeStats::fold(acc.price_range, property.price);
        acc.bedroom_range = RangeStats::fold(acc.bedroom_range, property.bedrooms as u64);
        acc.bathroom_range = RangeStats::fold(acc.bathroom_range, property.bathrooms as u64);
        acc.built_area_range = RangeStats::fold(acc.built_area_range, property.built_area);
        acc.plot_area_range = RangeStats::fold(acc.plot_area_range, property.plot_area);
        if !property.property_type.is_empty() {
            acc.types.insert(property.property_type.clone());
        }
        acc.has_pool = acc.has_pool || property.pool;
        for image in &property.images {
            if acc.images.len() >= MAX_ROLLUP_IMAGES {
                break;
            }
            if acc.seen_images.insert(image.clone()) {
                acc.images.push(image.clone());
            }
        }
    }

    let total_groups = order.len();
    let mut rollups: Vec<DevelopmentRollup> = order
        .into_iter()
        .filter_map(|key| {
            let acc = groups.remove(&key).expect("group for ordered key");
            // No usable price means no pricing-led content; drop the group.
            let price_from = acc.price_range?.min;
            Some(DevelopmentRollup {
                slug: slugify(&key.development),
                developer: key.developer,
                development: key.development,
                property_count: acc.count,
                price_from,
                bedroom_range: acc.bedroom_range,
                bathroom_range: acc.bathroom_range,
                built_area_range: acc.built_area_range,
                plot_area_range: acc.plot_area_range,
                property_types: acc.types.into_iter().collect(),
                has_pool: acc.has_pool,
                images: acc.images,
                representative_reference: acc.representative_reference,
                zone: acc.zone,
                delivery_date: acc.delivery_date,
            })
        })
        .collect();

    if rollups.len() < total_groups {
        debug!(
            "Discarded {} development rollups with no usable price",
            total_groups - rollups.len()
        );
    }

    rollups.sort_by(|a, b| {
        b.property_count
            .cmp(&a.property_count)
            .then(a.slug.cmp(&b.slug))
    });
    info!("Aggregated {} developments", rollups.len());
    rollups
}
