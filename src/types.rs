use serde::{Deserialize, Serialize};

/// Canonical property record every feed variant is normalized into.
///
/// Numeric fields are unsigned: absent or unparseable data is represented
/// as `0`, never as a null or a negative value, so range folds downstream
/// must treat `0` as "no data".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Property {
    pub reference: String,
    pub title: String,
    pub description: String,
    pub property_type: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub built_area: u64,
    pub plot_area: u64,
    pub price: u64,
    pub town: String,
    pub province: String,
    pub zone: String,
    pub images: Vec<String>,
    pub features: Vec<String>,
    pub pool: bool,
    pub views: String,
    pub orientation: String,
    pub source: String,
}

/// Development metadata attached to a property reference via the external
/// mapping table. The delivery date keeps the table's `DD-MM-YYYY` format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentInfo {
    pub developer: String,
    pub development: String,
    pub delivery_date: String,
    #[serde(default)]
    pub zone: Option<String>,
}

/// Min/max over strictly positive contributions. A group where every value
/// was zero has no range at all, so rollups hold `Option<RangeStats>` and
/// omit the field entirely when serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeStats {
    pub min: u64,
    pub max: u64,
}

impl RangeStats {
    /// Fold one value into an optional range, ignoring zero.
    pub fn fold(range: Option<RangeStats>, value: u64) -> Option<RangeStats> {
        if value == 0 {
            return range;
        }
        Some(match range {
            None => RangeStats { min: value, max: value },
            Some(r) => RangeStats {
                min: r.min.min(value),
                max: r.max.max(value),
            },
        })
    }
}

/// Per-town rollup backing area guide generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRollup {
    pub town: String,
    pub slug: String,
    pub property_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<RangeStats>,
    pub property_types: Vec<String>,
}

/// Per-developer rollup aggregated from mapped properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperRollup {
    pub developer: String,
    pub slug: String,
    pub developments: Vec<String>,
    pub zones: Vec<String>,
    pub references: Vec<String>,
    pub is_golf_specialist: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest_delivery: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_delivery: Option<String>,
}

/// Grouping key for development rollups. A struct key cannot collide the
/// way a `developer + separator + development` string can when either
/// component contains the separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DevelopmentKey {
    pub developer: String,
    pub development: String,
}

/// Per-development rollup: all mapped properties sharing one
/// developer/development pair, folded into ranges and distinct sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentRollup {
    pub developer: String,
    pub development: String,
    pub slug: String,
    pub property_count: usize,
    pub price_from: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedroom_range: Option<RangeStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathroom_range: Option<RangeStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub built_area_range: Option<RangeStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_area_range: Option<RangeStats>,
    pub property_types: Vec<String>,
    pub has_pool: bool,
    pub images: Vec<String>,
    pub representative_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    pub delivery_date: String,
}

/// Entity kinds the pipeline can generate content for. Doubles as the
/// artifact directory partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Property,
    Area,
    Developer,
    Development,
}

impl EntityKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            EntityKind::Property => "properties",
            EntityKind::Area => "areas",
            EntityKind::Developer => "developers",
            EntityKind::Development => "developments",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EntityKind::Property => "property",
            EntityKind::Area => "area",
            EntityKind::Developer => "developer",
            EntityKind::Development => "development",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed '{feed}' unreachable: {detail}")]
    Fetch { feed: String, detail: String },

    #[error("feed parse error: {0}")]
    Parse(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("model call failed: {0}")]
    Model(String),

    #[error("no valid JSON recovered for {entity}: {}", raw_sample(.raw))]
    Generation { entity: String, raw: String },

    #[error("failed to persist artifact '{slug}': {source}")]
    Persistence {
        slug: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

fn raw_sample(raw: &str) -> String {
    let sample: String = raw.chars().take(120).collect();
    if raw.chars().count() > 120 {
        format!("{}...", sample)
    } else {
        sample
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
