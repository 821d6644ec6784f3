use std::env;
use std::path::PathBuf;

/// XML schema variant a feed speaks. Each variant has its own parser in
/// `sources/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Kyero,
    Sooprema,
}

/// One entry of the static feed table: name, endpoint, schema, enabled flag.
#[derive(Debug, Clone)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
    pub format: FeedFormat,
    pub enabled: bool,
}

impl FeedSpec {
    pub fn new(name: &str, url: &str, format: FeedFormat, enabled: bool) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            format,
            enabled,
        }
    }
}

/// HTTP fetch settings shared by all feed sources.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Property-Aggregator/1.0".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 5,
            max_redirects: 5,
        }
    }
}

/// Model call and per-entity retry settings.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub model: String,
    pub max_tokens: u32,
    /// Generation attempts per entity before the entity is counted failed.
    pub max_attempts: u32,
    /// Base of the linear backoff between attempts: attempt N sleeps N * base.
    pub retry_base_delay_ms: u64,
    /// Courtesy pause after every successful generation.
    pub post_generation_delay_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 4000,
            max_attempts: 3,
            retry_base_delay_ms: 2000,
            post_generation_delay_ms: 1000,
        }
    }
}

/// Everything the pipeline needs, passed explicitly into the orchestrator.
/// There is no global state: tests construct their own config with doubles
/// for the HTTP and model clients.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub feeds: Vec<FeedSpec>,
    pub content_dir: PathBuf,
    pub mapping_path: PathBuf,
    pub regenerate_all: bool,
    pub fetch: FetchConfig,
    pub generation: GenerationConfig,
}

impl PipelineConfig {
    /// Default configuration: the production feed table, `src/content` as
    /// the artifact root, and `REGENERATE_ALL` read from the environment.
    pub fn from_env() -> Self {
        Self {
            feeds: default_feeds(),
            content_dir: PathBuf::from("src/content"),
            mapping_path: PathBuf::from("data/property-development-mapping.json"),
            regenerate_all: env::var("REGENERATE_ALL").as_deref() == Ok("true"),
            fetch: FetchConfig::default(),
            generation: GenerationConfig::default(),
        }
    }

    pub fn enabled_feeds(&self) -> Vec<&FeedSpec> {
        self.feeds.iter().filter(|f| f.enabled).collect()
    }
}

/// The static production feed table. The special REDSP feed stays disabled:
/// its records carry empty town fields and poison area aggregation.
fn default_feeds() -> Vec<FeedSpec> {
    vec![
        FeedSpec::new(
            "general",
            "https://xml.redsp.net/file/450/23a140q0551/general-zone-1-kyero.xml",
            FeedFormat::Kyero,
            true,
        ),
        FeedSpec::new(
            "background",
            "https://backgroundproperties.com/wp-load.php?security_token=23f0185aeb5102e7&export_id=19&action=get_data",
            FeedFormat::Sooprema,
            true,
        ),
        FeedSpec::new(
            "special",
            "https://xml.redsp.net/files/450/94015ams84x/test-redsp_v4.xml",
            FeedFormat::Kyero,
            false,
        ),
    ]
}
