use crate::config::{FeedFormat, FeedSpec};
use crate::fetcher::Fetcher;
use crate::types::{Property, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub mod kyero_feed;
pub mod sooprema_feed;

pub use kyero_feed::KyeroParser;
pub use sooprema_feed::SoopremaParser;

/// Per-format adapter turning one feed's raw XML into canonical properties.
///
/// Parsing never fails at the record level: a malformed record degrades to
/// empty/zero fields rather than being dropped, because its existence still
/// matters for counts. A document that is not XML at all yields an empty
/// list.
pub trait FeedParser: Send + Sync {
    /// Feed identifier stamped into every parsed property's `source` field.
    fn source(&self) -> &str;

    fn parse(&self, xml: &str) -> Vec<Property>;
}

/// A source of canonical properties the orchestrator can pull from. Real
/// sources fetch over HTTP; tests substitute a static double.
#[async_trait]
pub trait PropertyFeed: Send + Sync {
    fn name(&self) -> &str;

    async fn pull(&self) -> Result<Vec<Property>>;
}

pub fn parser_for(format: FeedFormat, source: &str) -> Box<dyn FeedParser> {
    match format {
        FeedFormat::Kyero => Box::new(KyeroParser::new(source)),
        FeedFormat::Sooprema => Box::new(SoopremaParser::new(source)),
    }
}

/// HTTP-backed feed source: fetcher + format parser composed per the feed
/// table entry.
pub struct HttpPropertyFeed {
    spec: FeedSpec,
    fetcher: Arc<Fetcher>,
    parser: Box<dyn FeedParser>,
}

impl HttpPropertyFeed {
    pub fn new(spec: FeedSpec, fetcher: Arc<Fetcher>) -> Self {
        let parser = parser_for(spec.format, &spec.name);
        Self {
            spec,
            fetcher,
            parser,
        }
    }
}

#[async_trait]
impl PropertyFeed for HttpPropertyFeed {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn pull(&self) -> Result<Vec<Property>> {
        let xml = self
            .fetcher
            .fetch_text(&self.spec.name, &self.spec.url)
            .await?;
        let properties = self.parser.parse(&xml);
        info!(
            "Feed '{}' contributed {} properties",
            self.spec.name,
            properties.len()
        );
        Ok(properties)
    }
}
