pub mod aggregator;
pub mod config;
pub mod content_store;
pub mod fetcher;
pub mod generator;
pub mod llm;
pub mod mapping;
pub mod normalizer;
pub mod pipeline;
pub mod prompt;
pub mod repair;
pub mod sources;
pub mod types;

pub use config::{FeedFormat, FeedSpec, FetchConfig, GenerationConfig, PipelineConfig};
pub use content_store::ContentStore;
pub use fetcher::Fetcher;
pub use generator::ContentGenerator;
pub use llm::{AnthropicClient, MockModelClient, ModelClient};
pub use mapping::MappingTable;
pub use pipeline::{ContentPipeline, RunOptions, RunStats, TargetKind};
pub use types::*;
