use anyhow::Context;
use clap::Parser;
use property_aggregator::sources::{HttpPropertyFeed, PropertyFeed};
use property_aggregator::{
    AnthropicClient, ContentGenerator, ContentPipeline, ContentStore, Fetcher, MappingTable,
    PipelineConfig, RunOptions, TargetKind,
};
use std::env;
use std::sync::Arc;
use tracing::info;

/// Multi-source property feed aggregation and AI content generation.
#[derive(Parser, Debug)]
#[command(name = "property-aggregator", version, about)]
struct Cli {
    /// Case-insensitive substring filter on town names.
    #[arg(long)]
    town: Option<String>,

    /// Entity kinds to generate content for.
    #[arg(long = "type", value_enum, default_value = "all")]
    target: TargetKind,

    /// Maximum entities per kind; 0 means unlimited.
    #[arg(long, default_value_t = 0)]
    limit: usize,

    /// Generate for one property reference only.
    #[arg(long = "ref")]
    reference: Option<String>,

    /// Report per-town property counts and exit without generating.
    #[arg(long)]
    list_towns: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env();

    info!(
        "Starting content pipeline (mode: {})",
        if config.regenerate_all {
            "regenerate ALL"
        } else {
            "new content only"
        }
    );

    let fetcher = Arc::new(Fetcher::new(config.fetch.clone()).context("building HTTP client")?);

    let sources: Vec<Box<dyn PropertyFeed>> = config
        .enabled_feeds()
        .into_iter()
        .map(|spec| {
            Box::new(HttpPropertyFeed::new(spec.clone(), fetcher.clone()))
                as Box<dyn PropertyFeed>
        })
        .collect();
    if sources.is_empty() {
        anyhow::bail!("no feeds enabled");
    }

    let mapping = MappingTable::load(&config.mapping_path).context("loading mapping table")?;

    let api_key = env::var("ANTHROPIC_API_KEY").unwrap_or_default();
    let model = Arc::new(AnthropicClient::new(
        fetcher.client(),
        api_key,
        &config.generation,
    ));
    let generator = ContentGenerator::new(model);

    let store = ContentStore::new(&config.content_dir).context("opening content store")?;

    let pipeline = ContentPipeline::new(config, sources, mapping, generator, store);

    if cli.list_towns {
        let towns = pipeline.list_towns().await?;
        println!("{} towns with properties:", towns.len());
        for (town, count) in towns {
            println!("  {:<30} {}", town, count);
        }
        return Ok(());
    }

    let options = RunOptions {
        target: cli.target,
        town: cli.town,
        reference: cli.reference,
        limit: cli.limit,
    };

    // Per-item failures are reported in the summary, never via the exit
    // code: a completed batch always exits zero.
    let stats = pipeline.run(&options).await?;

    println!("===================================");
    println!("Generated: {}", stats.generated);
    println!("Skipped:   {}", stats.skipped);
    println!("Failed:    {}", stats.failed);
    println!("===================================");

    Ok(())
}
