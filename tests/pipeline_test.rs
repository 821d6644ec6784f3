use async_trait::async_trait;
use property_aggregator::sources::PropertyFeed;
use property_aggregator::types::{DevelopmentInfo, Property, Result};
use property_aggregator::{
    ContentGenerator, ContentPipeline, ContentStore, MappingTable, MockModelClient,
    PipelineConfig, RunOptions, TargetKind,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Static feed double: returns a fixed property list without any network.
struct StaticFeed {
    name: String,
    properties: Vec<Property>,
}

#[async_trait]
impl PropertyFeed for StaticFeed {
    fn name(&self) -> &str {
        &self.name
    }

    async fn pull(&self) -> Result<Vec<Property>> {
        Ok(self.properties.clone())
    }
}

/// Feed double that always fails, standing in for an unreachable endpoint.
struct BrokenFeed;

#[async_trait]
impl PropertyFeed for BrokenFeed {
    fn name(&self) -> &str {
        "broken"
    }

    async fn pull(&self) -> Result<Vec<Property>> {
        Err(property_aggregator::types::PipelineError::Fetch {
            feed: "broken".to_string(),
            detail: "connection refused".to_string(),
        })
    }
}

fn property(reference: &str, town: &str, price: u64) -> Property {
    Property {
        reference: reference.to_string(),
        town: town.to_string(),
        price,
        property_type: "Apartment".to_string(),
        description: "Short feed description".to_string(),
        source: "test".to_string(),
        ..Default::default()
    }
}

fn test_mapping() -> MappingTable {
    let mut entries = HashMap::new();
    entries.insert(
        "A1".to_string(),
        DevelopmentInfo {
            developer: "Acme".to_string(),
            development: "Sunrise Villas".to_string(),
            delivery_date: "01-06-2026".to_string(),
            zone: Some("La Finca Golf".to_string()),
        },
    );
    entries.insert(
        "A2".to_string(),
        DevelopmentInfo {
            developer: "Acme".to_string(),
            development: "Sunrise Villas".to_string(),
            delivery_date: "01-06-2026".to_string(),
            zone: Some("La Finca Golf".to_string()),
        },
    );
    MappingTable::from_entries(entries)
}

fn test_config(content_dir: PathBuf) -> PipelineConfig {
    let mut config = PipelineConfig::from_env();
    config.content_dir = content_dir;
    config.regenerate_all = false;
    config.generation.max_attempts = 3;
    config.generation.retry_base_delay_ms = 0;
    config.generation.post_generation_delay_ms = 0;
    config
}

fn temp_content_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "property-aggregator-test-{}-{}",
        std::process::id(),
        label
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn build_pipeline(
    content_dir: &PathBuf,
    feeds: Vec<Box<dyn PropertyFeed>>,
    model: Arc<MockModelClient>,
) -> ContentPipeline {
    let config = test_config(content_dir.clone());
    let store = ContentStore::new(content_dir).expect("content store");
    let generator = ContentGenerator::new(model);
    ContentPipeline::new(config, feeds, test_mapping(), generator, store)
}

const VALID_RESPONSE: &str =
    r#"{"metaTitle": "Generated title", "metaDescription": "Generated description"}"#;

#[tokio::test]
async fn test_batch_is_idempotent_across_runs() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let dir = temp_content_dir("idempotent");
    let feeds: Vec<Box<dyn PropertyFeed>> = vec![Box::new(StaticFeed {
        name: "static".to_string(),
        properties: vec![
            property("A1", "Algorfa", 200_000),
            property("A2", "Algorfa", 0),
            property("B7", "Torrevieja", 150_000),
        ],
    })];
    let model = Arc::new(MockModelClient::fixed(VALID_RESPONSE));
    let pipeline = build_pipeline(&dir, feeds, model.clone());

    let options = RunOptions {
        target: TargetKind::All,
        town: None,
        reference: None,
        limit: 0,
    };

    let first = pipeline.run(&options).await?;
    info!("First run: {}", first);
    assert!(first.generated > 0, "first run should generate artifacts");
    assert_eq!(first.skipped, 0);
    assert_eq!(first.failed, 0);

    // Second run over unchanged input: zero additional writes, everything
    // reported as skipped before any model call is made.
    let calls_after_first = model.call_count();
    let second = pipeline.run(&options).await?;
    info!("Second run: {}", second);
    assert_eq!(second.generated, 0);
    assert_eq!(second.skipped, first.generated);
    assert_eq!(model.call_count(), calls_after_first);

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}

#[tokio::test]
async fn test_artifacts_are_enriched_and_atomic() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let dir = temp_content_dir("artifacts");
    let feeds: Vec<Box<dyn PropertyFeed>> = vec![Box::new(StaticFeed {
        name: "static".to_string(),
        properties: vec![property("A1", "Algorfa", 200_000)],
    })];
    let model = Arc::new(MockModelClient::fixed(VALID_RESPONSE));
    let pipeline = build_pipeline(&dir, feeds, model);

    let options = RunOptions {
        target: TargetKind::Developments,
        town: None,
        reference: None,
        limit: 0,
    };
    let stats = pipeline.run(&options).await?;
    assert_eq!(stats.generated, 1);

    let artifact_path = dir.join("developments").join("sunrise-villas.json");
    let raw = std::fs::read_to_string(&artifact_path)?;
    let artifact: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(artifact["metaTitle"], "Generated title");
    assert_eq!(artifact["slug"], "sunrise-villas");
    assert_eq!(artifact["developer"], "Acme");
    assert!(artifact["generatedAt"].is_string());
    assert_eq!(artifact["stats"]["priceFrom"], 200_000);

    // The write-to-temp-then-rename strategy leaves no partial files.
    for entry in std::fs::read_dir(dir.join("developments"))? {
        let name = entry?.file_name();
        assert!(!name.to_string_lossy().ends_with(".tmp"));
    }

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}

#[tokio::test]
async fn test_entity_failure_does_not_abort_batch() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let dir = temp_content_dir("failures");
    let feeds: Vec<Box<dyn PropertyFeed>> = vec![Box::new(StaticFeed {
        name: "static".to_string(),
        properties: vec![
            property("A1", "Algorfa", 200_000),
            property("B7", "Torrevieja", 150_000),
        ],
    })];
    // The model never produces JSON: every entity exhausts its retries,
    // and the batch still completes with a full failure count.
    let model = Arc::new(MockModelClient::fixed("I am sorry, I cannot do that."));
    let pipeline = build_pipeline(&dir, feeds, model.clone());

    let options = RunOptions {
        target: TargetKind::Areas,
        town: None,
        reference: None,
        limit: 0,
    };
    let stats = pipeline.run(&options).await?;
    assert_eq!(stats.generated, 0);
    assert_eq!(stats.failed, 2);
    // Three attempts per area entity.
    assert_eq!(model.call_count(), 6);

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}

#[tokio::test]
async fn test_unreachable_feed_contributes_nothing() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let dir = temp_content_dir("broken-feed");
    let feeds: Vec<Box<dyn PropertyFeed>> = vec![
        Box::new(BrokenFeed),
        Box::new(StaticFeed {
            name: "static".to_string(),
            properties: vec![property("A1", "Algorfa", 200_000)],
        }),
    ];
    let model = Arc::new(MockModelClient::fixed(VALID_RESPONSE));
    let pipeline = build_pipeline(&dir, feeds, model);

    let properties = pipeline.collect_properties().await?;
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].reference, "A1");

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}

#[tokio::test]
async fn test_town_filter_and_limit() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let dir = temp_content_dir("filters");
    let feeds: Vec<Box<dyn PropertyFeed>> = vec![Box::new(StaticFeed {
        name: "static".to_string(),
        properties: vec![
            property("A1", "Torrevieja", 200_000),
            property("B1", "Rojales", 150_000),
            property("C1", "Ciudad Quesada (Rojales)", 180_000),
        ],
    })];
    let model = Arc::new(MockModelClient::fixed(VALID_RESPONSE));
    let pipeline = build_pipeline(&dir, feeds, model);

    // Case-insensitive substring match keeps both Rojales variants.
    let options = RunOptions {
        target: TargetKind::Areas,
        town: Some("rojales".to_string()),
        reference: None,
        limit: 1,
    };
    let stats = pipeline.run(&options).await?;
    // Two towns match the filter but the limit keeps one.
    assert_eq!(stats.generated + stats.skipped, 1);

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}

#[tokio::test]
async fn test_list_towns_counts() -> Result<()> {
    let dir = temp_content_dir("towns");
    let feeds: Vec<Box<dyn PropertyFeed>> = vec![Box::new(StaticFeed {
        name: "static".to_string(),
        properties: vec![
            property("A1", "Torrevieja", 200_000),
            property("A2", "Torrevieja", 210_000),
            property("B1", "Rojales", 150_000),
        ],
    })];
    let model = Arc::new(MockModelClient::fixed(VALID_RESPONSE));
    let pipeline = build_pipeline(&dir, feeds, model);

    let towns = pipeline.list_towns().await?;
    assert_eq!(towns[0], ("Torrevieja".to_string(), 2));
    assert_eq!(towns[1], ("Rojales".to_string(), 1));

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}
