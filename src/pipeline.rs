use crate::aggregator::{
    aggregate_areas, aggregate_developers, aggregate_developments, merge_feeds,
};
use crate::config::PipelineConfig;
use crate::content_store::ContentStore;
use crate::generator::ContentGenerator;
use crate::mapping::MappingTable;
use crate::normalizer::slugify;
use crate::prompt;
use crate::sources::PropertyFeed;
use crate::types::{EntityKind, PipelineError, Property, Result};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info, warn};

/// Which entity kinds a batch run generates content for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TargetKind {
    All,
    Developers,
    Developments,
    Areas,
    Properties,
}

/// Options for one batch run, parsed from the CLI.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub target: TargetKind,
    /// Case-insensitive substring filter on town names.
    pub town: Option<String>,
    /// Restrict a properties run to one reference.
    pub reference: Option<String>,
    /// Maximum entities considered per kind; 0 means unlimited.
    pub limit: usize,
}

/// Counters surfaced as the run summary. Per-item failures land here, never
/// in the process exit code.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunStats {
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunStats {
    fn merge(&mut self, other: RunStats) {
        self.generated += other.generated;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "generated: {}, skipped: {}, failed: {}",
            self.generated, self.skipped, self.failed
        )
    }
}

/// Batch driver: fetch feeds, aggregate, and generate one artifact per
/// entity, sequentially. All collaborators are injected so tests can run
/// the whole batch against static sources and a mock model.
pub struct ContentPipeline {
    config: PipelineConfig,
    sources: Vec<Box<dyn PropertyFeed>>,
    mapping: MappingTable,
    generator: ContentGenerator,
    store: ContentStore,
}

impl ContentPipeline {
    pub fn new(
        config: PipelineConfig,
        sources: Vec<Box<dyn PropertyFeed>>,
        mapping: MappingTable,
        generator: ContentGenerator,
        store: ContentStore,
    ) -> Self {
        Self {
            config,
            sources,
            mapping,
            generator,
            store,
        }
    }

    /// Fetch every source sequentially and concatenate. A source failure is
    /// logged and contributes nothing; only an empty source list is fatal.
    pub async fn collect_properties(&self) -> Result<Vec<Property>> {
        if self.sources.is_empty() {
            return Err(PipelineError::Config("no feeds enabled".to_string()));
        }

        let mut batches = Vec::new();
        for source in &self.sources {
            match source.pull().await {
                Ok(properties) => batches.push(properties),
                Err(e) => {
                    error!("Feed '{}' failed, contributing nothing: {}", source.name(), e);
                    batches.push(Vec::new());
                }
            }
        }

        let merged = merge_feeds(batches);
        info!("Collected {} properties across {} feeds", merged.len(), self.sources.len());
        Ok(merged)
    }

    /// Per-town property counts for `--list-towns`, most populous first.
    pub async fn list_towns(&self) -> Result<Vec<(String, usize)>> {
        let properties = self.collect_properties().await?;
        let areas = aggregate_areas(&properties);
        Ok(areas
            .into_iter()
            .map(|a| (a.town, a.property_count))
            .collect())
    }

    /// Run one batch and return its statistics. Per-entity failures are
    /// absorbed into the stats; the batch itself always completes.
    pub async fn run(&self, options: &RunOptions) -> Result<RunStats> {
        let mut properties = self.collect_properties().await?;

        if let Some(town) = &options.town {
            let needle = town.to_lowercase();
            properties.retain(|p| p.town.to_lowercase().contains(&needle));
            info!("Town filter '{}' kept {} properties", town, properties.len());
        }

        let mut stats = RunStats::default();

        if matches!(options.target, TargetKind::All | TargetKind::Areas) {
            stats.merge(self.generate_areas(&properties, options).await);
        }
        if matches!(options.target, TargetKind::All | TargetKind::Developments) {
            stats.merge(self.generate_developments(&properties, options).await);
        }
        if matches!(options.target, TargetKind::All | TargetKind::Developers) {
            stats.merge(self.generate_developers(&properties, options).await);
        }
        if matches!(options.target, TargetKind::All | TargetKind::Properties) {
            stats.merge(self.generate_properties(&properties, options).await);
        }

        info!("Batch complete: {}", stats);
        Ok(stats)
    }

    async fn generate_areas(&self, properties: &[Property], options: &RunOptions) -> RunStats {
        let mut stats = RunStats::default();
        let rollups = limited(aggregate_areas(properties), options.limit);
        info!("Generating {} area guides", rollups.len());

        for area in rollups {
            let prompt = prompt::area_prompt(&area);
            let extra = json!({
                "town": area.town,
                "propertyCount": area.property_count,
            });
            self.generate_entity(EntityKind::Area, &area.slug, &prompt, extra, &mut stats)
                .await;
        }
        stats
    }

    async fn generate_developments(
        &self,
        properties: &[Property],
        options: &RunOptions,
    ) -> RunStats {
        let mut stats = RunStats::default();
        let rollups = limited(aggregate_developments(properties, &self.mapping), options.limit);
        info!("Generating {} development pages", rollups.len());

        let mut seen_slugs: HashSet<String> = HashSet::new();
        for development in rollups {
            // Two distinct developments slugifying identically is a mapping
            // data-quality problem; surface it instead of overwriting.
            if !seen_slugs.insert(development.slug.clone()) {
                warn!(
                    "Slug collision on '{}' (developer '{}'), skipping",
                    development.slug, development.developer
                );
                stats.failed += 1;
                continue;
            }
            let prompt = prompt::development_prompt(&development);
            let extra = json!({
                "developer": development.developer,
                "development": development.development,
                "stats": development,
            });
            self.generate_entity(
                EntityKind::Development,
                &development.slug,
                &prompt,
                extra,
                &mut stats,
            )
            .await;
        }
        stats
    }

    async fn generate_developers(
        &self,
        properties: &[Property],
        options: &RunOptions,
    ) -> RunStats {
        let mut stats = RunStats::default();
        let rollups = limited(aggregate_developers(properties, &self.mapping), options.limit);
        info!("Generating {} developer profiles", rollups.len());

        for developer in rollups {
            let prompt = prompt::developer_prompt(&developer);
            let extra = json!({
                "name": developer.developer,
                "stats": developer,
            });
            self.generate_entity(
                EntityKind::Developer,
                &developer.slug,
                &prompt,
                extra,
                &mut stats,
            )
            .await;
        }
        stats
    }

    async fn generate_properties(
        &self,
        properties: &[Property],
        options: &RunOptions,
    ) -> RunStats {
        let mut stats = RunStats::default();

        // Only properties whose feed description cannot carry a page get
        // generated copy, unless one reference is explicitly requested.
        let candidates: Vec<&Property> = match &options.reference {
            Some(reference) => properties
                .iter()
                .filter(|p| p.reference.eq_ignore_ascii_case(reference))
                .collect(),
            None => properties
                .iter()
                .filter(|p| !p.reference.is_empty())
                .filter(|p| p.description.chars().count() < 200)
                .collect(),
        };
        let candidates = limited(candidates, options.limit);
        info!("Generating content for {} properties", candidates.len());

        for property in candidates {
            let slug = slugify(&property.reference);
            let prompt = prompt::property_prompt(property);
            let extra = json!({
                "reference": property.reference,
                "source": property.source,
                "town": property.town,
            });
            self.generate_entity(EntityKind::Property, &slug, &prompt, extra, &mut stats)
                .await;
        }
        stats
    }

    /// The per-entity sub-machine: skip gate, bounded retries with linearly
    /// increasing backoff, save, courtesy delay. A failure here never
    /// escapes; it is logged and counted.
    async fn generate_entity(
        &self,
        kind: EntityKind,
        slug: &str,
        prompt: &str,
        extra: Value,
        stats: &mut RunStats,
    ) {
        if !self.config.regenerate_all && self.store.exists(kind, slug) {
            info!("Skipping {} '{}' (exists)", kind, slug);
            stats.skipped += 1;
            return;
        }

        let generation = &self.config.generation;
        for attempt in 1..=generation.max_attempts {
            match self.generator.generate(slug, prompt).await {
                Ok(mut content) => {
                    enrich(&mut content, slug, &extra);
                    match self.store.save(kind, slug, &content) {
                        Ok(()) => {
                            info!("Generated {} '{}'", kind, slug);
                            stats.generated += 1;
                        }
                        Err(e) => {
                            error!("Failed to save {} '{}': {}", kind, slug, e);
                            stats.failed += 1;
                        }
                    }
                    tokio::time::sleep(Duration::from_millis(
                        generation.post_generation_delay_ms,
                    ))
                    .await;
                    return;
                }
                Err(e) if attempt < generation.max_attempts => {
                    let delay = generation.retry_base_delay_ms * attempt as u64;
                    warn!(
                        "Attempt {}/{} failed for {} '{}' ({}), retrying in {}ms",
                        attempt, generation.max_attempts, kind, slug, e, delay
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => {
                    error!(
                        "Giving up on {} '{}' after {} attempts: {}",
                        kind, slug, generation.max_attempts, e
                    );
                    stats.failed += 1;
                }
            }
        }
    }
}

/// Apply the run limit to a candidate list; 0 means unlimited.
fn limited<T>(items: Vec<T>, limit: usize) -> Vec<T> {
    if limit == 0 {
        items
    } else {
        items.into_iter().take(limit).collect()
    }
}

/// Stamp the artifact with its identity and generation time, plus the
/// kind-specific facts the callers pass in. Pipeline-owned fields overwrite
/// model-produced ones of the same name.
fn enrich(content: &mut Value, slug: &str, extra: &Value) {
    if let Some(object) = content.as_object_mut() {
        if let Some(extra_map) = extra.as_object() {
            for (key, value) in extra_map {
                object.insert(key.clone(), value.clone());
            }
        }
        object.insert("slug".to_string(), json!(slug));
        object.insert("generatedAt".to_string(), json!(Utc::now().to_rfc3339()));
    }
}
