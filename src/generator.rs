use crate::llm::ModelClient;
use crate::prompt::JSON_SYSTEM_PROMPT;
use crate::repair::{extract_candidate, repair_and_parse};
use crate::types::{PipelineError, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Issues the model call and enforces the JSON output contract: extract the
/// candidate, run the repair cascade, validate the shape. Exhausting every
/// repair raises `Generation` carrying the raw text for diagnostics.
pub struct ContentGenerator {
    model: Arc<dyn ModelClient>,
}

impl ContentGenerator {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> String {
        self.model.name()
    }

    /// Generate one content object for the entity identified by `entity`.
    pub async fn generate(&self, entity: &str, prompt: &str) -> Result<Value> {
        let raw = self.model.complete(JSON_SYSTEM_PROMPT, prompt).await?;
        debug!("Model returned {} chars for '{}'", raw.len(), entity);

        let value = extract_candidate(&raw)
            .and_then(|candidate| repair_and_parse(&candidate))
            .ok_or_else(|| PipelineError::Generation {
                entity: entity.to_string(),
                raw: raw.clone(),
            })?;

        if !value.is_object() {
            return Err(PipelineError::Generation {
                entity: entity.to_string(),
                raw,
            });
        }

        Ok(value)
    }
}
