//! Cached JSON Schema compilation and validation for tool I/O (spec §4.1
//! "Validates call inputs and outputs").

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use jsonschema::Validator;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error, Clone)]
pub enum SchemaError {
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

/// Compiles and caches [`Validator`]s keyed by schema hash, so repeated
/// calls against the same tool's schemas don't recompile it every time.
#[derive(Default)]
pub struct SchemaCache {
    validators: RwLock<HashMap<u64, Arc<Validator>>>,
}

impl SchemaCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn validate(
        &self,
        schema: &serde_json::Value,
        data: &serde_json::Value,
    ) -> Result<(), SchemaError> {
        let validator = self.compile(schema).await?;
        let messages: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();
        if messages.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed(messages.join("; ")))
        }
    }

    async fn compile(&self, schema: &serde_json::Value) -> Result<Arc<Validator>, SchemaError> {
        let hash = hash_schema(schema);
        {
            let cache = self.validators.read().await;
            if let Some(validator) = cache.get(&hash) {
                return Ok(Arc::clone(validator));
            }
        }
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;
        let validator = Arc::new(validator);
        let mut cache = self.validators.write().await;
        cache.insert(hash, Arc::clone(&validator));
        Ok(validator)
    }

    pub async fn cache_size(&self) -> usize {
        self.validators.read().await.len()
    }
}

fn hash_schema(schema: &serde_json::Value) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    schema.to_string().hash(&mut hasher);
    hasher.finish()
}
