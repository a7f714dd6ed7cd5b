//! Tool Registry (C1): versioned tool storage, dependency resolution, and
//! schema-validated dispatch (spec §4.1).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use semver::Version;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::condition::ResultsView;
use crate::diagnostics::{DiagnosticEvent, EventSink};

use super::handler::ToolHandler;
use super::metadata::{RegistrySnapshot, ToolMetadata};
use super::schema::SchemaCache;
use super::version::{parse_range, parse_strict, satisfies};

#[derive(Debug, Error, Clone)]
pub enum RegistryError {
    #[error("tool '{0}' not found")]
    ToolNotFound(String),
    #[error("tool '{0}' is disabled")]
    ToolDisabled(String),
    #[error("input validation failed: {0}")]
    InvalidInput(String),
    #[error("output validation failed: {0}")]
    InvalidOutput(String),
    #[error("handler '{0}' failed: {1}")]
    HandlerFailed(String, String),
}

/// Result of a `register` call (spec §4.1 "Returns `{success, warnings,
/// errors}`").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterOutcome {
    pub success: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

struct Entry {
    version: Version,
    handler: Arc<dyn ToolHandler>,
    enabled: Arc<AtomicBool>,
}

/// Canonical store of tool handlers keyed by (name, version).
pub struct ToolRegistry {
    entries: RwLock<HashMap<String, Vec<Entry>>>,
    schemas: SchemaCache,
    sink: Arc<dyn EventSink>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            schemas: SchemaCache::new(),
            sink,
        }
    }

    pub async fn register(&self, handler: Arc<dyn ToolHandler>) -> RegisterOutcome {
        let meta = handler.metadata().clone();
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        let version = match parse_strict(&meta.version) {
            Ok(v) => v,
            Err(e) => {
                errors.push(e.to_string());
                return RegisterOutcome {
                    success: false,
                    warnings,
                    errors,
                };
            }
        };

        {
            let entries = self.entries.read().await;
            for dep in &meta.dependencies {
                let available = entries.get(&dep.target);
                let req = match parse_range(&dep.range) {
                    Ok(r) => r,
                    Err(e) => {
                        errors.push(e.to_string());
                        continue;
                    }
                };
                let satisfied = available
                    .is_some_and(|bucket| bucket.iter().any(|e| satisfies(&req, &e.version)));
                if satisfied {
                    continue;
                }
                if dep.optional {
                    warnings.push(format!(
                        "optional dependency '{}' ({}) is unsatisfied",
                        dep.target, dep.range
                    ));
                } else if available.is_none() {
                    errors.push(format!(
                        "required dependency '{}' is not registered",
                        dep.target
                    ));
                } else {
                    errors.push(format!(
                        "required dependency '{}' has no registered version satisfying '{}'",
                        dep.target, dep.range
                    ));
                }
            }
        }

        if !errors.is_empty() {
            return RegisterOutcome {
                success: false,
                warnings,
                errors,
            };
        }

        if meta.deprecated {
            warnings.push(format!(
                "'{}' v{} is deprecated{}",
                meta.name,
                meta.version,
                meta.deprecation_message
                    .as_ref()
                    .map(|m| format!(": {m}"))
                    .unwrap_or_default()
            ));
        }

        let replaced = {
            let mut entries = self.entries.write().await;
            let bucket = entries.entry(meta.name.clone()).or_default();
            let existing = bucket.iter().position(|e| e.version == version);
            let enabled = Arc::new(AtomicBool::new(meta.enabled));
            let entry = Entry {
                version: version.clone(),
                handler: Arc::clone(&handler),
                enabled,
            };
            let replaced = existing.is_some();
            if let Some(idx) = existing {
                bucket[idx] = entry;
            } else {
                bucket.push(entry);
            }
            bucket.sort_by(|a, b| b.version.cmp(&a.version));
            replaced
        };

        if replaced {
            warnings.push(format!(
                "replaced existing registration for '{}' v{}",
                meta.name, meta.version
            ));
        }

        self.sink.emit(DiagnosticEvent::ToolRegistered {
            name: meta.name.clone(),
            version: meta.version.clone(),
            replaced,
        });
        if meta.deprecated {
            self.sink.emit(DiagnosticEvent::DeprecationWarning {
                name: meta.name.clone(),
                version: meta.version.clone(),
                message: meta.deprecation_message.clone(),
            });
        }

        RegisterOutcome {
            success: true,
            warnings,
            errors,
        }
    }

    pub async fn get(&self, name: &str, version: Option<&str>) -> Option<Arc<dyn ToolHandler>> {
        let entries = self.entries.read().await;
        let bucket = entries.get(name)?;
        match version {
            Some(v) => {
                let target = parse_strict(v).ok()?;
                bucket
                    .iter()
                    .find(|e| e.version == target)
                    .map(|e| Arc::clone(&e.handler))
            }
            None => bucket
                .iter()
                .find(|e| !e.handler.metadata().deprecated)
                .map(|e| Arc::clone(&e.handler)),
        }
    }

    pub async fn execute(
        &self,
        name: &str,
        input: serde_json::Value,
        ctx: &(dyn ResultsView + Send + Sync),
        version: Option<&str>,
    ) -> Result<serde_json::Value, RegistryError> {
        let entries = self.entries.read().await;
        let bucket = entries
            .get(name)
            .ok_or_else(|| RegistryError::ToolNotFound(name.to_string()))?;
        let entry = match version {
            Some(v) => {
                let target = parse_strict(v).map_err(|e| RegistryError::ToolNotFound(e.to_string()))?;
                bucket.iter().find(|e| e.version == target)
            }
            None => bucket.iter().find(|e| !e.handler.metadata().deprecated),
        }
        .ok_or_else(|| RegistryError::ToolNotFound(name.to_string()))?;

        if !entry.enabled.load(Ordering::SeqCst) {
            return Err(RegistryError::ToolDisabled(name.to_string()));
        }
        let handler = Arc::clone(&entry.handler);
        let meta = handler.metadata().clone();
        drop(entries);

        self.schemas
            .validate(&meta.input_schema, &input)
            .await
            .map_err(|e| RegistryError::InvalidInput(e.to_string()))?;

        let output = handler
            .call(input, ctx)
            .await
            .map_err(|e| RegistryError::HandlerFailed(name.to_string(), e))?;

        self.schemas
            .validate(&meta.output_schema, &output)
            .await
            .map_err(|e| RegistryError::InvalidOutput(e.to_string()))?;

        if meta.deprecated {
            self.sink.emit(DiagnosticEvent::DeprecationWarning {
                name: meta.name.clone(),
                version: meta.version.clone(),
                message: meta.deprecation_message.clone(),
            });
        }

        Ok(output)
    }

    pub async fn list_versions(&self, name: &str) -> Vec<String> {
        let entries = self.entries.read().await;
        entries
            .get(name)
            .map(|bucket| bucket.iter().map(|e| e.version.to_string()).collect())
            .unwrap_or_default()
    }

    pub async fn list_by_category(&self, category: &str) -> Vec<ToolMetadata> {
        self.filter_metadata(|m| m.category == category).await
    }

    pub async fn list_by_tag(&self, tag: &str) -> Vec<ToolMetadata> {
        self.filter_metadata(|m| m.tags.iter().any(|t| t == tag))
            .await
    }

    pub async fn deprecated_tools(&self) -> Vec<ToolMetadata> {
        self.filter_metadata(|m| m.deprecated).await
    }

    async fn filter_metadata(&self, pred: impl Fn(&ToolMetadata) -> bool) -> Vec<ToolMetadata> {
        let entries = self.entries.read().await;
        entries
            .values()
            .flat_map(|bucket| bucket.iter())
            .map(|e| e.handler.metadata().clone())
            .filter(|m| pred(m))
            .collect()
    }

    /// Enable/disable a specific (name, version), or all versions of a name
    /// when `version` is absent. Returns whether anything matched.
    pub async fn set_enabled(&self, name: &str, version: Option<&str>, enabled: bool) -> bool {
        let entries = self.entries.read().await;
        let Some(bucket) = entries.get(name) else {
            return false;
        };
        let target = match version {
            Some(v) => match parse_strict(v) {
                Ok(v) => Some(v),
                Err(_) => return false,
            },
            None => None,
        };
        let mut matched = false;
        for entry in bucket {
            let applies = match &target {
                Some(t) => *t == entry.version,
                None => true,
            };
            if applies {
                entry.enabled.store(enabled, Ordering::SeqCst);
                matched = true;
            }
        }
        matched
    }

    pub async fn snapshot(&self) -> RegistrySnapshot {
        let entries = self.entries.read().await;
        let mut snapshot = RegistrySnapshot {
            total_tools: entries.len(),
            ..Default::default()
        };
        for bucket in entries.values() {
            snapshot.total_versions += bucket.len();
            for entry in bucket {
                let meta = entry.handler.metadata();
                *snapshot.by_category.entry(meta.category.clone()).or_insert(0) += 1;
                let risk = format!("{:?}", meta.security.risk_level);
                *snapshot.by_risk_level.entry(risk).or_insert(0) += 1;
                if meta.deprecated {
                    snapshot.deprecated_count += 1;
                }
            }
        }
        snapshot
    }
}
