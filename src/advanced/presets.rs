use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::QueryError;
use crate::query::builder::QueryOptions;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPreset {
    pub name: String,
    pub options: QueryOptions,
    pub saved_at: DateTime<Utc>,
}

/// Named, reusable query options
#[derive(Debug, Clone, Default)]
pub struct PresetStore {
    presets: Arc<RwLock<HashMap<String, QueryPreset>>>,
}

impl PresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store options under `name`, replacing any previous preset
    pub async fn save(&self, name: &str, options: QueryOptions) {
        let preset = QueryPreset {
            name: name.to_string(),
            options,
            saved_at: Utc::now(),
        };
        let replaced = self
            .presets
            .write()
            .await
            .insert(name.to_string(), preset)
            .is_some();
        info!(preset = name, replaced, "Saved query preset");
    }

    pub async fn load(&self, name: &str) -> Option<QueryOptions> {
        self.presets
            .read()
            .await
            .get(name)
            .map(|preset| preset.options.clone())
    }

    pub async fn get(&self, name: &str) -> Option<QueryPreset> {
        self.presets.read().await.get(name).cloned()
    }

    /// Preset names in sorted order
    pub async fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.presets.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns whether a preset was removed
    pub async fn delete(&self, name: &str) -> bool {
        let removed = self.presets.write().await.remove(name).is_some();
        debug!(preset = name, removed, "Deleted query preset");
        removed
    }

    /// Stored options with `overrides` shallow-merged on top. Override keys
    /// use the serialized option names (`page`, `filters`, `sortBy`, ...) and
    /// replace the stored value wholesale.
    pub async fn resolve(
        &self,
        name: &str,
        overrides: Map<String, Value>,
    ) -> Result<QueryOptions, QueryError> {
        let stored = self
            .load(name)
            .await
            .ok_or_else(|| QueryError::PresetNotFound(name.to_string()))?;

        if overrides.is_empty() {
            return Ok(stored);
        }

        let mut merged = match serde_json::to_value(&stored)? {
            Value::Object(object) => object,
            _ => Map::new(),
        };
        merged.extend(overrides);

        Ok(serde_json::from_value(Value::Object(merged))?)
    }
}
