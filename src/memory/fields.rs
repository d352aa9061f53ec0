//! Field memory
//!
//! The process-wide learned vocabulary: which field names exist, how many
//! extraction passes populated each, and a few observed sample values per
//! field. The store only grows during normal operation; nothing removes a
//! field short of a restore or a process restart.

use crate::error::{Error, Result};
use crate::extract::record::builtin_fields;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default cap on observed sample values kept per field.
pub const DEFAULT_MAX_SAMPLES: usize = 5;

/// Default cap on distinct known field names.
pub const DEFAULT_MAX_FIELDS: usize = 1024;

/// Per-field learned state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    /// Extraction passes that populated this field
    pub count: u64,
    /// First observed values, in observation order
    pub samples: Vec<String>,
}

/// Serializable view of the whole store, the unit of snapshot persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMemorySnapshot {
    pub fields: IndexMap<String, FieldStats>,
}

/// Process-wide store of known field names and learned samples.
pub struct FieldMemory {
    inner: Arc<RwLock<MemoryInner>>,
}

struct MemoryInner {
    /// Insertion order is first-registered order
    fields: IndexMap<String, FieldStats>,
    max_samples: usize,
    max_fields: usize,
}

impl FieldMemory {
    pub fn new(max_samples: usize, max_fields: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryInner {
                fields: IndexMap::new(),
                max_samples,
                max_fields,
            })),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_SAMPLES, DEFAULT_MAX_FIELDS)
    }

    /// Add a field name with zero prior observations. Idempotent: registering
    /// a known name is a no-op. Fails only when the known-field cap would be
    /// exceeded.
    pub async fn register(&self, name: &str) -> Result<()> {
        let name = normalized(name)?;
        let mut inner = self.inner.write().await;
        if inner.fields.contains_key(&name) {
            return Ok(());
        }
        Self::check_capacity(&inner)?;
        inner.fields.insert(name, FieldStats::default());
        Ok(())
    }

    /// Record that one extraction pass populated `name`, merging the pass's
    /// sample values into the field's bounded sample set. Unknown names are
    /// registered on the fly, subject to the same cap as `register`.
    pub async fn observe(&self, name: &str, samples: &[String]) -> Result<()> {
        let name = normalized(name)?;
        let mut inner = self.inner.write().await;
        if !inner.fields.contains_key(&name) {
            Self::check_capacity(&inner)?;
        }
        let max_samples = inner.max_samples;
        let stats = inner.fields.entry(name).or_default();
        stats.count += 1;
        for sample in samples {
            if stats.samples.len() >= max_samples {
                break;
            }
            if !stats.samples.contains(sample) {
                stats.samples.push(sample.clone());
            }
        }
        Ok(())
    }

    /// Known field names, first-registered order.
    pub async fn known_fields(&self) -> Vec<String> {
        self.inner.read().await.fields.keys().cloned().collect()
    }

    /// Known fields minus the built-in record fields: the names the
    /// assembler probes with the keyword-adjacency detector.
    pub async fn custom_fields(&self) -> Vec<String> {
        let builtins = builtin_fields();
        self.inner
            .read()
            .await
            .fields
            .keys()
            .filter(|name| !builtins.contains(&name.as_str()))
            .cloned()
            .collect()
    }

    /// Per-field counters and samples, first-registered order.
    pub async fn stats(&self) -> IndexMap<String, FieldStats> {
        self.inner.read().await.fields.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.fields.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.fields.is_empty()
    }

    /// Copy of the full store for persistence.
    pub async fn snapshot(&self) -> FieldMemorySnapshot {
        FieldMemorySnapshot {
            fields: self.inner.read().await.fields.clone(),
        }
    }

    /// Replace the store's contents with a previously taken snapshot.
    pub async fn restore(&self, snapshot: FieldMemorySnapshot) {
        self.inner.write().await.fields = snapshot.fields;
    }

    fn check_capacity(inner: &MemoryInner) -> Result<()> {
        if inner.fields.len() >= inner.max_fields {
            return Err(Error::Memory(format!(
                "known-field capacity exhausted ({})",
                inner.max_fields
            )));
        }
        Ok(())
    }
}

fn normalized(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Memory("field name is empty".to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_idempotent() {
        let memory = FieldMemory::with_defaults();
        memory.register("GST Number").await.unwrap();
        memory.register("GST Number").await.unwrap();
        assert_eq!(memory.known_fields().await, vec!["GST Number"]);
    }

    #[tokio::test]
    async fn test_register_preserves_order() {
        let memory = FieldMemory::with_defaults();
        memory.register("Beta").await.unwrap();
        memory.register("Alpha").await.unwrap();
        memory.register("Gamma").await.unwrap();
        assert_eq!(memory.known_fields().await, vec!["Beta", "Alpha", "Gamma"]);
    }

    #[tokio::test]
    async fn test_register_trims_and_rejects_blank() {
        let memory = FieldMemory::with_defaults();
        memory.register("  Batch  ").await.unwrap();
        assert_eq!(memory.known_fields().await, vec!["Batch"]);
        assert!(memory.register("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_observe_increments_and_samples() {
        let memory = FieldMemory::with_defaults();
        memory
            .observe("Phone", &["9876543210".to_string()])
            .await
            .unwrap();
        memory
            .observe("Phone", &["9876543210".to_string(), "9123456780".to_string()])
            .await
            .unwrap();

        let stats = memory.stats().await;
        let phone = &stats["Phone"];
        assert_eq!(phone.count, 2);
        assert_eq!(phone.samples, vec!["9876543210", "9123456780"]);
    }

    #[tokio::test]
    async fn test_observe_registers_unknown_names() {
        let memory = FieldMemory::with_defaults();
        memory.observe("Salary", &[]).await.unwrap();
        assert_eq!(memory.known_fields().await, vec!["Salary"]);
        assert_eq!(memory.stats().await["Salary"].count, 1);
    }

    #[tokio::test]
    async fn test_sample_cap() {
        let memory = FieldMemory::new(3, DEFAULT_MAX_FIELDS);
        let samples: Vec<String> = (0..6).map(|i| format!("v{i}")).collect();
        memory.observe("Notes", &samples).await.unwrap();

        let stats = memory.stats().await;
        assert_eq!(stats["Notes"].samples, vec!["v0", "v1", "v2"]);
    }

    #[tokio::test]
    async fn test_registered_field_starts_unobserved() {
        let memory = FieldMemory::with_defaults();
        memory.register("Invoice").await.unwrap();
        let stats = memory.stats().await;
        assert_eq!(stats["Invoice"].count, 0);
        assert!(stats["Invoice"].samples.is_empty());
    }

    #[tokio::test]
    async fn test_field_capacity_exhaustion() {
        let memory = FieldMemory::new(DEFAULT_MAX_SAMPLES, 2);
        memory.register("One").await.unwrap();
        memory.register("Two").await.unwrap();

        let err = memory.register("Three").await.unwrap_err();
        assert!(matches!(err, Error::Memory(_)));

        // Known names still work at the cap
        memory.register("One").await.unwrap();
        memory.observe("Two", &["x".to_string()]).await.unwrap();
    }

    #[tokio::test]
    async fn test_custom_fields_excludes_builtins() {
        let memory = FieldMemory::with_defaults();
        memory.observe("Persons", &[]).await.unwrap();
        memory.register("GST Number").await.unwrap();
        memory.observe("Phone", &[]).await.unwrap();

        assert_eq!(memory.custom_fields().await, vec!["GST Number"]);
    }

    #[tokio::test]
    async fn test_snapshot_restore_round_trip() {
        let memory = FieldMemory::with_defaults();
        memory.register("Invoice").await.unwrap();
        memory
            .observe("Phone", &["9876543210".to_string()])
            .await
            .unwrap();

        let snapshot = memory.snapshot().await;

        let restored = FieldMemory::with_defaults();
        restored.restore(snapshot.clone()).await;

        assert_eq!(restored.known_fields().await, vec!["Invoice", "Phone"]);
        assert_eq!(restored.snapshot().await, snapshot);
    }

    #[tokio::test]
    async fn test_snapshot_serializes_round_trip() {
        let memory = FieldMemory::with_defaults();
        memory
            .observe("Email", &["a@b.com".to_string()])
            .await
            .unwrap();

        let snapshot = memory.snapshot().await;
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: FieldMemorySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[tokio::test]
    async fn test_concurrent_observes_keep_every_increment() {
        let memory = Arc::new(FieldMemory::with_defaults());

        let mut handles = Vec::new();
        for i in 0..50 {
            let memory = Arc::clone(&memory);
            handles.push(tokio::spawn(async move {
                memory
                    .observe("Amount", &[format!("{i}")])
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = memory.stats().await;
        assert_eq!(stats["Amount"].count, 50);
        assert_eq!(stats["Amount"].samples.len(), DEFAULT_MAX_SAMPLES);
    }
}
