//! Service facade
//!
//! `ExtractionService` owns the process-wide stores and implements the
//! external operations: analyze, custom-field registration and inspection,
//! history queries, and export flattening. When a memory file is configured,
//! the field-memory snapshot is restored at startup and re-persisted
//! (fire-and-forget) after every mutation.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::Result;
use crate::export::{self, FlatRow};
use crate::extract::{ExtractionRecord, RecordAssembler};
use crate::memory::fields::{FieldMemory, FieldMemorySnapshot, FieldStats};
use crate::memory::history::{HistoryEntry, HistoryLog};

/// Facade over the extraction pipeline and its stores.
pub struct ExtractionService {
    assembler: RecordAssembler,
    memory: Arc<FieldMemory>,
    history: Arc<HistoryLog>,
    memory_file: Option<PathBuf>,
}

impl ExtractionService {
    /// Build the service from configuration. Restores the field-memory
    /// snapshot when a memory file is configured and present on disk.
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let memory = Arc::new(FieldMemory::new(
            config.memory.max_samples_per_field,
            config.memory.max_known_fields,
        ));
        let history = Arc::new(HistoryLog::new(config.memory.history_capacity));
        let assembler = RecordAssembler::new(&config.extractor, Arc::clone(&memory))?;

        let service = Self {
            assembler,
            memory,
            history,
            memory_file: config.memory.memory_file.clone(),
        };
        service.load_snapshot().await;
        Ok(service)
    }

    /// One extraction pass: assemble a record, log it to history, persist
    /// the updated field memory.
    pub async fn analyze(&self, text: &str) -> Result<ExtractionRecord> {
        let record = self.assembler.assemble(text).await?;
        self.history.append(record.clone()).await;
        self.persist_snapshot().await;
        info!("Analyzed {} chars into {} fields", text.len(), record.len());
        Ok(record)
    }

    /// Register a custom field so future passes probe for it.
    pub async fn register_field(&self, name: &str) -> Result<()> {
        self.memory.register(name).await?;
        self.persist_snapshot().await;
        info!("Registered custom field '{}'", name.trim());
        Ok(())
    }

    /// Known field names, first-registered order.
    pub async fn known_fields(&self) -> Vec<String> {
        self.memory.known_fields().await
    }

    /// Per-field occurrence counts and samples.
    pub async fn field_stats(&self) -> IndexMap<String, FieldStats> {
        self.memory.stats().await
    }

    /// Up to `limit` most recent extractions, newest first.
    pub async fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.history.recent(limit).await
    }

    pub async fn history_capacity(&self) -> usize {
        self.history.capacity().await
    }

    /// Flatten one record, or a sequence of records, into export rows.
    pub fn export(&self, payload: &Value) -> Vec<FlatRow> {
        match payload {
            Value::Array(records) => export::flatten_all(records.iter()),
            single => export::flatten(single),
        }
    }

    // =========================================================================
    // Snapshot persistence
    // =========================================================================

    async fn load_snapshot(&self) {
        let Some(path) = &self.memory_file else {
            return;
        };
        match tokio::fs::read_to_string(path).await {
            Ok(data) => match serde_json::from_str::<FieldMemorySnapshot>(&data) {
                Ok(snapshot) => {
                    self.memory.restore(snapshot).await;
                    info!("Restored field memory from {}", path.display());
                }
                Err(e) => {
                    warn!("Failed to parse field memory {}: {}", path.display(), e);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Failed to read field memory {}: {}", path.display(), e);
            }
        }
    }

    /// Persist the current snapshot to disk (fire-and-forget)
    async fn persist_snapshot(&self) {
        let Some(path) = self.memory_file.clone() else {
            return;
        };
        let snapshot = self.memory.snapshot().await;
        tokio::spawn(async move {
            match serde_json::to_string_pretty(&snapshot) {
                Ok(json) => {
                    if let Err(e) = tokio::fs::write(&path, json).await {
                        warn!("Failed to persist field memory to {}: {}", path.display(), e);
                    }
                }
                Err(e) => {
                    warn!("Failed to serialize field memory: {}", e);
                }
            }
        });
    }

    /// Write the field-memory snapshot and wait for the write to finish.
    /// The analyze/register paths persist in the background; callers about
    /// to exit the process use this instead.
    pub async fn flush(&self) -> Result<()> {
        let Some(path) = &self.memory_file else {
            return Ok(());
        };
        let snapshot = self.memory.snapshot().await;
        let json = serde_json::to_string_pretty(&snapshot)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}
