//! fieldglean configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main fieldglean configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Detector tuning
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Field memory and history configuration
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS (empty = allow any)
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18920,
            allowed_origins: Vec::new(),
        }
    }
}

/// Detector tuning knobs
///
/// Every heuristic threshold the extraction pass uses lives here so none of
/// them is an inlined magic number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Lowercase substrings that disqualify a capitalized phrase as a person
    /// name (organizational and geographic markers)
    pub name_blocklist: Vec<String>,

    /// Maximum tokens in a person name (longer matches are dropped)
    pub max_name_tokens: usize,

    /// Require phone numbers to start with a digit in 6..=9
    pub restrict_phone_prefix: bool,

    /// Keywords that qualify a nearby digit run as a monetary value
    pub money_keywords: Vec<String>,

    /// Maximum characters between a money keyword's end and the digit run's
    /// start for the run to qualify
    pub money_window: usize,

    /// Monetary values strictly above this land in Salary, the rest in
    /// Amount (deliberate heuristic, default 10,000)
    pub salary_threshold: u64,

    /// Keywords that mark an input line as a note
    pub note_keywords: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            name_blocklist: [
                "road",
                "street",
                "office",
                "company",
                "technologies",
                "city",
                "state",
                "country",
                "ltd",
                "district",
                "nagar",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_name_tokens: 3,
            restrict_phone_prefix: true,
            money_keywords: vec![
                "salary".to_string(),
                "amount paid".to_string(),
                "price".to_string(),
            ],
            money_window: 20,
            salary_threshold: 10_000,
            note_keywords: vec![
                "discussed".to_string(),
                "handled".to_string(),
                "managed".to_string(),
            ],
        }
    }
}

/// Field memory and history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of past extractions the history log retains
    pub history_capacity: usize,

    /// Observed sample values kept per field (first-observed win)
    pub max_samples_per_field: usize,

    /// Hard cap on distinct known field names; exceeding it is a resource
    /// error, not an extraction outcome
    pub max_known_fields: usize,

    /// Snapshot file for field memory (None = in-memory only)
    pub memory_file: Option<PathBuf>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            max_samples_per_field: 5,
            max_known_fields: 1024,
            memory_file: None,
        }
    }
}
