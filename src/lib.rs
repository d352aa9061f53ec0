//! fieldglean - Learning text extraction service
//!
//! fieldglean pulls structured records out of free-form text. A fixed set of
//! regex detectors finds people, contact details, monetary values, dates and
//! transaction markers; a field memory learns which field names show up over
//! time and probes for runtime-registered custom fields; a bounded history
//! keeps the most recent extractions; an export flattener turns any record
//! into spreadsheet-ready `(Field, Value)` rows.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     ExtractionService                      │
//! │                                                            │
//! │  text ──► ┌──────────────────┐      ┌──────────────────┐   │
//! │           │ RecordAssembler  │─────►│  ExtractionRecord│   │
//! │           │  - detectors     │      │  (ordered fields)│   │
//! │           │  - custom probes │      └────────┬─────────┘   │
//! │           └────────┬─────────┘               │             │
//! │                    │ observe                 │ append      │
//! │           ┌────────▼─────────┐      ┌────────▼─────────┐   │
//! │           │   FieldMemory    │      │    HistoryLog    │   │
//! │           │  names + samples │      │  newest first,   │   │
//! │           │  (snapshot file) │      │  bounded         │   │
//! │           └──────────────────┘      └──────────────────┘   │
//! └────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                  export::flatten -> (Field, Value) rows
//! ```
//!
//! ## Modules
//!
//! - [`extract`]: detectors, record assembly and the record value model
//! - [`memory`]: learned field vocabulary and the bounded history log
//! - [`export`]: record flattening for tabular output
//! - [`ingest`]: text decoding and input merging
//! - [`service`]: the facade tying the pipeline together
//! - [`api`]: HTTP endpoints over the service
//! - [`config`]: configuration management

pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod ingest;
pub mod memory;
pub mod service;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use extract::{ExtractionRecord, FieldValue};
pub use service::ExtractionService;
