//! The extraction pipeline's pure half
//!
//! `PatternLibrary` holds the compiled detectors; `RecordAssembler` turns
//! detector output into one `ExtractionRecord` per pass.

pub mod assembler;
pub mod patterns;
pub mod record;

pub use assembler::RecordAssembler;
pub use patterns::{MoneyBucket, PatternLibrary, ProductMatch};
pub use record::{builtin_fields, fields, ExtractionRecord, FieldValue};
