//! Text ingest boundary
//!
//! Decoding images, PDFs, and word-processor documents into text belongs to
//! external collaborators; this module only fixes the seam. A `TextDecoder`
//! turns uploaded bytes into text, and `merge_inputs` joins decoded text
//! with any pasted text into the single blob the extraction pass consumes.

use crate::error::{Error, Result};
use async_trait::async_trait;

/// Boundary for external document-to-text providers.
#[async_trait]
pub trait TextDecoder: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Decode raw bytes into UTF-8 text.
    async fn decode(&self, bytes: &[u8]) -> Result<String>;
}

/// Passthrough decoder for plain-text uploads.
pub struct PlainTextDecoder;

#[async_trait]
impl TextDecoder for PlainTextDecoder {
    fn name(&self) -> &str {
        "plain_text"
    }

    async fn decode(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::Ingest(e.to_string()))
    }
}

/// Join decoded and pasted text into one blob, decoded first, parts
/// separated by a newline. Missing or empty parts are skipped; both absent
/// yields the empty string, which is valid input for the extraction pass.
pub fn merge_inputs(decoded: Option<&str>, pasted: Option<&str>) -> String {
    let mut parts = Vec::new();
    if let Some(decoded) = decoded {
        if !decoded.is_empty() {
            parts.push(decoded);
        }
    }
    if let Some(pasted) = pasted {
        if !pasted.is_empty() {
            parts.push(pasted);
        }
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_both_sides() {
        assert_eq!(
            merge_inputs(Some("from document"), Some("pasted note")),
            "from document\npasted note"
        );
    }

    #[test]
    fn test_merge_single_sides() {
        assert_eq!(merge_inputs(Some("from document"), None), "from document");
        assert_eq!(merge_inputs(None, Some("pasted note")), "pasted note");
    }

    #[test]
    fn test_merge_empty_is_valid() {
        assert_eq!(merge_inputs(None, None), "");
        assert_eq!(merge_inputs(Some(""), Some("")), "");
    }

    #[tokio::test]
    async fn test_plain_text_decoder() {
        let decoder = PlainTextDecoder;
        assert_eq!(decoder.name(), "plain_text");
        let text = decoder.decode("phone 9876543210".as_bytes()).await.unwrap();
        assert_eq!(text, "phone 9876543210");
    }

    #[tokio::test]
    async fn test_plain_text_decoder_rejects_invalid_utf8() {
        let decoder = PlainTextDecoder;
        let err = decoder.decode(&[0xff, 0xfe, 0x00]).await.unwrap_err();
        assert!(matches!(err, Error::Ingest(_)));
    }
}
