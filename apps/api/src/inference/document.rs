//! Uploaded résumé documents and their conversion to plain text.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::Serialize;

use crate::inference::InferenceError;

const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A reference to an uploaded résumé file. Content is shared, so cloning is cheap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRef {
    pub file_name: String,
    pub media_type: String,
    #[serde(skip)]
    pub content: Bytes,
}

impl DocumentRef {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, content: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            content,
        }
    }

    /// Decodes `data:<mime>;base64,<payload>`.
    pub fn from_data_uri(file_name: &str, uri: &str) -> Result<Self, InferenceError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| InferenceError::InvalidInput("document is not a data URI".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| InferenceError::InvalidInput("data URI has no payload".to_string()))?;
        let media_type = header.strip_suffix(";base64").ok_or_else(|| {
            InferenceError::InvalidInput("data URI must be base64-encoded".to_string())
        })?;
        if media_type.is_empty() {
            return Err(InferenceError::InvalidInput(
                "data URI must declare a MIME type".to_string(),
            ));
        }

        let content = BASE64_STANDARD
            .decode(payload.trim())
            .map_err(|e| InferenceError::InvalidInput(format!("invalid base64 payload: {e}")))?;

        Ok(Self::new(file_name, media_type, Bytes::from(content)))
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Extracts the document's text. PDF extraction is CPU-bound and runs on the
    /// blocking pool.
    pub async fn extract_text(&self) -> Result<String, InferenceError> {
        if self.is_empty() {
            return Err(InferenceError::InvalidInput(format!(
                "document '{}' is empty",
                self.file_name
            )));
        }

        let media_type = self.media_type.to_ascii_lowercase();
        let text = if media_type == PDF_MEDIA_TYPE {
            let content = self.content.clone();
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&content))
                .await
                .map_err(|e| InferenceError::Upstream(format!("PDF extraction task failed: {e}")))?
                .map_err(|e| InferenceError::InvalidInput(format!("unreadable PDF: {e}")))?
        } else if media_type.starts_with("text/") {
            String::from_utf8(self.content.to_vec()).map_err(|_| {
                InferenceError::InvalidInput(format!(
                    "document '{}' is not valid UTF-8",
                    self.file_name
                ))
            })?
        } else {
            return Err(InferenceError::InvalidInput(format!(
                "unsupported document type '{}'",
                self.media_type
            )));
        };

        if text.trim().is_empty() {
            return Err(InferenceError::InvalidInput(format!(
                "no text could be extracted from '{}'",
                self.file_name
            )));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data_uri_decodes_payload() {
        let payload = BASE64_STANDARD.encode("Jane Doe\nRust engineer");
        let uri = format!("data:text/plain;base64,{payload}");
        let doc = DocumentRef::from_data_uri("resume.txt", &uri).unwrap();
        assert_eq!(doc.media_type, "text/plain");
        assert_eq!(&doc.content[..], b"Jane Doe\nRust engineer");
    }

    #[test]
    fn test_from_data_uri_rejects_plain_string() {
        let err = DocumentRef::from_data_uri("resume.txt", "hello").unwrap_err();
        assert!(matches!(err, InferenceError::InvalidInput(_)));
    }

    #[test]
    fn test_from_data_uri_requires_base64_marker() {
        let err = DocumentRef::from_data_uri("resume.txt", "data:text/plain,hello").unwrap_err();
        assert!(matches!(err, InferenceError::InvalidInput(_)));
    }

    #[test]
    fn test_from_data_uri_rejects_bad_payload() {
        let err =
            DocumentRef::from_data_uri("resume.txt", "data:text/plain;base64,@@@").unwrap_err();
        assert!(matches!(err, InferenceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_extract_text_plain() {
        let doc = DocumentRef::new("cv.txt", "text/plain", Bytes::from_static(b"Go, gRPC"));
        assert_eq!(doc.extract_text().await.unwrap(), "Go, gRPC");
    }

    #[tokio::test]
    async fn test_extract_text_rejects_unknown_type() {
        let doc = DocumentRef::new("cv.png", "image/png", Bytes::from_static(b"\x89PNG"));
        let err = doc.extract_text().await.unwrap_err();
        assert!(matches!(err, InferenceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_extract_text_rejects_empty_document() {
        let doc = DocumentRef::new("cv.txt", "text/plain", Bytes::new());
        let err = doc.extract_text().await.unwrap_err();
        assert!(matches!(err, InferenceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_extract_text_rejects_whitespace_only() {
        let doc = DocumentRef::new("cv.txt", "text/plain", Bytes::from_static(b"   \n"));
        assert!(doc.extract_text().await.is_err());
    }
}
