use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inference::DocumentRef;

/// Identity of one analysis run. Every in-flight call is tagged with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the user submitted. A field counts as present only if it has
/// non-whitespace content.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionInputs {
    pub job_description: String,
    pub resume_text: String,
    pub document: Option<DocumentRef>,
}

impl SessionInputs {
    pub fn new(job_description: impl Into<String>, resume_text: impl Into<String>) -> Self {
        Self {
            job_description: job_description.into(),
            resume_text: resume_text.into(),
            document: None,
        }
    }

    pub fn with_document(mut self, document: DocumentRef) -> Self {
        self.document = Some(document);
        self
    }

    pub fn has_job_description(&self) -> bool {
        !self.job_description.trim().is_empty()
    }

    pub fn has_resume_text(&self) -> bool {
        !self.resume_text.trim().is_empty()
    }

    pub fn has_document(&self) -> bool {
        self.document.as_ref().is_some_and(|d| !d.is_empty())
    }

    /// Nothing at all to analyze.
    pub fn is_blank(&self) -> bool {
        !self.has_job_description() && !self.has_resume_text() && !self.has_document()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub inputs: SessionInputs,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(inputs: SessionInputs) -> Self {
        Self {
            id: SessionId::new(),
            inputs,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_whitespace_is_not_present() {
        let inputs = SessionInputs::new("  \n", "\t");
        assert!(!inputs.has_job_description());
        assert!(!inputs.has_resume_text());
        assert!(inputs.is_blank());
    }

    #[test]
    fn test_empty_document_is_not_present() {
        let inputs = SessionInputs::default().with_document(DocumentRef::new(
            "cv.pdf",
            "application/pdf",
            Bytes::new(),
        ));
        assert!(!inputs.has_document());
        assert!(inputs.is_blank());
    }

    #[test]
    fn test_document_alone_is_not_blank() {
        let inputs = SessionInputs::default().with_document(DocumentRef::new(
            "cv.txt",
            "text/plain",
            Bytes::from_static(b"Rust"),
        ));
        assert!(inputs.has_document());
        assert!(!inputs.is_blank());
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = Session::new(SessionInputs::default());
        let b = Session::new(SessionInputs::default());
        assert_ne!(a.id, b.id);
    }
}
