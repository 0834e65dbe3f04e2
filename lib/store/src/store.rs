use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use fabx_core::{CoarseFilter, Record, Result};

/// Media kind of a supplementary attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
    #[serde(other)]
    Other,
}

/// Supplementary media row keyed by a free-form name that embeds one or
/// more product identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
    pub kind: AttachmentKind,
}

/// The external record store the engine narrows candidates through.
///
/// Implementations must honor the filter's conjunctive predicates, its
/// field projection, and its row cap (which bounds the fetch, not the
/// final page). The engine treats every error as a degraded empty result,
/// so implementations should return errors rather than hang.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Candidate rows for a coarse filter.
    async fn fetch_candidates(&self, filter: &CoarseFilter) -> Result<Vec<Record>>;

    /// Direct lookup by primary identifier, with field projection.
    /// `Ok(None)` means the identifier is unknown, not a failure.
    async fn fetch_by_code(&self, code: &str, fields: &[String]) -> Result<Option<Record>>;

    /// Attachments whose name mentions any of the given identifiers.
    async fn fetch_attachments(&self, codes: &[String]) -> Result<Vec<Attachment>>;
}
