use async_trait::async_trait;
use parking_lot::RwLock;

use fabx_core::{CoarseFilter, Record, Result};

use crate::store::{Attachment, RecordStore};

/// In-memory reference store: a linear scan over materialized records.
///
/// Used by the CLI demo runner and by tests; a production deployment
/// would put a database-backed [`RecordStore`] behind the same trait.
pub struct MemoryStore {
    key_field: String,
    records: RwLock<Vec<Record>>,
    attachments: RwLock<Vec<Attachment>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            records: RwLock::new(Vec::new()),
            attachments: RwLock::new(Vec::new()),
        }
    }

    pub fn load_records(&self, records: Vec<Record>) {
        self.records.write().extend(records);
    }

    pub fn load_attachments(&self, attachments: Vec<Attachment>) {
        self.attachments.write().extend(attachments);
    }

    pub fn count(&self) -> usize {
        self.records.read().len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("code")
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_candidates(&self, filter: &CoarseFilter) -> Result<Vec<Record>> {
        let records = self.records.read();
        let mut out: Vec<Record> = records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        if filter.row_cap > 0 {
            out.truncate(filter.row_cap);
        }
        if !filter.projection.is_empty() {
            for record in &mut out {
                record.project(&filter.projection);
            }
        }
        Ok(out)
    }

    async fn fetch_by_code(&self, code: &str, fields: &[String]) -> Result<Option<Record>> {
        let records = self.records.read();
        let found = records.iter().find(|r| r.text(&self.key_field) == code);
        Ok(found.map(|r| {
            let mut record = r.clone();
            if !fields.is_empty() {
                record.project(fields);
            }
            record
        }))
    }

    async fn fetch_attachments(&self, codes: &[String]) -> Result<Vec<Attachment>> {
        let attachments = self.attachments.read();
        Ok(attachments
            .iter()
            .filter(|a| {
                codes
                    .iter()
                    .any(|code| !code.is_empty() && a.name.contains(code.as_str()))
            })
            .cloned()
            .collect())
    }
}
