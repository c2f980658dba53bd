//! Document-store capability used by the audit store
//!
//! The store only needs insert, filtered newest-first reads, counts and
//! point lookups. MongoDB provides them in production
//! ([`MongoAuditCollection`](crate::mongo::MongoAuditCollection)); the
//! in-memory collection evaluates the same [`Filter`] values for
//! development and tests.

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::Document;
use parking_lot::RwLock;

use crate::error::Result;
use crate::query::Filter;

#[async_trait]
pub trait AuditCollection: Send + Sync {
    /// Insert one document. The document carries its own `_id`.
    async fn insert_one(&self, document: Document) -> Result<()>;

    /// Matching documents, most recently created first (descending `_id`).
    /// A `limit` of 0 means no limit.
    async fn find_newest_first(
        &self,
        filter: &Filter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Document>>;

    async fn count(&self, filter: &Filter) -> Result<u64>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>>;
}

// ============================================================================
// In-Memory Collection (for testing/development)
// ============================================================================

/// Documents are held in insertion order. Reads sort by descending `_id`
/// like the MongoDB collection, since concurrent appends may insert in a
/// different order than their ObjectIds were generated.
pub struct MemoryAuditCollection {
    documents: RwLock<Vec<Document>>,
}

impl MemoryAuditCollection {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Raw stored documents, oldest first
    pub fn documents(&self) -> Vec<Document> {
        self.documents.read().clone()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl Default for MemoryAuditCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditCollection for MemoryAuditCollection {
    async fn insert_one(&self, document: Document) -> Result<()> {
        self.documents.write().push(document);
        Ok(())
    }

    async fn find_newest_first(
        &self,
        filter: &Filter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Document>> {
        let documents = self.documents.read();
        let mut matching: Vec<&Document> = documents
            .iter()
            .rev()
            .filter(|document| filter.matches(document))
            .collect();
        // Stable, so equal or missing ids keep newest-inserted first
        matching.sort_by(|a, b| object_id(b).cmp(&object_id(a)));

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = match limit {
            0 => usize::MAX,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };
        Ok(matching.into_iter().skip(skip).take(limit).cloned().collect())
    }

    async fn count(&self, filter: &Filter) -> Result<u64> {
        let documents = self.documents.read();
        Ok(documents.iter().filter(|document| filter.matches(document)).count() as u64)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>> {
        let documents = self.documents.read();
        Ok(documents
            .iter()
            .find(|document| document.get_object_id("_id").is_ok_and(|stored| stored == id))
            .cloned())
    }
}

fn object_id(document: &Document) -> Option<ObjectId> {
    document.get_object_id("_id").ok()
}
