//! Audit Store
//!
//! Persists events as wrapped documents and answers filtered, paginated,
//! newest-first reads. Owns the wrap/flatten logic.

use std::sync::Arc;

use bson::oid::ObjectId;
use bson::Document;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::collection::AuditCollection;
use crate::document::StoredAuditDocument;
use crate::entity::{AuditEvent, AuditRecord};
use crate::error::Result;
use crate::filters::{involving_principal, AuditFilters};
use crate::query::Filter;

pub struct AuditStore {
    collection: Arc<dyn AuditCollection>,
    clock: Arc<dyn Clock>,
}

impl AuditStore {
    pub fn new(collection: Arc<dyn AuditCollection>) -> Self {
        Self::with_clock(collection, Arc::new(SystemClock))
    }

    pub fn with_clock(collection: Arc<dyn AuditCollection>, clock: Arc<dyn Clock>) -> Self {
        Self { collection, clock }
    }

    pub fn collection(&self) -> &Arc<dyn AuditCollection> {
        &self.collection
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Persist one event and return its new identifier.
    ///
    /// The timestamp is always taken from the store's clock.
    pub async fn append(&self, event: &AuditEvent) -> Result<String> {
        event.validate()?;

        let stored = StoredAuditDocument::new(ObjectId::new(), event.clone(), self.clock.now());
        let document = stored.to_document()?;
        self.collection.insert_one(document).await?;

        debug!(
            id = %stored.id,
            wrapper = %stored.category,
            action = %event.action,
            "Audit event stored"
        );
        Ok(stored.id.to_hex())
    }

    /// Filtered page, newest first, plus the full filtered count
    pub async fn query(
        &self,
        filters: &AuditFilters,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<AuditRecord>, u64)> {
        self.find_page(&filters.to_filter(), skip, limit).await
    }

    /// Point lookup. Unknown or syntactically invalid ids are `None`.
    pub async fn get(&self, id: &str) -> Result<Option<AuditRecord>> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        Ok(self
            .collection
            .find_by_id(object_id)
            .await?
            .and_then(|document| flatten(&document)))
    }

    /// Events where `principal` is the actor or the target user
    pub async fn activity_for(
        &self,
        principal: &str,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<AuditRecord>, u64)> {
        self.find_page(&involving_principal(principal), skip, limit).await
    }

    async fn find_page(
        &self,
        filter: &Filter,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<AuditRecord>, u64)> {
        let documents = self.collection.find_newest_first(filter, skip, limit).await?;
        let total = self.collection.count(filter).await?;

        let records = documents.iter().filter_map(flatten).collect();
        Ok((records, total))
    }
}

/// Unwrap a stored document, skipping it if it is malformed
fn flatten(document: &Document) -> Option<AuditRecord> {
    match StoredAuditDocument::from_document(document) {
        Ok(stored) => Some(stored.into_record()),
        Err(e) => {
            warn!(
                id = ?document.get("_id"),
                error = %e,
                "Skipping malformed audit document"
            );
            None
        }
    }
}
