//! MongoDB Audit Collection
//!
//! Backs the audit store with a single MongoDB collection. Ordering uses the
//! ObjectId `_id`, which is creation-ordered, since the four wrapper subtrees
//! share no sortable top-level field.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use tracing::{debug, info};

use crate::collection::AuditCollection;
use crate::entity::AuditCategory;
use crate::error::Result;
use crate::query::{AuditField, Filter};

/// Fields indexed under every wrapper
const INDEXED_FIELDS: [AuditField; 4] = [
    AuditField::Actor,
    AuditField::TargetUser,
    AuditField::ResourceId,
    AuditField::Timestamp,
];

pub struct MongoAuditCollection {
    collection: Collection<Document>,
}

impl MongoAuditCollection {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection(collection_name),
        }
    }

    pub fn from_collection(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    pub fn name(&self) -> &str {
        self.collection.name()
    }

    /// Create the secondary indexes used by the audit filters
    pub async fn ensure_indexes(&self) -> Result<()> {
        info!(collection = %self.name(), "Initializing audit log indexes");

        self.collection
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "type": 1 })
                    .options(IndexOptions::builder().background(true).build())
                    .build(),
            )
            .await?;

        for category in AuditCategory::ALL {
            for field in INDEXED_FIELDS {
                let direction = if field == AuditField::Timestamp { -1 } else { 1 };
                self.collection
                    .create_index(
                        IndexModel::builder()
                            .keys(doc! { category.path(field): direction })
                            .options(IndexOptions::builder().background(true).sparse(true).build())
                            .build(),
                    )
                    .await?;
            }

            // Dashboard activity counts
            self.collection
                .create_index(
                    IndexModel::builder()
                        .keys(doc! {
                            category.path(AuditField::Action): 1,
                            category.path(AuditField::Timestamp): -1,
                        })
                        .options(IndexOptions::builder().background(true).build())
                        .build(),
                )
                .await?;
        }

        info!(collection = %self.name(), "Audit log indexes initialized");
        Ok(())
    }
}

#[async_trait]
impl AuditCollection for MongoAuditCollection {
    async fn insert_one(&self, document: Document) -> Result<()> {
        self.collection.insert_one(document).await?;
        Ok(())
    }

    async fn find_newest_first(
        &self,
        filter: &Filter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Document>> {
        let query = filter.to_document();
        debug!(filter = %query, skip, limit, "Querying audit logs");

        let options = FindOptions::builder()
            .sort(doc! { "_id": -1 })
            .skip(skip)
            .limit(find_limit(limit))
            .build();

        let cursor = self.collection.find(query).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self, filter: &Filter) -> Result<u64> {
        Ok(self.collection.count_documents(filter.to_document()).await?)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Document>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }
}

/// Driver limit for a requested one. 0 stays "no limit"; values past
/// `i64::MAX` saturate, since a negative limit means a single batch.
fn find_limit(limit: u64) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_limit_saturates() {
        assert_eq!(find_limit(0), 0);
        assert_eq!(find_limit(25), 25);
        assert_eq!(find_limit(i64::MAX as u64), i64::MAX);
        assert_eq!(find_limit(u64::MAX), i64::MAX);
        assert_eq!(find_limit(1 << 63), i64::MAX);
    }
}
