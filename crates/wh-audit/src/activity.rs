//! Activity Aggregator
//!
//! Dashboard counts of created / updated / deleted events over a lookback
//! window, across all four wrappers.

use std::sync::Arc;

use bson::Bson;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;
use wh_config::AuditConfig;

use crate::clock::Clock;
use crate::collection::AuditCollection;
use crate::entity::{AuditAction, AuditCategory};
use crate::error::{AuditError, Result};
use crate::query::{bson_datetime, AuditField, Filter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityBucket {
    Created,
    Updated,
    Deleted,
}

impl ActivityBucket {
    pub const ALL: [ActivityBucket; 3] = [
        ActivityBucket::Created,
        ActivityBucket::Updated,
        ActivityBucket::Deleted,
    ];

    /// Bucket an action counts towards. Adding an action kind forces a
    /// decision here.
    pub fn of(action: AuditAction) -> Option<Self> {
        match action {
            AuditAction::ItemCreate | AuditAction::ProcurementCreate | AuditAction::UserCreate => {
                Some(ActivityBucket::Created)
            }

            AuditAction::ItemUpdate
            | AuditAction::ItemBulkUpdate
            | AuditAction::ProcurementUpdate
            | AuditAction::UserUpdate
            | AuditAction::PasswordChange
            | AuditAction::RoleChange => Some(ActivityBucket::Updated),

            AuditAction::ItemDelete
            | AuditAction::ItemBulkDelete
            | AuditAction::ProcurementDelete
            | AuditAction::UserDelete => Some(ActivityBucket::Deleted),

            AuditAction::UserLogin
            | AuditAction::UserLogout
            | AuditAction::GroupCreate
            | AuditAction::GroupUpdate
            | AuditAction::GroupDelete
            | AuditAction::ProcurementFileUpload
            | AuditAction::ProcurementFileDelete
            | AuditAction::ItemImport
            | AuditAction::Undo => None,
        }
    }

    /// Every action kind in this bucket
    pub fn actions(self) -> Vec<AuditAction> {
        AuditAction::ALL
            .into_iter()
            .filter(|action| ActivityBucket::of(*action) == Some(self))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityCounts {
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    pub window_days: u32,
}

pub struct ActivityAggregator {
    collection: Arc<dyn AuditCollection>,
    clock: Arc<dyn Clock>,
    config: AuditConfig,
}

impl ActivityAggregator {
    pub fn new(
        collection: Arc<dyn AuditCollection>,
        clock: Arc<dyn Clock>,
        config: AuditConfig,
    ) -> Self {
        Self { collection, clock, config }
    }

    /// Counts over the configured default window
    pub async fn activity_counts_default(&self) -> Result<ActivityCounts> {
        self.activity_counts(self.config.default_activity_window_days).await
    }

    pub async fn activity_counts(&self, window_days: u32) -> Result<ActivityCounts> {
        if window_days == 0 || window_days > self.config.max_activity_window_days {
            return Err(AuditError::validation(format!(
                "window_days must be between 1 and {}",
                self.config.max_activity_window_days
            )));
        }

        let window_start = self.clock.now() - Duration::days(i64::from(window_days));
        debug!(window_days, %window_start, "Counting audit activity");

        let created = self.count_bucket(ActivityBucket::Created, window_start).await?;
        let updated = self.count_bucket(ActivityBucket::Updated, window_start).await?;
        let deleted = self.count_bucket(ActivityBucket::Deleted, window_start).await?;

        Ok(ActivityCounts { created, updated, deleted, window_days })
    }

    async fn count_bucket(
        &self,
        bucket: ActivityBucket,
        window_start: DateTime<Utc>,
    ) -> Result<u64> {
        self.collection.count(&bucket_filter(bucket, window_start)).await
    }
}

/// One term per wrapper: recent enough and in the bucket
fn bucket_filter(bucket: ActivityBucket, window_start: DateTime<Utc>) -> Filter {
    let actions: Vec<Bson> = bucket.actions().into_iter().map(|a| Bson::from(a.as_str())).collect();

    Filter::any_wrapper(&AuditCategory::ALL, |w| {
        Filter::And(vec![
            Filter::range(w.path(AuditField::Timestamp), Some(bson_datetime(window_start)), None),
            Filter::is_in(w.path(AuditField::Action), actions.clone()),
        ])
    })
}
