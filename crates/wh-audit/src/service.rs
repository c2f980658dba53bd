//! Audit Service
//!
//! Validates paging, translates page/page_size into skip/limit and wraps
//! store results in an [`AuditPage`].

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use wh_config::AuditConfig;

use crate::access::AuditPrincipal;
use crate::entity::{AuditEvent, AuditRecord};
use crate::error::{AuditError, Result};
use crate::filters::AuditFilters;
use crate::store::AuditStore;

/// One page of flattened audit records
#[derive(Debug, Clone, Serialize)]
pub struct AuditPage {
    pub events: Vec<AuditRecord>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl AuditPage {
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size)) as u32
    }
}

#[derive(Clone)]
pub struct AuditService {
    store: Arc<AuditStore>,
    config: AuditConfig,
}

impl AuditService {
    pub fn new(store: Arc<AuditStore>, config: AuditConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<AuditStore> {
        &self.store
    }

    /// Record an event as submitted
    pub async fn record(&self, event: AuditEvent) -> Result<String> {
        let id = self.store.append(&event).await?;

        info!(
            id = %id,
            action = %event.action,
            actor = %event.actor,
            target_resource = ?event.target_resource,
            resource_id = ?event.resource_id,
            "Audit log recorded"
        );
        Ok(id)
    }

    /// Record an event on behalf of an authenticated principal, replacing
    /// whatever actor fields were submitted
    pub async fn record_as(
        &self,
        principal: &AuditPrincipal,
        mut event: AuditEvent,
    ) -> Result<String> {
        event.actor = principal.username.clone();
        event.actor_role = principal.role.clone();
        self.record(event).await
    }

    pub async fn list(
        &self,
        filters: &AuditFilters,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<AuditPage> {
        let (page, page_size) = self.paging(page, page_size)?;
        let (events, total) = self
            .store
            .query(filters, skip(page, page_size), u64::from(page_size))
            .await?;

        Ok(AuditPage { events, total, page, page_size })
    }

    pub async fn get(&self, id: &str) -> Result<Option<AuditRecord>> {
        self.store.get(id).await
    }

    /// Everything `principal` did or had done to them
    pub async fn activity(
        &self,
        principal: &str,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<AuditPage> {
        if principal.trim().is_empty() {
            return Err(AuditError::validation("principal is required"));
        }

        let (page, page_size) = self.paging(page, page_size)?;
        let (events, total) = self
            .store
            .activity_for(principal, skip(page, page_size), u64::from(page_size))
            .await?;

        Ok(AuditPage { events, total, page, page_size })
    }

    fn paging(&self, page: Option<u32>, page_size: Option<u32>) -> Result<(u32, u32)> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(self.config.default_page_size);

        if page == 0 {
            return Err(AuditError::validation("page must be at least 1"));
        }
        if page_size == 0 || page_size > self.config.max_page_size {
            return Err(AuditError::validation(format!(
                "page_size must be between 1 and {}",
                self.config.max_page_size
            )));
        }
        Ok((page, page_size))
    }
}

fn skip(page: u32, page_size: u32) -> u64 {
    u64::from(page - 1) * u64::from(page_size)
}
