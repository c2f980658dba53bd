//! Warehouse Audit Log
//!
//! Append-only audit trail for warehouse mutations, kept in one document
//! collection. Each stored document files its event under exactly one of four
//! wrapper keys (`user_action`, `item_action`, `procurement_action`,
//! `general_action`) chosen from the event's `target_resource`.
//!
//! - [`AuditStore`]: write, filtered newest-first reads, point lookups and
//!   per-principal activity, flattening documents back into [`AuditRecord`]s
//! - [`AuditService`]: paging and the response envelope
//! - [`ActivityAggregator`]: created / updated / deleted dashboard counts
//! - [`Filter`]: typed query values rendered to MongoDB or evaluated in memory

pub mod access;
pub mod activity;
pub mod clock;
pub mod collection;
pub mod document;
pub mod entity;
pub mod error;
pub mod filters;
pub mod mongo;
pub mod query;
pub mod service;
pub mod store;

pub use access::{checks, AuditPrincipal};
pub use activity::{ActivityAggregator, ActivityBucket, ActivityCounts};
pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::{AuditCollection, MemoryAuditCollection};
pub use document::{MalformedDocument, StoredAuditDocument};
pub use entity::{AuditAction, AuditCategory, AuditChanges, AuditEvent, AuditRecord};
pub use error::{AuditError, Result};
pub use filters::{involving_principal, AuditFilters};
pub use mongo::MongoAuditCollection;
pub use query::{AuditField, Filter, SEARCH_FIELDS};
pub use service::{AuditPage, AuditService};
pub use store::AuditStore;
