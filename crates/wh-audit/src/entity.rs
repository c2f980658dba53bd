//! Audit Record Model
//!
//! One auditable action, the closed set of action kinds, and the four
//! wrapper categories an event is filed under.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AuditError, Result};

/// Auditable action kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Users
    UserCreate,
    UserUpdate,
    UserDelete,
    UserLogin,
    UserLogout,
    PasswordChange,
    RoleChange,

    // Groups
    GroupCreate,
    GroupUpdate,
    GroupDelete,

    // Procurement
    ProcurementCreate,
    ProcurementUpdate,
    ProcurementDelete,
    ProcurementFileUpload,
    ProcurementFileDelete,

    // Inventory items
    ItemCreate,
    ItemUpdate,
    ItemDelete,
    ItemBulkUpdate,
    ItemBulkDelete,
    ItemImport,
    Undo,
}

impl AuditAction {
    pub const ALL: [AuditAction; 22] = [
        AuditAction::UserCreate,
        AuditAction::UserUpdate,
        AuditAction::UserDelete,
        AuditAction::UserLogin,
        AuditAction::UserLogout,
        AuditAction::PasswordChange,
        AuditAction::RoleChange,
        AuditAction::GroupCreate,
        AuditAction::GroupUpdate,
        AuditAction::GroupDelete,
        AuditAction::ProcurementCreate,
        AuditAction::ProcurementUpdate,
        AuditAction::ProcurementDelete,
        AuditAction::ProcurementFileUpload,
        AuditAction::ProcurementFileDelete,
        AuditAction::ItemCreate,
        AuditAction::ItemUpdate,
        AuditAction::ItemDelete,
        AuditAction::ItemBulkUpdate,
        AuditAction::ItemBulkDelete,
        AuditAction::ItemImport,
        AuditAction::Undo,
    ];

    /// Stored string form
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::UserCreate => "user_create",
            AuditAction::UserUpdate => "user_update",
            AuditAction::UserDelete => "user_delete",
            AuditAction::UserLogin => "user_login",
            AuditAction::UserLogout => "user_logout",
            AuditAction::PasswordChange => "password_change",
            AuditAction::RoleChange => "role_change",
            AuditAction::GroupCreate => "group_create",
            AuditAction::GroupUpdate => "group_update",
            AuditAction::GroupDelete => "group_delete",
            AuditAction::ProcurementCreate => "procurement_create",
            AuditAction::ProcurementUpdate => "procurement_update",
            AuditAction::ProcurementDelete => "procurement_delete",
            AuditAction::ProcurementFileUpload => "procurement_file_upload",
            AuditAction::ProcurementFileDelete => "procurement_file_delete",
            AuditAction::ItemCreate => "item_create",
            AuditAction::ItemUpdate => "item_update",
            AuditAction::ItemDelete => "item_delete",
            AuditAction::ItemBulkUpdate => "item_bulk_update",
            AuditAction::ItemBulkDelete => "item_bulk_delete",
            AuditAction::ItemImport => "item_import",
            AuditAction::Undo => "undo",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self> {
        AuditAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| AuditError::validation(format!("Unknown audit action: {s}")))
    }
}

/// Wrapper category a stored audit document is filed under.
///
/// Every stored document carries exactly one of the four wrapper keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuditCategory {
    User,
    Item,
    Procurement,
    General,
}

impl AuditCategory {
    pub const ALL: [AuditCategory; 4] = [
        AuditCategory::User,
        AuditCategory::Item,
        AuditCategory::Procurement,
        AuditCategory::General,
    ];

    /// Top-level document key holding the event payload
    pub fn wrapper_key(self) -> &'static str {
        match self {
            AuditCategory::User => "user_action",
            AuditCategory::Item => "item_action",
            AuditCategory::Procurement => "procurement_action",
            AuditCategory::General => "general_action",
        }
    }

    pub fn from_wrapper_key(key: &str) -> Option<Self> {
        AuditCategory::ALL
            .into_iter()
            .find(|category| category.wrapper_key() == key)
    }

    /// Wrapper selection at write time. Total over every `target_resource`.
    pub fn for_target(target_resource: Option<&str>) -> Self {
        match target_resource {
            Some("user") | Some("group") => AuditCategory::User,
            Some("item") => AuditCategory::Item,
            Some("procurement_order") => AuditCategory::Procurement,
            _ => AuditCategory::General,
        }
    }
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wrapper_key())
    }
}

/// Field-level diff: field name to `{old, new}` (values are open-ended JSON)
pub type AuditChanges = Map<String, Value>;

/// One auditable action as supplied by the caller.
///
/// There is no timestamp here: the store assigns it at write time, and a
/// `timestamp` key in incoming JSON is dropped on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub action: AuditAction,

    /// Principal who performed the action
    pub actor: String,

    /// Role of the actor at the time of the action
    pub actor_role: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_role: Option<String>,

    /// Resource category ("item", "user", "group", "procurement_order", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_resource: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<AuditChanges>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        actor: impl Into<String>,
        actor_role: impl Into<String>,
    ) -> Self {
        Self {
            action,
            actor: actor.into(),
            actor_role: actor_role.into(),
            target_user: None,
            target_role: None,
            target_resource: None,
            resource_id: None,
            changes: None,
            reason: None,
            details: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn with_target_user(mut self, user: impl Into<String>) -> Self {
        self.target_user = Some(user.into());
        self
    }

    pub fn with_target_role(mut self, role: impl Into<String>) -> Self {
        self.target_role = Some(role.into());
        self
    }

    pub fn with_target_resource(mut self, resource: impl Into<String>) -> Self {
        self.target_resource = Some(resource.into());
        self
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn with_changes(mut self, changes: AuditChanges) -> Self {
        self.changes = Some(changes);
        self
    }

    /// Record one `{old, new}` pair under `field`
    pub fn with_change(
        mut self,
        field: impl Into<String>,
        old: impl Into<Value>,
        new: impl Into<Value>,
    ) -> Self {
        let mut pair = Map::new();
        pair.insert("old".to_string(), old.into());
        pair.insert("new".to_string(), new.into());
        self.changes
            .get_or_insert_with(Map::new)
            .insert(field.into(), Value::Object(pair));
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_request_info(
        mut self,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    /// Wrapper this event is filed under
    pub fn category(&self) -> AuditCategory {
        AuditCategory::for_target(self.target_resource.as_deref())
    }

    /// Reject events missing the mandatory actor fields
    pub fn validate(&self) -> Result<()> {
        if self.actor.trim().is_empty() {
            return Err(AuditError::validation("actor is required"));
        }
        if self.actor_role.trim().is_empty() {
            return Err(AuditError::validation("actor_role is required"));
        }
        Ok(())
    }
}

/// Flattened audit record as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub id: String,

    /// Assigned by the store at write time
    pub timestamp: DateTime<Utc>,

    /// Wrapper the document was stored under
    #[serde(skip)]
    pub category: AuditCategory,

    #[serde(flatten)]
    pub event: AuditEvent,
}
