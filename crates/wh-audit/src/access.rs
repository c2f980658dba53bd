//! Access checks for the audit read paths
//!
//! Used by the route layer; the store and service do not call these.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Authenticated caller as seen by the audit subsystem
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPrincipal {
    pub username: String,

    /// Role label recorded as `actor_role`
    pub role: String,

    #[serde(default)]
    pub permissions: HashSet<String>,
}

pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const SUPERADMIN: &str = "superadmin";
}

pub mod permissions {
    pub const ADMIN: &str = "admin";
    pub const INVENTORY_READ: &str = "inventory:ro";
    pub const INVENTORY_WRITE: &str = "inventory:rw";
}

impl AuditPrincipal {
    pub fn new(username: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: role.into(),
            permissions: HashSet::new(),
        }
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn is_admin(&self) -> bool {
        self.role == roles::ADMIN
            || self.role == roles::SUPERADMIN
            || self.has_permission(permissions::ADMIN)
    }

    /// List and inspect audit logs
    pub fn can_view_audit_logs(&self) -> bool {
        self.is_admin()
            || self.has_permission(permissions::INVENTORY_READ)
            || self.has_permission(permissions::INVENTORY_WRITE)
    }

    /// Per-user activity views and dashboard counts
    pub fn can_view_user_activity(&self) -> bool {
        self.is_admin()
    }
}

/// Common authorization checks
pub mod checks {
    use super::*;
    use crate::error::{AuditError, Result};

    pub fn require_audit_access(principal: &AuditPrincipal) -> Result<()> {
        if principal.can_view_audit_logs() {
            Ok(())
        } else {
            Err(AuditError::forbidden("Insufficient permissions to view audit logs"))
        }
    }

    pub fn require_admin(principal: &AuditPrincipal) -> Result<()> {
        if principal.can_view_user_activity() {
            Ok(())
        } else {
            Err(AuditError::forbidden("Admin access required"))
        }
    }
}
