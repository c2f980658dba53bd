//! Audit list filters
//!
//! Translates request-level filters into a [`Filter`]. When
//! `target_resource` is given the query is narrowed to the wrapper it
//! selects; otherwise every active dimension becomes a disjunction over all
//! four wrappers, and the dimensions are AND-ed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{AuditAction, AuditCategory};
use crate::query::{AuditField, Filter, SEARCH_FIELDS};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditFilters {
    #[serde(default)]
    pub action: Option<AuditAction>,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub target_user: Option<String>,
    #[serde(default)]
    pub target_resource: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    /// Case-insensitive substring over the searchable fields
    #[serde(default)]
    pub search: Option<String>,
    /// Inclusive lower bound on the stored timestamp
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the stored timestamp
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl AuditFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn target_user(mut self, user: impl Into<String>) -> Self {
        self.target_user = Some(user.into());
        self
    }

    pub fn target_resource(mut self, resource: impl Into<String>) -> Self {
        self.target_resource = Some(resource.into());
        self
    }

    pub fn resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn start_date(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn end_date(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(end);
        self
    }

    /// Wrappers the query runs against
    pub fn scope(&self) -> Vec<AuditCategory> {
        match non_empty(&self.target_resource) {
            Some(target) => vec![AuditCategory::for_target(Some(target))],
            None => AuditCategory::ALL.to_vec(),
        }
    }

    /// Build the compound filter: one clause per active dimension, AND-ed
    pub fn to_filter(&self) -> Filter {
        let scope = self.scope();
        let mut clauses = Vec::new();

        // A narrowed query also requires the wrapper itself, so a value that
        // collides with a field of another category cannot leak through.
        if let [category] = scope.as_slice() {
            clauses.push(Filter::exists(category.wrapper_key()));
        }

        if let Some(action) = self.action {
            clauses.push(Filter::any_wrapper(&scope, |w| {
                Filter::eq(w.path(AuditField::Action), action.as_str())
            }));
        }

        let exact = [
            (AuditField::Actor, &self.actor),
            (AuditField::TargetUser, &self.target_user),
            (AuditField::ResourceId, &self.resource_id),
        ];
        for (field, value) in exact {
            if let Some(value) = non_empty(value) {
                clauses.push(Filter::any_wrapper(&scope, |w| Filter::eq(w.path(field), value)));
            }
        }

        if self.start_date.is_some() || self.end_date.is_some() {
            clauses.push(Filter::any_wrapper(&scope, |w| {
                Filter::time_range(w.path(AuditField::Timestamp), self.start_date, self.end_date)
            }));
        }

        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let terms = scope
                .iter()
                .flat_map(|w| SEARCH_FIELDS.iter().map(move |f| Filter::contains(w.path(*f), term)))
                .collect();
            clauses.push(Filter::or(terms));
        }

        Filter::and(clauses)
    }
}

/// Every event where `principal` is the actor or the target user
pub fn involving_principal(principal: &str) -> Filter {
    Filter::or(
        AuditCategory::ALL
            .iter()
            .flat_map(|w| {
                [
                    Filter::eq(w.path(AuditField::Actor), principal),
                    Filter::eq(w.path(AuditField::TargetUser), principal),
                ]
            })
            .collect(),
    )
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
