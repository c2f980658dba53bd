//! Typed audit query builder
//!
//! Filters are values, not mutated documents. A logical field is qualified
//! by the wrapper it lives under ([`AuditCategory::path`]), predicates are
//! combined with explicit [`Filter::and`] / [`Filter::or`], and the result is
//! rendered to a MongoDB filter document or evaluated in memory.
//!
//! Because a document carries exactly one wrapper, "field F matches in any
//! wrapper" is a disjunction over wrappers, and several active dimensions are
//! a conjunction of those disjunctions: `$and: [{$or: ...}, {$or: ...}]`.

use std::cmp::Ordering;

use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use regex::RegexBuilder;

use crate::entity::AuditCategory;

/// Logical fields of an audit event payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditField {
    Action,
    Actor,
    ActorRole,
    TargetUser,
    TargetRole,
    TargetResource,
    ResourceId,
    Reason,
    Details,
    Timestamp,
    ChangesName,
    ChangesCatalogNumber,
}

impl AuditField {
    /// Path of the field inside a wrapper subtree
    pub fn as_str(self) -> &'static str {
        match self {
            AuditField::Action => "action",
            AuditField::Actor => "actor",
            AuditField::ActorRole => "actor_role",
            AuditField::TargetUser => "target_user",
            AuditField::TargetRole => "target_role",
            AuditField::TargetResource => "target_resource",
            AuditField::ResourceId => "resource_id",
            AuditField::Reason => "reason",
            AuditField::Details => "details",
            AuditField::Timestamp => "timestamp",
            AuditField::ChangesName => "changes.name",
            AuditField::ChangesCatalogNumber => "changes.catalog_number",
        }
    }
}

/// Fields covered by free-text search
pub const SEARCH_FIELDS: [AuditField; 8] = [
    AuditField::Actor,
    AuditField::TargetUser,
    AuditField::TargetResource,
    AuditField::ResourceId,
    AuditField::Reason,
    AuditField::Details,
    AuditField::ChangesName,
    AuditField::ChangesCatalogNumber,
];

impl AuditCategory {
    /// Dot path of `field` under this wrapper, e.g. `item_action.actor`
    pub fn path(self, field: AuditField) -> String {
        format!("{}.{}", self.wrapper_key(), field.as_str())
    }
}

/// A composable filter over stored audit documents
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals value
    Eq { path: String, value: Bson },
    /// Field equals one of the values
    In { path: String, values: Vec<Bson> },
    /// Field is present
    Exists { path: String },
    /// Inclusive bounds; a missing bound is open
    Range { path: String, gte: Option<Bson>, lte: Option<Bson> },
    /// Case-insensitive literal substring match on a string field
    Contains { path: String, term: String },
    /// Every clause matches; empty matches everything
    And(Vec<Filter>),
    /// At least one clause matches; empty matches nothing
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Eq { path: path.into(), value: value.into() }
    }

    pub fn is_in(path: impl Into<String>, values: Vec<Bson>) -> Self {
        Filter::In { path: path.into(), values }
    }

    pub fn exists(path: impl Into<String>) -> Self {
        Filter::Exists { path: path.into() }
    }

    pub fn range(path: impl Into<String>, gte: Option<Bson>, lte: Option<Bson>) -> Self {
        Filter::Range { path: path.into(), gte, lte }
    }

    /// Inclusive timestamp window
    pub fn time_range(
        path: impl Into<String>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        Filter::range(path, start.map(bson_datetime), end.map(bson_datetime))
    }

    pub fn contains(path: impl Into<String>, term: impl Into<String>) -> Self {
        Filter::Contains { path: path.into(), term: term.into() }
    }

    /// Conjunction; a single clause is returned as-is
    pub fn and(mut clauses: Vec<Filter>) -> Self {
        if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            Filter::And(clauses)
        }
    }

    /// Disjunction; a single clause is returned as-is
    pub fn or(mut clauses: Vec<Filter>) -> Self {
        if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            Filter::Or(clauses)
        }
    }

    /// Matches every document
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    /// `predicate` applied under each wrapper in `scope`, OR-ed together
    pub fn any_wrapper<F>(scope: &[AuditCategory], predicate: F) -> Self
    where
        F: Fn(AuditCategory) -> Filter,
    {
        Filter::or(scope.iter().copied().map(predicate).collect())
    }

    /// Render as a MongoDB filter document
    pub fn to_document(&self) -> Document {
        match self {
            Filter::Eq { path, value } => doc! { path.as_str(): value.clone() },
            Filter::In { path, values } => doc! { path.as_str(): { "$in": values.clone() } },
            Filter::Exists { path } => doc! { path.as_str(): { "$exists": true } },
            Filter::Range { path, gte, lte } => {
                let mut bounds = Document::new();
                if let Some(gte) = gte {
                    bounds.insert("$gte", gte.clone());
                }
                if let Some(lte) = lte {
                    bounds.insert("$lte", lte.clone());
                }
                if bounds.is_empty() {
                    doc! { path.as_str(): { "$exists": true } }
                } else {
                    doc! { path.as_str(): bounds }
                }
            }
            Filter::Contains { path, term } => doc! {
                path.as_str(): { "$regex": regex::escape(term), "$options": "i" }
            },
            Filter::And(clauses) if clauses.is_empty() => Document::new(),
            Filter::And(clauses) => doc! { "$and": render_all(clauses) },
            // $or rejects an empty array; every document has an _id
            Filter::Or(clauses) if clauses.is_empty() => doc! { "_id": { "$exists": false } },
            Filter::Or(clauses) => doc! { "$or": render_all(clauses) },
        }
    }

    /// Evaluate against a stored document with MongoDB semantics
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::Eq { path, value } => lookup(document, path).is_some_and(|v| v == value),
            Filter::In { path, values } => {
                lookup(document, path).is_some_and(|v| values.contains(v))
            }
            Filter::Exists { path } => lookup(document, path).is_some(),
            Filter::Range { path, gte, lte } => match lookup(document, path) {
                Some(value) => {
                    let above = gte.as_ref().map_or(true, |bound| {
                        matches!(compare(value, bound), Some(Ordering::Greater | Ordering::Equal))
                    });
                    let below = lte.as_ref().map_or(true, |bound| {
                        matches!(compare(value, bound), Some(Ordering::Less | Ordering::Equal))
                    });
                    above && below
                }
                None => false,
            },
            Filter::Contains { path, term } => match lookup(document, path) {
                Some(Bson::String(s)) => RegexBuilder::new(&regex::escape(term))
                    .case_insensitive(true)
                    .build()
                    .map(|re| re.is_match(s))
                    .unwrap_or(false),
                _ => false,
            },
            Filter::And(clauses) => clauses.iter().all(|c| c.matches(document)),
            Filter::Or(clauses) => clauses.iter().any(|c| c.matches(document)),
        }
    }
}

fn render_all(clauses: &[Filter]) -> Vec<Bson> {
    clauses.iter().map(|c| Bson::Document(c.to_document())).collect()
}

pub(crate) fn bson_datetime(value: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_chrono(value))
}

/// Resolve a dot path through nested documents
fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        match current {
            Bson::Document(inner) => current = inner.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Ordering between comparable BSON values; `None` across incompatible types
fn compare(left: &Bson, right: &Bson) -> Option<Ordering> {
    match (left, right) {
        (Bson::DateTime(a), Bson::DateTime(b)) => Some(a.cmp(b)),
        (Bson::String(a), Bson::String(b)) => Some(a.cmp(b)),
        (Bson::ObjectId(a), Bson::ObjectId(b)) => Some(a.cmp(b)),
        _ => {
            let a = as_f64(left)?;
            let b = as_f64(right)?;
            a.partial_cmp(&b)
        }
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}
