//! Wrapped storage document
//!
//! Stored shape: `{ _id, <wrapper_key>: { ...event, timestamp }, type: <wrapper_key> }`.
//! `type` is an index helper; the wrapper key actually present is authoritative.

use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::entity::{AuditCategory, AuditEvent, AuditRecord};
use crate::error::Result;

pub const TYPE_FIELD: &str = "type";
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Why a stored document could not be flattened
#[derive(Error, Debug)]
pub enum MalformedDocument {
    #[error("missing or non-ObjectId _id")]
    MissingId,

    #[error("no wrapper key present")]
    NoWrapper,

    #[error("{0} wrapper keys present")]
    MultipleWrappers(usize),

    #[error("payload has no timestamp")]
    MissingTimestamp,

    #[error("payload does not decode: {0}")]
    Payload(#[from] bson::de::Error),
}

/// One audit event as filed under its wrapper
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAuditDocument {
    pub id: ObjectId,
    pub category: AuditCategory,
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

impl StoredAuditDocument {
    /// File `event` under the wrapper its `target_resource` selects
    pub fn new(id: ObjectId, event: AuditEvent, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            category: event.category(),
            timestamp,
            event,
        }
    }

    pub fn to_document(&self) -> Result<Document> {
        let mut payload = bson::to_document(&self.event)?;
        payload.insert(TIMESTAMP_FIELD, bson::DateTime::from_chrono(self.timestamp));

        let wrapper = self.category.wrapper_key();
        let mut document = doc! { "_id": self.id };
        document.insert(wrapper, payload);
        document.insert(TYPE_FIELD, wrapper);
        Ok(document)
    }

    pub fn from_document(document: &Document) -> std::result::Result<Self, MalformedDocument> {
        let id = document
            .get_object_id("_id")
            .map_err(|_| MalformedDocument::MissingId)?;

        let wrapped: Vec<(AuditCategory, &Document)> = AuditCategory::ALL
            .into_iter()
            .filter_map(|category| match document.get(category.wrapper_key()) {
                Some(Bson::Document(payload)) => Some((category, payload)),
                _ => None,
            })
            .collect();

        let (category, payload) = match wrapped.as_slice() {
            [] => return Err(MalformedDocument::NoWrapper),
            [single] => *single,
            many => return Err(MalformedDocument::MultipleWrappers(many.len())),
        };

        let mut payload = payload.clone();
        let timestamp = match payload.remove(TIMESTAMP_FIELD) {
            Some(Bson::DateTime(ts)) => ts.to_chrono(),
            _ => return Err(MalformedDocument::MissingTimestamp),
        };
        let event: AuditEvent = bson::from_document(payload)?;

        Ok(Self {
            id,
            category,
            timestamp,
            event,
        })
    }

    /// Lift the wrapper payload to the top level and attach the id
    pub fn into_record(self) -> AuditRecord {
        AuditRecord {
            id: self.id.to_hex(),
            timestamp: self.timestamp,
            category: self.category,
            event: self.event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::AuditAction;

    fn event(target: Option<&str>) -> AuditEvent {
        let mut event = AuditEvent::new(AuditAction::ItemUpdate, "alice", "admin")
            .with_change("qty", 3, 4)
            .with_details("restock");
        event.target_resource = target.map(String::from);
        event
    }

    #[test]
    fn test_exactly_one_wrapper_key() {
        for (target, key) in [
            (Some("item"), "item_action"),
            (Some("group"), "user_action"),
            (Some("procurement_order"), "procurement_action"),
            (None, "general_action"),
        ] {
            let stored = StoredAuditDocument::new(ObjectId::new(), event(target), Utc::now());
            let document = stored.to_document().unwrap();

            let present: Vec<&str> = AuditCategory::ALL
                .iter()
                .map(|c| c.wrapper_key())
                .filter(|k| document.contains_key(*k))
                .collect();
            assert_eq!(present, vec![key]);
            assert_eq!(document.get_str(TYPE_FIELD).unwrap(), key);

            let payload = document.get_document(key).unwrap();
            assert!(payload.contains_key("action"));
            assert!(payload.contains_key("actor"));
            assert!(payload.contains_key("actor_role"));
            assert!(payload.get_datetime(TIMESTAMP_FIELD).is_ok());
            assert!(!payload.contains_key("target_user"), "absent options are not stored");
        }
    }

    #[test]
    fn test_round_trip_through_document() {
        let now = bson::DateTime::now().to_chrono();
        let stored = StoredAuditDocument::new(ObjectId::new(), event(Some("item")), now);
        let decoded = StoredAuditDocument::from_document(&stored.to_document().unwrap()).unwrap();
        assert_eq!(decoded, stored);

        let record = decoded.into_record();
        assert_eq!(record.id, stored.id.to_hex());
        assert_eq!(record.event, stored.event);
    }

    #[test]
    fn test_wrapper_key_is_authoritative_over_type() {
        let stored = StoredAuditDocument::new(ObjectId::new(), event(Some("item")), Utc::now());
        let mut document = stored.to_document().unwrap();
        document.insert(TYPE_FIELD, "user_action");

        let decoded = StoredAuditDocument::from_document(&document).unwrap();
        assert_eq!(decoded.category, AuditCategory::Item);
    }

    #[test]
    fn test_malformed_documents() {
        let no_wrapper = doc! { "_id": ObjectId::new(), "type": "item_action" };
        assert!(matches!(
            StoredAuditDocument::from_document(&no_wrapper),
            Err(MalformedDocument::NoWrapper)
        ));

        let not_a_mapping = doc! { "_id": ObjectId::new(), "item_action": "oops" };
        assert!(matches!(
            StoredAuditDocument::from_document(&not_a_mapping),
            Err(MalformedDocument::NoWrapper)
        ));

        let ts = bson::DateTime::now();
        let payload = doc! {
            "action": "item_create",
            "actor": "a",
            "actor_role": "r",
            "timestamp": ts,
        };
        let two = doc! {
            "_id": ObjectId::new(),
            "item_action": payload.clone(),
            "user_action": payload.clone(),
        };
        assert!(matches!(
            StoredAuditDocument::from_document(&two),
            Err(MalformedDocument::MultipleWrappers(2))
        ));

        let no_ts = doc! {
            "_id": ObjectId::new(),
            "item_action": { "action": "item_create", "actor": "a", "actor_role": "r" },
        };
        assert!(matches!(
            StoredAuditDocument::from_document(&no_ts),
            Err(MalformedDocument::MissingTimestamp)
        ));

        let bad_action = doc! {
            "_id": ObjectId::new(),
            "item_action": {
                "action": "teleport",
                "actor": "a",
                "actor_role": "r",
                "timestamp": ts,
            },
        };
        assert!(matches!(
            StoredAuditDocument::from_document(&bad_action),
            Err(MalformedDocument::Payload(_))
        ));

        let no_id = doc! { "item_action": payload };
        assert!(matches!(
            StoredAuditDocument::from_document(&no_id),
            Err(MalformedDocument::MissingId)
        ));
    }
}
