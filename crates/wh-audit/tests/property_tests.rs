//! Property tests for the audit store query paths
//!
//! Randomized events span every wrapper and deliberately reuse the same
//! strings as actors, target users and resource ids.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use wh_audit::{
    AuditAction, AuditCategory, AuditEvent, AuditFilters, AuditRecord, AuditStore, ManualClock,
    MemoryAuditCollection,
};

const PEOPLE: [&str; 4] = ["alice", "bob", "carol", "i1"];
const RESOURCE_IDS: [&str; 3] = ["i1", "i2", "alice"];
const TARGETS: [&str; 5] = ["item", "user", "group", "procurement_order", "report"];

#[derive(Debug, Clone)]
struct EventSpec {
    actor: &'static str,
    target_user: Option<&'static str>,
    target_resource: Option<&'static str>,
    resource_id: &'static str,
    action: AuditAction,
    day: u32,
}

impl EventSpec {
    fn event(&self) -> AuditEvent {
        let mut event =
            AuditEvent::new(self.action, self.actor, "manager").with_resource_id(self.resource_id);
        event.target_user = self.target_user.map(String::from);
        event.target_resource = self.target_resource.map(String::from);
        event
    }

    fn category(&self) -> AuditCategory {
        AuditCategory::for_target(self.target_resource)
    }
}

fn event_spec() -> impl Strategy<Value = EventSpec> {
    (
        prop::sample::select(PEOPLE.to_vec()),
        prop::option::of(prop::sample::select(PEOPLE.to_vec())),
        prop::option::of(prop::sample::select(TARGETS.to_vec())),
        prop::sample::select(RESOURCE_IDS.to_vec()),
        prop::sample::select(AuditAction::ALL.to_vec()),
        1u32..=6,
    )
        .prop_map(|(actor, target_user, target_resource, resource_id, action, day)| EventSpec {
            actor,
            target_user,
            target_resource,
            resource_id,
            action,
            day,
        })
}

fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, n, 8, 0, 0).unwrap()
}

/// Store seeded with `specs`, plus the ids in append order
async fn seeded(specs: &[EventSpec]) -> (AuditStore, Vec<String>) {
    let clock = Arc::new(ManualClock::new(day(1)));
    let store = AuditStore::with_clock(Arc::new(MemoryAuditCollection::new()), clock.clone());

    let mut ids = Vec::with_capacity(specs.len());
    for (n, spec) in specs.iter().enumerate() {
        clock.set(day(spec.day) + Duration::seconds(n as i64));
        ids.push(store.append(&spec.event()).await.unwrap());
    }
    (store, ids)
}

async fn query_ids(store: &AuditStore, filters: &AuditFilters) -> (Vec<String>, u64) {
    let (records, total) = store.query(filters, 0, 0).await.unwrap();
    (ids_of(&records), total)
}

fn ids_of(records: &[AuditRecord]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}

fn expected_ids(
    specs: &[EventSpec],
    ids: &[String],
    keep: impl Fn(&EventSpec) -> bool,
) -> Vec<String> {
    specs
        .iter()
        .zip(ids)
        .rev()
        .filter(|&(spec, _)| keep(spec))
        .map(|(_, id)| id.clone())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// actor AND start_date equals the intersection of the two single filters
    #[test]
    fn compound_filter_is_intersection(
        specs in prop::collection::vec(event_spec(), 0..30),
        actor in prop::sample::select(PEOPLE.to_vec()),
        start in 1u32..=6,
    ) {
        tokio_test::block_on(async {
            let (store, ids) = seeded(&specs).await;

            let (by_actor, _) = query_ids(&store, &AuditFilters::new().actor(actor)).await;
            let (by_date, _) = query_ids(&store, &AuditFilters::new().start_date(day(start))).await;
            let compound = AuditFilters::new().actor(actor).start_date(day(start));
            let (both, total) = query_ids(&store, &compound).await;

            let intersection: Vec<String> =
                by_actor.iter().filter(|id| by_date.contains(*id)).cloned().collect();
            prop_assert_eq!(&both, &intersection);
            prop_assert_eq!(total, both.len() as u64);

            let expected = expected_ids(&specs, &ids, |s| s.actor == actor && s.day >= start);
            prop_assert_eq!(both, expected);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Narrowed queries return exactly the events filed under that wrapper
    #[test]
    fn narrowing_never_leaks_across_wrappers(
        specs in prop::collection::vec(event_spec(), 0..30),
        target in prop::sample::select(TARGETS.to_vec()),
        resource_id in prop::option::of(prop::sample::select(RESOURCE_IDS.to_vec())),
    ) {
        tokio_test::block_on(async {
            let (store, ids) = seeded(&specs).await;
            let wrapper = AuditCategory::for_target(Some(target));

            let mut filters = AuditFilters::new().target_resource(target);
            if let Some(resource_id) = resource_id {
                filters = filters.resource_id(resource_id);
            }
            let (records, total) = store.query(&filters, 0, 0).await.unwrap();

            prop_assert!(records.iter().all(|r| r.category == wrapper));
            let expected = expected_ids(&specs, &ids, |s| {
                s.category() == wrapper && resource_id.map_or(true, |r| s.resource_id == r)
            });
            prop_assert_eq!(total, expected.len() as u64);
            prop_assert_eq!(ids_of(&records), expected);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Two adjacent pages concatenate to the double-size page
    #[test]
    fn pagination_is_stable(
        specs in prop::collection::vec(event_spec(), 0..30),
        actor in prop::option::of(prop::sample::select(PEOPLE.to_vec())),
        k in 1u64..8,
    ) {
        tokio_test::block_on(async {
            let (store, _) = seeded(&specs).await;
            let filters = match actor {
                Some(actor) => AuditFilters::new().actor(actor),
                None => AuditFilters::new(),
            };

            let (first, total_first) = store.query(&filters, 0, k).await.unwrap();
            let (second, total_second) = store.query(&filters, k, k).await.unwrap();
            let (both, total_both) = store.query(&filters, 0, 2 * k).await.unwrap();

            let mut joined = ids_of(&first);
            joined.extend(ids_of(&second));
            prop_assert_eq!(joined, ids_of(&both));
            prop_assert_eq!(total_first, total_both);
            prop_assert_eq!(total_second, total_both);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Results come back most recently appended first
    #[test]
    fn results_are_newest_first(
        specs in prop::collection::vec(event_spec(), 0..30),
        search in prop::option::of(prop::sample::select(vec!["ALI", "i", "bo"])),
    ) {
        tokio_test::block_on(async {
            let (store, ids) = seeded(&specs).await;
            let position: HashMap<&String, usize> =
                ids.iter().enumerate().map(|(n, id)| (id, n)).collect();

            let filters = match search {
                Some(term) => AuditFilters::new().search(term),
                None => AuditFilters::new(),
            };
            let (records, _) = store.query(&filters, 0, 0).await.unwrap();

            let order: Vec<usize> = records.iter().map(|r| position[&r.id]).collect();
            prop_assert!(order.windows(2).all(|w| w[0] > w[1]));
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Activity is the exact union of "acted" and "was targeted"
    #[test]
    fn activity_is_union_of_actor_and_target(
        specs in prop::collection::vec(event_spec(), 0..30),
        principal in prop::sample::select(PEOPLE.to_vec()),
    ) {
        tokio_test::block_on(async {
            let (store, ids) = seeded(&specs).await;

            let (acted, _) = query_ids(&store, &AuditFilters::new().actor(principal)).await;
            let targeted_filter = AuditFilters::new().target_user(principal);
            let (targeted, _) = query_ids(&store, &targeted_filter).await;
            let (records, total) = store.activity_for(principal, 0, 0).await.unwrap();
            let activity = ids_of(&records);

            let union: BTreeSet<String> = acted.into_iter().chain(targeted).collect();
            let found: BTreeSet<String> = activity.iter().cloned().collect();
            prop_assert_eq!(&found, &union);
            prop_assert_eq!(activity.len(), found.len());
            prop_assert_eq!(total, union.len() as u64);

            let expected = expected_ids(&specs, &ids, |s| {
                s.actor == principal || s.target_user == Some(principal)
            });
            prop_assert_eq!(activity, expected);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Every supplied field survives append then get
    #[test]
    fn append_then_get_round_trips(
        spec in event_spec(),
        reason in prop::option::of("[a-zA-Z ]{0,24}"),
    ) {
        tokio_test::block_on(async {
            let (store, _) = seeded(&[]).await;
            let mut event = spec.event();
            event.reason = reason;
            let event = event.with_change("qty", 1, 2);

            let id = store.append(&event).await.unwrap();
            let record = store.get(&id).await.unwrap();
            prop_assert!(record.is_some());
            let record = record.unwrap();
            prop_assert_eq!(record.category, spec.category());
            prop_assert_eq!(record.event, event);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
