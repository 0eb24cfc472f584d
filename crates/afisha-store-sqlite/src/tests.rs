//! Integration tests for `SqliteStore` against an in-memory database.

use afisha_core::{
  Error as CoreError,
  event::EventStatus,
  record::{
    EventRecord, ImageRecord, OccurrenceRecord, OrganizerRecord,
    SourceRecord, TagRecord, TicketRecord, VenueRecord,
  },
  store::{EventQuery, EventStore, RecordAction},
};
use chrono::{DateTime, TimeZone, Utc};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn start(hour: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 9, 1, hour, 0, 0).unwrap()
}

fn record(slug: &str) -> EventRecord {
  EventRecord {
    title:           format!("Event {slug}"),
    slug:            slug.to_owned(),
    description:     None,
    full_text:       None,
    language:        "ru".to_owned(),
    age_restriction: 0,
    status:          None,
    organizer:       None,
    default_venue:   None,
    tags:            vec![],
    occurrences:     vec![],
    tickets:         vec![],
    images:          vec![],
    sources:         vec![],
  }
}

fn organizer(name: &str) -> OrganizerRecord {
  OrganizerRecord {
    name:         name.to_owned(),
    rating:       4.5,
    social_links: Some(serde_json::json!({"vk": "https://vk.com/acme"})),
  }
}

fn venue(name: &str, city: &str) -> VenueRecord {
  VenueRecord {
    name:    name.to_owned(),
    address: "Some street 1".to_owned(),
    city:    city.to_owned(),
    lat:     Some(55.75),
    lon:     Some(37.61),
  }
}

fn tag(slug: &str) -> TagRecord {
  TagRecord { name: slug.to_owned(), slug: slug.to_owned() }
}

fn occurrence(hour: u32) -> OccurrenceRecord {
  OccurrenceRecord {
    start_time:    start(hour),
    end_time:      None,
    tz:            "Europe/Moscow".to_owned(),
    status:        "scheduled".to_owned(),
    location_name: None,
    venue:         None,
  }
}

fn source(fingerprint: &str) -> SourceRecord {
  SourceRecord {
    source_url:  format!("https://kudago.com/{fingerprint}"),
    source_name: "kudago".to_owned(),
    confidence:  0.9,
    fingerprint: fingerprint.to_owned(),
    raw_payload: Some(serde_json::json!({"id": fingerprint})),
  }
}

// ─── Create / populate ───────────────────────────────────────────────────────

#[tokio::test]
async fn create_populates_full_graph() {
  let s = store().await;

  let mut rec = record("jazz-night");
  rec.status = Some(EventStatus::Scheduled);
  rec.organizer = Some(organizer("Acme"));
  rec.default_venue = Some(venue("Blue Note", "Moscow"));
  rec.tags = vec![tag("music"), tag("jazz")];
  rec.occurrences = vec![occurrence(19), occurrence(21)];
  rec.tickets = vec![TicketRecord {
    name:     "VIP".to_owned(),
    price:    5000,
    currency: "RUB".to_owned(),
    capacity: Some(20),
    sold:     0,
  }];
  rec.images = vec![ImageRecord {
    url:        "https://img/1.jpg".to_owned(),
    alt:        None,
    sort_order: 0,
  }];
  rec.sources = vec![source("fp-1")];

  let (action, view) = s.upsert_event(rec).await.unwrap();
  assert_eq!(action, RecordAction::Created);
  assert_eq!(view.event.slug, "jazz-night");
  assert_eq!(view.event.status, EventStatus::Scheduled);
  assert!(view.event.updated_at.is_none());
  assert_eq!(view.organizer.as_ref().unwrap().name, "Acme");
  assert_eq!(view.venue.as_ref().unwrap().city, "Moscow");
  assert_eq!(view.tags.len(), 2);
  assert_eq!(view.occurrences.len(), 2);
  assert_eq!(view.tickets.len(), 1);
  assert_eq!(view.images.len(), 1);
  assert_eq!(view.sources.len(), 1);
}

#[tokio::test]
async fn find_by_slug_missing_returns_none() {
  let s = store().await;
  assert!(s.find_by_slug("nope").await.unwrap().is_none());
}

// ─── Idempotence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn identical_batch_twice_is_idempotent() {
  let s = store().await;

  let mut rec = record("jazz-night");
  rec.organizer = Some(organizer("Acme"));
  rec.tags = vec![tag("music")];
  rec.occurrences = vec![occurrence(19)];
  rec.sources = vec![source("fp-1")];

  let first = s.ingest_batch(vec![rec.clone()]).await.unwrap();
  assert_eq!((first.created, first.updated), (1, 0));

  let second = s.ingest_batch(vec![rec]).await.unwrap();
  assert_eq!((second.created, second.updated), (0, 1));
  assert_eq!(second.outcomes[0].action, RecordAction::Updated);

  let view = s.find_by_slug("jazz-night").await.unwrap().unwrap();
  assert_eq!(view.tags.len(), 1);
  assert_eq!(view.occurrences.len(), 1);
  assert_eq!(view.sources.len(), 1, "re-ingestion must not multiply sources");
}

// ─── Natural-key dedup ───────────────────────────────────────────────────────

#[tokio::test]
async fn organizer_and_tag_shared_across_batch() {
  let s = store().await;

  let mut jazz = record("jazz-night");
  jazz.organizer = Some(organizer("Acme"));
  jazz.tags = vec![tag("music")];
  let mut rock = record("rock-night");
  rock.organizer = Some(organizer("Acme"));
  rock.tags = vec![tag("music")];

  let outcome = s.ingest_batch(vec![jazz, rock]).await.unwrap();
  assert_eq!(outcome.created, 2);

  let jazz_view = s.find_by_slug("jazz-night").await.unwrap().unwrap();
  let rock_view = s.find_by_slug("rock-night").await.unwrap().unwrap();

  // Both events link to the same organizer and tag rows.
  assert_eq!(
    jazz_view.organizer.as_ref().unwrap().organizer_id,
    rock_view.organizer.as_ref().unwrap().organizer_id,
  );
  assert_eq!(jazz_view.tags[0].tag_id, rock_view.tags[0].tag_id);
}

#[tokio::test]
async fn resolver_ignores_attributes_on_existing_key() {
  let s = store().await;

  let mut rec = record("a");
  rec.organizer = Some(organizer("Acme"));
  s.upsert_event(rec).await.unwrap();

  let mut rec = record("b");
  rec.organizer = Some(OrganizerRecord {
    name:         "Acme".to_owned(),
    rating:       1.0,
    social_links: None,
  });
  let (_, view) = s.upsert_event(rec).await.unwrap();

  // First writer's attributes stick; no update-on-resolve.
  let org = view.organizer.unwrap();
  assert_eq!(org.rating, 4.5);
  assert!(org.social_links.is_some());
}

#[tokio::test]
async fn venue_natural_key_is_name_city_pair() {
  let s = store().await;

  let mut a = record("a");
  a.default_venue = Some(venue("Palace", "Moscow"));
  let mut b = record("b");
  b.default_venue = Some(venue("Palace", "Kazan"));

  s.ingest_batch(vec![a, b]).await.unwrap();

  let va = s.find_by_slug("a").await.unwrap().unwrap().venue.unwrap();
  let vb = s.find_by_slug("b").await.unwrap().unwrap().venue.unwrap();
  assert_ne!(va.venue_id, vb.venue_id);
}

// ─── Full-replace semantics ──────────────────────────────────────────────────

#[tokio::test]
async fn occurrences_fully_replaced_on_update() {
  let s = store().await;

  let mut rec = record("fest");
  rec.occurrences = vec![occurrence(10), occurrence(12), occurrence(14)];
  s.upsert_event(rec).await.unwrap();

  let mut rec = record("fest");
  rec.occurrences = vec![occurrence(12)];
  let (_, view) = s.upsert_event(rec).await.unwrap();

  assert_eq!(view.occurrences.len(), 1);
  assert_eq!(view.occurrences[0].occurrence.start_time, start(12));
}

#[tokio::test]
async fn omitted_collections_are_emptied() {
  let s = store().await;

  let mut rec = record("fest");
  rec.tags = vec![tag("music")];
  rec.occurrences = vec![occurrence(10)];
  rec.tickets = vec![TicketRecord {
    name:     "Std".to_owned(),
    price:    100,
    currency: "RUB".to_owned(),
    capacity: None,
    sold:     0,
  }];
  s.upsert_event(rec).await.unwrap();

  // A bare record is "the current true view" — everything goes.
  let (_, view) = s.upsert_event(record("fest")).await.unwrap();
  assert!(view.tags.is_empty());
  assert!(view.occurrences.is_empty());
  assert!(view.tickets.is_empty());
}

#[tokio::test]
async fn tag_set_replaced_but_tag_rows_survive() {
  let s = store().await;

  let mut rec = record("fest");
  rec.tags = vec![tag("music"), tag("jazz")];
  let (_, before) = s.upsert_event(rec).await.unwrap();
  let music_id = before
    .tags
    .iter()
    .find(|t| t.slug == "music")
    .unwrap()
    .tag_id;

  let mut rec = record("fest");
  rec.tags = vec![tag("jazz"), tag("rock")];
  let (_, after) = s.upsert_event(rec).await.unwrap();

  let slugs: Vec<&str> = after.tags.iter().map(|t| t.slug.as_str()).collect();
  assert_eq!(slugs, vec!["jazz", "rock"]);

  // The detached tag row still exists and resolves to the same id.
  let mut other = record("other");
  other.tags = vec![tag("music")];
  let (_, other_view) = s.upsert_event(other).await.unwrap();
  assert_eq!(other_view.tags[0].tag_id, music_id);
}

// ─── Occurrence uniqueness ───────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_start_time_in_one_record_fails() {
  let s = store().await;

  let mut rec = record("fest");
  rec.occurrences = vec![occurrence(19), occurrence(19)];

  let err = s.upsert_event(rec).await.unwrap_err();
  match err {
    Error::Constraint { slug, detail } => {
      assert_eq!(slug, "fest");
      assert!(detail.contains("start_time"), "detail: {detail}");
    }
    other => panic!("expected constraint error, got {other:?}"),
  }
  // The failed upsert left nothing behind.
  assert!(s.find_by_slug("fest").await.unwrap().is_none());
}

// ─── Batch atomicity ─────────────────────────────────────────────────────────

#[tokio::test]
async fn failing_record_rolls_back_whole_batch() {
  let s = store().await;
  s.upsert_event(record("pre-existing")).await.unwrap();

  let mut bad = record("bad");
  bad.occurrences = vec![occurrence(19), occurrence(19)];

  let err = s
    .ingest_batch(vec![record("one"), bad, record("three")])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Constraint { .. }));

  // Record 1 was processed before the failure but must not be committed.
  assert!(s.find_by_slug("one").await.unwrap().is_none());
  assert!(s.find_by_slug("bad").await.unwrap().is_none());
  assert!(s.find_by_slug("three").await.unwrap().is_none());
  assert!(s.find_by_slug("pre-existing").await.unwrap().is_some());
}

#[tokio::test]
async fn validation_failure_aborts_batch() {
  let s = store().await;

  let mut bad = record("bad");
  bad.title = "  ".to_owned();

  let err = s.ingest_batch(vec![record("one"), bad]).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::Validation(_))));
  assert!(s.find_by_slug("one").await.unwrap().is_none());
}

// ─── Scalar update rules ─────────────────────────────────────────────────────

#[tokio::test]
async fn status_only_overwritten_when_provided() {
  let s = store().await;

  let mut rec = record("fest");
  rec.status = Some(EventStatus::Scheduled);
  s.upsert_event(rec).await.unwrap();

  // No status in the update — the stored one stands.
  let (_, view) = s.upsert_event(record("fest")).await.unwrap();
  assert_eq!(view.event.status, EventStatus::Scheduled);
  assert!(view.event.updated_at.is_some());

  let mut rec = record("fest");
  rec.status = Some(EventStatus::Cancelled);
  let (_, view) = s.upsert_event(rec).await.unwrap();
  assert_eq!(view.event.status, EventStatus::Cancelled);
}

#[tokio::test]
async fn references_kept_when_update_omits_them() {
  let s = store().await;

  let mut rec = record("fest");
  rec.organizer = Some(organizer("Acme"));
  rec.default_venue = Some(venue("Palace", "Moscow"));
  s.upsert_event(rec).await.unwrap();

  let (_, view) = s.upsert_event(record("fest")).await.unwrap();
  assert!(view.organizer.is_some());
  assert!(view.venue.is_some());
}

#[tokio::test]
async fn occurrence_venue_override_resolved() {
  let s = store().await;

  let mut rec = record("tour");
  let mut occ = occurrence(20);
  occ.venue = Some(venue("Arena", "Kazan"));
  occ.location_name = Some("Main hall".to_owned());
  rec.occurrences = vec![occ];

  let (_, view) = s.upsert_event(rec).await.unwrap();
  let shown = &view.occurrences[0];
  assert_eq!(shown.venue.as_ref().unwrap().city, "Kazan");
  assert_eq!(shown.occurrence.location_name.as_deref(), Some("Main hall"));
}

// ─── Source provenance ───────────────────────────────────────────────────────

#[tokio::test]
async fn sources_deduplicated_by_fingerprint() {
  let s = store().await;

  let mut rec = record("fest");
  rec.sources = vec![source("fp-1"), source("fp-1")];
  let (_, view) = s.upsert_event(rec).await.unwrap();
  assert_eq!(view.sources.len(), 1);

  // Same fingerprint again: skipped. New fingerprint: appended.
  let mut rec = record("fest");
  rec.sources = vec![source("fp-1"), source("fp-2")];
  let (_, view) = s.upsert_event(rec).await.unwrap();
  assert_eq!(view.sources.len(), 2);

  // Sources accumulate — an update without them deletes nothing.
  let (_, view) = s.upsert_event(record("fest")).await.unwrap();
  assert_eq!(view.sources.len(), 2);
}

// ─── Deletion ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_cascades_children_but_preserves_refdata() {
  let s = store().await;

  let mut rec = record("fest");
  rec.organizer = Some(organizer("Acme"));
  rec.tags = vec![tag("music")];
  rec.occurrences = vec![occurrence(19)];
  let (_, view) = s.upsert_event(rec).await.unwrap();
  let organizer_id = view.organizer.unwrap().organizer_id;
  let tag_id = view.tags[0].tag_id;

  s.delete_event("fest").await.unwrap();
  assert!(s.find_by_slug("fest").await.unwrap().is_none());

  // Shared rows survived: a fresh event resolves to the same ids.
  let mut rec = record("fest2");
  rec.organizer = Some(organizer("Acme"));
  rec.tags = vec![tag("music")];
  let (_, view) = s.upsert_event(rec).await.unwrap();
  assert_eq!(view.organizer.unwrap().organizer_id, organizer_id);
  assert_eq!(view.tags[0].tag_id, tag_id);
}

#[tokio::test]
async fn delete_unknown_slug_errors() {
  let s = store().await;
  let err = s.delete_event("ghost").await.unwrap_err();
  assert!(matches!(err, Error::EventNotFound(_)));
}

#[tokio::test]
async fn purge_removes_events_keeps_reference_rows() {
  let s = store().await;

  let mut a = record("a");
  a.organizer = Some(organizer("Acme"));
  let mut b = record("b");
  b.tags = vec![tag("music")];
  s.ingest_batch(vec![a, b]).await.unwrap();
  let acme_id = s
    .find_by_slug("a")
    .await
    .unwrap()
    .unwrap()
    .organizer
    .unwrap()
    .organizer_id;

  assert_eq!(s.purge_events().await.unwrap(), 2);
  assert!(s.list_events(&EventQuery::default()).await.unwrap().is_empty());

  let mut rec = record("c");
  rec.organizer = Some(organizer("Acme"));
  let (_, view) = s.upsert_event(rec).await.unwrap();
  assert_eq!(view.organizer.unwrap().organizer_id, acme_id);
}

// ─── Read queries ────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_filters_by_status_tag_and_date_range() {
  let s = store().await;

  let mut jazz = record("jazz");
  jazz.status = Some(EventStatus::Scheduled);
  jazz.tags = vec![tag("music")];
  jazz.occurrences = vec![occurrence(10)];

  let mut expo = record("expo");
  expo.status = Some(EventStatus::Draft);
  expo.tags = vec![tag("art")];
  expo.occurrences = vec![occurrence(20)];

  s.ingest_batch(vec![jazz, expo]).await.unwrap();

  let scheduled = s
    .list_events(&EventQuery {
      status: Some(EventStatus::Scheduled),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(scheduled.len(), 1);
  assert_eq!(scheduled[0].event.slug, "jazz");

  let tagged = s
    .list_events(&EventQuery { tag: Some("art".to_owned()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(tagged.len(), 1);
  assert_eq!(tagged[0].event.slug, "expo");

  let afternoon = s
    .list_events(&EventQuery {
      starts_after: Some(start(15)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(afternoon.len(), 1);
  assert_eq!(afternoon[0].event.slug, "expo");

  let morning = s
    .list_events(&EventQuery {
      starts_before: Some(start(15)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(morning.len(), 1);
  assert_eq!(morning[0].event.slug, "jazz");
}

#[tokio::test]
async fn list_orders_newest_first_and_paginates() {
  let s = store().await;
  s.ingest_batch(vec![record("a"), record("b"), record("c")])
    .await
    .unwrap();

  let all = s.list_events(&EventQuery::default()).await.unwrap();
  let slugs: Vec<&str> = all.iter().map(|v| v.event.slug.as_str()).collect();
  assert_eq!(slugs, vec!["c", "b", "a"]);

  let page = s
    .list_events(&EventQuery {
      limit: Some(1),
      offset: Some(1),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].event.slug, "b");
}
