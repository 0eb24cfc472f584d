//! Event — the root entity — and the child rows it exclusively owns.
//!
//! An event is matched by its `slug` (the only identity used to decide
//! create-vs-update) and owns its occurrences, ticket types, images, and
//! provenance sources outright: deleting the event deletes them all, and
//! every reconciliation pass re-materialises them from the submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::refdata::{Organizer, Tag, Venue};

/// Moderation/scheduling state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
  #[default]
  Draft,
  Scheduled,
  Cancelled,
  Postponed,
  Done,
}

/// Root event row. References to organizer and default venue are by id;
/// the populated graph lives in [`EventView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  pub event_id:        i64,
  pub title:           String,
  pub slug:            String,
  pub description:     Option<String>,
  pub full_text:       Option<String>,
  pub language:        String,
  pub age_restriction: u8,
  pub status:          EventStatus,
  pub created_at:      DateTime<Utc>,
  /// Set on every reconciliation pass that updates an existing row.
  pub updated_at:      Option<DateTime<Utc>>,
  pub organizer_id:    Option<i64>,
  pub venue_id:        Option<i64>,
}

/// One dated showing of an event. Unique per `(event, start_time)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Occurrence {
  pub occurrence_id: i64,
  pub start_time:    DateTime<Utc>,
  pub end_time:      Option<DateTime<Utc>>,
  pub tz:            String,
  pub status:        String,
  /// Venue override for this date only (e.g. one stop of a tour).
  pub venue_id:      Option<i64>,
  /// Free-text refinement of the place: "Main hall", "Room 401".
  pub location_name: Option<String>,
}

/// A ticket tier ("VIP", "Dance floor"). No natural key — ordinal within
/// its event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketType {
  pub ticket_type_id: i64,
  pub name:           String,
  /// Minor currency units.
  pub price:          i64,
  pub currency:       String,
  pub capacity:       Option<i64>,
  pub sold:           i64,
}

/// A gallery image. Ordinal within its event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventImage {
  pub image_id:   i64,
  pub url:        String,
  pub alt:        Option<String>,
  pub sort_order: i64,
}

/// Provenance: which scrape produced this event. Deduplicated per
/// `(event, fingerprint)` so repeated ingestion from the same source does
/// not multiply rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSource {
  pub source_id:   i64,
  pub source_url:  String,
  pub source_name: String,
  pub scraped_at:  DateTime<Utc>,
  /// Parser's own estimate of extraction quality, 0.0–1.0.
  pub confidence:  f64,
  /// Caller-supplied hash identifying one scrape of one source.
  pub fingerprint: String,
  pub raw_payload: Option<Value>,
}

// ─── Populated graph ─────────────────────────────────────────────────────────

/// An occurrence together with its resolved venue override, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceView {
  #[serde(flatten)]
  pub occurrence: Occurrence,
  pub venue:      Option<Venue>,
}

/// The fully-populated read model for one event — root row plus every
/// reference and owned collection, loaded eagerly so callers never need a
/// second round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventView {
  #[serde(flatten)]
  pub event:       Event,
  pub organizer:   Option<Organizer>,
  pub venue:       Option<Venue>,
  pub tags:        Vec<Tag>,
  pub occurrences: Vec<OccurrenceView>,
  pub tickets:     Vec<TicketType>,
  pub images:      Vec<EventImage>,
  pub sources:     Vec<EventSource>,
}
