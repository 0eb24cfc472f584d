//! The `EventStore` trait and supporting query/outcome types.
//!
//! The trait is implemented by storage backends (e.g.
//! `afisha-store-sqlite`). Higher layers (`afisha-api`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  event::{EventStatus, EventView},
  record::EventRecord,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`EventStore::list_events`].
///
/// An explicit filter specification: every predicate is optional and the
/// set is resolved once per request, never probed field-by-field.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
  pub status:        Option<EventStatus>,
  /// Only events linked to the tag with this slug.
  pub tag:           Option<String>,
  /// Only events with at least one occurrence starting at or after this.
  pub starts_after:  Option<DateTime<Utc>>,
  /// Only events with at least one occurrence starting before this.
  pub starts_before: Option<DateTime<Utc>>,
  pub limit:         Option<usize>,
  pub offset:        Option<usize>,
}

// ─── Batch outcome ───────────────────────────────────────────────────────────

/// What the reconciler did with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordAction {
  Created,
  Updated,
}

/// Per-record result within a committed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutcome {
  pub slug:   String,
  pub action: RecordAction,
}

/// Aggregate result of a fully-committed batch. A batch that fails commits
/// nothing and produces no outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
  pub created:  u64,
  pub updated:  u64,
  /// One entry per record, in submission order.
  pub outcomes: Vec<RecordOutcome>,
}

impl BatchOutcome {
  pub fn push(&mut self, slug: String, action: RecordAction) {
    match action {
      RecordAction::Created => self.created += 1,
      RecordAction::Updated => self.updated += 1,
    }
    self.outcomes.push(RecordOutcome { slug, action });
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an Afisha event store backend.
///
/// Reference data (organizers, venues, tags) is append-only and shared;
/// events and their owned children are exclusively re-materialised by the
/// reconciliation path for their slug. Batch ingestion is atomic: either
/// every record in the batch is committed or none is.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reconciliation ────────────────────────────────────────────────────

  /// Reconcile an ordered batch of records inside one unit of work.
  ///
  /// Records are processed strictly sequentially; the first failure rolls
  /// back everything the batch wrote. Counts and per-record outcomes are
  /// reported only for a fully-committed batch.
  fn ingest_batch(
    &self,
    records: Vec<EventRecord>,
  ) -> impl Future<Output = Result<BatchOutcome, Self::Error>> + Send + '_;

  /// Reconcile a single record in its own unit of work and return the
  /// fully-populated result.
  fn upsert_event(
    &self,
    record: EventRecord,
  ) -> impl Future<Output = Result<(RecordAction, EventView), Self::Error>>
  + Send
  + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve one event by slug, eagerly populated with organizer, venue,
  /// tags, occurrences (with occurrence-level venues), tickets, images,
  /// and sources. Returns `None` if the slug is unknown.
  fn find_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<EventView>, Self::Error>> + Send + 'a;

  /// List events matching `query`, newest first, fully populated.
  fn list_events<'a>(
    &'a self,
    query: &'a EventQuery,
  ) -> impl Future<Output = Result<Vec<EventView>, Self::Error>> + Send + 'a;

  // ── Deletion ──────────────────────────────────────────────────────────

  /// Delete one event by slug, cascading to its owned children. Shared
  /// reference data survives. Errors if the slug is unknown.
  fn delete_event<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Maintenance: delete every event (cascading to children) while
  /// preserving organizers, venues, and tags. Returns the number of root
  /// rows deleted.
  fn purge_events(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
