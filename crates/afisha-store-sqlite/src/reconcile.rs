//! Event Reconciler — merge one submitted record into the store.
//!
//! Orchestrates the resolver, locator, and child reconcilers for a single
//! record: resolve shared references, match the root by slug, overwrite or
//! create it, then bring every owned collection in line with the
//! submission. Creation and update share the child code path — on a fresh
//! root the diffs simply find nothing to delete.

use afisha_core::{record::EventRecord, store::RecordAction};
use chrono::{DateTime, Utc};
use rusqlite::Transaction;
use tracing::debug;

use crate::{
  Error, Result, children,
  encode::{encode_dt, encode_status},
  locate, resolve,
};

/// Reconcile one record inside the caller's transaction. Returns the root
/// row id and whether it was created or updated. Nothing is committed
/// here; the batch coordinator owns the commit point.
pub fn reconcile_one(
  tx: &Transaction,
  record: &EventRecord,
  now: DateTime<Utc>,
) -> Result<(i64, RecordAction)> {
  record.validate().map_err(Error::Core)?;

  let organizer_id = record
    .organizer
    .as_ref()
    .map(|o| resolve::resolve_organizer(tx, o))
    .transpose()
    .map_err(|e| name_slug(e, &record.slug))?;
  let venue_id = record
    .default_venue
    .as_ref()
    .map(|v| resolve::resolve_venue(tx, v))
    .transpose()
    .map_err(|e| name_slug(e, &record.slug))?;

  let existing = locate::event_id_by_slug(tx, &record.slug)?;

  let (event_id, action) = match existing {
    Some(event_id) => {
      update_root(tx, event_id, record, organizer_id, venue_id, now)?;
      (event_id, RecordAction::Updated)
    }
    None => {
      let event_id =
        insert_root(tx, record, organizer_id, venue_id, now)?;
      (event_id, RecordAction::Created)
    }
  };

  children::reconcile_tags(tx, event_id, &record.tags)
    .map_err(|e| name_slug(e, &record.slug))?;
  children::reconcile_occurrences(tx, event_id, &record.slug, &record.occurrences)?;
  children::reconcile_tickets(tx, event_id, &record.slug, &record.tickets)?;
  children::reconcile_images(tx, event_id, &record.slug, &record.images)?;
  children::reconcile_sources(tx, event_id, &record.slug, &record.sources, now)?;

  debug!(slug = %record.slug, ?action, "reconciled event");
  Ok((event_id, action))
}

/// Overwrite the scalar fields of an existing root. Status is only
/// touched when the record carries one; `updated_at` always moves.
fn update_root(
  tx: &Transaction,
  event_id: i64,
  record: &EventRecord,
  organizer_id: Option<i64>,
  venue_id: Option<i64>,
  now: DateTime<Utc>,
) -> Result<()> {
  tx.execute(
    "UPDATE events
     SET title = ?1, description = ?2, full_text = ?3, language = ?4,
         age_restriction = ?5, updated_at = ?6
     WHERE event_id = ?7",
    rusqlite::params![
      record.title,
      record.description,
      record.full_text,
      record.language,
      record.age_restriction,
      encode_dt(now),
      event_id,
    ],
  )?;

  if let Some(status) = record.status {
    tx.execute(
      "UPDATE events SET status = ?1 WHERE event_id = ?2",
      rusqlite::params![encode_status(status), event_id],
    )?;
  }
  // References are reassigned only when the record resolved one; a record
  // without an organizer block leaves the existing link alone.
  if organizer_id.is_some() {
    tx.execute(
      "UPDATE events SET organizer_id = ?1 WHERE event_id = ?2",
      rusqlite::params![organizer_id, event_id],
    )?;
  }
  if venue_id.is_some() {
    tx.execute(
      "UPDATE events SET venue_id = ?1 WHERE event_id = ?2",
      rusqlite::params![venue_id, event_id],
    )?;
  }

  Ok(())
}

fn insert_root(
  tx: &Transaction,
  record: &EventRecord,
  organizer_id: Option<i64>,
  venue_id: Option<i64>,
  now: DateTime<Utc>,
) -> Result<i64> {
  let status = record.status.unwrap_or_default();
  tx.execute(
    "INSERT INTO events
       (title, slug, description, full_text, language, age_restriction,
        status, created_at, organizer_id, venue_id)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    rusqlite::params![
      record.title,
      record.slug,
      record.description,
      record.full_text,
      record.language,
      record.age_restriction,
      encode_status(status),
      encode_dt(now),
      organizer_id,
      venue_id,
    ],
  )
  .map_err(|e| Error::for_record(&record.slug, "event insert", e))?;
  Ok(tx.last_insert_rowid())
}

/// Attach the record's slug to constraint errors raised below the level
/// that knows it (resolver, tag reconciler).
fn name_slug(err: Error, slug: &str) -> Error {
  match err {
    Error::Constraint { slug: s, detail } if s.is_empty() => {
      Error::Constraint { slug: slug.to_owned(), detail }
    }
    other => other,
  }
}
