//! Natural-Key Resolver — find-or-create for shared reference data.
//!
//! Each resolver looks its natural key up inside the current transaction,
//! returning the existing row's id when found (submitted attributes are
//! ignored — there is no update-on-resolve). On a miss it inserts and
//! returns the new id. The insert is visible to later lookups in the same
//! transaction, so two records in one batch referencing the same new key
//! resolve to one row.
//!
//! Concurrency: a batch in another process can create the same key between
//! our lookup and insert. `INSERT OR IGNORE` turns that race into a
//! zero-row insert; we re-query and return the winner's id instead of
//! failing the batch. The race never surfaces to callers.

use afisha_core::record::{OrganizerRecord, TagRecord, VenueRecord};
use rusqlite::{OptionalExtension as _, Transaction};
use tracing::{debug, trace};

use crate::{Error, Result, encode::encode_json};

pub fn resolve_organizer(
  tx: &Transaction,
  record: &OrganizerRecord,
) -> Result<i64> {
  let existing: Option<i64> = tx
    .query_row(
      "SELECT organizer_id FROM organizers WHERE name = ?1",
      rusqlite::params![record.name],
      |r| r.get(0),
    )
    .optional()?;
  if let Some(id) = existing {
    return Ok(id);
  }

  let social_links = encode_json(&record.social_links)?;
  let inserted = tx.execute(
    "INSERT OR IGNORE INTO organizers (name, rating, social_links)
     VALUES (?1, ?2, ?3)",
    rusqlite::params![record.name, record.rating, social_links],
  )?;
  if inserted == 1 {
    debug!(name = %record.name, "created organizer");
    return Ok(tx.last_insert_rowid());
  }

  // Lost the insert race to a concurrent writer; take the winner's row.
  trace!(name = %record.name, "organizer insert raced, re-querying");
  requery(
    tx,
    "SELECT organizer_id FROM organizers WHERE name = ?1",
    rusqlite::params![record.name],
    "organizer",
    &record.name,
  )
}

pub fn resolve_venue(tx: &Transaction, record: &VenueRecord) -> Result<i64> {
  let existing: Option<i64> = tx
    .query_row(
      "SELECT venue_id FROM venues WHERE name = ?1 AND city = ?2",
      rusqlite::params![record.name, record.city],
      |r| r.get(0),
    )
    .optional()?;
  if let Some(id) = existing {
    return Ok(id);
  }

  let inserted = tx.execute(
    "INSERT OR IGNORE INTO venues (name, address, city, lat, lon)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      record.name,
      record.address,
      record.city,
      record.lat,
      record.lon,
    ],
  )?;
  if inserted == 1 {
    debug!(name = %record.name, city = %record.city, "created venue");
    return Ok(tx.last_insert_rowid());
  }

  trace!(name = %record.name, city = %record.city, "venue insert raced, re-querying");
  requery(
    tx,
    "SELECT venue_id FROM venues WHERE name = ?1 AND city = ?2",
    rusqlite::params![record.name, record.city],
    "venue",
    &format!("{}, {}", record.name, record.city),
  )
}

pub fn resolve_tag(tx: &Transaction, record: &TagRecord) -> Result<i64> {
  let existing: Option<i64> = tx
    .query_row(
      "SELECT tag_id FROM tags WHERE slug = ?1",
      rusqlite::params![record.slug],
      |r| r.get(0),
    )
    .optional()?;
  if let Some(id) = existing {
    return Ok(id);
  }

  let inserted = tx.execute(
    "INSERT OR IGNORE INTO tags (name, slug) VALUES (?1, ?2)",
    rusqlite::params![record.name, record.slug],
  )?;
  if inserted == 1 {
    debug!(slug = %record.slug, "created tag");
    return Ok(tx.last_insert_rowid());
  }

  trace!(slug = %record.slug, "tag insert raced, re-querying");
  requery(
    tx,
    "SELECT tag_id FROM tags WHERE slug = ?1",
    rusqlite::params![record.slug],
    "tag",
    &record.slug,
  )
}

/// Second lookup after a zero-row `INSERT OR IGNORE`. A miss here means the
/// ignored conflict was not on our natural key — report it instead of
/// looping.
fn requery(
  tx: &Transaction,
  sql: &str,
  params: impl rusqlite::Params,
  kind: &str,
  key: &str,
) -> Result<i64> {
  tx.query_row(sql, params, |r| r.get(0))
    .optional()?
    .ok_or_else(|| Error::Constraint {
      slug:   String::new(),
      detail: format!("{kind} {key:?} could not be resolved after insert"),
    })
}
