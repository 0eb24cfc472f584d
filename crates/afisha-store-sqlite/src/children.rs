//! Child-Collection Reconciler — replace/merge policy per collection kind.
//!
//! Every submission is "the current true view" of the event, so the
//! submitted set becomes the complete stored set:
//!
//! - tags: association set diff (tag rows themselves are never deleted),
//! - occurrences: diff keyed by start time (update matched, delete
//!   missing, insert new),
//! - tickets and images: delete then insert in submission order,
//! - sources: append, skipping fingerprints already stored for the event.
//!
//! The deletes are issued explicitly here rather than left to cascades, so
//! the destructive half of full-replace is a visible, auditable step.

use std::collections::HashSet;

use afisha_core::record::{
  ImageRecord, OccurrenceRecord, SourceRecord, TagRecord, TicketRecord,
};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, Transaction};

use crate::{
  Error, Result,
  encode::{encode_dt, encode_json},
  resolve::{resolve_tag, resolve_venue},
};

/// Set the event's tag associations to exactly the resolved submitted set.
pub fn reconcile_tags(
  tx: &Transaction,
  event_id: i64,
  submitted: &[TagRecord],
) -> Result<()> {
  let mut desired: Vec<i64> = Vec::with_capacity(submitted.len());
  for tag in submitted {
    let id = resolve_tag(tx, tag)?;
    if !desired.contains(&id) {
      desired.push(id);
    }
  }

  let current: Vec<i64> = {
    let mut stmt =
      tx.prepare("SELECT tag_id FROM event_tags WHERE event_id = ?1")?;
    let ids = stmt
      .query_map(rusqlite::params![event_id], |r| r.get(0))?
      .collect::<rusqlite::Result<Vec<i64>>>()?;
    ids
  };

  let desired_set: HashSet<i64> = desired.iter().copied().collect();
  for tag_id in &current {
    if !desired_set.contains(tag_id) {
      tx.execute(
        "DELETE FROM event_tags WHERE event_id = ?1 AND tag_id = ?2",
        rusqlite::params![event_id, tag_id],
      )?;
    }
  }

  let current_set: HashSet<i64> = current.into_iter().collect();
  for tag_id in desired {
    if !current_set.contains(&tag_id) {
      tx.execute(
        "INSERT INTO event_tags (event_id, tag_id) VALUES (?1, ?2)",
        rusqlite::params![event_id, tag_id],
      )?;
    }
  }

  Ok(())
}

/// Replace the occurrence set via an explicit diff keyed by start time.
///
/// Rows whose start time is absent from the submission are deleted, rows
/// whose start time matches are updated in place, the rest are inserted.
/// Two submitted occurrences sharing a start time are a constraint
/// violation, never a silent drop.
pub fn reconcile_occurrences(
  tx: &Transaction,
  event_id: i64,
  slug: &str,
  submitted: &[OccurrenceRecord],
) -> Result<()> {
  let mut seen: HashSet<String> = HashSet::with_capacity(submitted.len());
  for occ in submitted {
    if !seen.insert(encode_dt(occ.start_time)) {
      return Err(Error::Constraint {
        slug:   slug.to_owned(),
        detail: format!(
          "duplicate occurrence start_time {}",
          occ.start_time.to_rfc3339()
        ),
      });
    }
  }

  // Delete occurrences the submission no longer carries.
  let current: Vec<(i64, String)> = {
    let mut stmt = tx.prepare(
      "SELECT occurrence_id, start_time FROM occurrences WHERE event_id = ?1",
    )?;
    let rows = stmt
      .query_map(rusqlite::params![event_id], |r| {
        Ok((r.get(0)?, r.get(1)?))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    rows
  };
  for (occurrence_id, start_time) in &current {
    if !seen.contains(start_time) {
      tx.execute(
        "DELETE FROM occurrences WHERE occurrence_id = ?1",
        rusqlite::params![occurrence_id],
      )?;
    }
  }

  for occ in submitted {
    let venue_id = occ
      .venue
      .as_ref()
      .map(|v| resolve_venue(tx, v))
      .transpose()?;
    let start_str = encode_dt(occ.start_time);
    let end_str = occ.end_time.map(encode_dt);

    let existing: Option<i64> = tx
      .query_row(
        "SELECT occurrence_id FROM occurrences
         WHERE event_id = ?1 AND start_time = ?2",
        rusqlite::params![event_id, start_str],
        |r| r.get(0),
      )
      .optional()?;

    match existing {
      Some(occurrence_id) => {
        tx.execute(
          "UPDATE occurrences
           SET end_time = ?1, tz = ?2, status = ?3, venue_id = ?4,
               location_name = ?5
           WHERE occurrence_id = ?6",
          rusqlite::params![
            end_str,
            occ.tz,
            occ.status,
            venue_id,
            occ.location_name,
            occurrence_id,
          ],
        )?;
      }
      None => {
        // The unique (event_id, start_time) index backstops the pre-check.
        tx.execute(
          "INSERT INTO occurrences
             (event_id, start_time, end_time, tz, status, venue_id,
              location_name)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            event_id,
            start_str,
            end_str,
            occ.tz,
            occ.status,
            venue_id,
            occ.location_name,
          ],
        )
        .map_err(|e| Error::for_record(slug, "occurrence insert", e))?;
      }
    }
  }

  Ok(())
}

/// Replace all ticket tiers with the submitted set, in submission order.
pub fn reconcile_tickets(
  tx: &Transaction,
  event_id: i64,
  slug: &str,
  submitted: &[TicketRecord],
) -> Result<()> {
  tx.execute(
    "DELETE FROM ticket_types WHERE event_id = ?1",
    rusqlite::params![event_id],
  )?;
  for ticket in submitted {
    tx.execute(
      "INSERT INTO ticket_types
         (event_id, name, price, currency, capacity, sold)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      rusqlite::params![
        event_id,
        ticket.name,
        ticket.price,
        ticket.currency,
        ticket.capacity,
        ticket.sold,
      ],
    )
    .map_err(|e| Error::for_record(slug, "ticket insert", e))?;
  }
  Ok(())
}

/// Replace all gallery images with the submitted set, in submission order.
pub fn reconcile_images(
  tx: &Transaction,
  event_id: i64,
  slug: &str,
  submitted: &[ImageRecord],
) -> Result<()> {
  tx.execute(
    "DELETE FROM event_images WHERE event_id = ?1",
    rusqlite::params![event_id],
  )?;
  for image in submitted {
    tx.execute(
      "INSERT INTO event_images (event_id, url, alt, sort_order)
       VALUES (?1, ?2, ?3, ?4)",
      rusqlite::params![event_id, image.url, image.alt, image.sort_order],
    )
    .map_err(|e| Error::for_record(slug, "image insert", e))?;
  }
  Ok(())
}

/// Append submitted provenance records, skipping any fingerprint already
/// stored for this event (or repeated within the submission). Existing
/// sources are kept: provenance accumulates across sources but never
/// duplicates a scrape.
pub fn reconcile_sources(
  tx: &Transaction,
  event_id: i64,
  slug: &str,
  submitted: &[SourceRecord],
  now: DateTime<Utc>,
) -> Result<()> {
  let mut known: HashSet<String> = {
    let mut stmt = tx.prepare(
      "SELECT fingerprint FROM event_sources WHERE event_id = ?1",
    )?;
    let rows = stmt
      .query_map(rusqlite::params![event_id], |r| r.get(0))?
      .collect::<rusqlite::Result<HashSet<String>>>()?;
    rows
  };

  for source in submitted {
    if !known.insert(source.fingerprint.clone()) {
      continue;
    }
    let raw_payload = encode_json(&source.raw_payload)?;
    tx.execute(
      "INSERT INTO event_sources
         (event_id, source_url, source_name, scraped_at, confidence,
          fingerprint, raw_payload)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      rusqlite::params![
        event_id,
        source.source_url,
        source.source_name,
        encode_dt(now),
        source.confidence,
        source.fingerprint,
        raw_payload,
      ],
    )
    .map_err(|e| Error::for_record(slug, "source insert", e))?;
  }

  Ok(())
}
