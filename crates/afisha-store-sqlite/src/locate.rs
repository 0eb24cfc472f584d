//! Event Locator — slug lookup and eager loading of the full event graph.
//!
//! `find_by_slug` is the sole identity check for create-vs-update: all
//! matching happens on the unique `events.slug` column. The returned
//! [`EventView`] is fully populated (organizer, venue, tags, occurrences
//! with their venue overrides, tickets, images, sources) so callers can
//! both match and respond without a second round trip.

use afisha_core::{
  event::{
    Event, EventImage, EventSource, EventView, Occurrence, OccurrenceView,
    TicketType,
  },
  refdata::{Organizer, Tag, Venue},
  store::EventQuery,
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{decode_dt, decode_dt_opt, decode_json, decode_status, encode_dt,
           encode_status},
};

/// Shape of an `events` row before text columns are decoded.
struct RawEvent {
  event_id:        i64,
  title:           String,
  slug:            String,
  description:     Option<String>,
  full_text:       Option<String>,
  language:        String,
  age_restriction: u8,
  status:          String,
  created_at:      String,
  updated_at:      Option<String>,
  organizer_id:    Option<i64>,
  venue_id:        Option<i64>,
}

impl RawEvent {
  fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:        self.event_id,
      title:           self.title,
      slug:            self.slug,
      description:     self.description,
      full_text:       self.full_text,
      language:        self.language,
      age_restriction: self.age_restriction,
      status:          decode_status(&self.status)?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt_opt(self.updated_at)?,
      organizer_id:    self.organizer_id,
      venue_id:        self.venue_id,
    })
  }
}

const EVENT_COLUMNS: &str = "event_id, title, slug, description, full_text,
   language, age_restriction, status, created_at, updated_at,
   organizer_id, venue_id";

fn raw_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawEvent> {
  Ok(RawEvent {
    event_id:        row.get(0)?,
    title:           row.get(1)?,
    slug:            row.get(2)?,
    description:     row.get(3)?,
    full_text:       row.get(4)?,
    language:        row.get(5)?,
    age_restriction: row.get(6)?,
    status:          row.get(7)?,
    created_at:      row.get(8)?,
    updated_at:      row.get(9)?,
    organizer_id:    row.get(10)?,
    venue_id:        row.get(11)?,
  })
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// The root row's id for a slug, or `None`. Cheap form of the locator for
/// call sites that only need the match.
pub fn event_id_by_slug(conn: &Connection, slug: &str) -> Result<Option<i64>> {
  Ok(
    conn
      .query_row(
        "SELECT event_id FROM events WHERE slug = ?1",
        rusqlite::params![slug],
        |r| r.get(0),
      )
      .optional()?,
  )
}

/// Find an event by slug with every reference and child collection loaded.
pub fn find_by_slug(conn: &Connection, slug: &str) -> Result<Option<EventView>> {
  let raw: Option<RawEvent> = conn
    .query_row(
      &format!("SELECT {EVENT_COLUMNS} FROM events WHERE slug = ?1"),
      rusqlite::params![slug],
      raw_from_row,
    )
    .optional()?;

  match raw {
    Some(raw) => Ok(Some(load_view(conn, raw)?)),
    None => Ok(None),
  }
}

// ─── Graph loading ───────────────────────────────────────────────────────────

fn load_view(conn: &Connection, raw: RawEvent) -> Result<EventView> {
  let event = raw.into_event()?;
  let event_id = event.event_id;

  let organizer = match event.organizer_id {
    Some(id) => load_organizer(conn, id)?,
    None => None,
  };
  let venue = match event.venue_id {
    Some(id) => load_venue(conn, id)?,
    None => None,
  };

  Ok(EventView {
    event,
    organizer,
    venue,
    tags: load_tags(conn, event_id)?,
    occurrences: load_occurrences(conn, event_id)?,
    tickets: load_tickets(conn, event_id)?,
    images: load_images(conn, event_id)?,
    sources: load_sources(conn, event_id)?,
  })
}

fn load_organizer(conn: &Connection, id: i64) -> Result<Option<Organizer>> {
  let row: Option<(i64, String, f64, Option<String>)> = conn
    .query_row(
      "SELECT organizer_id, name, rating, social_links
       FROM organizers WHERE organizer_id = ?1",
      rusqlite::params![id],
      |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
    )
    .optional()?;

  row
    .map(|(organizer_id, name, rating, social_links)| {
      Ok(Organizer {
        organizer_id,
        name,
        rating,
        social_links: decode_json(social_links)?,
      })
    })
    .transpose()
}

fn load_venue(conn: &Connection, id: i64) -> Result<Option<Venue>> {
  Ok(
    conn
      .query_row(
        "SELECT venue_id, name, address, city, lat, lon
         FROM venues WHERE venue_id = ?1",
        rusqlite::params![id],
        |r| {
          Ok(Venue {
            venue_id: r.get(0)?,
            name:     r.get(1)?,
            address:  r.get(2)?,
            city:     r.get(3)?,
            lat:      r.get(4)?,
            lon:      r.get(5)?,
          })
        },
      )
      .optional()?,
  )
}

fn load_tags(conn: &Connection, event_id: i64) -> Result<Vec<Tag>> {
  let mut stmt = conn.prepare(
    "SELECT t.tag_id, t.name, t.slug
     FROM tags t
     JOIN event_tags et ON et.tag_id = t.tag_id
     WHERE et.event_id = ?1
     ORDER BY t.slug",
  )?;
  let tags = stmt
    .query_map(rusqlite::params![event_id], |r| {
      Ok(Tag { tag_id: r.get(0)?, name: r.get(1)?, slug: r.get(2)? })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(tags)
}

fn load_occurrences(
  conn: &Connection,
  event_id: i64,
) -> Result<Vec<OccurrenceView>> {
  struct RawOccurrence {
    occurrence_id: i64,
    start_time:    String,
    end_time:      Option<String>,
    tz:            String,
    status:        String,
    venue_id:      Option<i64>,
    location_name: Option<String>,
  }

  let mut stmt = conn.prepare(
    "SELECT occurrence_id, start_time, end_time, tz, status, venue_id,
            location_name
     FROM occurrences WHERE event_id = ?1
     ORDER BY start_time",
  )?;
  let raws = stmt
    .query_map(rusqlite::params![event_id], |r| {
      Ok(RawOccurrence {
        occurrence_id: r.get(0)?,
        start_time:    r.get(1)?,
        end_time:      r.get(2)?,
        tz:            r.get(3)?,
        status:        r.get(4)?,
        venue_id:      r.get(5)?,
        location_name: r.get(6)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(|raw| {
      let venue = match raw.venue_id {
        Some(id) => load_venue(conn, id)?,
        None => None,
      };
      Ok(OccurrenceView {
        occurrence: Occurrence {
          occurrence_id: raw.occurrence_id,
          start_time:    decode_dt(&raw.start_time)?,
          end_time:      decode_dt_opt(raw.end_time)?,
          tz:            raw.tz,
          status:        raw.status,
          venue_id:      raw.venue_id,
          location_name: raw.location_name,
        },
        venue,
      })
    })
    .collect()
}

fn load_tickets(conn: &Connection, event_id: i64) -> Result<Vec<TicketType>> {
  let mut stmt = conn.prepare(
    "SELECT ticket_type_id, name, price, currency, capacity, sold
     FROM ticket_types WHERE event_id = ?1
     ORDER BY ticket_type_id",
  )?;
  let tickets = stmt
    .query_map(rusqlite::params![event_id], |r| {
      Ok(TicketType {
        ticket_type_id: r.get(0)?,
        name:           r.get(1)?,
        price:          r.get(2)?,
        currency:       r.get(3)?,
        capacity:       r.get(4)?,
        sold:           r.get(5)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(tickets)
}

fn load_images(conn: &Connection, event_id: i64) -> Result<Vec<EventImage>> {
  let mut stmt = conn.prepare(
    "SELECT image_id, url, alt, sort_order
     FROM event_images WHERE event_id = ?1
     ORDER BY sort_order, image_id",
  )?;
  let images = stmt
    .query_map(rusqlite::params![event_id], |r| {
      Ok(EventImage {
        image_id:   r.get(0)?,
        url:        r.get(1)?,
        alt:        r.get(2)?,
        sort_order: r.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(images)
}

fn load_sources(conn: &Connection, event_id: i64) -> Result<Vec<EventSource>> {
  struct RawSource {
    source_id:   i64,
    source_url:  String,
    source_name: String,
    scraped_at:  String,
    confidence:  f64,
    fingerprint: String,
    raw_payload: Option<String>,
  }

  let mut stmt = conn.prepare(
    "SELECT source_id, source_url, source_name, scraped_at, confidence,
            fingerprint, raw_payload
     FROM event_sources WHERE event_id = ?1
     ORDER BY source_id",
  )?;
  let raws = stmt
    .query_map(rusqlite::params![event_id], |r| {
      Ok(RawSource {
        source_id:   r.get(0)?,
        source_url:  r.get(1)?,
        source_name: r.get(2)?,
        scraped_at:  r.get(3)?,
        confidence:  r.get(4)?,
        fingerprint: r.get(5)?,
        raw_payload: r.get(6)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(|raw| {
      Ok(EventSource {
        source_id:   raw.source_id,
        source_url:  raw.source_url,
        source_name: raw.source_name,
        scraped_at:  decode_dt(&raw.scraped_at)?,
        confidence:  raw.confidence,
        fingerprint: raw.fingerprint,
        raw_payload: decode_json(raw.raw_payload)?,
      })
    })
    .collect()
}

// ─── Filtered listing ────────────────────────────────────────────────────────

/// Run an [`EventQuery`] and return matching events newest-first, fully
/// populated. The predicate set is resolved into one SQL statement up
/// front; absent predicates are never probed per row.
pub fn list_events(conn: &Connection, query: &EventQuery) -> Result<Vec<EventView>> {
  let status_str = query.status.map(encode_status).map(str::to_owned);
  let after_str = query.starts_after.map(encode_dt);
  let before_str = query.starts_before.map(encode_dt);
  let limit_val = query.limit.unwrap_or(100) as i64;
  let offset_val = query.offset.unwrap_or(0) as i64;

  let mut conds: Vec<&'static str> = vec![];
  if status_str.is_some() {
    conds.push("e.status = ?1");
  }
  if query.tag.is_some() {
    conds.push(
      "EXISTS (SELECT 1 FROM event_tags et
               JOIN tags t ON t.tag_id = et.tag_id
               WHERE et.event_id = e.event_id AND t.slug = ?2)",
    );
  }
  if after_str.is_some() {
    conds.push(
      "EXISTS (SELECT 1 FROM occurrences o
               WHERE o.event_id = e.event_id AND o.start_time >= ?3)",
    );
  }
  if before_str.is_some() {
    conds.push(
      "EXISTS (SELECT 1 FROM occurrences o
               WHERE o.event_id = e.event_id AND o.start_time < ?4)",
    );
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };

  let sql = format!(
    "SELECT {EVENT_COLUMNS} FROM events e
     {where_clause}
     ORDER BY e.event_id DESC
     LIMIT ?5 OFFSET ?6"
  );

  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(
      rusqlite::params![
        status_str.as_deref(),
        query.tag.as_deref(),
        after_str.as_deref(),
        before_str.as_deref(),
        limit_val,
        offset_val,
      ],
      raw_from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws.into_iter().map(|raw| load_view(conn, raw)).collect()
}
