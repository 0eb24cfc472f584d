//! Submitted record types — the wire shape of one scraped event.
//!
//! A record is always "the current true view" of the event as the scraper
//! saw it: every collection it carries fully replaces the stored one, so a
//! submission that omits an occurrence deletes that occurrence. Reference
//! data (organizer, venue, tags) is matched by natural key and created on
//! first sight; attributes on an already-resolved key are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result, event::EventStatus};

fn default_language() -> String { "ru".to_owned() }
fn default_tz() -> String { "Europe/Moscow".to_owned() }
fn default_occurrence_status() -> String { "scheduled".to_owned() }
fn default_currency() -> String { "RUB".to_owned() }
fn default_confidence() -> f64 { 1.0 }

/// Organizer reference; `name` is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerRecord {
  pub name:         String,
  #[serde(default)]
  pub rating:       f64,
  #[serde(default)]
  pub social_links: Option<Value>,
}

/// Venue reference; `(name, city)` is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueRecord {
  pub name:    String,
  pub address: String,
  pub city:    String,
  #[serde(default)]
  pub lat:     Option<f64>,
  #[serde(default)]
  pub lon:     Option<f64>,
}

/// Tag reference; `slug` is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRecord {
  pub name: String,
  pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceRecord {
  pub start_time:    DateTime<Utc>,
  #[serde(default)]
  pub end_time:      Option<DateTime<Utc>>,
  #[serde(default = "default_tz")]
  pub tz:            String,
  #[serde(default = "default_occurrence_status")]
  pub status:        String,
  #[serde(default)]
  pub location_name: Option<String>,
  /// Venue override for this occurrence only; resolved by natural key.
  #[serde(default)]
  pub venue:         Option<VenueRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRecord {
  pub name:     String,
  pub price:    i64,
  #[serde(default = "default_currency")]
  pub currency: String,
  #[serde(default)]
  pub capacity: Option<i64>,
  #[serde(default)]
  pub sold:     i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
  pub url:        String,
  #[serde(default)]
  pub alt:        Option<String>,
  #[serde(default)]
  pub sort_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
  pub source_url:  String,
  pub source_name: String,
  #[serde(default = "default_confidence")]
  pub confidence:  f64,
  pub fingerprint: String,
  #[serde(default)]
  pub raw_payload: Option<Value>,
}

/// One scraped event as submitted for reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
  pub title:           String,
  pub slug:            String,
  #[serde(default)]
  pub description:     Option<String>,
  #[serde(default)]
  pub full_text:       Option<String>,
  #[serde(default = "default_language")]
  pub language:        String,
  #[serde(default)]
  pub age_restriction: u8,
  /// `None` leaves an existing event's status untouched; a new event
  /// defaults to [`EventStatus::Draft`].
  #[serde(default)]
  pub status:          Option<EventStatus>,

  #[serde(default)]
  pub organizer:       Option<OrganizerRecord>,
  #[serde(default)]
  pub default_venue:   Option<VenueRecord>,
  #[serde(default)]
  pub tags:            Vec<TagRecord>,
  #[serde(default)]
  pub occurrences:     Vec<OccurrenceRecord>,
  #[serde(default)]
  pub tickets:         Vec<TicketRecord>,
  #[serde(default)]
  pub images:          Vec<ImageRecord>,
  #[serde(default)]
  pub sources:         Vec<SourceRecord>,
}

impl EventRecord {
  /// Reject records that cannot identify or describe an event.
  pub fn validate(&self) -> Result<()> {
    if self.slug.trim().is_empty() {
      return Err(Error::Validation("slug must not be empty".into()));
    }
    if self.title.trim().is_empty() {
      return Err(Error::Validation(format!(
        "record {:?}: title must not be empty",
        self.slug
      )));
    }
    for tag in &self.tags {
      if tag.slug.trim().is_empty() {
        return Err(Error::Validation(format!(
          "record {:?}: tag slug must not be empty",
          self.slug
        )));
      }
    }
    Ok(())
  }
}
