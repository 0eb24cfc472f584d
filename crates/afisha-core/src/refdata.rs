//! Shared reference data — organizers, venues, tags.
//!
//! These rows are shared master data: created lazily the first time an
//! ingested record references their natural key, never updated by the
//! reconciliation path afterwards, and never deleted when an event is.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event organizer, unique by `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organizer {
  pub organizer_id: i64,
  pub name:         String,
  pub rating:       f64,
  /// Free-form map of network name to profile URL.
  pub social_links: Option<Value>,
}

/// A venue, unique by the `(name, city)` pair — two venues with the same
/// name in different cities are distinct rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
  pub venue_id: i64,
  pub name:     String,
  pub address:  String,
  pub city:     String,
  pub lat:      Option<f64>,
  pub lon:      Option<f64>,
}

/// A classification tag, unique by `slug`; many-to-many with events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
  pub tag_id: i64,
  pub name:   String,
  pub slug:   String,
}
