//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings (comparable
//! lexicographically, since they are always UTC in one fixed format).
//! Free-form maps (social links, raw payloads) are stored as compact JSON.

use afisha_core::event::EventStatus;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_dt_opt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── EventStatus ─────────────────────────────────────────────────────────────

pub fn encode_status(s: EventStatus) -> &'static str {
  match s {
    EventStatus::Draft => "draft",
    EventStatus::Scheduled => "scheduled",
    EventStatus::Cancelled => "cancelled",
    EventStatus::Postponed => "postponed",
    EventStatus::Done => "done",
  }
}

pub fn decode_status(s: &str) -> Result<EventStatus> {
  match s {
    "draft" => Ok(EventStatus::Draft),
    "scheduled" => Ok(EventStatus::Scheduled),
    "cancelled" => Ok(EventStatus::Cancelled),
    "postponed" => Ok(EventStatus::Postponed),
    "done" => Ok(EventStatus::Done),
    other => Err(Error::DateParse(format!("unknown event status: {other:?}"))),
  }
}

// ─── JSON maps ───────────────────────────────────────────────────────────────

pub fn encode_json(v: &Option<Value>) -> Result<Option<String>> {
  v.as_ref().map(|v| Ok(serde_json::to_string(v)?)).transpose()
}

pub fn decode_json(s: Option<String>) -> Result<Option<Value>> {
  s.as_deref().map(|s| Ok(serde_json::from_str(s)?)).transpose()
}
