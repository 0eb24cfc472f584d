//! Handlers for `/events` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/events` | Filters: `status`, `tag`, `starts_after`, `starts_before`, `limit`, `offset` |
//! | `POST`   | `/events/batch` | Atomic batch reconciliation |
//! | `GET`    | `/events/{slug}` | 404 if not found |
//! | `PUT`    | `/events/{slug}` | Single-record upsert; body slug must match path |
//! | `DELETE` | `/events/{slug}` | Cascades to children |
//! | `DELETE` | `/events/cleanup` | Deletes all events, keeps reference data |

use std::sync::Arc;

use afisha_core::{
  event::{EventStatus, EventView},
  record::EventRecord,
  store::{BatchOutcome, EventQuery, EventStore, RecordAction},
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

// ─── Health ──────────────────────────────────────────────────────────────────

/// `GET /`
pub async fn health() -> impl IntoResponse {
  Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub status:        Option<EventStatus>,
  pub tag:           Option<String>,
  pub starts_after:  Option<DateTime<Utc>>,
  pub starts_before: Option<DateTime<Utc>>,
  pub limit:         Option<usize>,
  pub offset:        Option<usize>,
}

/// `GET /events[?status=...][&tag=...][&starts_after=...][&limit=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<EventView>>, ApiError>
where
  S: EventStore,
  S::Error: Into<afisha_core::Error>,
{
  let query = EventQuery {
    status:        params.status,
    tag:           params.tag,
    starts_after:  params.starts_after,
    starts_before: params.starts_before,
    limit:         params.limit,
    offset:        params.offset,
  };

  let events = store
    .list_events(&query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(events))
}

// ─── Batch ingestion ─────────────────────────────────────────────────────────

/// `POST /events/batch` — body: an ordered array of event records.
///
/// All-or-nothing: the response is produced only for a fully-committed
/// batch; any failure rolls the whole batch back and reports the failing
/// record.
pub async fn batch<S>(
  State(store): State<Arc<S>>,
  Json(records): Json<Vec<EventRecord>>,
) -> Result<(StatusCode, Json<BatchOutcome>), ApiError>
where
  S: EventStore,
  S::Error: Into<afisha_core::Error>,
{
  let outcome = store
    .ingest_batch(records)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

// ─── Single record ───────────────────────────────────────────────────────────

/// `GET /events/{slug}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<Json<EventView>, ApiError>
where
  S: EventStore,
  S::Error: Into<afisha_core::Error>,
{
  let view = store
    .find_by_slug(&slug)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("event {slug} not found")))?;
  Ok(Json(view))
}

/// `PUT /events/{slug}` — upsert one record with the same reconciliation
/// semantics as the batch path. 201 on create, 200 on update.
pub async fn upsert<S>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
  Json(record): Json<EventRecord>,
) -> Result<(StatusCode, Json<EventView>), ApiError>
where
  S: EventStore,
  S::Error: Into<afisha_core::Error>,
{
  if record.slug != slug {
    return Err(ApiError::BadRequest(format!(
      "body slug {:?} does not match path slug {slug:?}",
      record.slug
    )));
  }

  let (action, view) = store
    .upsert_event(record)
    .await
    .map_err(ApiError::from_store)?;
  let status = match action {
    RecordAction::Created => StatusCode::CREATED,
    RecordAction::Updated => StatusCode::OK,
  };
  Ok((status, Json(view)))
}

/// `DELETE /events/{slug}` — removes the event and everything it owns;
/// organizers, venues, and tags survive.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(slug): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: EventStore,
  S::Error: Into<afisha_core::Error>,
{
  store
    .delete_event(&slug)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Maintenance ─────────────────────────────────────────────────────────────

/// `DELETE /events/cleanup` — wipe all events (cascading), keep shared
/// reference data.
pub async fn cleanup<S>(
  State(store): State<Arc<S>>,
) -> Result<StatusCode, ApiError>
where
  S: EventStore,
  S::Error: Into<afisha_core::Error>,
{
  let purged = store
    .purge_events()
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(purged, "cleanup requested via API");
  Ok(StatusCode::NO_CONTENT)
}
