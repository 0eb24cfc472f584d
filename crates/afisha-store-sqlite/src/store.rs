//! [`SqliteStore`] — the SQLite implementation of [`EventStore`], and the
//! Batch Coordinator that owns the per-batch unit of work.

use std::path::Path;

use afisha_core::{
  event::EventView,
  record::EventRecord,
  store::{BatchOutcome, EventQuery, EventStore, RecordAction},
};
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::{Error, Result, locate, reconcile, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Afisha event store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// database work runs on the connection's dedicated thread, so records
/// within a batch are applied strictly sequentially and concurrent batches
/// are serialized against each other.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread, flattening the engine's own result
  /// through the channel error.
  async fn with_conn<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

// ─── Batch Coordinator ───────────────────────────────────────────────────────

/// Process a batch inside one transaction: records strictly in submission
/// order, a single commit after every record succeeds. Dropping the
/// transaction on the first failure rolls back everything the batch wrote
/// — no partial state is ever committed.
fn run_batch(
  conn: &mut Connection,
  records: &[EventRecord],
) -> Result<BatchOutcome> {
  let now = Utc::now();
  let tx = conn.transaction()?;

  let mut outcome = BatchOutcome::default();
  for record in records {
    let (_, action) = reconcile::reconcile_one(&tx, record, now)?;
    outcome.push(record.slug.clone(), action);
  }

  tx.commit()?;
  Ok(outcome)
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = Error;

  async fn ingest_batch(
    &self,
    records: Vec<EventRecord>,
  ) -> Result<BatchOutcome> {
    let total = records.len();
    let result = self
      .with_conn(move |conn| run_batch(conn, &records))
      .await;

    match &result {
      Ok(outcome) => info!(
        total,
        created = outcome.created,
        updated = outcome.updated,
        "batch committed"
      ),
      Err(err) => warn!(total, %err, "batch rolled back"),
    }
    result
  }

  async fn upsert_event(
    &self,
    record: EventRecord,
  ) -> Result<(RecordAction, EventView)> {
    self
      .with_conn(move |conn| {
        let now = Utc::now();
        let tx = conn.transaction()?;
        let (_, action) = reconcile::reconcile_one(&tx, &record, now)?;
        tx.commit()?;

        let view = locate::find_by_slug(conn, &record.slug)?
          .ok_or_else(|| Error::EventNotFound(record.slug.clone()))?;
        Ok((action, view))
      })
      .await
  }

  async fn find_by_slug(&self, slug: &str) -> Result<Option<EventView>> {
    let slug = slug.to_owned();
    self
      .with_conn(move |conn| locate::find_by_slug(conn, &slug))
      .await
  }

  async fn list_events(&self, query: &EventQuery) -> Result<Vec<EventView>> {
    let query = query.clone();
    self
      .with_conn(move |conn| locate::list_events(conn, &query))
      .await
  }

  async fn delete_event(&self, slug: &str) -> Result<()> {
    let slug = slug.to_owned();
    self
      .with_conn(move |conn| {
        let deleted = conn.execute(
          "DELETE FROM events WHERE slug = ?1",
          rusqlite::params![slug],
        )?;
        if deleted == 0 {
          return Err(Error::EventNotFound(slug));
        }
        Ok(())
      })
      .await
  }

  async fn purge_events(&self) -> Result<u64> {
    let purged = self
      .with_conn(|conn| Ok(conn.execute("DELETE FROM events", [])? as u64))
      .await?;
    info!(purged, "purged all events; reference data preserved");
    Ok(purged)
  }
}
