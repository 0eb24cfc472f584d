//! Error type for `afisha-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] afisha_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A uniqueness constraint rejected the record named by `slug`.
  #[error("record {slug:?}: {detail}")]
  Constraint { slug: String, detail: String },

  #[error("event not found: {0}")]
  EventNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Wrap a raw sqlite error from a child/root insert, promoting
  /// constraint violations to [`Error::Constraint`] with the failing
  /// record's slug attached.
  pub(crate) fn for_record(
    slug: &str,
    what: &str,
    err: rusqlite::Error,
  ) -> Self {
    if is_constraint_violation(&err) {
      Error::Constraint {
        slug:   slug.to_owned(),
        detail: format!("{what}: {err}"),
      }
    } else {
      err.into()
    }
  }
}

/// Whether a sqlite error is a UNIQUE/constraint failure (as opposed to an
/// I/O or programming error).
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

/// Classification for transport layers: `NotFound`, `Constraint`, and
/// `Validation` keep their identity; everything else is a storage fault.
impl From<Error> for afisha_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Core(e) => e,
      Error::Json(e) => afisha_core::Error::Serialization(e),
      Error::Constraint { slug, detail } => {
        afisha_core::Error::Constraint { slug, detail }
      }
      Error::EventNotFound(slug) => afisha_core::Error::NotFound(slug),
      Error::Database(_) | Error::Sqlite(_) | Error::DateParse(_) => {
        afisha_core::Error::Storage(err.to_string())
      }
    }
  }
}
