//! Error types for `afisha-core`.
//!
//! This is the classified error that crosses the [`EventStore`] boundary:
//! storage backends keep their own richer error enums and convert into this
//! one, so transport layers can map each kind to a response without knowing
//! which backend produced it.
//!
//! [`EventStore`]: crate::store::EventStore

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A single-record operation named a slug with no stored event.
  #[error("event not found: {0}")]
  NotFound(String),

  /// A store uniqueness constraint rejected the record — duplicate
  /// occurrence start time, or an unrecoverable natural-key conflict.
  /// Carries the failing record's slug so the caller can resubmit a
  /// corrected batch.
  #[error("record {slug:?}: {detail}")]
  Constraint { slug: String, detail: String },

  /// The submitted record is malformed.
  #[error("invalid record: {0}")]
  Validation(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Backend failure unrelated to the submitted data.
  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
