//! JSON REST API for Afisha.
//!
//! Exposes an axum [`Router`] backed by any
//! [`afisha_core::store::EventStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = afisha_api::api_router(store.clone());
//! ```

pub mod error;
pub mod events;

use std::{path::PathBuf, sync::Arc};

use afisha_core::store::EventStore;
use axum::{
  Router,
  routing::{delete, get, post},
};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: EventStore + Clone + Send + Sync + 'static,
  S::Error: Into<afisha_core::Error>,
{
  Router::new()
    .route("/", get(events::health))
    .route("/events", get(events::list::<S>))
    .route("/events/batch", post(events::batch::<S>))
    .route("/events/cleanup", delete(events::cleanup::<S>))
    .route(
      "/events/{slug}",
      get(events::get_one::<S>)
        .put(events::upsert::<S>)
        .delete(events::delete_one::<S>),
    )
    .with_state(store)
}
