//! SQLite backend for the Afisha event store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The reconciliation engine
//! itself is synchronous code operating on one [`rusqlite::Transaction`]
//! per batch: the coordinator in [`store`] opens the transaction, threads
//! it by reference through the resolver, locator, and child reconcilers,
//! and owns the single commit point.

mod children;
mod encode;
mod locate;
mod reconcile;
mod resolve;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
