//! # taskboard
//!
//! An async task-management web service: create, list, complete/undo, and
//! delete tasks held in a pluggable document collection, with bounded
//! retry-with-backoff around the completion toggle and a board controller
//! that mirrors the list client-side.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskboard::api;
//! use taskboard::store::{MemoryCollection, TaskStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(TaskStore::new(Arc::new(MemoryCollection::new())));
//!     println!("Serving on http://127.0.0.1:8080");
//!     api::serve("127.0.0.1:8080", store).await?;
//!     Ok(())
//! }
//! ```

// ── Domain modules ────────────────────────────────────────────────────────────
pub mod api;
pub mod board;
pub mod retry;
pub mod store;
pub mod task;

// ── HTTP stack ────────────────────────────────────────────────────────────────
pub mod context;
pub mod http;
pub mod middleware;
pub mod router;
pub mod security;
pub mod server;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use board::TaskBoard;
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::Router;
pub use server::{Server, ServerError};
pub use store::{StoreError, TaskStore};
pub use task::{Task, TaskId};
