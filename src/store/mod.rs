//! Task store — a thin typed interface over an opaque document collection.
//!
//! [`Collection`] is the boundary to the underlying engine: four primitive
//! document operations, nothing more. The engine behind it is deliberately
//! out of scope; [`MemoryCollection`] ships in-crate and any driver that
//! implements the trait plugs in the same way.
//!
//! [`TaskStore`] is the typed wrapper the rest of the crate talks to. It is
//! constructed explicitly with its collection handle (no process-global
//! state) and owns the retry policy applied to the completion toggle, the
//! most failure-prone and most frequently invoked mutation.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::error;

use crate::retry::{RetryPolicy, retry};
use crate::task::{IdParseError, Task, TaskId};

pub mod memory;

pub use memory::MemoryCollection;

/// First page returned when the caller does not specify one.
pub const DEFAULT_PAGE: usize = 1;

/// Page window size used when the caller does not specify one.
pub const DEFAULT_LIMIT: usize = 10;

/// Failure reported by the underlying document engine.
///
/// The engine is opaque to this crate, so its failures are carried as a
/// message rather than a structured cause.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CollectionError {
    message: String,
}

impl CollectionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The opaque document-store boundary: one collection of task documents.
///
/// Implementations must provide per-document atomicity for each operation;
/// nothing here spans multiple documents. `find` returns documents in the
/// collection's natural insertion order.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Returns up to `limit` tasks after skipping the first `skip`, in
    /// insertion order.
    async fn find(&self, skip: usize, limit: usize) -> Result<Vec<Task>, CollectionError>;

    /// Inserts one task document.
    async fn insert(&self, task: Task) -> Result<(), CollectionError>;

    /// Sets `completed` on the task matching `id`.
    ///
    /// Returns the modified count: 1 when a document changed, 0 when no
    /// document matched or the stored value already equalled `completed`.
    async fn set_completed(&self, id: TaskId, completed: bool) -> Result<u64, CollectionError>;

    /// Removes the task matching `id`, returning the deleted count.
    async fn remove(&self, id: TaskId) -> Result<u64, CollectionError>;
}

/// Errors surfaced by [`TaskStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The id string did not parse; no collection call was made.
    #[error(transparent)]
    InvalidId(#[from] IdParseError),

    #[error("failed to fetch tasks")]
    Fetch(#[source] CollectionError),

    #[error("failed to create task")]
    Write(#[source] CollectionError),

    #[error("failed to delete task")]
    Delete(#[source] CollectionError),

    /// Strict delete policy: removing an id that matches nothing is an
    /// error the caller must surface, never a silent no-op.
    #[error("no task with id {0}")]
    NotFound(TaskId),

    /// The toggle kept failing through every configured attempt.
    #[error("toggle failed after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: CollectionError,
    },
}

/// Typed task-store interface: list, create, toggle, delete.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use taskboard::store::{MemoryCollection, TaskStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), taskboard::store::StoreError> {
/// let store = TaskStore::new(Arc::new(MemoryCollection::new()));
/// store.create("water plants", "the big one too", "2026-08-20").await?;
/// let tasks = store.list(1, 10).await?;
/// assert_eq!(tasks.len(), 1);
/// assert!(!tasks[0].completed);
/// # Ok(())
/// # }
/// ```
pub struct TaskStore {
    collection: Arc<dyn Collection>,
    retry: RetryPolicy,
}

impl TaskStore {
    /// Creates a store over the given collection with the default retry
    /// policy (3 attempts, exponential backoff).
    pub fn new(collection: Arc<dyn Collection>) -> Self {
        Self {
            collection,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy applied to [`toggle`](Self::toggle).
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Lists one page of tasks in insertion order.
    ///
    /// The window is `skip = (page - 1) * limit`, `take = limit`; a `page`
    /// of 0 is treated as page 1. A page past the end of the collection
    /// yields an empty vector.
    ///
    /// # Errors
    ///
    /// [`StoreError::Fetch`] when the underlying query fails. The failure is
    /// surfaced, never swallowed.
    pub async fn list(&self, page: usize, limit: usize) -> Result<Vec<Task>, StoreError> {
        let skip = page.max(1).saturating_sub(1).saturating_mul(limit);
        self.collection.find(skip, limit).await.map_err(|e| {
            error!(err = %e, "list query failed");
            StoreError::Fetch(e)
        })
    }

    /// Lists the first page with the default window size.
    pub async fn list_default(&self) -> Result<Vec<Task>, StoreError> {
        self.list(DEFAULT_PAGE, DEFAULT_LIMIT).await
    }

    /// Creates a task with `completed = false` and returns its new id.
    ///
    /// Creation is never retried: without deduplication a blind re-insert
    /// could duplicate the task.
    ///
    /// # Errors
    ///
    /// [`StoreError::Write`] when the insert fails.
    pub async fn create(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: impl Into<String>,
    ) -> Result<TaskId, StoreError> {
        let task = Task::new(TaskId::generate(), title, description, due_date);
        let id = task.id;
        self.collection.insert(task).await.map_err(|e| {
            error!(err = %e, "insert failed");
            StoreError::Write(e)
        })?;
        Ok(id)
    }

    /// Flips `completed` to `!current` on the task matching `id`.
    ///
    /// Returns `Ok(true)` when exactly one document was modified and
    /// `Ok(false)` when nothing matched or the write changed nothing; both
    /// are ordinary outcomes, not errors. The collection call is wrapped in
    /// this store's retry policy.
    ///
    /// # Errors
    ///
    /// [`StoreError::RetriesExhausted`] once every attempt has failed.
    pub async fn toggle(&self, id: TaskId, current: bool) -> Result<bool, StoreError> {
        let collection = Arc::clone(&self.collection);
        let modified = retry(&self.retry, move || {
            let collection = Arc::clone(&collection);
            async move { collection.set_completed(id, !current).await }
        })
        .await
        .map_err(|e| StoreError::RetriesExhausted {
            attempts: e.attempts,
            source: e.source,
        })?;
        Ok(modified == 1)
    }

    /// Removes the task matching `id`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no document matched (strict policy);
    /// [`StoreError::Delete`] when the underlying delete fails.
    pub async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        let deleted = self.collection.remove(id).await.map_err(|e| {
            error!(err = %e, "delete failed");
            StoreError::Delete(e)
        })?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    /// [`toggle`](Self::toggle) for a transport-form id string.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidId`] when the string does not parse; the
    /// collection is never reached in that case.
    pub async fn toggle_str(&self, id: &str, current: bool) -> Result<bool, StoreError> {
        let id = TaskId::parse(id)?;
        self.toggle(id, current).await
    }

    /// [`delete`](Self::delete) for a transport-form id string.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidId`] when the string does not parse.
    pub async fn delete_str(&self, id: &str) -> Result<(), StoreError> {
        let id = TaskId::parse(id)?;
        self.delete(id).await
    }
}
