//! The board: client-local task list mirror and form state.
//!
//! [`TaskBoard`] is the controller behind the task view. It keeps a local
//! mirror of the store's task list, validates the add-task form before any
//! store call, and re-lists the full collection after every successful
//! mutation rather than patching the mirror in place. Consistency beats
//! cleverness at this scale.
//!
//! A task that was just marked completed does not vanish from the view at
//! once: its row enters a fading state and is dropped from the mirror by
//! [`TaskBoard::sweep`] once the fade delay has passed. The fading flag is
//! view state only and never reaches the store.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::store::{StoreError, TaskStore};
use crate::task::{Task, TaskId};

/// Delay between a row entering the fading state and its removal from view.
pub const DEFAULT_FADE_DELAY: Duration = Duration::from_millis(1000);

/// Current values of the add-task form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub due_date: String,
}

/// Per-field validation flags, set when a submit is rejected locally and
/// cleared on the next successful submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub title: bool,
    pub description: bool,
    pub due_date: bool,
}

impl FieldErrors {
    pub fn any(self) -> bool {
        self.title || self.description || self.due_date
    }
}

/// One row of the visible list: the task plus its view-only fade state.
#[derive(Debug, Clone)]
pub struct BoardRow {
    pub task: Task,
    fading_until: Option<Instant>,
}

impl BoardRow {
    fn new(task: Task) -> Self {
        Self {
            task,
            fading_until: None,
        }
    }

    /// Whether this row is fading out of view.
    pub fn is_fading(&self) -> bool {
        self.fading_until.is_some()
    }
}

/// Controller holding the visible task list, the form, and its validation
/// flags.
///
/// All store operations are awaited sequentially; the board never issues
/// parallel calls within one action.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use taskboard::board::TaskBoard;
/// use taskboard::store::{MemoryCollection, TaskStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), taskboard::store::StoreError> {
/// let store = TaskStore::new(Arc::new(MemoryCollection::new()));
/// let mut board = TaskBoard::new(store);
///
/// let form = board.form_mut();
/// form.title = "file taxes".into();
/// form.description = "before the deadline".into();
/// form.due_date = "2027-04-15".into();
///
/// assert!(board.submit().await?);
/// assert_eq!(board.rows().len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct TaskBoard {
    store: TaskStore,
    rows: Vec<BoardRow>,
    form: TaskForm,
    errors: FieldErrors,
    fade_delay: Duration,
}

impl TaskBoard {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store,
            rows: Vec::new(),
            form: TaskForm::default(),
            errors: FieldErrors::default(),
            fade_delay: DEFAULT_FADE_DELAY,
        }
    }

    /// Overrides the fade delay (1000 ms by default).
    #[must_use]
    pub fn with_fade_delay(mut self, fade_delay: Duration) -> Self {
        self.fade_delay = fade_delay;
        self
    }

    /// The visible rows, including ones currently fading.
    pub fn rows(&self) -> &[BoardRow] {
        &self.rows
    }

    pub fn form(&self) -> &TaskForm {
        &self.form
    }

    /// Mutable access for the view to bind form fields.
    pub fn form_mut(&mut self) -> &mut TaskForm {
        &mut self.form
    }

    pub fn errors(&self) -> FieldErrors {
        self.errors
    }

    /// Replaces the local mirror with a fresh listing from the store.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError::Fetch`]; the previous mirror is kept
    /// unchanged when the listing fails.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        let tasks = self.store.list_default().await?;
        self.rows = tasks.into_iter().map(BoardRow::new).collect();
        Ok(())
    }

    /// Submits the add-task form.
    ///
    /// Required-field validation runs first: if title, description, or due
    /// date is empty, the matching [`FieldErrors`] flags are set, no store
    /// call is made, and `Ok(false)` is returned. On success the task is
    /// created, the list re-fetched, and the form and flags cleared.
    ///
    /// A failed create leaves the form contents intact so nothing the user
    /// typed is lost.
    pub async fn submit(&mut self) -> Result<bool, StoreError> {
        self.errors = FieldErrors {
            title: self.form.title.is_empty(),
            description: self.form.description.is_empty(),
            due_date: self.form.due_date.is_empty(),
        };
        if self.errors.any() {
            debug!(errors = ?self.errors, "submit rejected by field validation");
            return Ok(false);
        }

        self.store
            .create(
                self.form.title.clone(),
                self.form.description.clone(),
                self.form.due_date.clone(),
            )
            .await?;
        self.refresh().await?;

        self.form = TaskForm::default();
        self.errors = FieldErrors::default();
        Ok(true)
    }

    /// Toggles completion of the row matching `id`.
    ///
    /// On success the list is re-fetched; when the task has just become
    /// completed its row starts fading and will leave the view after the
    /// fade delay, while the store record stays completed. An undo keeps the
    /// row in place. On any error, including retry exhaustion, the mirror
    /// shows the prior state unchanged.
    pub async fn toggle(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let current = self
            .rows
            .iter()
            .find(|r| r.task.id == id)
            .is_some_and(|r| r.task.completed);

        let modified = self.store.toggle(id, current).await?;
        self.refresh().await?;

        if !current {
            if let Some(row) = self.rows.iter_mut().find(|r| r.task.id == id) {
                row.fading_until = Some(Instant::now() + self.fade_delay);
            }
        }
        Ok(modified)
    }

    /// Deletes the task and re-fetches; removal is immediate, no fade.
    pub async fn delete(&mut self, id: TaskId) -> Result<(), StoreError> {
        self.store.delete(id).await?;
        self.refresh().await
    }

    /// Drops rows whose fade deadline has passed from the local mirror.
    ///
    /// The view's render loop is expected to call this; the store is not
    /// touched.
    pub fn sweep(&mut self) {
        let now = Instant::now();
        self.rows
            .retain(|row| row.fading_until.is_none_or(|deadline| deadline > now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::retry::RetryPolicy;
    use crate::store::{Collection, CollectionError, MemoryCollection};

    /// Counts calls and optionally fails every operation.
    struct Probe {
        inner: MemoryCollection,
        calls: AtomicU32,
        failing: std::sync::atomic::AtomicBool,
    }

    impl Probe {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: MemoryCollection::new(),
                calls: AtomicU32::new(0),
                failing: std::sync::atomic::AtomicBool::new(false),
            })
        }

        fn trip(&self) -> Result<(), CollectionError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.failing.load(Ordering::Relaxed) {
                return Err(CollectionError::new("down"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Collection for Probe {
        async fn find(&self, skip: usize, limit: usize) -> Result<Vec<Task>, CollectionError> {
            self.trip()?;
            self.inner.find(skip, limit).await
        }

        async fn insert(&self, task: Task) -> Result<(), CollectionError> {
            self.trip()?;
            self.inner.insert(task).await
        }

        async fn set_completed(&self, id: TaskId, completed: bool) -> Result<u64, CollectionError> {
            self.trip()?;
            self.inner.set_completed(id, completed).await
        }

        async fn remove(&self, id: TaskId) -> Result<u64, CollectionError> {
            self.trip()?;
            self.inner.remove(id).await
        }
    }

    fn board_over(probe: Arc<Probe>) -> TaskBoard {
        let store = TaskStore::new(probe).with_retry(RetryPolicy::immediate(3));
        TaskBoard::new(store)
    }

    fn fill_form(board: &mut TaskBoard, title: &str, description: &str, due: &str) {
        let form = board.form_mut();
        form.title = title.into();
        form.description = description.into();
        form.due_date = due.into();
    }

    #[tokio::test]
    async fn empty_description_sets_flag_without_store_call() {
        let probe = Probe::new();
        let mut board = board_over(probe.clone());
        fill_form(&mut board, "title", "", "2026-02-01");

        assert!(!board.submit().await.unwrap());
        assert!(board.errors().description);
        assert!(!board.errors().title);
        assert!(!board.errors().due_date);
        assert_eq!(probe.calls.load(Ordering::Relaxed), 0);
        // The typed values are still there.
        assert_eq!(board.form().title, "title");
    }

    #[tokio::test]
    async fn successful_submit_lists_the_task_and_clears_the_form() {
        let probe = Probe::new();
        let mut board = board_over(probe.clone());
        fill_form(&mut board, "walk dog", "around the block", "2026-02-01");
        // Leave a stale flag behind to prove it clears.
        board.errors.title = true;

        assert!(board.submit().await.unwrap());
        assert_eq!(board.rows().len(), 1);
        assert_eq!(board.rows()[0].task.title, "walk dog");
        assert!(!board.rows()[0].task.completed);
        assert_eq!(*board.form(), TaskForm::default());
        assert!(!board.errors().any());
    }

    #[tokio::test]
    async fn failed_create_keeps_the_form() {
        let probe = Probe::new();
        let mut board = board_over(probe.clone());
        fill_form(&mut board, "t", "d", "2026-02-01");
        probe.failing.store(true, Ordering::Relaxed);

        assert!(board.submit().await.is_err());
        assert_eq!(board.form().title, "t");
    }

    #[tokio::test(start_paused = true)]
    async fn completing_fades_then_disappears_locally_only() {
        let probe = Probe::new();
        let mut board = board_over(probe.clone());
        fill_form(&mut board, "t", "d", "2026-02-01");
        board.submit().await.unwrap();
        let id = board.rows()[0].task.id;

        assert!(board.toggle(id).await.unwrap());
        assert!(board.rows()[0].is_fading());
        assert!(board.rows()[0].task.completed);

        // Before the deadline the row survives a sweep.
        tokio::time::advance(Duration::from_millis(500)).await;
        board.sweep();
        assert_eq!(board.rows().len(), 1);

        tokio::time::advance(Duration::from_millis(600)).await;
        board.sweep();
        assert!(board.rows().is_empty());

        // The store record is untouched by the sweep.
        let stored = probe.inner.get(id).await.unwrap();
        assert!(stored.completed);
    }

    #[tokio::test]
    async fn undo_does_not_fade() {
        let probe = Probe::new();
        let mut board = board_over(probe.clone());
        fill_form(&mut board, "t", "d", "2026-02-01");
        board.submit().await.unwrap();
        let id = board.rows()[0].task.id;

        board.toggle(id).await.unwrap();
        // Undo straight away.
        board.toggle(id).await.unwrap();

        assert_eq!(board.rows().len(), 1);
        assert!(!board.rows()[0].is_fading());
        assert!(!board.rows()[0].task.completed);
    }

    #[tokio::test]
    async fn delete_removes_immediately_everywhere() {
        let probe = Probe::new();
        let mut board = board_over(probe.clone());
        fill_form(&mut board, "t", "d", "2026-02-01");
        board.submit().await.unwrap();
        let id = board.rows()[0].task.id;

        board.delete(id).await.unwrap();
        assert!(board.rows().is_empty());
        assert!(probe.inner.get(id).await.is_none());
    }

    #[tokio::test]
    async fn failed_toggle_leaves_the_mirror_unchanged() {
        let probe = Probe::new();
        let mut board = board_over(probe.clone());
        fill_form(&mut board, "t", "d", "2026-02-01");
        board.submit().await.unwrap();
        let id = board.rows()[0].task.id;

        probe.failing.store(true, Ordering::Relaxed);
        let err = board.toggle(id).await.unwrap_err();
        assert!(matches!(err, StoreError::RetriesExhausted { .. }));

        assert_eq!(board.rows().len(), 1);
        assert!(!board.rows()[0].task.completed);
        assert!(!board.rows()[0].is_fading());
    }
}
