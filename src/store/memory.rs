//! In-memory document collection.
//!
//! Keeps task documents in insertion order behind a [`tokio::sync::RwLock`],
//! giving the same per-document atomicity guarantees the store layer expects
//! from a real engine. Used by the demo and throughout the test suite.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Collection, CollectionError};
use crate::task::{Task, TaskId};

/// Insertion-ordered, in-memory [`Collection`].
#[derive(Default)]
pub struct MemoryCollection {
    tasks: RwLock<Vec<Task>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches one document by id, mainly for inspection in tests and demos.
    pub async fn get(&self, id: TaskId) -> Option<Task> {
        self.tasks.read().await.iter().find(|t| t.id == id).cloned()
    }

    /// Number of documents currently stored.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    async fn find(&self, skip: usize, limit: usize) -> Result<Vec<Task>, CollectionError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().skip(skip).take(limit).cloned().collect())
    }

    async fn insert(&self, task: Task) -> Result<(), CollectionError> {
        self.tasks.write().await.push(task);
        Ok(())
    }

    async fn set_completed(&self, id: TaskId, completed: bool) -> Result<u64, CollectionError> {
        let mut tasks = self.tasks.write().await;
        match tasks.iter_mut().find(|t| t.id == id) {
            Some(task) if task.completed != completed => {
                task.completed = completed;
                Ok(1)
            }
            // Unknown id, or a write that changes nothing: modified count 0.
            _ => Ok(0),
        }
    }

    async fn remove(&self, id: TaskId) -> Result<u64, CollectionError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        Ok((before - tasks.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(title: &str) -> Task {
        Task::new(TaskId::generate(), title, "desc", "2026-01-01")
    }

    #[tokio::test]
    async fn find_preserves_insertion_order() {
        let col = MemoryCollection::new();
        for name in ["one", "two", "three"] {
            col.insert(task(name)).await.unwrap();
        }

        let all = col.find(0, 10).await.unwrap();
        let titles: Vec<_> = all.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn find_applies_skip_and_take() {
        let col = MemoryCollection::new();
        for i in 0..5 {
            col.insert(task(&i.to_string())).await.unwrap();
        }

        let window = col.find(2, 2).await.unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].title, "2");
        assert_eq!(window[1].title, "3");

        assert!(col.find(5, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_completed_counts_only_real_changes() {
        let col = MemoryCollection::new();
        let t = task("a");
        let id = t.id;
        col.insert(t).await.unwrap();

        assert_eq!(col.set_completed(id, true).await.unwrap(), 1);
        // Same value again: nothing modified.
        assert_eq!(col.set_completed(id, true).await.unwrap(), 0);
        assert_eq!(col.set_completed(TaskId::generate(), true).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn remove_reports_deleted_count() {
        let col = MemoryCollection::new();
        let t = task("a");
        let id = t.id;
        col.insert(t).await.unwrap();

        assert_eq!(col.remove(id).await.unwrap(), 1);
        assert_eq!(col.remove(id).await.unwrap(), 0);
        assert!(col.is_empty().await);
    }
}
