//! The task document model and its identifier type.
//!
//! A [`Task`] is the sole persisted entity: one document per task in a single
//! collection, with the wire field names (`_id`, `dueDate`) the rest of the
//! stack expects. [`TaskId`] is assigned by the store at creation and is the
//! only way an id enters the system from the outside — incoming strings must
//! pass [`TaskId::parse`] before they reach the collection layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error returned when a string cannot be parsed into a [`TaskId`].
///
/// Raised before any collection call is made, so a malformed id from a URL or
/// form field never turns into a low-level driver error.
#[derive(Debug, Error)]
#[error("malformed task id {input:?}")]
pub struct IdParseError {
    /// The rejected input string.
    pub input: String,
    #[source]
    source: uuid::Error,
}

/// Opaque unique task identifier, assigned by the store at creation.
///
/// Backed by a timestamp-prefixed UUID (v7) and rendered as a string for
/// transport.
///
/// # Examples
///
/// ```
/// use taskboard::task::TaskId;
///
/// let id = TaskId::generate();
/// let rendered = id.to_string();
/// assert_eq!(TaskId::parse(&rendered).unwrap(), id);
/// assert!(TaskId::parse("not-an-id").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generates a fresh, time-ordered id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses a transport-form id string, validating it before use.
    ///
    /// # Errors
    ///
    /// Returns [`IdParseError`] when `input` is not a well-formed id. Callers
    /// must treat this as a client error, not a store failure.
    pub fn parse(input: &str) -> Result<Self, IdParseError> {
        Uuid::from_str(input).map(Self).map_err(|source| IdParseError {
            input: input.to_owned(),
            source,
        })
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A unit of work: title, description, due date, and a completion flag.
///
/// `completed` is the only field that changes after creation; it defaults to
/// `false` and is flipped by the store's toggle operation. The remaining
/// fields are immutable once the document exists, and the board guarantees
/// they are never empty at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier, `_id` on the wire.
    #[serde(rename = "_id")]
    pub id: TaskId,
    pub title: String,
    pub description: String,
    /// Due date carried as a string, exactly as submitted.
    #[serde(rename = "dueDate")]
    pub due_date: String,
    pub completed: bool,
}

impl Task {
    /// Builds a new, not-yet-completed task document.
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            due_date: due_date.into(),
            completed: false,
        }
    }
}
