//! Boots the task API on localhost with a seeded in-memory collection.
//!
//! ```sh
//! cargo run --example serve
//! curl http://127.0.0.1:8080/api/tasks
//! ```

use std::sync::Arc;

use taskboard::api;
use taskboard::store::{Collection, MemoryCollection, TaskStore};
use taskboard::task::{Task, TaskId};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard=debug".into()),
        )
        .init();

    let collection = Arc::new(MemoryCollection::new());
    for (title, description, due) in [
        ("water the plants", "kitchen and balcony", "2026-08-10"),
        ("renew passport", "book the appointment first", "2026-09-30"),
    ] {
        collection
            .insert(Task::new(TaskId::generate(), title, description, due))
            .await?;
    }

    let store = Arc::new(TaskStore::new(collection));
    println!("Serving on http://127.0.0.1:8080");
    api::serve("127.0.0.1:8080", store).await?;
    Ok(())
}
