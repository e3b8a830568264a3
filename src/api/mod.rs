//! The HTTP surface of the task store.
//!
//! Four routes over a shared [`TaskStore`]:
//!
//! | Route                   | Effect                              |
//! |-------------------------|-------------------------------------|
//! | `GET /api/tasks`        | list one page (`?page=`, `?limit=`) |
//! | `POST /api/tasks`       | create from `{title, description, dueDate}` |
//! | `PUT /api/tasks/:id`    | set completion from `{completed}`   |
//! | `DELETE /api/tasks/:id` | remove the task                     |
//!
//! [`router`] builds the routes; [`serve`] wraps them in the CORS and
//! request-logging middleware and runs the TCP server. Store failures map to
//! JSON error bodies with the status codes listed on [`error_response`].

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::context::Context;
use crate::middleware::{MiddlewareHandler, Next, RequestLogger, from_middleware};
use crate::router::Router;
use crate::security::CorsMiddleware;
use crate::server::{Server, ServerError};
use crate::store::{DEFAULT_LIMIT, DEFAULT_PAGE, StoreError, TaskStore};
use crate::{Response, StatusCode};

/// `POST /api/tasks` request body.
#[derive(Debug, Deserialize)]
struct CreateTask {
    title: String,
    description: String,
    #[serde(rename = "dueDate")]
    due_date: String,
}

/// `PUT /api/tasks/:id` request body: the completion state to store.
#[derive(Debug, Deserialize)]
struct ToggleTask {
    completed: bool,
}

/// Maps a store failure to its HTTP rendering.
///
/// `InvalidId` → 400, `NotFound` → 404, `RetriesExhausted` → 503, and the
/// remaining store failures → 500. The body is always `{"error": "..."}`.
fn error_response(err: &StoreError) -> Response {
    let status = match err {
        StoreError::InvalidId(_) => StatusCode::BadRequest,
        StoreError::NotFound(_) => StatusCode::NotFound,
        StoreError::RetriesExhausted { .. } => StatusCode::ServiceUnavailable,
        StoreError::Fetch(_) | StoreError::Write(_) | StoreError::Delete(_) => {
            StatusCode::InternalServerError
        }
    };
    Response::json(status, &json!({ "error": err.to_string() }))
}

/// Builds the task API router over the given store.
pub fn router(store: Arc<TaskStore>) -> Router {
    let mut router = Router::new();

    let list_store = Arc::clone(&store);
    router.get("/api/tasks", move |ctx: Context| {
        let store = Arc::clone(&list_store);
        async move {
            let page = query_usize(&ctx, "page").unwrap_or(DEFAULT_PAGE);
            let limit = query_usize(&ctx, "limit").unwrap_or(DEFAULT_LIMIT);
            match store.list(page, limit).await {
                Ok(tasks) => Response::json(StatusCode::Ok, &tasks),
                Err(err) => error_response(&err),
            }
        }
    });

    let create_store = Arc::clone(&store);
    router.post("/api/tasks", move |ctx: Context| {
        let store = Arc::clone(&create_store);
        async move {
            let body: CreateTask = match ctx.json() {
                Ok(body) => body,
                Err(e) => {
                    return Response::json(
                        StatusCode::BadRequest,
                        &json!({ "error": format!("invalid body: {e}") }),
                    );
                }
            };
            // The HTTP-shape counterpart of the board's required-field check.
            if body.title.is_empty() || body.description.is_empty() || body.due_date.is_empty() {
                return Response::json(
                    StatusCode::UnprocessableEntity,
                    &json!({ "error": "title, description, and dueDate must be non-empty" }),
                );
            }
            match store
                .create(body.title, body.description, body.due_date)
                .await
            {
                Ok(id) => Response::json(StatusCode::Created, &json!({ "_id": id })),
                Err(err) => error_response(&err),
            }
        }
    });

    let toggle_store = Arc::clone(&store);
    router.put("/api/tasks/:id", move |ctx: Context| {
        let store = Arc::clone(&toggle_store);
        async move {
            let body: ToggleTask = match ctx.json() {
                Ok(body) => body,
                Err(e) => {
                    return Response::json(
                        StatusCode::BadRequest,
                        &json!({ "error": format!("invalid body: {e}") }),
                    );
                }
            };
            let id = ctx.params().get("id").unwrap_or_default().to_owned();
            // toggle flips the current value, so the stored result is
            // `body.completed` exactly when "current" is its negation.
            match store.toggle_str(&id, !body.completed).await {
                Ok(modified) => Response::json(StatusCode::Ok, &json!({ "modified": modified })),
                Err(err) => error_response(&err),
            }
        }
    });

    let delete_store = Arc::clone(&store);
    router.delete("/api/tasks/:id", move |ctx: Context| {
        let store = Arc::clone(&delete_store);
        async move {
            let id = ctx.params().get("id").unwrap_or_default().to_owned();
            match store.delete_str(&id).await {
                Ok(()) => Response::new(StatusCode::NoContent),
                Err(err) => error_response(&err),
            }
        }
    });

    router
}

/// The full middleware stack: CORS, request logging, then route dispatch.
pub fn stack(store: Arc<TaskStore>) -> Vec<MiddlewareHandler> {
    let router = Arc::new(router(store));
    let dispatch: MiddlewareHandler = Arc::new(move |ctx: Context, _next: Next| {
        let router = Arc::clone(&router);
        Box::pin(async move { router.route(ctx.into_request()).await })
    });

    vec![
        from_middleware(Arc::new(CorsMiddleware::new())),
        from_middleware(Arc::new(RequestLogger)),
        dispatch,
    ]
}

/// Binds `addr` and serves the task API until the process terminates.
///
/// # Errors
///
/// Returns [`ServerError`] when the address cannot be bound or the listener
/// fails.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use taskboard::api;
/// use taskboard::store::{MemoryCollection, TaskStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), taskboard::server::ServerError> {
///     let store = Arc::new(TaskStore::new(Arc::new(MemoryCollection::new())));
///     api::serve("127.0.0.1:8080", store).await
/// }
/// ```
pub async fn serve(addr: impl AsRef<str>, store: Arc<TaskStore>) -> Result<(), ServerError> {
    let server = Server::bind(addr).await?;
    let stack = stack(store);
    server
        .run(move |request| {
            let stack = stack.clone();
            async move { Next::new(stack).run(Context::new(request)).await }
        })
        .await
}

fn query_usize(ctx: &Context, key: &str) -> Option<usize> {
    ctx.request().query_param(key)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Request;
    use crate::retry::RetryPolicy;
    use crate::store::MemoryCollection;
    use crate::task::{Task, TaskId};

    fn api() -> (Arc<MemoryCollection>, Router) {
        let collection = Arc::new(MemoryCollection::new());
        let store = TaskStore::new(collection.clone()).with_retry(RetryPolicy::immediate(3));
        (collection, router(Arc::new(store)))
    }

    fn raw_request(method: &str, path: &str, body: &str) -> Request {
        let raw = format!(
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        Request::parse(raw.as_bytes()).unwrap().0
    }

    fn body_json(res: &Response) -> serde_json::Value {
        serde_json::from_slice(res.body_ref()).unwrap()
    }

    async fn create(router: &Router, title: &str) -> TaskId {
        let body = format!(
            r#"{{"title":"{title}","description":"d","dueDate":"2026-03-01"}}"#
        );
        let res = router.route(raw_request("POST", "/api/tasks", &body)).await;
        assert_eq!(res.status(), StatusCode::Created);
        let id = body_json(&res)["_id"].as_str().unwrap().to_owned();
        TaskId::parse(&id).unwrap()
    }

    #[tokio::test]
    async fn list_starts_empty() {
        let (_, router) = api();
        let res = router.route(raw_request("GET", "/api/tasks", "")).await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert_eq!(body_json(&res), json!([]));
    }

    #[tokio::test]
    async fn create_then_list_round_trips_fields() {
        let (_, router) = api();
        create(&router, "ship release").await;

        let res = router.route(raw_request("GET", "/api/tasks", "")).await;
        let tasks: Vec<Task> = serde_json::from_slice(res.body_ref()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "ship release");
        assert_eq!(tasks[0].due_date, "2026-03-01");
        assert!(!tasks[0].completed);
    }

    #[tokio::test]
    async fn list_respects_pagination_params() {
        let (_, router) = api();
        for i in 0..12 {
            create(&router, &format!("task {i}")).await;
        }

        let res = router
            .route(raw_request("GET", "/api/tasks?page=2&limit=10", ""))
            .await;
        let tasks: Vec<Task> = serde_json::from_slice(res.body_ref()).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "task 10");
    }

    #[tokio::test]
    async fn create_rejects_empty_fields_without_storing() {
        let (collection, router) = api();
        let res = router
            .route(raw_request(
                "POST",
                "/api/tasks",
                r#"{"title":"x","description":"","dueDate":"2026-03-01"}"#,
            ))
            .await;
        assert_eq!(res.status(), StatusCode::UnprocessableEntity);
        assert!(collection.is_empty().await);
    }

    #[tokio::test]
    async fn create_rejects_malformed_json() {
        let (collection, router) = api();
        let res = router
            .route(raw_request("POST", "/api/tasks", "not json"))
            .await;
        assert_eq!(res.status(), StatusCode::BadRequest);
        assert!(collection.is_empty().await);
    }

    #[tokio::test]
    async fn put_sets_and_clears_completion() {
        let (collection, router) = api();
        let id = create(&router, "t").await;

        let res = router
            .route(raw_request(
                "PUT",
                &format!("/api/tasks/{id}"),
                r#"{"completed":true}"#,
            ))
            .await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert_eq!(body_json(&res), json!({ "modified": true }));
        assert!(collection.get(id).await.unwrap().completed);

        let res = router
            .route(raw_request(
                "PUT",
                &format!("/api/tasks/{id}"),
                r#"{"completed":false}"#,
            ))
            .await;
        assert_eq!(body_json(&res), json!({ "modified": true }));
        assert!(!collection.get(id).await.unwrap().completed);
    }

    #[tokio::test]
    async fn put_unknown_id_reports_unmodified() {
        let (_, router) = api();
        let ghost = TaskId::generate();
        let res = router
            .route(raw_request(
                "PUT",
                &format!("/api/tasks/{ghost}"),
                r#"{"completed":true}"#,
            ))
            .await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert_eq!(body_json(&res), json!({ "modified": false }));
    }

    #[tokio::test]
    async fn put_malformed_id_is_bad_request() {
        let (_, router) = api();
        let res = router
            .route(raw_request(
                "PUT",
                "/api/tasks/garbage",
                r#"{"completed":true}"#,
            ))
            .await;
        assert_eq!(res.status(), StatusCode::BadRequest);
    }

    #[tokio::test]
    async fn delete_removes_and_unknown_delete_is_404() {
        let (collection, router) = api();
        let id = create(&router, "t").await;

        let res = router
            .route(raw_request("DELETE", &format!("/api/tasks/{id}"), ""))
            .await;
        assert_eq!(res.status(), StatusCode::NoContent);
        assert!(collection.is_empty().await);

        let res = router
            .route(raw_request("DELETE", &format!("/api/tasks/{id}"), ""))
            .await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (_, router) = api();
        let res = router.route(raw_request("GET", "/api/lists", "")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn full_stack_serves_cors_preflight() {
        let collection = Arc::new(MemoryCollection::new());
        let store = Arc::new(TaskStore::new(collection));
        let stack = stack(store);

        let raw = "OPTIONS /api/tasks HTTP/1.1\r\nHost: x\r\nOrigin: http://localhost:3000\r\n\r\n";
        let request = Request::parse(raw.as_bytes()).unwrap().0;
        let res = Next::new(stack).run(Context::new(request)).await;
        assert_eq!(res.status(), StatusCode::NoContent);
    }
}
