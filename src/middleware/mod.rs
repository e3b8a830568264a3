//! Middleware pipeline — composable before/after request handler logic.
//!
//! An ordered stack of layers wraps the route dispatch: each middleware
//! receives the request [`Context`] and a [`Next`] cursor into the remaining
//! chain, and may pass through, short-circuit with its own [`Response`], or
//! decorate the downstream response. The service composes CORS, the request
//! logger, and finally the router itself as the terminal layer.

use std::{pin::Pin, sync::Arc};

use tokio::time::Instant;

use crate::{Response, context::Context};

/// A type-erased, reference-counted middleware function.
///
/// Every entry in the stack is stored as a `MiddlewareHandler`; the [`Arc`]
/// makes handlers cheap to clone so [`Next`] can advance through the chain
/// without copying closures.
pub type MiddlewareHandler = Arc<
    dyn Fn(Context, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static,
>;

/// A cursor into the remaining middleware chain for a single request.
///
/// Passed to each middleware's [`Middleware::handle`]; calling
/// [`Next::run`] advances by one layer. `Next` is consumed by `run`, so a
/// middleware cannot invoke the rest of the chain twice.
pub struct Next {
    middlewares: Vec<MiddlewareHandler>,
    // Which middleware to invoke on the next `run` call.
    index: usize,
}

impl Next {
    /// Creates a cursor positioned at the start of the given stack.
    pub fn new(middlewares: Vec<MiddlewareHandler>) -> Self {
        Self {
            middlewares,
            index: 0,
        }
    }

    /// Invokes the next layer and returns its response.
    ///
    /// If the chain is exhausted without any layer producing a response, a
    /// `500 Internal Server Error` is returned as a safe fallback.
    pub async fn run(mut self, ctx: Context) -> Response {
        if self.index < self.middlewares.len() {
            let handler = self.middlewares[self.index].clone();
            self.index += 1;
            handler(ctx, self).await
        } else {
            Response::new(crate::StatusCode::InternalServerError)
                .body("No response generated by middleware pipeline")
        }
    }
}

/// Converts a [`Middleware`] implementation into a [`MiddlewareHandler`].
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

/// The core trait for all middleware.
///
/// Implementations must be `Send + Sync` (the stack is shared across Tokio
/// tasks) and return a pinned `Send` future.
pub trait Middleware: Send + Sync {
    /// Handles the request and optionally delegates to the next layer.
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

/// Built-in middleware that logs each request's method, path, status, and
/// duration.
///
/// Emits one `tracing::info!` line after the downstream handler completes:
///
/// ```text
/// PUT /api/tasks/42 - 200 (312µs)
/// ```
///
/// Never short-circuits; the downstream response passes through unmodified.
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.request().method().as_str().to_string();
            let path = ctx.request().path().to_string();

            let response = next.run(ctx).await;

            let duration = start.elapsed();
            let status = response.status().as_u16();

            tracing::info!("{} {} - {} ({:?})", method, path, status, duration);

            response
        })
    }
}
