//! CORS middleware — origin validation, preflight handling, and
//! `Access-Control-*` header injection.

use std::pin::Pin;

use crate::{
    Response,
    context::Context,
    middleware::{Middleware, Next},
};

/// Cross-Origin Resource Sharing middleware.
///
/// Behavior:
///
/// - No `Origin` header, or an origin outside the allow-list: the request
///   passes through unmodified.
/// - `OPTIONS` preflight from an allowed origin: short-circuited with
///   `204 No Content` plus the `Access-Control-*` headers; the downstream
///   handler is not called.
/// - Any other request from an allowed origin: handled normally, with the
///   CORS headers appended to the response. `Vary: Origin` is added when a
///   specific (non-wildcard) origin is echoed back.
///
/// Defaults allow every origin and exactly the methods and headers the task
/// API serves.
///
/// # Examples
///
/// ```
/// use taskboard::security::CorsMiddleware;
///
/// let cors = CorsMiddleware::new().allow_origin("http://localhost:3000");
/// ```
pub struct CorsMiddleware {
    allowed_origins: Vec<String>,
    allowed_methods: Vec<String>,
    allowed_headers: Vec<String>,
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl CorsMiddleware {
    /// Permissive defaults: all origins, the four API methods, JSON bodies.
    pub fn new() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE"]
                .map(str::to_string)
                .to_vec(),
            allowed_headers: vec!["Content-Type".to_string()],
        }
    }

    /// Adds an allowed origin. Pass `"*"` to permit all origins.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origins.push(origin.into());
        self
    }

    /// Adds an allowed HTTP method, sent verbatim in
    /// `Access-Control-Allow-Methods`.
    #[must_use]
    pub fn allow_method(mut self, method: impl Into<String>) -> Self {
        self.allowed_methods.push(method.into());
        self
    }

    /// Adds an allowed request header, sent verbatim in
    /// `Access-Control-Allow-Headers`.
    #[must_use]
    pub fn allow_header(mut self, header: impl Into<String>) -> Self {
        self.allowed_headers.push(header.into());
        self
    }
}

impl Middleware for CorsMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        let allowed_origins = self.allowed_origins.clone();
        let allowed_methods = self.allowed_methods.clone();
        let allowed_headers = self.allowed_headers.clone();

        Box::pin(async move {
            let request_origin = ctx.request().headers().get("origin").map(str::to_owned);
            let is_preflight = ctx.request().method() == &crate::Method::Options;
            let Some(origin) = request_origin else {
                return next.run(ctx).await;
            };

            let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
                "*".to_owned()
            } else if allowed_origins.contains(&origin) {
                origin.clone()
            } else {
                return next.run(ctx).await;
            };

            let methods_str = allowed_methods.join(", ");
            let headers_str = allowed_headers.join(", ");
            let is_wildcard = allow_origin == "*";

            if is_preflight {
                let mut resp = Response::new(crate::StatusCode::NoContent)
                    .header("Access-Control-Allow-Origin", &allow_origin)
                    .header("Access-Control-Allow-Methods", &methods_str)
                    .header("Access-Control-Allow-Headers", &headers_str)
                    .header("Access-Control-Max-Age", "3600");
                if !is_wildcard {
                    resp.add_header("Vary", "Origin");
                }
                return resp;
            }

            let mut resp = next.run(ctx).await;
            resp.add_header("Access-Control-Allow-Origin", &allow_origin);
            resp.add_header("Access-Control-Allow-Methods", &methods_str);
            resp.add_header("Access-Control-Allow-Headers", &headers_str);
            if !is_wildcard {
                resp.add_header("Vary", "Origin");
            }
            resp
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::middleware::{MiddlewareHandler, from_middleware};
    use crate::{Request, StatusCode};

    fn ctx(raw: &str) -> Context {
        Context::new(Request::parse(raw.as_bytes()).unwrap().0)
    }

    fn chain(cors: CorsMiddleware) -> Vec<MiddlewareHandler> {
        let terminal: MiddlewareHandler = Arc::new(|_ctx, _next| {
            Box::pin(async { Response::new(StatusCode::Ok).body("handled") })
        });
        vec![from_middleware(Arc::new(cors)), terminal]
    }

    fn rendered(res: Response) -> String {
        String::from_utf8(res.into_bytes().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn no_origin_passes_through_untouched() {
        let res = Next::new(chain(CorsMiddleware::new()))
            .run(ctx("GET /api/tasks HTTP/1.1\r\nHost: x\r\n\r\n"))
            .await;
        let s = rendered(res);
        assert!(!s.contains("Access-Control-Allow-Origin"));
        assert!(s.ends_with("handled"));
    }

    #[tokio::test]
    async fn preflight_short_circuits_with_204() {
        let res = Next::new(chain(CorsMiddleware::new()))
            .run(ctx(
                "OPTIONS /api/tasks HTTP/1.1\r\nHost: x\r\nOrigin: http://localhost:3000\r\n\r\n",
            ))
            .await;
        assert_eq!(res.status(), StatusCode::NoContent);
        let s = rendered(res);
        assert!(s.contains("Access-Control-Allow-Origin: *"));
        assert!(s.contains("Access-Control-Allow-Methods: GET, POST, PUT, DELETE"));
        // The handler never ran.
        assert!(!s.contains("handled"));
    }

    #[tokio::test]
    async fn allowed_origin_decorates_the_response() {
        let cors = CorsMiddleware {
            allowed_origins: vec!["http://localhost:3000".into()],
            ..CorsMiddleware::new()
        };
        let res = Next::new(chain(cors))
            .run(ctx(
                "GET /api/tasks HTTP/1.1\r\nHost: x\r\nOrigin: http://localhost:3000\r\n\r\n",
            ))
            .await;

        let s = rendered(res);
        assert!(s.contains("Access-Control-Allow-Origin: http://localhost:3000"));
        assert!(s.contains("Vary: Origin"));
        assert!(s.ends_with("handled"));
    }

    #[tokio::test]
    async fn rejected_origin_passes_through_unchanged() {
        let cors = CorsMiddleware {
            allowed_origins: vec!["http://localhost:3000".into()],
            ..CorsMiddleware::new()
        };
        let res = Next::new(chain(cors))
            .run(ctx(
                "GET /api/tasks HTTP/1.1\r\nHost: x\r\nOrigin: http://evil.example\r\n\r\n",
            ))
            .await;
        let s = rendered(res);
        assert!(!s.contains("Access-Control-Allow-Origin"));
        assert!(s.ends_with("handled"));
    }
}
