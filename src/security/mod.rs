//! HTTP security middleware.
//!
//! Currently one concern: [`CorsMiddleware`], which lets the browser-hosted
//! task view call this API from another origin.

pub mod middleware;

pub use middleware::CorsMiddleware;
