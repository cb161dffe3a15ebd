//! HTTP surface of the trust layer: token verification endpoints and the
//! session-protected student routes.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
