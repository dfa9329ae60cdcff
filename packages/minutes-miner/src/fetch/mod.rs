//! Fetch engine and its supporting pieces.
//!
//! - `FetchEngine` - retry/backoff/header rotation over any `Transport`
//! - `DocumentCache` - idempotent on-disk cache for downloaded documents
//! - `JitterDelay` / `NoDelay` - delay strategies
//! - `ReqwestTransport` - the production transport

pub mod cache;
pub mod delay;
pub mod engine;
pub mod http;
pub mod session;

pub use cache::DocumentCache;
pub use delay::{JitterDelay, NoDelay};
pub use engine::{FetchEngine, FetchTarget};
pub use http::ReqwestTransport;
pub use session::Session;
