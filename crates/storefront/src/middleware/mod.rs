//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session serialization (one request per session at a time)
//! 5. Session layer (tower-sessions with `PostgreSQL` store, signed cookie)

pub mod request_id;
pub mod session;

pub use request_id::request_id_middleware;
pub use session::{SessionLocks, create_session_layer, serialize_sessions};
