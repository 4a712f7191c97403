//! Barista API Library
//!
//! HTTP handlers, the request-observability middleware chain and application setup.

mod api_doc;
mod handlers;
mod store;

pub mod error;
pub mod middleware;
pub mod setup;
pub mod state;

pub use error::{ApiError, ValidatedJson};
pub use middleware::{apply_pipeline, RequestContext};
pub use state::AppState;
