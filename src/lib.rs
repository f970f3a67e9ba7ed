//! Content layer of the agency marketing site.
//!
//! [`Gateway`] reads collections from the CMS and falls back to static
//! content on any failure; [`proxy`] relays browser requests to the CMS with
//! permissive CORS headers.

pub mod config;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod proxy;
pub mod source;
pub mod types;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::config::GatewayConfig;
    pub use crate::gateway::Gateway;
    pub use crate::source::{ContentSource, RestSource};
    pub use crate::types::{Collection, ContentItem, ErrorBody, Rendered, SiteContent};
}

pub use config::GatewayConfig;
pub use error::{FetchError, PathError, UnknownCollection};
pub use gateway::Gateway;
pub use proxy::{RelayError, RelayState};
pub use source::{ContentSource, JsonResponse, RestSource};
pub use types::{Collection, ContentItem, ErrorBody, Rendered, SiteContent};
