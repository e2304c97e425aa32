//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `ResourceKind`: the independent ID spaces walked by the crawler
//! - `SubresourceKind`: paginated content nested under a resource
//! - `RetryState`: per-unit transient failure counter

mod resource_kind;
mod retry_state;

pub use resource_kind::{ResourceKind, SubresourceKind};
pub use retry_state::RetryState;
