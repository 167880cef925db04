//! On-disk and in-memory caching.
//!
//! [`durable`] is a small key/value seam over `cacache`; [`image_cache`]
//! layers the resolved-image map on top of it.

pub mod durable;
pub mod image_cache;

pub use durable::*;
pub use image_cache::*;
