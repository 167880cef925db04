//! Storage infrastructure shared by the services.

pub mod cache;
