//! Service Module
//!
//! Business logic layer for the API server.
//! Services sit between the dispatch layer and the wall store.

pub mod wall;

// Re-export for convenience
pub use wall as wall_service;
