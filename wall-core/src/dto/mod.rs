//! Data Transfer Objects
//!
//! Request/response envelopes and payloads exchanged between the API server
//! and its callers. DTOs are lightweight and carry no storage concerns.

pub mod api;
pub mod wall;
