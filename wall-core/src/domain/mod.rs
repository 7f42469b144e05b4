//! Core domain types
//!
//! This module contains the core domain structures shared by the API server
//! (which persists walls), the client, and the CLI (which renders the
//! delivery pipeline).

pub mod environment;
pub mod operation;
pub mod pipeline;
pub mod wall;
