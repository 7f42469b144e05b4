//! Virtual Wall Core
//!
//! Core types and abstractions for the Virtual Wall application.
//!
//! This crate contains:
//! - Domain types: walls, API operations, environments, pipeline topology
//! - DTOs: the request/response envelope and payloads shared by server and client
//! - The pipeline builder that turns an environment list into a topology

pub mod domain;
pub mod dto;
pub mod topology;
