//! Infrastructure layer: concrete implementations of the domain traits
//! and the wire DTOs.

pub mod auth;
pub mod connection_registry;
pub mod dto;
pub mod problem;
pub mod repository;
