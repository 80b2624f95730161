//! Core data types for mvn2get.
//!
//! This crate defines the configuration value the rest of the tool consumes,
//! artifact coordinates and their repository URL layout, the problem ledger,
//! and the event sink through which the resolver reports progress.

pub mod config;
pub mod coordinate;
pub mod events;
pub mod problem;
