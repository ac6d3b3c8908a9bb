//! # twinpack-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the twinpack workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
