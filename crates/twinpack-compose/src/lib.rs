//! # twinpack-compose
//!
//! Build graph compositor for the dual-process app target, where the
//! service process runs application logic and the view process renders.
//!
//! Handles:
//! - **Target**: Resolution of host options into a validated target.
//! - **Provide**: Free-identifier bindings for generated code.
//! - **Rules**: The ordered module transformation pipeline.
//! - **Assets**: Never-inline emission rules for binary assets.
//! - **Cache**: Per-stage cache directories and identifiers.
//! - **Patch**: Idempotent mutation passes over host graphs.
//! - **Composer**: Fresh composition and host graph mutation.

pub mod assets;
pub mod boot;
pub mod cache;
pub mod composer;
pub mod graph;
pub mod patch;
pub mod provide;
pub mod rules;
pub mod target;
