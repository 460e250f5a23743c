//! Score and maturity-stage derivation for the Digital Development Compass.
//!
//! Raw per-indicator tables are loaded into a [`pipeline::PipelineInput`],
//! turned into per-country score trees by [`pipeline::build`] and written as
//! the dashboard's bulk JSON document plus a small metadata module.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod queries;
pub mod scoring;
pub mod telemetry;
