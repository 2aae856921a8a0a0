//! Activity certificate tracking with a capped activity-points scoring engine.
//!
//! Activity records are owned by the CRUD layer in [`activities`]; the [`scoring`] module
//! matches each record against a declarative rule table, computes raw points, clamps them
//! to per-sub-type and per-category caps, and sums the result into a student total.

pub mod activities;
pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;
