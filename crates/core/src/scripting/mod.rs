//! Script execution domain logic.
//!
//! A [`RuntimeRegistry`](registry::RuntimeRegistry) maps each script kind to
//! its runtime; [`materializer`] writes the rendered script into a private
//! workspace and [`runner`] executes it with a timeout. Nothing here touches
//! the database, so the whole pipeline is testable in isolation.

pub mod executor;
pub mod materializer;
pub mod python;
pub mod registry;
pub mod runner;
pub mod shell;
pub mod status;
pub mod subprocess;
