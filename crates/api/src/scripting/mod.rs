//! Script execution service.
//!
//! The [`ScriptCoordinator`](coordinator::ScriptCoordinator) ties the core
//! runtimes and runner to the database repositories, providing a single
//! entry point for running stored script tasks.

pub mod coordinator;
