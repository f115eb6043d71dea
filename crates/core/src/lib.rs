//! Fleetdesk domain logic.
//!
//! Everything here is free of database access so it can be unit tested in
//! isolation: id and timestamp aliases, the shared error type, pagination
//! math, input validation, and the script runtime (materializer + runner).

pub mod error;
pub mod pagination;
pub mod script_types;
pub mod scripting;
pub mod types;
pub mod validation;
pub mod vehicle;
