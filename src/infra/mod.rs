//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod segments;
pub mod telemetry;
