//! Shared library modules providing error types, file utilities, path expansion, and telemetry initialization.

pub mod errors;
pub mod fs;
pub mod paths;
pub mod telemetry;
