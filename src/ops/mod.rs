//! Provisioning operations built on the catalogue and a provider backend.

pub mod launch;
pub mod sync;

pub use launch::{LaunchParams, LaunchResult};
pub use sync::{SyncOutcome, SyncRequest};
