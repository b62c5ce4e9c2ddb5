//! Library crate root for the `machine` profile catalogue tool.

#[path = "lib/mod.rs"]
pub mod lib_mod;
pub use lib_mod as lib;
pub mod catalogue;
pub mod cli;
pub mod ops;
pub mod provider;
pub mod settings;
