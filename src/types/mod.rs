// Tabfix shared type definitions
// Each submodule defines types used across the crate.

pub mod cleanup;
pub mod config;
pub mod errors;
pub mod session;
pub mod settings;
pub mod tab;
