//! Tabfix: browser tab lifecycle helper.
//!
//! Saves and restores tab sessions, closes duplicate tabs and enforces focus
//! mode on top of an abstract tab provider and key-value store.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod rpc_handler;
pub mod services;
pub mod types;
