//! # essa
//!
//! The ESSA application: CLI over a project snapshot file and an HTTP API
//! over an in-memory workspace, both driving [`essa_core`].

pub mod api;
pub mod cli;
pub mod config;
