//! Shared data model and host-side helpers for `lanprobe`.
//!
//! Everything here is free of async runtime concerns: the scan engine in
//! `lanprobe-core` builds on these types, and the CLI renders them.

pub mod config;
pub mod error;
pub mod network;
pub mod utils;

pub use error::ScanError;
