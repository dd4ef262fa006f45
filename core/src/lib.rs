//! Scan engine for `lanprobe`: port probing, per-host scanning and the
//! coordinator that sweeps a whole /24.

pub mod network;
pub mod scanner;

pub use scanner::{ScanCoordinator, ScanEvent, ScanState, StartOutcome};
