//! Generation service: cache-key derivation, output-cache short-circuit, and the
//! render -> save -> publish pipeline.

pub mod orchestrator;
pub mod preview;
pub mod stats;
