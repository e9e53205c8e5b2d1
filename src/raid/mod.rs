//! RAID - attack simulation engine.
//!
//! Executes a simulated attack vector against a snapshot. Raids against the
//! same target are serialized through a keyed lane; high-severity vectors can
//! be gated behind an injected asynchronous approval handler with a timeout.
//! Simulations are deterministic functions of snapshot fields; nothing real
//! is ever touched.

mod engine;
mod types;
pub mod vectors;

pub use engine::RaidEngine;
pub use types::{
    ApprovalGate, ApprovalHandler, ApprovalRequest, ApprovalResponse, BlastRadius, RaidOptions,
    RaidResult, TimelineStep, VectorKind,
};
