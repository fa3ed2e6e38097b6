//! Input/output helpers for exchange telemetry.

pub mod export;
