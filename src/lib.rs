// THEORY:
// This file is the main entry point for the `sentinel_vision` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the
// public API exposed to external consumers (camera hosts, streaming servers).
//
// The primary goal is to export the `MotionPipeline` and its associated data
// structures (`PipelineConfig`, `MotionSettings`, `CycleReport`, the alert
// seam) as the clean, high-level interface for the entire engine. The internal
// modules (`core_modules`) stay encapsulated behind it; hosts that need to
// drive the engine from an async capture loop additionally get the `stream`
// harness.

pub mod core_modules;
pub mod error;
pub mod pipeline;
pub mod stream;

pub use crate::core_modules::alert::{AlertSink, SinkError, ThreatAlert};
pub use crate::core_modules::frame::Frame;
pub use crate::core_modules::region::Region;
pub use crate::core_modules::tracker::{TrackedObject, Tracker, TrackerUpdate};
pub use crate::error::EngineError;
pub use crate::pipeline::{CycleReport, MotionPipeline, MotionSettings, PipelineConfig};
pub use crate::stream::{FrameSupplier, StreamRunner, SupplyError};
