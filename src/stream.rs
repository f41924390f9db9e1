// THEORY:
// The `stream` module is the host harness around the synchronous engine. The
// engine itself performs no I/O and must be driven from a single logical
// thread of control; this module makes the recommended hosting shape concrete:
// a capture task pulls frames from the supplier on a blocking thread, a
// channel of capacity one provides exactly one frame of readahead, and a
// single consumer loop owns the pipeline and runs every cycle serially.
// Transient capture gaps become frameless `tick` cycles so that staleness
// pruning and escalation keep advancing; disconnection ends the run and hands
// the pipeline (with its tracker state) back to the caller.

use crate::pipeline::MotionPipeline;
use crate::core_modules::frame::Frame;
use thiserror::Error;
use tokio::sync::mpsc;

/// Failures the frame supplier may report.
#[derive(Debug, Error)]
pub enum SupplyError {
    /// No frame is available right now; the cycle is skipped, not aborted.
    #[error("frame temporarily unavailable")]
    Transient,
    /// The source is gone; the stream run ends.
    #[error("frame source disconnected")]
    Disconnected,
}

/// Pull source of frames, typically wrapping a camera.
pub trait FrameSupplier: Send {
    fn read_next_frame(&mut self) -> Result<Frame, SupplyError>;
}

enum CaptureEvent {
    Frame(Frame),
    Gap,
}

/// Drives a `MotionPipeline` from a `FrameSupplier` until disconnection.
pub struct StreamRunner {
    pipeline: MotionPipeline,
}

impl StreamRunner {
    pub fn new(pipeline: MotionPipeline) -> Self {
        Self { pipeline }
    }

    /// Runs the capture/process loop to completion, returning the pipeline so
    /// the host can inspect or resume its tracked state.
    pub async fn run<S: FrameSupplier + 'static>(mut self, supplier: S) -> MotionPipeline {
        // Capacity 1: at most one frame of readahead between capture and
        // processing.
        let (events, mut cycles) = mpsc::channel::<CaptureEvent>(1);

        let capture = tokio::task::spawn_blocking(move || {
            let mut supplier = supplier;
            loop {
                let event = match supplier.read_next_frame() {
                    Ok(frame) => CaptureEvent::Frame(frame),
                    Err(SupplyError::Transient) => CaptureEvent::Gap,
                    Err(SupplyError::Disconnected) => {
                        tracing::info!("frame source disconnected; capture ending");
                        break;
                    }
                };
                if events.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        while let Some(event) = cycles.recv().await {
            let result = match event {
                CaptureEvent::Frame(frame) => self.pipeline.process_frame(frame),
                CaptureEvent::Gap => self.pipeline.tick(),
            };
            if let Err(error) = result {
                tracing::warn!(%error, "cycle aborted");
            }
        }

        let _ = capture.await;
        self.pipeline
    }
}
