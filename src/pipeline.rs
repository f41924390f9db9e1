// THEORY:
// The `pipeline` module is the final, top-level API for the entire engine.
// It encapsulates the full stack - segmentation, consolidation, identity
// tracking, escalation, alert dispatch - into a single interface: one frame
// in, one `CycleReport` out. It also owns the two pieces of cross-cycle state
// that belong to no single component: the retained previous frame that the
// segmenter differences against, and the live settings that may be retuned
// mid-stream without discarding tracked objects.

use crate::core_modules::alert::{AlertDispatcher, AlertSink};
use crate::core_modules::consolidator::consolidator;
use crate::core_modules::escalation::EscalationEngine;
use crate::core_modules::frame::Frame;
use crate::core_modules::segmenter::Segmenter;
use crate::core_modules::tracker::Tracker;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// Re-export key data structures for the public API.
pub use crate::core_modules::alert::ThreatAlert;
pub use crate::core_modules::region::Region;
pub use crate::core_modules::tracker::TrackedObject;

/// Intensity difference at which a changed pixel counts as motion.
const BINARIZATION_THRESHOLD: u8 = 105;
/// Base matching distance in pixels, scaled by candidate width at match time.
const MATCH_DISTANCE_PX: u32 = 125;

/// Live-tunable engine settings, as supplied by the settings collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionSettings {
    /// Minimum pixel area a change component must exceed to be emitted.
    pub sensitivity: u32,
    /// Seconds of continuous presence per threat-level increment.
    pub escalation_interval_seconds: u64,
    /// Highest threat level an object may hold before breaching.
    pub maximum_threat_level: u32,
    /// Seconds of absence after which a tracked object is forgotten.
    pub deregistration_time_seconds: u64,
    /// Radius within which nearby change regions merge into one detection.
    pub merge_distance_pixels: u32,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            sensitivity: 40,
            escalation_interval_seconds: 5,
            maximum_threat_level: 3,
            deregistration_time_seconds: 4,
            merge_distance_pixels: 100,
        }
    }
}

impl MotionSettings {
    fn escalation_interval(&self) -> Duration {
        Duration::from_secs(self.escalation_interval_seconds)
    }

    fn deregistration_time(&self) -> Duration {
        Duration::from_secs(self.deregistration_time_seconds)
    }
}

/// Configuration for the MotionPipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub image_width: u32,
    pub image_height: u32,
    pub settings: MotionSettings,
}

/// The primary output of one processing cycle, consumed by the rendering
/// collaborator.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Every surviving tracked object, in ascending id order. A detection-free
    /// cycle still yields the stable current set.
    pub objects: Vec<TrackedObject>,
    /// Objects that crossed the threat ceiling this cycle. Already dispatched
    /// to the alert sink, if one is registered.
    pub breaches: Vec<TrackedObject>,
}

/// The main, top-level struct for the motion engine.
pub struct MotionPipeline {
    config: PipelineConfig,
    segmenter: Segmenter,
    tracker: Tracker,
    prev_frame: Option<Frame>,
    dispatcher: Option<AlertDispatcher>,
}

impl MotionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let settings = &config.settings;
        let segmenter = Segmenter::new(settings.sensitivity, BINARIZATION_THRESHOLD);
        let tracker = Tracker::new(
            MATCH_DISTANCE_PX,
            settings.deregistration_time(),
            EscalationEngine::new(
                settings.escalation_interval(),
                settings.maximum_threat_level,
            ),
        );
        Self {
            config,
            segmenter,
            tracker,
            prev_frame: None,
            dispatcher: None,
        }
    }

    /// Registers the alerting collaborator. Without one, breaches are still
    /// reported in the `CycleReport` but nothing is dispatched.
    pub fn with_alert_sink(mut self, sink: Box<dyn AlertSink>) -> Self {
        self.dispatcher = Some(AlertDispatcher::new(sink));
        self
    }

    /// Processes one frame at the current wall-clock time.
    pub fn process_frame(&mut self, frame: Frame) -> Result<CycleReport, EngineError> {
        self.process_frame_at(frame, Instant::now())
    }

    /// Runs one full cycle: segment against the retained previous frame,
    /// consolidate, track, escalate, dispatch breaches, retain the frame.
    ///
    /// The first frame ever seen produces no candidates. An aborted cycle
    /// leaves all prior state untouched, including the previous frame.
    pub fn process_frame_at(
        &mut self,
        frame: Frame,
        now: Instant,
    ) -> Result<CycleReport, EngineError> {
        if frame.width() != self.config.image_width || frame.height() != self.config.image_height {
            return Err(EngineError::FrameGeometry {
                width: self.config.image_width,
                height: self.config.image_height,
                actual: frame.data().len(),
            });
        }

        // Stage 1: Segmentation
        let regions = match &self.prev_frame {
            Some(prev) => self.segmenter.segment(prev, &frame)?,
            None => Vec::new(),
        };

        // Stage 2: Consolidation
        let candidates =
            consolidator::consolidate(&regions, self.config.settings.merge_distance_pixels);

        // Stage 3: Identity Tracking & Escalation
        let update = self.tracker.update_at(&candidates, now)?;

        // Stage 4: One-Shot Alert Dispatch
        if let Some(dispatcher) = &mut self.dispatcher {
            for breached in &update.breaches {
                dispatcher.dispatch(breached, &frame);
            }
        }

        tracing::debug!(
            raw_regions = regions.len(),
            candidates = candidates.len(),
            tracked = update.objects.len(),
            breaches = update.breaches.len(),
            "cycle complete"
        );

        self.prev_frame = Some(frame);
        Ok(CycleReport {
            objects: update.objects,
            breaches: update.breaches,
        })
    }

    /// Advances the staleness and escalation clocks without a new frame.
    pub fn tick(&mut self) -> Result<CycleReport, EngineError> {
        self.tick_at(Instant::now())
    }

    /// A frameless cycle for when the supplier has nothing to offer: the
    /// retained previous frame stays in place and the tracker runs with an
    /// empty candidate list so pruning and escalation do not stall.
    pub fn tick_at(&mut self, now: Instant) -> Result<CycleReport, EngineError> {
        let update = self.tracker.update_at(&[], now)?;

        if let Some(dispatcher) = &mut self.dispatcher {
            for breached in &update.breaches {
                match &self.prev_frame {
                    Some(frame) => dispatcher.dispatch(breached, frame),
                    // Unreachable in practice: a breach needs dwell time, and
                    // dwell needs at least one processed frame.
                    None => tracing::warn!(id = breached.id, "breach with no frame; alert dropped"),
                }
            }
        }

        Ok(CycleReport {
            objects: update.objects,
            breaches: update.breaches,
        })
    }

    /// Applies a live settings update from the settings collaborator without
    /// discarding in-flight tracked-object state.
    pub fn apply_settings(&mut self, settings: &MotionSettings) {
        self.segmenter.sensitivity = settings.sensitivity;
        self.tracker.apply_settings(
            settings.deregistration_time(),
            settings.escalation_interval(),
            settings.maximum_threat_level,
        );
        self.config.settings = settings.clone();
        tracing::info!(?settings, "settings applied");
    }

    /// The current tracked-object set, in ascending id order.
    pub fn tracked_objects(&self) -> Vec<TrackedObject> {
        self.tracker.tracked_objects().cloned().collect()
    }
}
