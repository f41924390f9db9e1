// THEORY:
// The `alert` module is the seam between the engine and the external alerting
// collaborator. The engine decides *that* a breach must be reported; the
// collaborator decides *how* (email, capture storage, webhooks) and owns its
// own persistence and retry policy. Two contracts are enforced on this side of
// the seam: each breached id is reported at most once, and a failing sink can
// never crash or stall a processing cycle.

use crate::core_modules::frame::Frame;
use crate::core_modules::tracker::TrackedObject;
use std::collections::HashSet;

/// Errors a sink may raise; they are logged here and never propagated.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// The one-shot report delivered when an object crosses the threat ceiling.
#[derive(Debug, Clone)]
pub struct ThreatAlert {
    /// The breaching object's id.
    pub id: u64,
    /// Its threat level at the moment of removal.
    pub threat_level: u32,
    /// The composite frame of the breaching cycle.
    pub frame: Frame,
}

/// Consumer of one-shot threat reports.
pub trait AlertSink: Send {
    fn notify(&mut self, alert: &ThreatAlert) -> Result<(), SinkError>;
}

/// Forwards breaches to a sink, at most once per id.
pub struct AlertDispatcher {
    sink: Box<dyn AlertSink>,
    /// Ids already dispatched. Ids are process-unique, so membership here is
    /// permanent.
    handled: HashSet<u64>,
}

impl AlertDispatcher {
    pub fn new(sink: Box<dyn AlertSink>) -> Self {
        Self {
            sink,
            handled: HashSet::new(),
        }
    }

    /// Reports a breached object with the frame it was last seen in.
    pub fn dispatch(&mut self, breached: &TrackedObject, frame: &Frame) {
        if !self.handled.insert(breached.id) {
            return;
        }

        let alert = ThreatAlert {
            id: breached.id,
            threat_level: breached.threat_level,
            frame: frame.clone(),
        };
        match self.sink.notify(&alert) {
            Ok(()) => tracing::info!(id = alert.id, "threat alert dispatched"),
            Err(error) => tracing::warn!(
                id = alert.id,
                %error,
                "alert sink failed; alert dropped"
            ),
        }
    }
}
