// THEORY:
// The `escalation` module turns dwell time into a threat score. An object that
// keeps being re-identified by the tracker accrues exactly one threat point
// per escalation interval, regardless of how many processing cycles fall
// inside that interval - the rule gates on wall-clock time since first sight
// and since the previous escalation, never on cycle count. Crossing the
// ceiling is a normal terminal transition for a tracked object, not an error:
// the tracker removes it and the breach is reported downstream exactly once.

use crate::core_modules::tracker::TrackedObject;
use std::time::{Duration, Instant};

/// What a single escalation pass did to an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// Neither interval had fully elapsed.
    Unchanged,
    /// The threat level was incremented and remains at or below the ceiling.
    Escalated,
    /// The increment pushed the threat level past the ceiling; the object
    /// must be removed and reported.
    CeilingBreached,
}

/// Raises an object's threat level on a fixed cadence while it remains
/// continuously present.
#[derive(Debug, Clone)]
pub struct EscalationEngine {
    /// Period an object must dwell before each threat increment.
    pub interval: Duration,
    /// Highest threat level an object may hold; exceeding it is a breach.
    pub ceiling: u32,
}

impl EscalationEngine {
    pub fn new(interval: Duration, ceiling: u32) -> Self {
        Self { interval, ceiling }
    }

    /// Conditionally escalates `object` at time `now`.
    pub fn escalate(&self, object: &mut TrackedObject, now: Instant) -> EscalationOutcome {
        let dwell = now.duration_since(object.first_seen);
        let since_last = now.duration_since(object.last_escalated);

        if dwell < self.interval || since_last < self.interval {
            return EscalationOutcome::Unchanged;
        }

        object.threat_level += 1;
        object.last_escalated = now;

        if object.threat_level > self.ceiling {
            EscalationOutcome::CeilingBreached
        } else {
            EscalationOutcome::Escalated
        }
    }
}
