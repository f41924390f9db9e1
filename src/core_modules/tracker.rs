// THEORY:
// The `tracker` module is the heart of the engine. Its responsibility is to
// add "object permanence" to the system: it takes the stateless candidate
// detections of a single cycle and associates them with the objects it was
// tracking from previous cycles, despite noisy per-frame segmentation.
//
// This module solves the data association problem.
//
// Key architectural principles:
// 1.  **Explicit Ownership**: The table of `TrackedObject`s is owned by one
//     `Tracker` instance and mutated only through `update_at`. There is no
//     ambient registry; hosts thread the tracker through calls explicitly.
// 2.  **Greedy Nearest-Neighbor Matching**: Each candidate binds to the
//     eligible object with the smallest squared center distance. Eligibility
//     scales with the candidate's width, so wider (closer) detections tolerate
//     proportionally larger per-cycle displacement.
// 3.  **Exclusive Claiming**: An object may be claimed by at most one
//     candidate per cycle. Once claimed it leaves the eligibility pool, which
//     prevents two fragments of one cycle from collapsing onto one identity.
// 4.  **Lifecycle Management**: Unmatched candidates are born with a fresh,
//     strictly increasing id; matched objects are updated in place; objects
//     unseen past the deregistration window are pruned; objects escalated past
//     the threat ceiling are removed and surfaced for one-shot reporting.

use crate::core_modules::escalation::{EscalationEngine, EscalationOutcome};
use crate::core_modules::region::{Region, center_distance_sq};
use crate::error::EngineError;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

/// How many recent center points an object remembers; oldest evicted first.
const CENTER_HISTORY_SIZE: usize = 5;

/// A persistent identity tracked across cycles.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    /// Unique, strictly increasing id; never reused within a tracker's lifetime.
    pub id: u64,
    /// The most recent bounding box observed for this object.
    pub bbox: Region,
    /// Up to the five most recent center points, oldest first.
    pub center_history: VecDeque<(f64, f64)>,
    /// When this object was first registered.
    pub first_seen: Instant,
    /// When this object last matched a candidate.
    pub last_seen: Instant,
    /// When this object's threat level last increased.
    pub last_escalated: Instant,
    /// Monotonic dwell-time threat score; only ever increases.
    pub threat_level: u32,
}

impl TrackedObject {
    pub(crate) fn new(id: u64, bbox: Region, seen_at: Instant) -> Self {
        let mut center_history = VecDeque::with_capacity(CENTER_HISTORY_SIZE);
        center_history.push_back(bbox.center());
        Self {
            id,
            bbox,
            center_history,
            first_seen: seen_at,
            last_seen: seen_at,
            last_escalated: seen_at,
            threat_level: 0,
        }
    }

    /// Folds a matched candidate into this object's state.
    fn observe(&mut self, bbox: Region, seen_at: Instant) {
        self.center_history.push_back(bbox.center());
        if self.center_history.len() > CENTER_HISTORY_SIZE {
            self.center_history.pop_front();
        }
        self.bbox = bbox;
        self.last_seen = seen_at;
    }

    /// The most recent center point in the history.
    pub fn last_center(&self) -> (f64, f64) {
        // History is never empty: the first center is pushed at birth.
        *self.center_history.back().unwrap()
    }
}

/// The result of one tracking cycle.
#[derive(Debug, Clone)]
pub struct TrackerUpdate {
    /// Snapshot of every surviving tracked object, in ascending id order.
    pub objects: Vec<TrackedObject>,
    /// Objects removed this cycle for exceeding the threat ceiling. Each id
    /// appears here at most once over the tracker's lifetime.
    pub breaches: Vec<TrackedObject>,
}

/// Matches candidate detections to persistent identities and manages their
/// full lifecycle.
pub struct Tracker {
    /// The tracked-object table, keyed by id. Ascending-id iteration is the
    /// deterministic tie-break for equidistant matches.
    objects: BTreeMap<u64, TrackedObject>,
    /// Next id to issue; starts at 1 and never goes backwards.
    next_id: u64,
    /// Base matching distance in pixels; squared and scaled by candidate
    /// width at eligibility time.
    match_distance: u32,
    /// How long an object may go unmatched before it is pruned.
    deregistration_time: Duration,
    escalation: EscalationEngine,
}

impl Tracker {
    pub fn new(
        match_distance: u32,
        deregistration_time: Duration,
        escalation: EscalationEngine,
    ) -> Self {
        Self {
            objects: BTreeMap::new(),
            next_id: 1,
            match_distance,
            deregistration_time,
            escalation,
        }
    }

    /// Runs one tracking cycle at the current wall-clock time.
    pub fn update(&mut self, candidates: &[Region]) -> Result<TrackerUpdate, EngineError> {
        self.update_at(candidates, Instant::now())
    }

    /// Runs one tracking cycle: match, register, escalate, prune.
    ///
    /// Must be called once per cycle even with an empty candidate list, since
    /// escalation and staleness pruning advance on `now`. A malformed
    /// candidate aborts the cycle with `InvalidInput` before any state is
    /// touched.
    pub fn update_at(
        &mut self,
        candidates: &[Region],
        now: Instant,
    ) -> Result<TrackerUpdate, EngineError> {
        for candidate in candidates {
            if !candidate.is_well_formed() {
                return Err(EngineError::InvalidInput(format!(
                    "candidate region corners are inverted: ({},{})-({},{})",
                    candidate.x1, candidate.y1, candidate.x2, candidate.y2
                )));
            }
        }

        // --- 1. Matching ---
        let mut claimed: HashSet<u64> = HashSet::new();
        for candidate in candidates {
            let id = match self.match_candidate(candidate, &claimed) {
                Some(id) => {
                    // The id came out of the table above.
                    self.objects.get_mut(&id).unwrap().observe(*candidate, now);
                    id
                }
                None => self.register(*candidate, now),
            };
            claimed.insert(id);
        }

        // --- 2. Escalation ---
        let mut breached_ids = Vec::new();
        for object in self.objects.values_mut() {
            if self.escalation.escalate(object, now) == EscalationOutcome::CeilingBreached {
                breached_ids.push(object.id);
            }
        }
        let breaches: Vec<TrackedObject> = breached_ids
            .iter()
            .filter_map(|id| self.objects.remove(id))
            .collect();
        for breach in &breaches {
            tracing::info!(
                id = breach.id,
                threat_level = breach.threat_level,
                "object exceeded the threat ceiling; removed"
            );
        }

        // --- 3. Staleness Pruning ---
        let before = self.objects.len();
        let deregistration_time = self.deregistration_time;
        self.objects
            .retain(|_, object| now.duration_since(object.last_seen) <= deregistration_time);
        if self.objects.len() < before {
            tracing::debug!(pruned = before - self.objects.len(), "pruned stale objects");
        }

        Ok(TrackerUpdate {
            objects: self.objects.values().cloned().collect(),
            breaches,
        })
    }

    /// Finds the unclaimed object nearest to `candidate`, if any lies within
    /// the width-scaled threshold. Ties go to the lowest id.
    fn match_candidate(&self, candidate: &Region, claimed: &HashSet<u64>) -> Option<u64> {
        let center = candidate.center();
        let scaled_threshold =
            f64::from(self.match_distance).powi(2) * f64::from(candidate.width());

        let mut closest: Option<(u64, f64)> = None;
        for (id, object) in &self.objects {
            if claimed.contains(id) {
                continue;
            }
            let distance_sq = center_distance_sq(center, object.last_center());
            if distance_sq <= scaled_threshold
                && closest.is_none_or(|(_, best)| distance_sq < best)
            {
                closest = Some((*id, distance_sq));
            }
        }
        closest.map(|(id, _)| id)
    }

    fn register(&mut self, bbox: Region, seen_at: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.objects.insert(id, TrackedObject::new(id, bbox, seen_at));
        tracing::info!(id, "registered new tracked object");
        id
    }

    /// Applies live tuning without discarding tracked-object state.
    pub fn apply_settings(
        &mut self,
        deregistration_time: Duration,
        escalation_interval: Duration,
        threat_ceiling: u32,
    ) {
        self.deregistration_time = deregistration_time;
        self.escalation.interval = escalation_interval;
        self.escalation.ceiling = threat_ceiling;
    }

    /// The current tracked-object table, in ascending id order.
    pub fn tracked_objects(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.values()
    }
}
