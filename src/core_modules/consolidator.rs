// THEORY:
// The `consolidator` is the glue between raw segmentation and identity
// tracking. A single moving object routinely fragments into several small
// change regions (limbs, shadow edges, partial occlusion); feeding those
// fragments to the tracker would mint spurious identities. Greedy proximity
// clustering folds every fragment whose center lies within a merge radius of
// an anchor into one candidate detection, so the tracker only ever sees one
// box per physical object. It is a stateless utility: one input list, one
// smaller-or-equal output list, no memory between cycles.

use crate::core_modules::region::{Region, center_distance_sq};

pub mod consolidator {
    use super::*;

    /// Merges nearby regions into fewer candidate detections.
    ///
    /// Clustering is greedy in input order: each unclustered region becomes an
    /// anchor, absorbs every other unclustered region whose center lies
    /// strictly within `merge_distance` of the anchor's center, and the
    /// cluster's extent is the component-wise union of its members. No region
    /// is assigned to more than one cluster.
    pub fn consolidate(regions: &[Region], merge_distance: u32) -> Vec<Region> {
        let merge_radius_sq = f64::from(merge_distance).powi(2);
        let mut consumed = vec![false; regions.len()];
        let mut merged = Vec::new();

        for anchor_index in 0..regions.len() {
            if consumed[anchor_index] {
                continue;
            }
            consumed[anchor_index] = true;

            let anchor_center = regions[anchor_index].center();
            let mut cluster = regions[anchor_index];

            for other_index in (anchor_index + 1)..regions.len() {
                if consumed[other_index] {
                    continue;
                }
                let distance_sq =
                    center_distance_sq(anchor_center, regions[other_index].center());
                if distance_sq < merge_radius_sq {
                    cluster = cluster.union(&regions[other_index]);
                    consumed[other_index] = true;
                }
            }

            merged.push(cluster);
        }

        merged
    }
}
