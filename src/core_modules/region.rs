// THEORY:
// The `region` module defines the one fixed-field geometry type that every
// layer of the engine speaks: an axis-aligned bounding box produced by the
// segmenter, consolidated into candidate detections, and carried by tracked
// objects. Keeping it a "dumb" validated data container means the segmenter
// boundary is the single place where malformed geometry can enter the system.

use crate::error::EngineError;

/// An axis-aligned bounding box in pixel coordinates.
///
/// `(x1, y1)` is the top-left corner and `(x2, y2)` the bottom-right corner,
/// with `x2 >= x1` and `y2 >= y1` enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    /// Builds a region, rejecting inverted corners.
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Result<Self, EngineError> {
        let region = Self { x1, y1, x2, y2 };
        if !region.is_well_formed() {
            return Err(EngineError::InvalidInput(format!(
                "region corners are inverted: ({x1},{y1})-({x2},{y2})"
            )));
        }
        Ok(region)
    }

    /// Whether the corners describe a non-inverted box.
    pub fn is_well_formed(&self) -> bool {
        self.x2 >= self.x1 && self.y2 >= self.y1
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// The geometric center of the box.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.x1 + self.x2) as f64 / 2.0,
            (self.y1 + self.y2) as f64 / 2.0,
        )
    }

    /// The smallest region enclosing both `self` and `other`.
    pub fn union(&self, other: &Region) -> Region {
        Region {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }
}

/// Squared straight-line distance between two center points.
///
/// Distances are compared in squared space throughout the engine, so the
/// square root is never taken.
pub fn center_distance_sq(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    (p1.0 - p2.0).powi(2) + (p1.1 - p2.1).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_corners() {
        assert!(Region::new(10, 10, 5, 20).is_err());
        assert!(Region::new(10, 10, 20, 5).is_err());
        assert!(Region::new(10, 10, 10, 10).is_ok());
    }

    #[test]
    fn center_of_a_box() {
        let region = Region::new(100, 100, 150, 150).unwrap();
        assert_eq!(region.center(), (125.0, 125.0));
    }

    #[test]
    fn union_encloses_both() {
        let a = Region::new(0, 0, 10, 10).unwrap();
        let b = Region::new(5, 20, 30, 40).unwrap();
        assert_eq!(a.union(&b), Region { x1: 0, y1: 0, x2: 30, y2: 40 });
    }

    #[test]
    fn squared_distance() {
        assert_eq!(center_distance_sq((0.0, 0.0), (3.0, 4.0)), 25.0);
    }
}
