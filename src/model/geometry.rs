//! Bounding box geometry.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle `(x0, y0, x1, y1)` in document units.
///
/// Coordinates are kept exactly as supplied by the extractor: no ordering
/// is enforced, so a malformed box may report a negative area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// `(x1 − x0) × (y1 − y0)`
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x0, y0, x1, y1]: [f64; 4]) -> Self {
        Self::new(x0, y0, x1, y1)
    }
}

/// Sum of `areas`, starting from `+0.0`.
///
/// `Iterator::sum` over `f64` starts from `-0.0`, which would print an empty
/// total as `-0.00`.
pub(crate) fn sum_areas<I: IntoIterator<Item = f64>>(areas: I) -> f64 {
    areas.into_iter().fold(0.0, |acc, a| acc + a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_new() {
        let bbox = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(bbox.x0, 10.0);
        assert_eq!(bbox.y0, 20.0);
        assert_eq!(bbox.x1, 30.0);
        assert_eq!(bbox.y1, 40.0);
    }

    #[test]
    fn test_bbox_area() {
        assert_eq!(BoundingBox::new(0.0, 0.0, 10.0, 10.0).area(), 100.0);
        assert_eq!(BoundingBox::new(1.5, 2.0, 4.0, 6.0).area(), 10.0);
        assert_eq!(BoundingBox::new(5.0, 5.0, 5.0, 9.0).area(), 0.0);
    }

    #[test]
    fn test_area_is_non_negative_for_ordered_boxes() {
        let boxes = [
            [0.0, 0.0, 0.0, 0.0],
            [0.25, 0.5, 0.75, 1.0],
            [-10.0, -10.0, 10.0, 10.0],
            [100.0, 700.0, 512.5, 712.25],
        ];
        for coords in boxes {
            let bbox = BoundingBox::from(coords);
            let expected = (coords[2] - coords[0]) * (coords[3] - coords[1]);
            assert_eq!(bbox.area(), expected);
            assert!(bbox.area() >= 0.0);
        }
    }

    #[test]
    fn test_inverted_box_is_not_corrected() {
        let bbox = BoundingBox::new(10.0, 0.0, 0.0, 10.0);
        assert_eq!(bbox.area(), -100.0);
    }

    #[test]
    fn test_bbox_union() {
        let a = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        let b = BoundingBox::new(5.0, 25.0, 35.0, 45.0);
        assert_eq!(a.union(&b), BoundingBox::new(5.0, 20.0, 35.0, 45.0));
    }

    #[test]
    fn test_array_conversion() {
        let bbox = BoundingBox::from([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(bbox.to_array(), [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_sum_areas_of_nothing_is_positive_zero() {
        let total = sum_areas(std::iter::empty());
        assert_eq!(total, 0.0);
        assert!(total.is_sign_positive());
        assert_eq!(sum_areas([1.5, -0.5, 2.0]), 3.0);
    }
}
