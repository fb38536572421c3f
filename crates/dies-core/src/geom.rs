use serde::{Deserialize, Serialize};

use crate::Vector2;

/// The field dimensions needed by the world predictor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FieldGeometry {
    /// Field length (distance between goal lines) in mm
    pub field_length: f64,
    /// Field width (distance between touch lines) in mm
    pub field_width: f64,
    /// Boundary width (distance from touch/goal line centers to boundary walls) in mm
    pub boundary_width: f64,
}

impl Default for FieldGeometry {
    fn default() -> Self {
        Self {
            field_length: 9000.0,
            field_width: 6000.0,
            boundary_width: 300.0,
        }
    }
}

impl FieldGeometry {
    /// Whether a point lies inside the playing field, grown by `margin` on each
    /// side.
    pub fn is_in_field(&self, pos: Vector2, margin: f64) -> bool {
        pos.x.abs() <= self.field_length / 2.0 + margin
            && pos.y.abs() <= self.field_width / 2.0 + margin
    }

    /// Whether a point lies within the boundary walls.
    pub fn is_inside_walls(&self, pos: Vector2) -> bool {
        self.is_in_field(pos, self.boundary_width)
    }

    pub fn is_valid(&self) -> bool {
        [self.field_length, self.field_width, self.boundary_width]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
            && self.field_length > 0.0
            && self.field_width > 0.0
    }
}
