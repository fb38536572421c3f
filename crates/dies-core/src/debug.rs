use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Vector2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugColor {
    #[default]
    Red,
    Green,
    Orange,
    Purple,
    Yellow,
    Blue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DebugShape {
    Cross {
        center: Vector2,
        color: DebugColor,
    },
    Circle {
        center: Vector2,
        radius: f64,
        fill: Option<DebugColor>,
        stroke: Option<DebugColor>,
    },
    Line {
        start: Vector2,
        end: Vector2,
        color: DebugColor,
    },
}

impl DebugShape {
    pub fn cross(center: Vector2, color: DebugColor) -> Self {
        DebugShape::Cross { center, color }
    }

    pub fn circle_fill(center: Vector2, radius: f64, fill: DebugColor) -> Self {
        DebugShape::Circle {
            center,
            radius,
            fill: Some(fill),
            stroke: None,
        }
    }

    pub fn circle_stroke(center: Vector2, radius: f64, stroke: DebugColor) -> Self {
        DebugShape::Circle {
            center,
            radius,
            fill: None,
            stroke: Some(stroke),
        }
    }

    pub fn line(start: Vector2, end: Vector2, color: DebugColor) -> Self {
        DebugShape::Line { start, end, color }
    }
}

/// Debug shapes grouped by layer.
///
/// # Layer names
///
/// Layer names should be `SCREAMING_SNAKE_CASE`, e.g. `BALL` or `BOTS`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeMap {
    layers: BTreeMap<String, Vec<DebugShape>>,
}

impl ShapeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shape to a layer, creating the layer if needed.
    pub fn add(&mut self, layer: &str, shape: DebugShape) {
        self.layers.entry(layer.to_owned()).or_default().push(shape);
    }

    /// The shapes of one layer.
    pub fn layer(&self, layer: &str) -> &[DebugShape] {
        self.layers.get(layer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn layers(&self) -> impl Iterator<Item = (&str, &[DebugShape])> {
        self.layers.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.layers.values().all(Vec::is_empty)
    }

    /// Total number of shapes over all layers.
    pub fn len(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_are_grouped_by_layer() {
        let mut map = ShapeMap::new();
        assert!(map.is_empty());
        map.add("BALL", DebugShape::cross(Vector2::zeros(), DebugColor::Red));
        map.add("BALL", DebugShape::circle_fill(Vector2::zeros(), 1.0, DebugColor::Orange));
        map.add("BOTS", DebugShape::cross(Vector2::zeros(), DebugColor::Blue));
        assert_eq!(map.layer("BALL").len(), 2);
        assert_eq!(map.layer("KICK").len(), 0);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn shapes_serialize_with_type_tag() {
        let shape = DebugShape::cross(Vector2::new(1.0, 2.0), DebugColor::Green);
        let json = serde_json::to_value(&shape).unwrap();
        assert_eq!(json["type"], "Cross");
        assert_eq!(json["data"]["color"], "green");
    }
}
