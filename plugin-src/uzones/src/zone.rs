//! Zone and node records, shaped exactly like the zone data document.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::geometry::{Planar, PlanePoint, Position, point_in_polygon};

/// Host identifier of a spawned marker object.
pub type MarkerId = u32;

/// Minimum node count for a zone to take part in containment and gating.
pub const MIN_READY_NODES: usize = 3;

/// One boundary vertex of a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(deserialize_with = "coordinate")]
    pub x: f64,
    #[serde(deserialize_with = "coordinate")]
    pub y: f64,
    #[serde(deserialize_with = "coordinate")]
    pub z: f64,
    /// Marker spawned to show this node in the world. Recreated on demand, never saved.
    #[serde(skip)]
    pub marker: Option<MarkerId>,
}

impl Node {
    #[must_use]
    pub const fn at(pos: Position) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            marker: None,
        }
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        Position::new(self.x, self.y, self.z)
    }
}

impl Planar for Node {
    #[inline]
    fn plane(&self) -> PlanePoint {
        PlanePoint::new(self.x, self.z)
    }
}

/// Older documents stored replaced nodes with stringified coordinates.
fn coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Coordinate {
        Number(f64),
        Text(String),
    }

    match Coordinate::deserialize(deserializer)? {
        Coordinate::Number(v) => Ok(v),
        Coordinate::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("bad coordinate '{s}': {e}"))),
    }
}

/// A named polygon region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub zone_name: String,
    /// Insertion order is ring order.
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub flags: BTreeSet<String>,
    /// One-way latch: set when the third node is added, never cleared by removals.
    #[serde(default)]
    pub is_ready: bool,
    #[serde(default, rename = "players")]
    pub members: BTreeSet<Uuid>,
}

impl Zone {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            zone_name: name.into(),
            nodes: Vec::new(),
            flags: BTreeSet::new(),
            is_ready: false,
            members: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.zone_name
    }

    /// Whether this zone's ground projection contains `pos`. Not-ready zones contain nothing.
    #[must_use]
    pub fn contains(&self, pos: &Position) -> bool {
        self.is_ready && point_in_polygon(pos.plane(), &self.nodes)
    }

    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub(crate) fn push_node(&mut self, node: Node) {
        self.nodes.push(node);
        if !self.is_ready && self.nodes.len() >= MIN_READY_NODES {
            self.is_ready = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_latches_on_third_node() {
        let mut zone = Zone::new("spawn");
        zone.push_node(Node::at(Position::new(0.0, 0.0, 0.0)));
        zone.push_node(Node::at(Position::new(0.0, 0.0, 10.0)));
        assert!(!zone.is_ready);
        zone.push_node(Node::at(Position::new(10.0, 0.0, 10.0)));
        assert!(zone.is_ready);
        zone.nodes.truncate(1);
        assert!(zone.is_ready);
        assert!(!zone.contains(&Position::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn not_ready_zone_contains_nothing() {
        let mut zone = Zone::new("half");
        zone.nodes = vec![
            Node::at(Position::new(0.0, 0.0, 0.0)),
            Node::at(Position::new(0.0, 0.0, 10.0)),
            Node::at(Position::new(10.0, 0.0, 10.0)),
        ];
        assert!(!zone.contains(&Position::new(2.0, 0.0, 8.0)));
        zone.is_ready = true;
        assert!(zone.contains(&Position::new(2.0, 0.0, 8.0)));
    }

    #[test]
    fn reads_legacy_record_with_string_coordinates() {
        let json = r#"{
            "zoneName": "old",
            "nodes": [
                {"x": 1.5, "y": 2, "z": 3},
                {"x": "4.25", "y": "0", "z": "-6", "visualizedBarricadeId": 77}
            ]
        }"#;
        let zone: Zone = serde_json::from_str(json).expect("legacy record parses");
        assert_eq!(zone.name(), "old");
        assert_eq!(zone.nodes[1].position(), Position::new(4.25, 0.0, -6.0));
        assert_eq!(zone.nodes[1].marker, None);
        assert!(zone.flags.is_empty());
        assert!(zone.members.is_empty());
        assert!(!zone.is_ready);
    }

    #[test]
    fn rejects_non_numeric_coordinate() {
        let json = r#"{"zoneName": "bad", "nodes": [{"x": "east", "y": 0, "z": 0}]}"#;
        assert!(serde_json::from_str::<Zone>(json).is_err());
    }

    #[test]
    fn writes_document_keys_and_skips_marker() {
        let mut zone = Zone::new("market");
        let mut node = Node::at(Position::new(1.0, 2.0, 3.0));
        node.marker = Some(9);
        zone.nodes.push(node);
        zone.flags.insert("nobuild".to_owned());

        let value = serde_json::to_value(&zone).expect("serializes");
        assert_eq!(value["zoneName"], "market");
        assert_eq!(value["isReady"], false);
        assert_eq!(value["flags"][0], "nobuild");
        assert!(value["players"].as_array().is_some_and(Vec::is_empty));
        assert!(value["nodes"][0].get("marker").is_none());
        assert_eq!(value["nodes"][0]["z"], 3.0);
    }
}
