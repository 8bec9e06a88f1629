//! # Markers
//!
//! Named spatial points discovered when an arena template is loaded.
//!
//! A [`MarkerSet`] keeps markers in discovery order. Plural slots and
//! ambiguous singular slots both rely on that order being stable, so the set
//! never reorders entries: re-inserting an existing name replaces its point
//! in place.

use serde::{Deserialize, Serialize};

/// 3D position with double precision.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position.
    pub fn distance(&self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A single named marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub position: Position,
}

/// Insertion-ordered mapping of marker name to position.
///
/// # Examples
///
/// ```rust
/// use position_schema::{MarkerSet, Position};
///
/// let mut markers = MarkerSet::new();
/// markers.insert("spawn.red", Position::new(0.0, 64.0, 0.0));
/// markers.insert("spawn.blue", Position::new(32.0, 64.0, 0.0));
/// assert_eq!(markers.names().collect::<Vec<_>>(), vec!["spawn.red", "spawn.blue"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerSet {
    markers: Vec<Marker>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a marker, or replaces the point of an existing one without
    /// moving it in discovery order. Returns the previous point, if any.
    pub fn insert(&mut self, name: impl Into<String>, position: Position) -> Option<Position> {
        let name = name.into();
        match self.markers.iter_mut().find(|m| m.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.position, position)),
            None => {
                self.markers.push(Marker { name, position });
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Position> {
        self.markers
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.position)
    }

    pub fn remove(&mut self, name: &str) -> Option<Position> {
        let index = self.markers.iter().position(|m| m.name == name)?;
        Some(self.markers.remove(index).position)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.markers.iter().any(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Markers in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(|m| m.name.as_str())
    }
}

impl<N: Into<String>> FromIterator<(N, Position)> for MarkerSet {
    fn from_iter<I: IntoIterator<Item = (N, Position)>>(iter: I) -> Self {
        let mut set = MarkerSet::new();
        for (name, position) in iter {
            set.insert(name, position);
        }
        set
    }
}

impl<'a> IntoIterator for &'a MarkerSet {
    type Item = &'a Marker;
    type IntoIter = std::slice::Iter<'a, Marker>;

    fn into_iter(self) -> Self::IntoIter {
        self.markers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reinsert_keeps_discovery_order() {
        let mut markers = MarkerSet::new();
        markers.insert("a", Position::new(1.0, 0.0, 0.0));
        markers.insert("b", Position::new(2.0, 0.0, 0.0));
        let previous = markers.insert("a", Position::new(9.0, 0.0, 0.0));

        assert_eq!(previous, Some(Position::new(1.0, 0.0, 0.0)));
        assert_eq!(markers.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(markers.get("a"), Some(Position::new(9.0, 0.0, 0.0)));
    }

    #[test]
    fn test_remove_marker() {
        let mut markers: MarkerSet = [("a", Position::default()), ("b", Position::default())]
            .into_iter()
            .collect();

        assert!(markers.remove("a").is_some());
        assert!(!markers.contains("a"));
        assert_eq!(markers.len(), 1);
        assert!(markers.remove("a").is_none());
    }

    #[test]
    fn test_distance() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance(b), 5.0);
    }
}
