use std::fmt;

use serde::{Deserialize, Serialize};

/// Snapshot of a viewport scroll offset, taken at `timestamp` (unix millis).
///
/// Snapshots are replaced wholesale, never edited in place.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
    pub timestamp: i64,
}

impl ScrollPosition {
    pub fn new(x: f64, y: f64, timestamp: i64) -> Self {
        Self { x, y, timestamp }
    }

    /// True when both offsets match, ignoring when the snapshot was taken.
    pub fn same_offset(&self, other: &ScrollPosition) -> bool {
        self.x == other.x && self.y == other.y
    }
}

/// Identifier of a navigable location (path plus query), used to key both the
/// position store and the navigation history.
///
/// The router's location string is taken verbatim; an empty location is `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteKey(String);

impl RouteKey {
    pub fn new(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.is_empty() {
            Self("/".to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RouteKey {
    fn from(location: &str) -> Self {
        RouteKey::new(location)
    }
}

impl From<String> for RouteKey {
    fn from(location: String) -> Self {
        RouteKey::new(&location)
    }
}

/// How a viewport scroll is animated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    #[default]
    Instant,
    Smooth,
}

impl ScrollBehavior {
    pub fn from_smooth(smooth: bool) -> Self {
        if smooth {
            ScrollBehavior::Smooth
        } else {
            ScrollBehavior::Instant
        }
    }
}

/// A stored position together with its route and age, as reported by the
/// debug accessor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredPosition {
    pub route: RouteKey,
    pub position: ScrollPosition,
    pub age_ms: i64,
}
