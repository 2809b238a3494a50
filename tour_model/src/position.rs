//! Hotspot placement on the panorama sphere.
//!
//! Positions are stored as fixed-point values with two decimal places so the
//! in-memory value and the `"x y z"` string written to tour configurations
//! always agree.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Distance from the camera at which new hotspots are placed.
pub const OPTIMAL_DISTANCE: f32 = 7.5;

/// A hotspot position relative to the panorama sphere centre, rounded to
/// two decimal places on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position(Vec3);

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self::from_vec3(Vec3::new(x, y, z))
    }

    pub fn from_vec3(value: Vec3) -> Self {
        Self(Vec3::new(
            round_centi(value.x),
            round_centi(value.y),
            round_centi(value.z),
        ))
    }

    pub fn as_vec3(&self) -> Vec3 {
        self.0
    }

    pub fn x(&self) -> f32 {
        self.0.x
    }

    pub fn y(&self) -> f32 {
        self.0.y
    }

    pub fn z(&self) -> f32 {
        self.0.z
    }
}

fn round_centi(value: f32) -> f32 {
    let rounded = (value * 100.0).round() / 100.0;
    // Normalise -0.0 so it never prints as "-0.00".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {:.2} {:.2}", self.0.x, self.0.y, self.0.z)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionParseError {
    #[error("expected three components, found {0}")]
    ComponentCount(usize),
    #[error("invalid position component `{0}`")]
    InvalidComponent(String),
}

impl FromStr for Position {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(PositionParseError::ComponentCount(parts.len()));
        }
        let mut values = [0.0f32; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            let value: f32 = part
                .parse()
                .map_err(|_| PositionParseError::InvalidComponent(part.to_string()))?;
            if !value.is_finite() {
                return Err(PositionParseError::InvalidComponent(part.to_string()));
            }
            *slot = value;
        }
        Ok(Self::new(values[0], values[1], values[2]))
    }
}

impl Serialize for Position {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Projects panorama clicks onto a sphere of fixed radius around the camera.
///
/// The panorama geometry may sit at any distance; placing markers at a
/// constant radius keeps them the same apparent size wherever the user
/// clicks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    distance: f32,
}

impl Default for Projector {
    fn default() -> Self {
        Self {
            distance: OPTIMAL_DISTANCE,
        }
    }
}

impl Projector {
    pub fn with_distance(distance: f32) -> Self {
        Self { distance }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Place a marker along the camera → intersection ray.
    ///
    /// When the intersection coincides with the camera there is no ray to
    /// follow; the marker goes straight ahead (-Z).
    pub fn project(&self, intersection: Vec3, camera: Vec3) -> Position {
        let direction = (intersection - camera)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z);
        Position::from_vec3(camera + direction * self.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_two_decimal_places() {
        let position = Position::new(1.0, 2.0, -3.0);
        assert_eq!(position.to_string(), "1.00 2.00 -3.00");
    }

    #[test]
    fn rounds_on_construction() {
        let position = Position::new(1.236, -0.004, 7.499);
        assert_eq!(position.to_string(), "1.24 0.00 7.50");
        assert_eq!(position.y(), 0.0);
    }

    #[test]
    fn parses_and_reformats() {
        let position: Position = "  0.5 -1.25   3 ".parse().expect("parse position");
        assert_eq!(position.to_string(), "0.50 -1.25 3.00");
        let again: Position = position.to_string().parse().expect("reparse");
        assert_eq!(position, again);
    }

    #[test]
    fn rejects_malformed_strings() {
        assert_eq!(
            "1 2".parse::<Position>(),
            Err(PositionParseError::ComponentCount(2))
        );
        assert!(matches!(
            "1 two 3".parse::<Position>(),
            Err(PositionParseError::InvalidComponent(part)) if part == "two"
        ));
        assert!("1 NaN 3".parse::<Position>().is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&Position::new(1.0, 2.0, -3.0)).expect("serialize");
        assert_eq!(json, "\"1.00 2.00 -3.00\"");
        let back: Position = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, Position::new(1.0, 2.0, -3.0));
    }

    #[test]
    fn projection_ignores_sphere_distance() {
        let projector = Projector::default();
        let camera = Vec3::ZERO;
        let near = projector.project(Vec3::new(0.0, 0.0, -2.0), camera);
        let far = projector.project(Vec3::new(0.0, 0.0, -500.0), camera);
        assert_eq!(near, far);
        assert_eq!(near, Position::new(0.0, 0.0, -OPTIMAL_DISTANCE));
    }

    #[test]
    fn projection_is_relative_to_camera() {
        let projector = Projector::default();
        let position = projector.project(Vec3::new(1.0, 2.0, -1.0), Vec3::new(1.0, 2.0, -10.5));
        assert_eq!(position.to_string(), "1.00 2.00 -3.00");
    }

    #[test]
    fn projection_keeps_radius_on_diagonals() {
        let projector = Projector::with_distance(5.0);
        let position = projector.project(Vec3::new(3.0, 0.0, 4.0), Vec3::ZERO);
        assert_eq!(position, Position::new(3.0, 0.0, 4.0));
        let length = position.as_vec3().length();
        assert!((length - 5.0).abs() < 0.01, "radius drifted to {length}");
    }

    #[test]
    fn degenerate_click_faces_forward() {
        let projector = Projector::default();
        let camera = Vec3::new(0.0, 1.6, 0.0);
        let position = projector.project(camera, camera);
        assert_eq!(position, Position::new(0.0, 1.6, -OPTIMAL_DISTANCE));
    }
}
