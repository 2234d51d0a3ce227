use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::geometry::{Polygon, is_positive};

/// Mounting and size of a drive wheel, in the mouse's body frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelSpec {
    /// Wheel radius in meters.
    pub radius: f64,
    /// Tread width in meters.
    pub width: f64,
    /// Center of the wheel relative to the body frame origin.
    pub position: DVec2,
    /// Mount rotation in radians; 0 puts the axle along the body x axis.
    #[serde(default)]
    pub rotation: f64,
}

/// A drive wheel: static geometry plus its current angular velocity.
#[derive(Debug, Clone)]
pub struct Wheel {
    radius: f64,
    initial_translation: DVec2,
    initial_rotation: f64,
    initial_polygon: Polygon,
    angular_velocity: f64,
}

impl Wheel {
    /// Build a wheel whose body-frame origin sits at `origin` in the maze.
    pub fn new(spec: &WheelSpec, origin: DVec2) -> CoreResult<Self> {
        if !is_positive(spec.radius) {
            return Err(CoreError::InvalidGeometry(format!(
                "wheel radius must be positive, got {}",
                spec.radius
            )));
        }
        if !is_positive(spec.width) {
            return Err(CoreError::InvalidGeometry(format!(
                "wheel width must be positive, got {}",
                spec.width
            )));
        }

        let translation = origin + spec.position;
        let half = DVec2::new(spec.width / 2.0, spec.radius);
        let polygon = Polygon::rect(translation - half, translation + half)
            .rotate_around_point(spec.rotation, translation);

        Ok(Self {
            radius: spec.radius,
            initial_translation: translation,
            initial_rotation: spec.rotation,
            initial_polygon: polygon,
            angular_velocity: 0.0,
        })
    }

    /// Wheel radius in meters.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Mount point at the start of the run.
    pub fn initial_translation(&self) -> DVec2 {
        self.initial_translation
    }

    /// Mount rotation relative to the body.
    pub fn initial_rotation(&self) -> f64 {
        self.initial_rotation
    }

    /// Footprint at the start of the run.
    pub fn initial_polygon(&self) -> &Polygon {
        &self.initial_polygon
    }

    /// Current angular velocity in radians per second.
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// Set the angular velocity. Any sign or magnitude is accepted.
    pub fn set_angular_velocity(&mut self, radians_per_second: f64) {
        self.angular_velocity = radians_per_second;
    }

    /// Rim speed in meters per second.
    pub fn linear_velocity(&self) -> f64 {
        self.angular_velocity * self.radius
    }
}
