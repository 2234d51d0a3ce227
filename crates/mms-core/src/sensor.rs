use std::f64::consts::PI;
use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::geometry::{Polygon, is_positive, ray_segment_distance, unit_vector};
use crate::maze::Maze;

/// Segments used to approximate the far arc of a sensor's view.
const ARC_SEGMENTS: usize = 8;
/// Sides of the sensor's footprint polygon.
const FOOTPRINT_SIDES: usize = 8;
/// Slack when deciding whether a wall shortened a ray.
const OCCLUSION_SLACK: f64 = 1e-9;

fn default_rays() -> usize {
    32
}

/// Mounting and field of view of a proximity sensor, in the body frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSpec {
    /// Sensor position relative to the body frame origin.
    pub position: DVec2,
    /// Direction the sensor faces, radians counter-clockwise from body +x.
    pub rotation: f64,
    /// Radius of the sensor's footprint in meters.
    pub radius: f64,
    /// Maximum detection distance in meters.
    pub range: f64,
    /// Half of the field-of-view angle in radians.
    pub half_width: f64,
    /// How long a single reading takes.
    pub read_time: Duration,
    /// Rays cast across the field of view per reading.
    #[serde(default = "default_rays")]
    pub rays: usize,
}

/// A proximity sensor. Holds only fixed parameters; readings are always
/// recomputed from the current pose and maze.
#[derive(Debug, Clone)]
pub struct Sensor {
    initial_translation: DVec2,
    initial_rotation: f64,
    read_time: Duration,
    rays: usize,
    initial_polygon: Polygon,
    initial_view: Polygon,
}

impl Sensor {
    /// Build a sensor whose body-frame origin sits at `origin` in the maze.
    ///
    /// The full view is a fan whose first vertex is the sensor position.
    pub fn new(name: &str, spec: &SensorSpec, origin: DVec2) -> CoreResult<Self> {
        if !is_positive(spec.radius) {
            return Err(CoreError::InvalidGeometry(format!(
                "sensor \"{name}\" radius must be positive, got {}",
                spec.radius
            )));
        }
        let translation = origin + spec.position;
        let half_width = spec.half_width.clamp(0.0, PI - 1e-6);

        let mut view = Vec::with_capacity(ARC_SEGMENTS + 2);
        view.push(translation);
        for i in 0..=ARC_SEGMENTS {
            let angle = spec.rotation - half_width + 2.0 * half_width * i as f64 / ARC_SEGMENTS as f64;
            view.push(translation + unit_vector(angle) * spec.range);
        }
        let initial_view = Polygon::new(view)?;

        let area = initial_view.area();
        if area.is_nan() || area <= f64::EPSILON {
            return Err(CoreError::DegenerateSensorView(name.to_string()));
        }

        Ok(Self {
            initial_translation: translation,
            initial_rotation: spec.rotation,
            read_time: spec.read_time,
            rays: spec.rays.max(2),
            initial_polygon: Polygon::regular(translation, spec.radius, FOOTPRINT_SIDES),
            initial_view,
        })
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

    /// Unoccluded view at the start of the run.
    pub fn initial_view(&self) -> &Polygon {
        &self.initial_view
    }

    /// Time a single reading takes.
    pub fn read_time(&self) -> Duration {
        self.read_time
    }

    /// The part of `full_view` not shadowed by any maze wall.
    ///
    /// `full_view` is this sensor's view already placed at the mouse's pose,
    /// `origin` its apex and `absolute_rotation` its facing in the maze.
    /// Rays are sampled uniformly across the field of view plus one through
    /// every vertex, so the result is deterministic for a given pose. When no
    /// ray is cut short the full view is returned unchanged; when the origin
    /// sits inside a wall the view collapses to the origin.
    pub fn current_view(
        &self,
        origin: DVec2,
        absolute_rotation: f64,
        full_view: &Polygon,
        maze: &Maze,
    ) -> Polygon {
        let walls: Vec<&Polygon> = maze
            .tiles_near(full_view.bounding_box())
            .flat_map(|tile| tile.wall_polygons())
            .collect();

        if walls.iter().any(|wall| wall.contains_point(origin)) {
            return Polygon::collapsed(origin);
        }

        let segments: Vec<(DVec2, DVec2)> = walls.iter().flat_map(|wall| wall.edges()).collect();

        let mut occluded = false;
        let mut boundary = Vec::with_capacity(self.rays + full_view.vertices().len() + 1);
        boundary.push(origin);
        for offset in self.ray_offsets(origin, absolute_rotation, full_view) {
            let direction = unit_vector(absolute_rotation + offset);
            let reach = full_view
                .edges()
                .filter_map(|(a, b)| ray_segment_distance(origin, direction, a, b))
                .fold(0.0, f64::max);
            let hit = segments
                .iter()
                .filter_map(|(a, b)| ray_segment_distance(origin, direction, *a, *b))
                .fold(f64::INFINITY, f64::min);

            if hit < reach - OCCLUSION_SLACK {
                occluded = true;
                boundary.push(origin + direction * hit);
            } else {
                boundary.push(origin + direction * reach);
            }
        }

        if !occluded {
            return full_view.clone();
        }
        Polygon::new(boundary).unwrap_or_else(|_| Polygon::collapsed(origin))
    }

    /// Ray angles relative to `absolute_rotation`, sorted and deduplicated.
    fn ray_offsets(&self, origin: DVec2, absolute_rotation: f64, full_view: &Polygon) -> Vec<f64> {
        let vertex_offsets: Vec<f64> = full_view
            .vertices()
            .iter()
            .skip(1)
            .map(|v| {
                let d = *v - origin;
                wrap_angle(d.y.atan2(d.x) - absolute_rotation)
            })
            .collect();

        let lo = vertex_offsets.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = vertex_offsets.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let mut offsets: Vec<f64> = (0..self.rays)
            .map(|i| lo + (hi - lo) * i as f64 / (self.rays - 1) as f64)
            .chain(vertex_offsets)
            .collect();
        offsets.sort_by(f64::total_cmp);
        offsets.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
        offsets
    }
}

/// Wrap an angle into `[-PI, PI)`.
fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}
