use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::geometry::{Polygon, convex_hull, unit_vector};
use crate::maze::{Direction, Maze, TileCoord};
use crate::sensor::{Sensor, SensorSpec};
use crate::wheel::{Wheel, WheelSpec};

/// Body-frame angle the mouse drives along (+y).
pub const FORWARD_AXIS: f64 = FRAC_PI_2;

/// Tolerance for the shared-axle check on wheel mounts.
const MOUNT_TOLERANCE: f64 = 1e-9;

/// Description of a mouse in its own body frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseSpec {
    /// Chassis outline.
    pub body: Polygon,
    /// Left drive wheel (negative x).
    pub left_wheel: WheelSpec,
    /// Right drive wheel (positive x).
    pub right_wheel: WheelSpec,
    /// Proximity sensors keyed by name.
    pub sensors: BTreeMap<String, SensorSpec>,
}

impl MouseSpec {
    /// A classic micromouse sized for 18 cm tiles, with five sensors:
    /// `left`, `front-left`, `front`, `front-right` and `right`.
    pub fn micromouse() -> Self {
        let wheel = |x: f64| WheelSpec {
            radius: 0.0125,
            width: 0.006,
            position: DVec2::new(x, 0.0),
            rotation: 0.0,
        };
        let sensor = |x: f64, y: f64, rotation: f64| SensorSpec {
            position: DVec2::new(x, y),
            rotation,
            radius: 0.004,
            range: 0.2,
            half_width: 0.1,
            read_time: Duration::from_millis(1),
            rays: 32,
        };

        let mut sensors = BTreeMap::new();
        sensors.insert("left".to_string(), sensor(-0.025, 0.045, PI));
        sensors.insert(
            "front-left".to_string(),
            sensor(-0.015, 0.05, FORWARD_AXIS + FRAC_PI_4),
        );
        sensors.insert("front".to_string(), sensor(0.0, 0.05, FORWARD_AXIS));
        sensors.insert(
            "front-right".to_string(),
            sensor(0.015, 0.05, FORWARD_AXIS - FRAC_PI_4),
        );
        sensors.insert("right".to_string(), sensor(0.025, 0.045, 0.0));

        Self {
            body: Polygon::rect(DVec2::new(-0.03, -0.03), DVec2::new(0.03, 0.05)),
            left_wheel: wheel(-0.035),
            right_wheel: wheel(0.035),
            sensors,
        }
    }
}

/// Position and heading of the mouse.
///
/// `rotation` is measured from the start heading; the mouse starts facing
/// body +y, i.e. north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Axle midpoint in maze coordinates.
    pub translation: DVec2,
    /// Accumulated rotation in radians, counter-clockwise positive.
    pub rotation: f64,
}

#[derive(Debug)]
struct Drive {
    left: Wheel,
    right: Wheel,
}

/// A differential-drive mouse.
///
/// Shared between the simulation stepper, which calls [`Mouse::update`], and
/// a control agent, which calls [`Mouse::set_wheel_speeds`] and
/// [`Mouse::read`]. Both wheels sit behind one mutex so an update never
/// pairs a fresh speed with a stale one; the pose sits behind a read-write
/// lock written only by `update`.
#[derive(Debug)]
pub struct Mouse {
    maze: Arc<Maze>,
    initial_translation: DVec2,
    initial_body_polygon: Polygon,
    initial_collision_polygon: Polygon,
    initial_wheel_polygons: [Polygon; 2],
    wheel_base: f64,
    drive: Mutex<Drive>,
    sensors: BTreeMap<String, Sensor>,
    pose: RwLock<Pose>,
    crashed: AtomicBool,
}

impl Mouse {
    /// Place a mouse described by `spec` with its body-frame origin at `start`.
    ///
    /// Fails if the wheels do not share an axle line, have no lateral
    /// separation, or any sensor's view is degenerate.
    pub fn new(spec: &MouseSpec, start: DVec2, maze: Arc<Maze>) -> CoreResult<Self> {
        let left = Wheel::new(&spec.left_wheel, start)?;
        let right = Wheel::new(&spec.right_wheel, start)?;

        let (lt, rt) = (left.initial_translation(), right.initial_translation());
        if (lt.y - rt.y).abs() > MOUNT_TOLERANCE {
            return Err(CoreError::AsymmetricWheelMount {
                left_y: spec.left_wheel.position.y,
                right_y: spec.right_wheel.position.y,
            });
        }
        let wheel_base = (rt.x - lt.x).abs();
        if wheel_base <= MOUNT_TOLERANCE {
            return Err(CoreError::ZeroWheelBase);
        }

        let sensors = spec
            .sensors
            .iter()
            .map(|(name, s)| Ok((name.clone(), Sensor::new(name, s, start)?)))
            .collect::<CoreResult<BTreeMap<_, _>>>()?;

        let body = spec.body.translate(start);
        let mut parts = vec![
            body.clone(),
            left.initial_polygon().clone(),
            right.initial_polygon().clone(),
        ];
        parts.extend(sensors.values().map(|s| s.initial_polygon().clone()));
        let collision = convex_hull(&parts)?;

        let initial_translation = (lt + rt) / 2.0;
        tracing::debug!(
            x = initial_translation.x,
            y = initial_translation.y,
            wheel_base,
            sensors = sensors.len(),
            "mouse placed"
        );

        Ok(Self {
            maze,
            initial_translation,
            initial_body_polygon: body,
            initial_collision_polygon: collision,
            initial_wheel_polygons: [left.initial_polygon().clone(), right.initial_polygon().clone()],
            wheel_base,
            drive: Mutex::new(Drive { left, right }),
            sensors,
            pose: RwLock::new(Pose {
                translation: initial_translation,
                rotation: 0.0,
            }),
            crashed: AtomicBool::new(false),
        })
    }

    /// The maze this mouse senses.
    pub fn maze(&self) -> &Arc<Maze> {
        &self.maze
    }

    /// Lateral distance between the wheel mounts.
    pub fn wheel_base(&self) -> f64 {
        self.wheel_base
    }

    /// Axle midpoint at the start of the run.
    pub fn initial_translation(&self) -> DVec2 {
        self.initial_translation
    }

    /// Snapshot of the current pose.
    pub fn pose(&self) -> Pose {
        *self.pose.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current axle midpoint.
    pub fn translation(&self) -> DVec2 {
        self.pose().translation
    }

    /// Current rotation relative to the start heading.
    pub fn rotation(&self) -> f64 {
        self.pose().rotation
    }

    /// Tile currently containing the axle midpoint.
    pub fn discretized_translation(&self) -> TileCoord {
        self.maze.tile_coord_of(self.translation())
    }

    /// Nearest cardinal direction to the current heading.
    pub fn discretized_rotation(&self) -> Direction {
        Direction::from_heading(FORWARD_AXIS + self.rotation())
    }

    /// Return `true` once the mouse has hit a wall.
    pub fn is_crashed(&self) -> bool {
        self.crashed.load(Ordering::Acquire)
    }

    /// Mark the mouse as crashed. Crashing is terminal.
    pub fn set_crashed(&self) {
        self.crashed.store(true, Ordering::Release);
    }

    /// Names of every sensor, in order.
    pub fn sensor_names(&self) -> impl Iterator<Item = &str> {
        self.sensors.keys().map(String::as_str)
    }

    /// Set both wheel speeds at once.
    ///
    /// Positive values drive the mouse forward on either side. The left
    /// wheel's axle faces the other way, so its own angular velocity is the
    /// negation of the value given here.
    pub fn set_wheel_speeds(&self, left: f64, right: f64) {
        let mut drive = self.drive();
        drive.left.set_angular_velocity(-left);
        drive.right.set_angular_velocity(right);
    }

    /// Current `(left, right)` wheel speeds, forward-positive.
    pub fn wheel_speeds(&self) -> (f64, f64) {
        let drive = self.drive();
        (-drive.left.angular_velocity(), drive.right.angular_velocity())
    }

    /// Advance the pose by `elapsed` simulation time.
    ///
    /// First-order step: the heading changes first and the forward distance
    /// is applied along the new heading. Callers must keep `elapsed` small.
    pub fn update(&self, elapsed: Duration) {
        let (left_speed, right_speed) = {
            let drive = self.drive();
            (drive.left.linear_velocity(), drive.right.linear_velocity())
        };

        let dt = elapsed.as_secs_f64();
        let delta_rotation = (right_speed + left_speed) / self.wheel_base * dt;
        let distance = (right_speed - left_speed) / 2.0 * dt;

        let mut pose = self.pose.write().unwrap_or_else(PoisonError::into_inner);
        pose.rotation += delta_rotation;
        let heading = FORWARD_AXIS + pose.rotation;
        pose.translation += unit_vector(heading) * distance;
    }

    /// Chassis outline at the current pose.
    pub fn body_polygon(&self) -> Polygon {
        self.place(&self.initial_body_polygon, self.pose())
    }

    /// `[left, right]` wheel footprints at the current pose.
    pub fn wheel_polygons(&self) -> Vec<Polygon> {
        let pose = self.pose();
        self.initial_wheel_polygons
            .iter()
            .map(|p| self.place(p, pose))
            .collect()
    }

    /// Sensor footprints at the current pose, in sensor-name order.
    pub fn sensor_polygons(&self) -> Vec<Polygon> {
        let pose = self.pose();
        self.sensors
            .values()
            .map(|s| self.place(s.initial_polygon(), pose))
            .collect()
    }

    /// Convex enclosure of every collidable part at the current pose.
    pub fn collision_polygon(&self) -> Polygon {
        self.place(&self.initial_collision_polygon, self.pose())
    }

    /// Occluded sensor views at the current pose, in sensor-name order.
    pub fn view_polygons(&self) -> Vec<Polygon> {
        let pose = self.pose();
        self.sensors
            .values()
            .map(|sensor| self.current_view(sensor, pose).0)
            .collect()
    }

    /// Read a sensor: 0.0 when its view is clear, 1.0 when fully blocked.
    pub fn read(&self, name: &str) -> CoreResult<f64> {
        let sensor = self.sensor(name)?;
        let (current, full) = self.current_view(sensor, self.pose());
        let full_area = full.area();
        if full_area <= f64::EPSILON {
            return Err(CoreError::DegenerateSensorView(name.to_string()));
        }
        Ok((1.0 - current.area() / full_area).clamp(0.0, 1.0))
    }

    /// How long one reading of the named sensor takes.
    pub fn read_time(&self, name: &str) -> CoreResult<Duration> {
        Ok(self.sensor(name)?.read_time())
    }

    fn sensor(&self, name: &str) -> CoreResult<&Sensor> {
        self.sensors
            .get(name)
            .ok_or_else(|| CoreError::UnknownSensor(name.to_string()))
    }

    /// `(current, full)` views of one sensor at `pose`.
    fn current_view(&self, sensor: &Sensor, pose: Pose) -> (Polygon, Polygon) {
        let full = self.place(sensor.initial_view(), pose);
        let current = sensor.current_view(
            full.vertices()[0],
            pose.rotation + sensor.initial_rotation(),
            &full,
            &self.maze,
        );
        (current, full)
    }

    fn place(&self, polygon: &Polygon, pose: Pose) -> Polygon {
        polygon
            .translate(pose.translation - self.initial_translation)
            .rotate_around_point(pose.rotation, pose.translation)
    }

    fn drive(&self) -> MutexGuard<'_, Drive> {
        self.drive.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{MazeGeometry, MazeLayout};
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn open_maze() -> Arc<Maze> {
        Arc::new(Maze::new(&MazeLayout::open(16, 16), MazeGeometry::default()).unwrap())
    }

    fn mouse_in(maze: Arc<Maze>) -> Mouse {
        let start = maze.tile_center(TileCoord::ORIGIN);
        Mouse::new(&MouseSpec::micromouse(), start, maze).unwrap()
    }

    /// Wheel rim speed of the preset for a given angular velocity.
    fn rim(omega: f64) -> f64 {
        omega * MouseSpec::micromouse().right_wheel.radius
    }

    #[test]
    fn starts_at_axle_midpoint_facing_north() {
        let maze = open_maze();
        let mouse = mouse_in(maze.clone());
        let offset = mouse.translation() - maze.tile_center(TileCoord::ORIGIN);
        assert_abs_diff_eq!(offset.length(), 0.0, epsilon = 1e-12);
        assert_eq!(mouse.rotation(), 0.0);
        assert_eq!(mouse.discretized_translation(), TileCoord::ORIGIN);
        assert_eq!(mouse.discretized_rotation(), Direction::North);
        assert_abs_diff_eq!(mouse.wheel_base(), 0.07, epsilon = 1e-12);
        assert!(!mouse.is_crashed());
    }

    #[test]
    fn rejects_asymmetric_wheel_mount() {
        let mut spec = MouseSpec::micromouse();
        spec.left_wheel.position.y = 0.01;
        let err = Mouse::new(&spec, DVec2::ZERO, open_maze()).unwrap_err();
        assert!(matches!(err, CoreError::AsymmetricWheelMount { .. }));
    }

    #[test]
    fn rejects_zero_wheel_base() {
        let mut spec = MouseSpec::micromouse();
        spec.left_wheel.position.x = spec.right_wheel.position.x;
        let err = Mouse::new(&spec, DVec2::ZERO, open_maze()).unwrap_err();
        assert_eq!(err, CoreError::ZeroWheelBase);
    }

    #[test]
    fn rejects_degenerate_sensor() {
        let mut spec = MouseSpec::micromouse();
        spec.sensors.get_mut("front").unwrap().range = 0.0;
        let err = Mouse::new(&spec, DVec2::ZERO, open_maze()).unwrap_err();
        assert_eq!(err, CoreError::DegenerateSensorView("front".into()));
    }

    #[test]
    fn zero_input_leaves_pose_unchanged() {
        let mouse = mouse_in(open_maze());
        let before = mouse.pose();
        mouse.update(Duration::from_secs(10));
        assert_eq!(mouse.pose(), before);
    }

    #[test]
    fn equal_speeds_drive_straight_ahead() {
        let mouse = mouse_in(open_maze());
        let start = mouse.translation();
        mouse.set_wheel_speeds(10.0, 10.0);
        mouse.update(Duration::from_millis(500));

        assert_eq!(mouse.rotation(), 0.0);
        let moved = mouse.translation() - start;
        assert_abs_diff_eq!(moved.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(moved.y, rim(10.0) * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn opposite_speeds_pivot_in_place() {
        let mouse = mouse_in(open_maze());
        let start = mouse.translation();
        mouse.set_wheel_speeds(-8.0, 8.0);
        mouse.update(Duration::from_millis(250));

        assert_abs_diff_eq!((mouse.translation() - start).length(), 0.0, epsilon = 1e-12);
        // Right wheel forward, left wheel back: counter-clockwise.
        assert_abs_diff_eq!(mouse.rotation(), 2.0 * rim(8.0) / 0.07 * 0.25, epsilon = 1e-12);
    }

    #[test]
    fn wheel_speeds_round_trip_through_mirrored_axle() {
        let mouse = mouse_in(open_maze());
        mouse.set_wheel_speeds(3.0, -4.0);
        assert_eq!(mouse.wheel_speeds(), (3.0, -4.0));
    }

    #[test]
    fn polygons_follow_the_pose() {
        let mouse = mouse_in(open_maze());
        let body_before = mouse.body_polygon();
        let area = body_before.area();

        mouse.set_wheel_speeds(4.0, 6.0);
        for _ in 0..100 {
            mouse.update(Duration::from_millis(1));
        }

        let body_after = mouse.body_polygon();
        assert_ne!(body_after, body_before);
        assert_abs_diff_eq!(body_after.area(), area, epsilon = 1e-12);
        assert_eq!(mouse.wheel_polygons().len(), 2);
        assert_eq!(mouse.sensor_polygons().len(), 5);
        assert_eq!(mouse.view_polygons().len(), 5);
        assert!(mouse.collision_polygon().contains_point(mouse.translation()));
    }

    #[test]
    fn collision_polygon_encloses_every_part() {
        let mouse = mouse_in(open_maze());
        let hull = mouse.collision_polygon();
        let parts = std::iter::once(mouse.body_polygon())
            .chain(mouse.wheel_polygons())
            .chain(mouse.sensor_polygons());
        for part in parts {
            for v in part.vertices() {
                assert!(hull.contains_point(*v));
            }
        }
    }

    #[test]
    fn read_in_open_maze_is_zero() {
        let mouse = mouse_in(open_maze());
        for name in ["left", "front-left", "front", "front-right", "right"] {
            assert_eq!(mouse.read(name).unwrap(), 0.0, "sensor {name}");
        }
    }

    #[test]
    fn read_sees_surrounding_walls() {
        let maze = Arc::new(Maze::new(&MazeLayout::closed(1, 1), MazeGeometry::default()).unwrap());
        let mouse = mouse_in(maze);
        for name in ["left", "front", "right"] {
            let value = mouse.read(name).unwrap();
            assert!(value > 0.0 && value <= 1.0, "{name} = {value}");
        }
    }

    #[test]
    fn unknown_sensor_is_an_error() {
        let mouse = mouse_in(open_maze());
        assert_eq!(
            mouse.read("rear").unwrap_err(),
            CoreError::UnknownSensor("rear".into())
        );
        assert!(mouse.read_time("rear").is_err());
        assert_eq!(mouse.read_time("front").unwrap(), Duration::from_millis(1));
    }

    #[test]
    fn crash_flag_is_sticky() {
        let mouse = mouse_in(open_maze());
        mouse.set_crashed();
        assert!(mouse.is_crashed());
    }

    proptest! {
        #[test]
        fn split_step_matches_single_step_rotation(
            left in -20.0f64..20.0,
            right in -20.0f64..20.0,
            millis in 1u64..200,
        ) {
            let once = mouse_in(open_maze());
            let twice = mouse_in(open_maze());
            once.set_wheel_speeds(left, right);
            twice.set_wheel_speeds(left, right);

            once.update(Duration::from_millis(2 * millis));
            twice.update(Duration::from_millis(millis));
            twice.update(Duration::from_millis(millis));

            prop_assert!((once.rotation() - twice.rotation()).abs() < 1e-9);
        }

        #[test]
        fn pivot_never_translates(speed in -30.0f64..30.0, millis in 1u64..2000) {
            let mouse = mouse_in(open_maze());
            let start = mouse.translation();
            mouse.set_wheel_speeds(-speed, speed);
            mouse.update(Duration::from_millis(millis));
            prop_assert!((mouse.translation() - start).length() < 1e-12);
        }

        #[test]
        fn straight_line_keeps_heading(speed in -30.0f64..30.0, millis in 1u64..2000) {
            let mouse = mouse_in(open_maze());
            let start = mouse.translation();
            mouse.set_wheel_speeds(speed, speed);
            mouse.update(Duration::from_millis(millis));
            prop_assert_eq!(mouse.rotation(), 0.0);
            let expected = rim(speed) * millis as f64 / 1000.0;
            prop_assert!(((mouse.translation() - start).y - expected).abs() < 1e-9);
        }

        #[test]
        fn small_steps_converge_to_the_arc(left in 1.0f64..10.0, right in 11.0f64..20.0) {
            // Closed-form pose after 0.1 s of constant wheel speeds.
            let (vl, vr) = (rim(left), rim(right));
            let omega = (vr - vl) / 0.07;
            let v = (vr + vl) / 2.0;
            let t = 0.1;
            let radius = v / omega;
            let heading = FORWARD_AXIS + omega * t;
            let exact = DVec2::new(
                radius * (heading.sin() - FORWARD_AXIS.sin()),
                -radius * (heading.cos() - FORWARD_AXIS.cos()),
            );

            let error_after = |steps: u32| {
                let mouse = mouse_in(open_maze());
                let start = mouse.translation();
                mouse.set_wheel_speeds(left, right);
                let dt = Duration::from_secs_f64(t / steps as f64);
                for _ in 0..steps {
                    mouse.update(dt);
                }
                ((mouse.translation() - start) - exact).length()
            };

            prop_assert!(error_after(100) < error_after(10));
        }
    }
}
