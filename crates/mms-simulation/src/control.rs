use std::sync::Arc;
use std::time::Duration;

use mms_core::Mouse;

use crate::error::SimResult;

/// The surface a control agent drives a mouse through.
///
/// Every method takes `&self` so an agent on its own thread can share the
/// mouse with the simulation stepper.
pub trait MouseInterface: Send + Sync {
    /// Set both wheel speeds at once, in rad/s, forward-positive.
    fn set_wheel_speeds(&self, left: f64, right: f64);

    /// Occlusion reading of the named sensor, in `[0, 1]`.
    fn read(&self, sensor: &str) -> SimResult<f64>;

    /// How long a reading of the named sensor takes.
    fn read_time(&self, sensor: &str) -> SimResult<Duration>;

    /// Return `true` once the mouse has hit a wall.
    fn is_crashed(&self) -> bool;
}

impl MouseInterface for Mouse {
    fn set_wheel_speeds(&self, left: f64, right: f64) {
        Mouse::set_wheel_speeds(self, left, right);
    }

    fn read(&self, sensor: &str) -> SimResult<f64> {
        Ok(Mouse::read(self, sensor)?)
    }

    fn read_time(&self, sensor: &str) -> SimResult<Duration> {
        Ok(Mouse::read_time(self, sensor)?)
    }

    fn is_crashed(&self) -> bool {
        Mouse::is_crashed(self)
    }
}

impl<T: MouseInterface + ?Sized> MouseInterface for Arc<T> {
    fn set_wheel_speeds(&self, left: f64, right: f64) {
        (**self).set_wheel_speeds(left, right);
    }

    fn read(&self, sensor: &str) -> SimResult<f64> {
        (**self).read(sensor)
    }

    fn read_time(&self, sensor: &str) -> SimResult<Duration> {
        (**self).read_time(sensor)
    }

    fn is_crashed(&self) -> bool {
        (**self).is_crashed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use glam::DVec2;
    use mms_core::{CoreError, Maze, MazeGeometry, MazeLayout, MouseSpec};

    fn agent_mouse() -> Arc<Mouse> {
        let maze = Arc::new(Maze::new(&MazeLayout::bounded(3, 3), MazeGeometry::default()).unwrap());
        Arc::new(Mouse::new(&MouseSpec::micromouse(), DVec2::splat(0.27), maze).unwrap())
    }

    fn drive(agent: &dyn MouseInterface) {
        agent.set_wheel_speeds(1.0, 2.0);
    }

    #[test]
    fn interface_reaches_the_mouse() {
        let mouse = agent_mouse();
        drive(&mouse);
        assert_eq!(mouse.wheel_speeds(), (1.0, 2.0));
        assert!(!MouseInterface::is_crashed(&mouse));

        let reading = MouseInterface::read(&mouse, "front").unwrap();
        assert!((0.0..=1.0).contains(&reading));
        assert_eq!(
            MouseInterface::read_time(&mouse, "front").unwrap(),
            Duration::from_millis(1)
        );
    }

    #[test]
    fn unknown_sensor_surfaces_core_error() {
        let mouse = agent_mouse();
        let err = MouseInterface::read(&mouse, "rear").unwrap_err();
        assert!(matches!(err, SimError::Core(CoreError::UnknownSensor(name)) if name == "rear"));
    }
}
