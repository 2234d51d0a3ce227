use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clap::ValueEnum;
use mms_simulation::{MouseInterface, SimResult};

/// Wheel speed for cruising, in rad/s.
const CRUISE: f64 = 8.0;
/// Front reading above which the way ahead counts as blocked.
const FRONT_BLOCKED: f64 = 0.8;
/// Side reading below which the side counts as open.
const SIDE_OPEN: f64 = 0.3;
/// Steering gain applied to the left/right reading imbalance.
const CENTERING_GAIN: f64 = 3.0;
/// Real time between agent decisions.
const POLL: Duration = Duration::from_millis(2);

/// Demo control agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgentKind {
    /// Keep a wall on the right, pivot left at dead ends.
    WallFollower,
    /// Drive straight ahead at cruising speed.
    Straight,
}

impl AgentKind {
    /// Start the agent on its own thread. It runs until `stop` is raised or
    /// the mouse crashes.
    pub fn spawn(
        self,
        mouse: Arc<dyn MouseInterface>,
        stop: Arc<AtomicBool>,
    ) -> JoinHandle<SimResult<()>> {
        thread::spawn(move || {
            tracing::debug!(agent = ?self, "agent started");
            let result = match self {
                AgentKind::WallFollower => follow_right_wall(mouse.as_ref(), &stop),
                AgentKind::Straight => drive_straight(mouse.as_ref(), &stop),
            };
            mouse.set_wheel_speeds(0.0, 0.0);
            result
        })
    }
}

fn running(mouse: &dyn MouseInterface, stop: &AtomicBool) -> bool {
    !stop.load(Ordering::Acquire) && !mouse.is_crashed()
}

fn drive_straight(mouse: &dyn MouseInterface, stop: &AtomicBool) -> SimResult<()> {
    mouse.set_wheel_speeds(CRUISE, CRUISE);
    while running(mouse, stop) {
        thread::sleep(POLL);
    }
    Ok(())
}

fn follow_right_wall(mouse: &dyn MouseInterface, stop: &AtomicBool) -> SimResult<()> {
    while running(mouse, stop) {
        let front = mouse.read("front")?;
        let left = mouse.read("left")?;
        let right = mouse.read("right")?;
        let (l, r) = wall_follower_speeds(front, left, right);
        mouse.set_wheel_speeds(l, r);
        thread::sleep(POLL);
    }
    Ok(())
}

/// One wall-follower decision from the front, left and right readings.
fn wall_follower_speeds(front: f64, left: f64, right: f64) -> (f64, f64) {
    if front > FRONT_BLOCKED {
        // Pivot left in place.
        (-CRUISE / 2.0, CRUISE / 2.0)
    } else if right < SIDE_OPEN {
        // Sweep right into the opening.
        (CRUISE, CRUISE * 0.4)
    } else if left < SIDE_OPEN {
        (CRUISE, CRUISE)
    } else {
        let steer = CENTERING_GAIN * (right - left);
        (CRUISE - steer, CRUISE + steer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_front_pivots_left() {
        let (l, r) = wall_follower_speeds(0.95, 0.9, 0.9);
        assert!(l < 0.0 && r > 0.0);
        assert_eq!(l, -r);
    }

    #[test]
    fn open_right_turns_right() {
        let (l, r) = wall_follower_speeds(0.0, 0.9, 0.0);
        assert!(l > r && r > 0.0);
    }

    #[test]
    fn corridor_steers_away_from_closer_wall() {
        let (l, r) = wall_follower_speeds(0.0, 0.85, 0.95);
        assert!(r > l, "closer to the right wall should steer left");

        let (l, r) = wall_follower_speeds(0.0, 0.9, 0.9);
        assert_eq!(l, r);
    }
}
