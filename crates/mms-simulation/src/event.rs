use std::time::Duration;

use mms_core::TileCoord;

/// What kind of simulation event occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEventKind {
    /// A mouse's axle midpoint moved into a different tile.
    TileTraversed {
        /// The mouse that moved.
        mouse: String,
        /// The tile it left.
        from: TileCoord,
        /// The tile it entered.
        to: TileCoord,
    },
    /// A mouse left the origin tile.
    OriginDeparted {
        /// The mouse that left.
        mouse: String,
    },
    /// A mouse entered the center region after leaving the origin.
    CenterReached {
        /// The mouse that arrived.
        mouse: String,
        /// Simulation time since it last left the origin.
        time: Duration,
    },
    /// A mouse's collision polygon touched a wall.
    Crashed {
        /// The mouse that crashed.
        mouse: String,
        /// The tile it crashed in.
        tile: TileCoord,
    },
}

impl SimEventKind {
    /// Name of the mouse this event is about.
    pub fn mouse(&self) -> &str {
        match self {
            Self::TileTraversed { mouse, .. }
            | Self::OriginDeparted { mouse }
            | Self::CenterReached { mouse, .. }
            | Self::Crashed { mouse, .. } => mouse,
        }
    }
}

/// A record of something that happened during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    /// The world step when this event occurred.
    pub tick: u64,
    /// Simulation time when this event occurred.
    pub sim_time: Duration,
    /// The specific kind of event that occurred.
    pub kind: SimEventKind,
    /// A human-readable description of the event.
    pub description: String,
}

impl SimEvent {
    /// Create a new simulation event.
    pub fn new(
        tick: u64,
        sim_time: Duration,
        kind: SimEventKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            tick,
            sim_time,
            kind,
            description: description.into(),
        }
    }
}

/// Accumulates events during a simulation run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Return a slice of all recorded events.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Return all events about the named mouse.
    pub fn events_for_mouse(&self, name: &str) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.kind.mouse() == name).collect()
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn departed(tick: u64, mouse: &str) -> SimEvent {
        SimEvent::new(
            tick,
            Duration::from_millis(tick),
            SimEventKind::OriginDeparted {
                mouse: mouse.into(),
            },
            "left the origin",
        )
    }

    #[test]
    fn event_log_push_and_query() {
        let mut log = EventLog::new(0);
        log.push(departed(1, "a"));
        log.push(departed(2, "b"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.events_for_mouse("a").len(), 1);
        assert!(log.events_for_mouse("c").is_empty());
    }

    #[test]
    fn event_log_max_events_trims() {
        let mut log = EventLog::new(2);
        for i in 0..5 {
            log.push(departed(i, "a"));
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0].tick, 3);
        assert_eq!(log.events()[1].tick, 4);
    }

    #[test]
    fn event_log_clear() {
        let mut log = EventLog::new(0);
        log.push(departed(0, "a"));
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn kind_reports_mouse() {
        let kind = SimEventKind::Crashed {
            mouse: "m".into(),
            tile: TileCoord::ORIGIN,
        };
        assert_eq!(kind.mouse(), "m");
    }
}
