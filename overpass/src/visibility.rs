//! Debounced visibility signal over the horizon crossing.
//!
//! Drives a binary indicator without flicker: losing the target starts a
//! short hold-down grace period instead of dropping straight back to
//! idle, and re-acquiring inside that period carries no penalty.

use tracing::debug;

use crate::units::{Angle, Time, Timestamp};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VisibilityState {
    /// Below the horizon, no recent acquisition
    Idle,
    /// Above the horizon
    Acquired,
    /// Recently lost; holding the indicator until the grace period lapses
    HoldDown,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VisibilitySignal {
    pub state: VisibilityState,
    /// When the grace period lapses, while in `HoldDown`
    pub hold_down_expiry: Option<Timestamp>,
}

#[derive(Debug, Copy, Clone)]
pub struct VisibilityMonitorConfig {
    /// How long a lost signal is held before the indicator goes idle
    pub hold_duration: Time,
}

impl Default for VisibilityMonitorConfig {
    fn default() -> Self {
        Self {
            hold_duration: Time::from_secs(5.0),
        }
    }
}

pub struct VisibilityMonitor {
    config: VisibilityMonitorConfig,
    state: VisibilityState,
    hold_down_expiry: Option<Timestamp>,
}

impl VisibilityMonitor {
    pub fn new(config: VisibilityMonitorConfig) -> Self {
        Self {
            config,
            state: VisibilityState::Idle,
            hold_down_expiry: None,
        }
    }

    pub fn signal(&self) -> VisibilitySignal {
        VisibilitySignal {
            state: self.state,
            hold_down_expiry: self.hold_down_expiry,
        }
    }

    pub fn reset(&mut self) {
        self.state = VisibilityState::Idle;
        self.hold_down_expiry = None;
    }

    /// Evaluated once per propagation tick, not once per query, so the
    /// hold timing is tied to the tick cadence.
    pub fn update(&mut self, now: Timestamp, elevation: Angle) -> VisibilityState {
        use VisibilityState::*;

        let above = elevation.as_degrees() > 0.0;
        match (self.state, above) {
            (Idle, true) => {
                debug!(?now, ?elevation, "signal acquired");
                self.state = Acquired;
            }
            (Acquired, false) => {
                let expiry = now + self.config.hold_duration;
                debug!(?now, ?expiry, "signal lost, holding");
                self.state = HoldDown;
                self.hold_down_expiry = Some(expiry);
            }
            (HoldDown, true) => {
                debug!(?now, "signal re-acquired inside hold-down");
                self.state = Acquired;
                self.hold_down_expiry = None;
            }
            (HoldDown, false) => {
                if self.hold_down_expiry.is_some_and(|expiry| now >= expiry) {
                    debug!(?now, "hold-down lapsed");
                    self.state = Idle;
                    self.hold_down_expiry = None;
                }
            }
            (Idle, false) | (Acquired, true) => (),
        }

        self.state
    }
}

impl<'a> crate::TrackingComponent<'a> for VisibilityMonitor {
    type SharedState = crate::system::TrackerSharedState;
    type Environment = crate::system::SystemEnvironment<'a>;

    fn reset(&mut self, _env: &'a Self::Environment, shared_state: &mut Self::SharedState) {
        VisibilityMonitor::reset(self);
        shared_state.signal = self.signal();
    }

    fn step(
        &mut self,
        _dt: Time,
        _env: &'a Self::Environment,
        shared_state: &mut Self::SharedState,
    ) {
        if let (Some(epoch), Some(orbit)) = (shared_state.epoch, shared_state.orbit.as_ref()) {
            self.update(epoch, orbit.elevation);
        }
        shared_state.signal = self.signal();
    }
}
