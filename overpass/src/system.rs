//! The whole tracking system: time base, orbit state, pass prediction,
//! and the visibility signal, stepped in sequence by one control loop.

use tleproto::ElementSet;

use crate::{
    orbit::{ObserverLocation, OrbitState, OrbitTracker, Propagator},
    predictor::{PassCache, PassPredictor, PassPredictorConfig, PassWindow, PredictError},
    timebase::{NavFix, TimeBase, TimeBaseConfig},
    units::{Angle, Time, Timestamp},
    visibility::{VisibilityMonitor, VisibilityMonitorConfig, VisibilitySignal, VisibilityState},
    TrackingComponent,
};

/// External signals offered to one control loop tick.
#[derive(Debug, Clone, Default)]
pub struct TickInputs {
    /// Wall-clock epoch from the network time service, when available
    pub network_epoch: Option<Timestamp>,
    /// Most recent satellite-navigation fix, when available
    pub nav_fix: Option<NavFix>,
}

#[derive(Debug, Clone)]
pub struct SystemEnvironment<'a> {
    pub inputs: &'a TickInputs,
}

/// Information that all components have (mutable) access to during
/// their step function.
#[derive(Debug, Clone)]
pub struct TrackerSharedState {
    /// Current epoch, written by the time base; `None` until synchronized
    pub epoch: Option<Timestamp>,
    /// Most recent propagated state; `None` while degraded
    pub orbit: Option<OrbitState>,
    /// Debounced indicator signal
    pub signal: VisibilitySignal,
}

impl Default for TrackerSharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerSharedState {
    pub fn new() -> Self {
        Self {
            epoch: None,
            orbit: None,
            signal: VisibilitySignal {
                state: VisibilityState::Idle,
                hold_down_expiry: None,
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ElementLoadError {
    #[error(transparent)]
    Parse(#[from] tleproto::ParseError),
    /// Structurally valid text that the propagation backend refused
    #[error("element set rejected by the propagation backend")]
    Rejected,
}

#[derive(Debug, Copy, Clone)]
pub struct TrackingSystemConfig {
    pub observer: ObserverLocation,
    /// Passes peaking below this are not worth reporting
    pub min_elevation: Angle,
    /// How long a cached pass window may serve queries
    pub pass_refresh_interval: Time,
    pub visibility: VisibilityMonitorConfig,
    pub time_base: TimeBaseConfig,
    pub predictor: PassPredictorConfig,
}

pub struct TrackingSystem {
    config: TrackingSystemConfig,

    time_base: TimeBase,
    tracker: OrbitTracker,
    predictor: PassPredictor,
    pass_cache: PassCache,
    visibility: VisibilityMonitor,

    element_set: Option<ElementSet>,
}

impl TrackingSystem {
    pub fn new(config: TrackingSystemConfig, propagator: Box<dyn Propagator>) -> Self {
        let mut tracker = OrbitTracker::new(propagator);
        tracker.set_observer(&config.observer);

        Self {
            time_base: TimeBase::new(config.time_base),
            predictor: PassPredictor::new(config.predictor),
            pass_cache: PassCache::default(),
            visibility: VisibilityMonitor::new(config.visibility),
            element_set: None,
            tracker,
            config,
        }
    }

    /// Replace the element set from raw TLE text.
    ///
    /// Atomic from the caller's point of view: any failure leaves the
    /// previous set, the readiness flag, and the backend's working
    /// elements untouched.
    pub fn load_tle(&mut self, raw: &str) -> Result<(), ElementLoadError> {
        let set = tleproto::parse_element_set(raw)?;
        if !self.tracker.load_elements(&set) {
            return Err(ElementLoadError::Rejected);
        }
        self.pass_cache.invalidate();
        self.element_set = Some(set);
        Ok(())
    }

    /// Idempotent; a repeated identical location (e.g. from every
    /// navigation fix) leaves the pass cache alone.
    pub fn set_observer(&mut self, observer: ObserverLocation) {
        if self.config.observer == observer {
            return;
        }
        self.config.observer = observer;
        self.tracker.set_observer(&observer);
        self.pass_cache.invalidate();
    }

    pub fn set_min_elevation(&mut self, min_elevation: Angle) {
        self.config.min_elevation = min_elevation;
    }

    pub fn observer(&self) -> &ObserverLocation {
        &self.config.observer
    }

    pub fn min_elevation(&self) -> Angle {
        self.config.min_elevation
    }

    pub fn element_set(&self) -> Option<&ElementSet> {
        self.element_set.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.tracker.is_ready()
    }

    pub fn current_epoch(&self) -> Option<Timestamp> {
        self.time_base.current_epoch()
    }

    /// The next pass peaking at or above the configured minimum
    /// elevation, served from cache while every input that could change
    /// the answer is unchanged.
    pub fn next_pass(&mut self) -> Result<Option<PassWindow>, PredictError> {
        let now = self
            .time_base
            .current_epoch()
            .ok_or(PredictError::NotReady)?;

        if let Some(window) = self.pass_cache.fresh(
            now,
            self.config.min_elevation,
            &self.config.observer,
            self.config.pass_refresh_interval,
        ) {
            return Ok(Some(window));
        }

        let found = self
            .predictor
            .next_pass(&mut self.tracker, now, self.config.min_elevation)?;
        if let Some(window) = found {
            self.pass_cache
                .store(window, now, self.config.min_elevation, self.config.observer);
        }
        Ok(found)
    }
}

impl<'a> TrackingComponent<'a> for TrackingSystem {
    type SharedState = TrackerSharedState;
    type Environment = SystemEnvironment<'a>;

    fn init(&mut self, env: &'a Self::Environment, shared_state: &mut Self::SharedState) {
        self.time_base.init(env, shared_state);
        self.tracker.init(env, shared_state);
        self.visibility.init(env, shared_state);
        shared_state.signal = self.visibility.signal();
    }

    fn reset(&mut self, env: &'a Self::Environment, shared_state: &mut Self::SharedState) {
        self.time_base.reset(env, shared_state);
        self.tracker.reset(env, shared_state);
        TrackingComponent::reset(&mut self.visibility, env, shared_state);
        self.pass_cache.invalidate();
    }

    fn step(&mut self, dt: Time, env: &'a Self::Environment, shared_state: &mut Self::SharedState) {
        self.time_base.step(dt, env, shared_state);

        // A navigation fix carries a ground position; altitude stays the
        // configured constant.
        if let Some(fix) = &env.inputs.nav_fix {
            let observer = ObserverLocation::from_degrees_and_meters(
                fix.latitude,
                fix.longitude,
                self.config.observer.altitude(),
            );
            self.set_observer(observer);
        }

        self.tracker.step(dt, env, shared_state);
        self.visibility.step(dt, env, shared_state);
    }
}
