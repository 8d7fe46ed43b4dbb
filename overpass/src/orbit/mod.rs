//! Live orbit state over an opaque propagation backend

pub mod scripted;
pub mod sgp4_driver;

pub use scripted::ScriptedPropagator;
pub use sgp4_driver::Sgp4Propagator;

use derive_more::Display;
use nav_types::WGS84;
use tracing::{debug, warn};

use crate::units::{Angle, Length, Timestamp};
use tleproto::ElementSet;

/// The ground location look angles are computed for.
///
/// Mutations must reach the propagation backend before the next
/// propagation, so the single owner pushes every change through
/// [`OrbitTracker::set_observer`].
#[derive(Debug, Copy, Clone)]
pub struct ObserverLocation {
    position: WGS84<f64>,
}

impl ObserverLocation {
    pub fn from_degrees_and_meters(latitude: Angle, longitude: Angle, altitude: Length) -> Self {
        Self {
            position: WGS84::from_degrees_and_meters(
                latitude.as_degrees(),
                longitude.as_degrees(),
                altitude.as_meters(),
            ),
        }
    }

    pub fn latitude(&self) -> Angle {
        Angle::from_degrees(self.position.latitude_degrees())
    }

    pub fn longitude(&self) -> Angle {
        Angle::from_degrees(self.position.longitude_degrees())
    }

    pub fn altitude(&self) -> Length {
        Length::from_meters(self.position.altitude())
    }
}

impl PartialEq for ObserverLocation {
    fn eq(&self, other: &Self) -> bool {
        self.position.latitude_degrees() == other.position.latitude_degrees()
            && self.position.longitude_degrees() == other.position.longitude_degrees()
            && self.position.altitude() == other.position.altitude()
    }
}

/// Topocentric and sub-satellite state at one instant.
///
/// Recomputed on demand; only the most recent result is retained.
#[derive(Copy, Clone, PartialEq, Debug, Display)]
#[display(
    fmt = "{{az: {:.1}°, el: {:.1}°, lat: {:.2}°, lon: {:.2}°, alt: {:.0} km, range: {:.0} km}}",
    "azimuth.as_degrees()",
    "elevation.as_degrees()",
    "latitude.as_degrees()",
    "longitude.as_degrees()",
    "altitude.as_kilometers()",
    "range.as_kilometers()"
)]
pub struct OrbitState {
    pub timestamp: Timestamp,

    /// Compass azimuth from the observer, 0..360 from north
    pub azimuth: Angle,
    /// Signed; positive means above the local horizon
    pub elevation: Angle,
    /// Slant range from the observer
    pub range: Length,

    /// Sub-satellite point, geodetic
    pub latitude: Angle,
    pub longitude: Angle,
    pub altitude: Length,
}

#[derive(Debug, thiserror::Error)]
#[error("element set rejected by the propagation backend: {reason}")]
pub struct ElementsRejected {
    pub reason: String,
}

/// Seam to the opaque orbital-mechanics algorithm.
///
/// Kept object-safe so the pass search and visibility machinery can run
/// against scripted elevation sequences instead of real orbit math.
pub trait Propagator {
    /// Idempotent and safe to call repeatedly, e.g. on every position fix.
    fn set_observer(&mut self, observer: &ObserverLocation);

    /// Replace the loaded element set. On rejection the previously loaded
    /// set (if any) must stay live.
    fn load_elements(&mut self, set: &ElementSet) -> Result<(), ElementsRejected>;

    /// Pure with respect to the loaded elements and observer: the same
    /// timestamp always produces the same state. `None` until both an
    /// element set and an observer are established.
    fn propagate_to(&mut self, t: Timestamp) -> Option<OrbitState>;
}

/// Owns the single propagator instance and its readiness.
///
/// `ready` tracks the last *successful* element load; a rejected reload
/// leaves both the flag and the backend's working set untouched.
pub struct OrbitTracker {
    propagator: Box<dyn Propagator>,
    ready: bool,
    last_state: Option<OrbitState>,
}

impl OrbitTracker {
    pub fn new(propagator: Box<dyn Propagator>) -> Self {
        Self {
            propagator,
            ready: false,
            last_state: None,
        }
    }

    pub fn set_observer(&mut self, observer: &ObserverLocation) {
        self.propagator.set_observer(observer);
    }

    /// Returns true if this element set was accepted by the backend.
    pub fn load_elements(&mut self, set: &ElementSet) -> bool {
        match self.propagator.load_elements(set) {
            Ok(()) => {
                debug!(name = %set.name, "element set loaded");
                self.ready = true;
                true
            }
            Err(e) => {
                warn!(name = %set.name, error = %e, "element set rejected, keeping previous");
                false
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// `None` when no valid element set is loaded; callers surface that
    /// as a degraded-data state rather than consuming garbage.
    pub fn propagate(&mut self, t: Timestamp) -> Option<OrbitState> {
        if !self.ready {
            return None;
        }
        let state = self.propagator.propagate_to(t);
        if let Some(state) = state {
            self.last_state = Some(state);
        }
        state
    }

    pub fn state(&self) -> Option<&OrbitState> {
        self.last_state.as_ref()
    }
}

impl<'a> crate::TrackingComponent<'a> for OrbitTracker {
    type SharedState = crate::system::TrackerSharedState;
    type Environment = crate::system::SystemEnvironment<'a>;

    fn step(
        &mut self,
        _dt: crate::units::Time,
        _env: &'a Self::Environment,
        shared_state: &mut Self::SharedState,
    ) {
        shared_state.orbit = shared_state.epoch.and_then(|epoch| self.propagate(epoch));
    }
}
