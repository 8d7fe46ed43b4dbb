//! Bounded forward search for the next qualifying pass

use tracing::debug;

use crate::{
    orbit::{ObserverLocation, OrbitTracker},
    units::{Angle, Time, Timestamp},
};

/// Search step. Acquisition and loss timestamps are only accurate to
/// this; they are reported at minute precision, and a pass shorter than
/// the step is not a practical target.
pub const SEARCH_STEP: Time = Time::from_secs(30.0);

/// How far ahead of the start epoch the search is allowed to look.
pub const SEARCH_HORIZON: Time = Time::from_secs(86_400.0);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictError {
    /// No valid element set and observer are established. Surfaced to the
    /// caller, never retried internally.
    #[error("propagator is not ready")]
    NotReady,
}

/// A single predicted visibility window.
///
/// Valid until its loss epoch passes or any search input changes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PassWindow {
    /// Acquisition of signal
    pub aos: Timestamp,
    /// Loss of signal
    pub los: Timestamp,
    /// Peak elevation observed across the pass
    pub max_elevation: Angle,
}

impl PassWindow {
    pub fn duration(&self) -> Time {
        self.los - self.aos
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration().as_minutes()
    }
}

#[derive(Debug, Copy, Clone)]
pub struct PassPredictorConfig {
    pub step: Time,
    pub horizon: Time,
}

impl Default for PassPredictorConfig {
    fn default() -> Self {
        Self {
            step: SEARCH_STEP,
            horizon: SEARCH_HORIZON,
        }
    }
}

pub struct PassPredictor {
    config: PassPredictorConfig,
}

impl PassPredictor {
    pub fn new(config: PassPredictorConfig) -> Self {
        Self { config }
    }

    /// Scan forward from `from` for the next pass whose peak elevation
    /// reaches `min_elevation`. `Ok(None)` means the horizon was
    /// exhausted, which is an expected outcome rather than a fault.
    ///
    /// The shared propagator is always restored to `from` before
    /// returning, so the search never leaves it at an arbitrary future
    /// epoch.
    pub fn next_pass(
        &self,
        tracker: &mut OrbitTracker,
        from: Timestamp,
        min_elevation: Angle,
    ) -> Result<Option<PassWindow>, PredictError> {
        if !tracker.is_ready() {
            return Err(PredictError::NotReady);
        }

        let result = self.scan(tracker, from, min_elevation);
        tracker.propagate(from);
        result
    }

    fn scan(
        &self,
        tracker: &mut OrbitTracker,
        from: Timestamp,
        min_elevation: Angle,
    ) -> Result<Option<PassWindow>, PredictError> {
        let horizon_end = from + self.config.horizon;
        let mut t = from;

        // Already above the horizon: run out the in-progress pass first,
        // otherwise it would be reported as "next".
        if elevation_at(tracker, t)?.as_degrees() > 0.0 {
            while t < horizon_end {
                if elevation_at(tracker, t)?.as_degrees() < 0.0 {
                    break;
                }
                t += self.config.step;
            }
        }

        let mut in_pass = false;
        let mut aos = t;
        let mut peak = Angle::from_degrees(f64::NEG_INFINITY);

        while t < horizon_end {
            let elevation = elevation_at(tracker, t)?;

            if !in_pass && elevation.as_degrees() > 0.0 {
                in_pass = true;
                aos = t;
                peak = elevation;
            } else if in_pass && elevation.as_degrees() > 0.0 {
                if elevation > peak {
                    peak = elevation;
                }
            } else if in_pass && elevation.as_degrees() < 0.0 {
                if peak >= min_elevation {
                    debug!(?aos, los = ?t, ?peak, "pass found");
                    return Ok(Some(PassWindow {
                        aos,
                        los: t,
                        max_elevation: peak,
                    }));
                }
                // Pass peaked too low; keep scanning the remaining horizon
                in_pass = false;
                peak = Angle::from_degrees(f64::NEG_INFINITY);
            }

            t += self.config.step;
        }

        debug!(?from, ?min_elevation, "no qualifying pass within the horizon");
        Ok(None)
    }
}

fn elevation_at(tracker: &mut OrbitTracker, t: Timestamp) -> Result<Angle, PredictError> {
    tracker
        .propagate(t)
        .map(|state| state.elevation)
        .ok_or(PredictError::NotReady)
}

/// Remembers the last computed window together with the inputs that
/// produced it, so redraw-rate callers don't pay for a fresh
/// O(horizon/step) search on every query.
#[derive(Default)]
pub struct PassCache {
    entry: Option<CacheEntry>,
}

struct CacheEntry {
    window: PassWindow,
    searched_at: Timestamp,
    min_elevation: Angle,
    observer: ObserverLocation,
}

impl PassCache {
    pub fn store(
        &mut self,
        window: PassWindow,
        searched_at: Timestamp,
        min_elevation: Angle,
        observer: ObserverLocation,
    ) {
        self.entry = Some(CacheEntry {
            window,
            searched_at,
            min_elevation,
            observer,
        });
    }

    /// The cached window, only while every input that could change the
    /// answer is unchanged and the window is still upcoming.
    pub fn fresh(
        &self,
        now: Timestamp,
        min_elevation: Angle,
        observer: &ObserverLocation,
        refresh_interval: Time,
    ) -> Option<PassWindow> {
        let entry = self.entry.as_ref()?;
        let age = now - entry.searched_at;
        if age.as_secs() < 0.0 || age >= refresh_interval {
            return None;
        }
        if entry.window.los <= now {
            return None;
        }
        if entry.min_elevation != min_elevation || entry.observer != *observer {
            return None;
        }
        Some(entry.window)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
