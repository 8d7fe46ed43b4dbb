//! Scripted propagation backend.
//!
//! Returns elevation as a pure function of the requested timestamp, so
//! the pass search and the visibility machinery can be exercised against
//! known profiles without real orbital mechanics. The shared call counter
//! lets tests assert how many propagations a code path actually paid for.

use std::{cell::Cell, rc::Rc};

use super::{ElementsRejected, ObserverLocation, OrbitState, Propagator};
use crate::units::{Angle, Length, Timestamp};
use tleproto::ElementSet;

pub struct ScriptedPropagator {
    elevation: Box<dyn Fn(Timestamp) -> Angle>,
    observer: Option<ObserverLocation>,
    reject_loads: bool,
    calls: Rc<Cell<u64>>,
}

impl ScriptedPropagator {
    pub fn new(elevation: impl Fn(Timestamp) -> Angle + 'static) -> Self {
        Self {
            elevation: Box::new(elevation),
            observer: None,
            reject_loads: false,
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Refuse every element load, for exercising failed-reload paths.
    pub fn rejecting_loads(mut self) -> Self {
        self.reject_loads = true;
        self
    }

    /// Counts every `propagate_to` call, shared with the caller.
    pub fn call_counter(&self) -> Rc<Cell<u64>> {
        self.calls.clone()
    }
}

impl Propagator for ScriptedPropagator {
    fn set_observer(&mut self, observer: &ObserverLocation) {
        self.observer = Some(*observer);
    }

    fn load_elements(&mut self, set: &ElementSet) -> Result<(), ElementsRejected> {
        if self.reject_loads {
            return Err(ElementsRejected {
                reason: format!("scripted rejection of '{}'", set.name),
            });
        }
        Ok(())
    }

    fn propagate_to(&mut self, t: Timestamp) -> Option<OrbitState> {
        self.observer?;
        self.calls.set(self.calls.get() + 1);
        Some(OrbitState {
            timestamp: t,
            azimuth: Angle::from_degrees(0.0),
            elevation: (self.elevation)(t),
            range: Length::from_kilometers(1000.0),
            latitude: Angle::from_degrees(0.0),
            longitude: Angle::from_degrees(0.0),
            altitude: Length::from_kilometers(400.0),
        })
    }
}
