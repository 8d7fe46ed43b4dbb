pub extern crate nalgebra as na;

pub mod config;
pub mod orbit;
pub mod predictor;
pub mod system;
pub mod timebase;
pub mod units;
pub mod visibility;

pub trait TrackingComponent<'a> {
    /// The type for state that is shared between multiple components; e.g. the
    /// per-tick epoch, orbit state, and visibility signal.
    type SharedState;

    /// The type for the environment structure that is scoped to this component.
    type Environment;

    fn init(&mut self, _env: &'a Self::Environment, _shared_state: &mut Self::SharedState) {}

    fn reset(&mut self, _env: &'a Self::Environment, _shared_state: &mut Self::SharedState) {}

    fn step(
        &mut self,
        dt: units::Time,
        env: &'a Self::Environment,
        shared_state: &mut Self::SharedState,
    );
}
