use approx::assert_relative_eq;
use indoc::indoc;

use overpass_lib::{
    orbit::ScriptedPropagator,
    predictor::PassPredictorConfig,
    system::{
        ElementLoadError, SystemEnvironment, TickInputs, TrackerSharedState, TrackingSystem,
        TrackingSystemConfig,
    },
    timebase::{NavFix, TimeBaseConfig},
    units::{Angle, Length, Time, Timestamp},
    visibility::{VisibilityMonitorConfig, VisibilityState},
    TrackingComponent,
};

const ISS_TLE: &str = indoc! {r#"ISS (ZARYA)
    1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
    2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008
    "#};

fn config() -> TrackingSystemConfig {
    TrackingSystemConfig {
        observer: overpass_lib::orbit::ObserverLocation::from_degrees_and_meters(
            Angle::from_degrees(30.22),
            Angle::from_degrees(-92.02),
            Length::from_meters(15.0),
        ),
        min_elevation: Angle::from_degrees(10.0),
        pass_refresh_interval: Time::from_secs(30.0),
        visibility: VisibilityMonitorConfig {
            hold_duration: Time::from_secs(5.0),
        },
        time_base: TimeBaseConfig::default(),
        predictor: PassPredictorConfig::default(),
    }
}

/// Tent-shaped elevation profile peaking at the midpoint of [start, end].
fn tent(start: f64, end: f64, peak: f64) -> impl Fn(Timestamp) -> Angle {
    move |t: Timestamp| {
        let t = t.as_unix_secs();
        if t > start && t < end {
            let mid = (start + end) / 2.0;
            let half = (end - start) / 2.0;
            Angle::from_degrees(peak * (1.0 - (t - mid).abs() / half))
        } else {
            Angle::from_degrees(-10.0)
        }
    }
}

#[test]
fn tick_loop_produces_states_and_visibility() {
    let scripted = ScriptedPropagator::new(tent(10.0, 40.0, 30.0));
    let mut system = TrackingSystem::new(config(), Box::new(scripted));
    system.load_tle(ISS_TLE).unwrap();

    let mut shared = TrackerSharedState::new();
    let first = TickInputs {
        network_epoch: Some(Timestamp::from_unix_secs(0.0)),
        nav_fix: None,
    };
    let rest = TickInputs::default();
    let dt = Time::from_secs(1.0);

    let mut states = Vec::new();
    for iteration in 0..60 {
        let inputs = if iteration == 0 { &first } else { &rest };
        let env = SystemEnvironment { inputs };
        if iteration == 0 {
            system.init(&env, &mut shared);
        }
        system.step(dt, &env, &mut shared);

        let orbit = shared.orbit.expect("ready system produces orbit state");
        states.push((shared.epoch.unwrap(), orbit.elevation, shared.signal.state));
    }

    // Epoch advanced with the ticks
    assert_eq!(states[0].0, Timestamp::from_unix_secs(0.0));
    assert_eq!(states[59].0, Timestamp::from_unix_secs(59.0));

    // Idle before the pass, acquired across it, held briefly after, idle again
    assert_eq!(states[5].2, VisibilityState::Idle);
    assert_eq!(states[25].2, VisibilityState::Acquired);
    assert_eq!(states[41].2, VisibilityState::HoldDown);
    assert_eq!(states[50].2, VisibilityState::Idle);

    // No Idle while the target was above the horizon
    for (_, elevation, state) in &states {
        if elevation.as_degrees() > 0.0 {
            assert_ne!(*state, VisibilityState::Idle);
        }
    }
}

#[test]
fn cached_window_serves_repeat_queries_without_a_search() {
    let scripted = ScriptedPropagator::new(tent(600.0, 1200.0, 45.0));
    let counter = scripted.call_counter();
    let mut system = TrackingSystem::new(config(), Box::new(scripted));
    system.load_tle(ISS_TLE).unwrap();

    let mut shared = TrackerSharedState::new();
    let inputs = TickInputs {
        network_epoch: Some(Timestamp::from_unix_secs(0.0)),
        nav_fix: None,
    };
    let env = SystemEnvironment { inputs: &inputs };
    system.init(&env, &mut shared);
    system.step(Time::from_secs(1.0), &env, &mut shared);

    let before = counter.get();
    let first = system.next_pass().unwrap().unwrap();
    assert!(counter.get() > before, "first query pays for a search");

    let before = counter.get();
    let second = system.next_pass().unwrap().unwrap();
    assert_eq!(counter.get(), before, "repeat query is served from cache");
    assert_eq!(first, second);

    // A threshold change invalidates the cached answer
    system.set_min_elevation(Angle::from_degrees(20.0));
    let before = counter.get();
    system.next_pass().unwrap().unwrap();
    assert!(counter.get() > before);
}

#[test]
fn failed_reload_preserves_a_working_system() {
    let scripted = ScriptedPropagator::new(tent(600.0, 1200.0, 45.0));
    let mut system = TrackingSystem::new(config(), Box::new(scripted));
    system.load_tle(ISS_TLE).unwrap();
    assert!(system.is_ready());
    let loaded_name = system.element_set().unwrap().name.clone();

    // Structurally broken refresh: no second line ending
    let err = system.load_tle("ISS (ZARYA)\n1 25544U").unwrap_err();
    assert!(matches!(err, ElementLoadError::Parse(_)));

    // Exactly as capable as before the attempt
    assert!(system.is_ready());
    assert_eq!(system.element_set().unwrap().name, loaded_name);

    let mut shared = TrackerSharedState::new();
    let inputs = TickInputs {
        network_epoch: Some(Timestamp::from_unix_secs(0.0)),
        nav_fix: None,
    };
    let env = SystemEnvironment { inputs: &inputs };
    system.init(&env, &mut shared);
    system.step(Time::from_secs(1.0), &env, &mut shared);
    assert!(shared.orbit.is_some());
    assert!(system.next_pass().unwrap().is_some());
}

#[test]
fn backend_rejection_is_surfaced_and_leaves_not_ready() {
    let scripted = ScriptedPropagator::new(tent(600.0, 1200.0, 45.0)).rejecting_loads();
    let mut system = TrackingSystem::new(config(), Box::new(scripted));

    let err = system.load_tle(ISS_TLE).unwrap_err();
    assert!(matches!(err, ElementLoadError::Rejected));
    assert!(!system.is_ready());
    assert!(system.element_set().is_none());
    assert!(system.next_pass().is_err());
}

#[test]
fn nav_fix_updates_time_and_observer() {
    let scripted = ScriptedPropagator::new(tent(600.0, 1200.0, 45.0));
    let mut system = TrackingSystem::new(config(), Box::new(scripted));
    system.load_tle(ISS_TLE).unwrap();

    let fix = NavFix {
        year: 2020,
        month: 7,
        day: 13,
        hour: 12,
        minute: 0,
        second: 0,
        latitude: Angle::from_degrees(35.0),
        longitude: Angle::from_degrees(-100.0),
    };
    let inputs = TickInputs {
        network_epoch: None,
        nav_fix: Some(fix),
    };
    let env = SystemEnvironment { inputs: &inputs };
    let mut shared = TrackerSharedState::new();
    system.init(&env, &mut shared);
    system.step(Time::from_secs(1.0), &env, &mut shared);

    // 2020-07-13 12:00:00 UTC
    assert_eq!(shared.epoch, Some(Timestamp::from_unix_secs(1_594_641_600.0)));

    // The fix moved the observer; the altitude stays configured
    assert_relative_eq!(system.observer().latitude().as_degrees(), 35.0);
    assert_relative_eq!(system.observer().longitude().as_degrees(), -100.0);
    assert_relative_eq!(system.observer().altitude().as_meters(), 15.0);
}
