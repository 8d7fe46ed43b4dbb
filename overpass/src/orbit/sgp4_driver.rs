//! Production propagation backend over the published SGP4 model.
//!
//! The model itself comes from the `sgp4` crate; this module only turns
//! its TEME-frame predictions into observer look angles and the
//! sub-satellite point.

use chrono::NaiveDateTime;
use tracing::warn;

use super::{ElementsRejected, ObserverLocation, OrbitState, Propagator};
use crate::units::{Angle, Length, Timestamp};
use tleproto::ElementSet;

// WGS84 flattening factor
const FLATTENING: f64 = 1.0 / 298.26;

struct LoadedElements {
    elements: sgp4::Elements,
    constants: sgp4::Constants,
    /// TLE reference epoch as Unix seconds
    epoch_unix_secs: f64,
}

#[derive(Default)]
pub struct Sgp4Propagator {
    observer: Option<ObserverLocation>,
    loaded: Option<LoadedElements>,
}

impl Sgp4Propagator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Propagator for Sgp4Propagator {
    fn set_observer(&mut self, observer: &ObserverLocation) {
        self.observer = Some(*observer);
    }

    fn load_elements(&mut self, set: &ElementSet) -> Result<(), ElementsRejected> {
        // Build the full replacement before touching `self.loaded`, so a
        // rejection cannot strand a half-loaded state.
        let elements = sgp4::Elements::from_tle(
            Some(set.name.clone()),
            set.line1.as_bytes(),
            set.line2.as_bytes(),
        )
        .map_err(|e| ElementsRejected {
            reason: e.to_string(),
        })?;
        let constants = sgp4::Constants::from_elements(&elements).map_err(|e| ElementsRejected {
            reason: e.to_string(),
        })?;
        let epoch_unix_secs = elements.datetime.and_utc().timestamp_millis() as f64 / 1.0e3;

        self.loaded = Some(LoadedElements {
            elements,
            constants,
            epoch_unix_secs,
        });
        Ok(())
    }

    fn propagate_to(&mut self, t: Timestamp) -> Option<OrbitState> {
        let observer = self.observer?;
        let loaded = self.loaded.as_ref()?;
        let datetime = t.as_datetime()?.naive_utc();

        let minutes = (t.as_unix_secs() - loaded.epoch_unix_secs) / 60.0;
        let prediction = match loaded.constants.propagate(sgp4::MinutesSinceEpoch(minutes)) {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    norad_id = loaded.elements.norad_id,
                    error = %e,
                    "propagation failed"
                );
                return None;
            }
        };

        let gmst = sidereal_time(&datetime);
        let sat_teme = na::Vector3::from(prediction.position);
        let (latitude, longitude, altitude_km) = geodetic_subpoint(&sat_teme, gmst);
        let range_teme = sat_teme - observer_teme(&observer, gmst);
        let (azimuth, elevation, range) = look_angles(&observer, gmst, &range_teme);

        Some(OrbitState {
            timestamp: t,
            azimuth,
            elevation,
            range,
            latitude: Angle::from_degrees(latitude),
            longitude: Angle::from_degrees(longitude),
            altitude: Length::from_kilometers(altitude_km),
        })
    }
}

/// Greenwich mean sidereal time [rad] at a UTC instant.
fn sidereal_time(datetime: &NaiveDateTime) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(datetime))
}

/// Observer position in the TEME frame [km], flattening-corrected.
fn observer_teme(observer: &ObserverLocation, gmst: f64) -> na::Vector3<f64> {
    let lat = observer.latitude().as_radians();
    let lon = observer.longitude().as_radians();
    let alt_km = observer.altitude().as_kilometers();

    // Local mean sidereal time for the observer's longitude
    let theta = wrap_two_pi(gmst + lon);

    let c = 1.0 / (1.0 + FLATTENING * (FLATTENING - 2.0) * lat.sin().powi(2)).sqrt();
    let s = (1.0 - FLATTENING).powi(2) * c;
    let achcp = (sgp4::WGS84.ae * c + alt_km) * lat.cos();

    na::Vector3::new(
        achcp * theta.cos(),
        achcp * theta.sin(),
        (sgp4::WGS84.ae * s + alt_km) * lat.sin(),
    )
}

/// Rotate a TEME range vector into the observer's south-east-zenith frame
/// and read the look angles off it.
fn look_angles(
    observer: &ObserverLocation,
    gmst: f64,
    range_teme: &na::Vector3<f64>,
) -> (Angle, Angle, Length) {
    let lat = observer.latitude().as_radians();
    let theta = wrap_two_pi(gmst + observer.longitude().as_radians());
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();

    let top_s = sin_lat * cos_theta * range_teme.x + sin_lat * sin_theta * range_teme.y
        - cos_lat * range_teme.z;
    let top_e = -sin_theta * range_teme.x + cos_theta * range_teme.y;
    let top_z = cos_lat * cos_theta * range_teme.x
        + cos_lat * sin_theta * range_teme.y
        + sin_lat * range_teme.z;

    let range_km = range_teme.norm();
    let mut azimuth = top_e.atan2(-top_s).to_degrees();
    if azimuth < 0.0 {
        azimuth += 360.0;
    }
    let elevation = (top_z / range_km).asin().to_degrees();

    (
        Angle::from_degrees(azimuth),
        Angle::from_degrees(elevation),
        Length::from_kilometers(range_km),
    )
}

/// Geodetic sub-satellite point from a TEME position, by iterative
/// latitude recovery.
fn geodetic_subpoint(position: &na::Vector3<f64>, gmst: f64) -> (f64, f64, f64) {
    let theta = position.y.atan2(position.x);
    let r = (position.x * position.x + position.y * position.y).sqrt();
    let e2 = FLATTENING * (2.0 - FLATTENING);

    let lon = wrap_pi(theta - gmst);
    let mut lat = position.z.atan2(r);
    let mut c = 1.0;
    for _ in 0..10 {
        let phi = lat;
        c = 1.0 / (1.0 - e2 * phi.sin() * phi.sin()).sqrt();
        lat = (position.z + sgp4::WGS84.ae * c * e2 * phi.sin()).atan2(r);
        if (lat - phi).abs() < 1e-10 {
            break;
        }
    }
    let alt = r / lat.cos() - sgp4::WGS84.ae * c;

    (lat.to_degrees(), lon.to_degrees(), alt)
}

fn float_mod(x: f64, y: f64) -> f64 {
    if y == 0.0 {
        return x;
    }
    x - y * (x / y).floor()
}

fn wrap_two_pi(value: f64) -> f64 {
    float_mod(value, 2.0 * std::f64::consts::PI)
}

fn wrap_pi(value: f64) -> f64 {
    float_mod(value + std::f64::consts::PI, 2.0 * std::f64::consts::PI) - std::f64::consts::PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const ISS_TLE: &str = indoc! {r#"ISS (ZARYA)
        1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
        2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008
        "#};

    // 2020-07-13 12:00:00 UTC, shortly after the fixture's epoch
    const T0: f64 = 1_594_641_600.0;

    fn observer() -> ObserverLocation {
        ObserverLocation::from_degrees_and_meters(
            Angle::from_degrees(30.22),
            Angle::from_degrees(-92.02),
            Length::from_meters(15.0),
        )
    }

    fn loaded_driver() -> Sgp4Propagator {
        let set = tleproto::parse_element_set(ISS_TLE).unwrap();
        let mut driver = Sgp4Propagator::new();
        driver.set_observer(&observer());
        driver.load_elements(&set).unwrap();
        driver
    }

    #[test]
    fn not_ready_without_elements() {
        let mut driver = Sgp4Propagator::new();
        driver.set_observer(&observer());
        assert!(driver
            .propagate_to(Timestamp::from_unix_secs(T0))
            .is_none());
    }

    #[test]
    fn propagation_is_deterministic() {
        let mut driver = loaded_driver();
        let t = Timestamp::from_unix_secs(T0);
        let a = driver.propagate_to(t).unwrap();
        let b = driver.propagate_to(t).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn state_is_physical() {
        let mut driver = loaded_driver();
        for minute in 0..90 {
            let t = Timestamp::from_unix_secs(T0 + f64::from(minute) * 60.0);
            let state = driver.propagate_to(t).unwrap();
            assert!(state.latitude.as_degrees().abs() <= 52.0, "inclination bound");
            assert!(state.longitude.as_degrees().abs() <= 180.0);
            assert!(state.azimuth.as_degrees() >= 0.0 && state.azimuth.as_degrees() < 360.0);
            assert!(state.elevation.as_degrees().abs() <= 90.0);
            // LEO altitude band
            assert!(state.altitude.as_kilometers() > 200.0);
            assert!(state.altitude.as_kilometers() < 1000.0);
            assert!(state.range.as_kilometers() > state.altitude.as_kilometers() * 0.9);
        }
    }

    #[test]
    fn bad_checksum_is_rejected() {
        let raw = ISS_TLE.replace("236008", "236009");
        let set = tleproto::parse_element_set(&raw).unwrap();
        let mut driver = loaded_driver();
        assert!(driver.load_elements(&set).is_err());
        // The previous working set stays live
        assert!(driver
            .propagate_to(Timestamp::from_unix_secs(T0))
            .is_some());
    }
}
