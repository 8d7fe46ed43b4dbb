//! Configuration file handling

use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

use crate::{
    orbit::ObserverLocation,
    predictor::PassPredictorConfig,
    system::TrackingSystemConfig,
    timebase::TimeBaseConfig,
    units::{Angle, Length, Time},
    visibility::VisibilityMonitorConfig,
};

#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub name: Option<String>,

    pub observer: Observer,

    /// Passes peaking below this are not reported [deg, 0..=90]
    pub min_elevation_degrees: u8,

    /// Indicator hold-down after losing the signal [s]
    pub hold_down_seconds: f64,

    /// How long a computed pass window may serve queries [s]
    pub pass_refresh_seconds: f64,

    /// Minimum spacing between navigation time adoptions [s]
    pub nav_resync_seconds: f64,

    /// Display formatting only; all internal time math is UTC
    pub utc_offset_hours: i32,

    /// TLE file loaded at boot
    pub tle_path: Option<PathBuf>,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Observer {
    pub latitude_degrees: f64,
    pub longitude_degrees: f64,
    pub altitude_meters: f64,
}

impl Default for Observer {
    fn default() -> Self {
        Self {
            latitude_degrees: 30.22,
            longitude_degrees: -92.02,
            altitude_meters: 15.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: None,
            observer: Observer::default(),
            min_elevation_degrees: 10,
            hold_down_seconds: 5.0,
            pass_refresh_seconds: 30.0,
            nav_resync_seconds: 60.0,
            utc_offset_hours: -6,
            tle_path: None,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let content = fs::read_to_string(path).expect("Failed to read config file");
        Self::from_str_checked(&content)
    }

    pub fn from_str_checked(s: &str) -> Self {
        let cfg: Config = toml::from_str(s).expect("Failed to parse config file");

        assert!(
            cfg.min_elevation_degrees <= 90,
            "min-elevation-degrees must be within 0..=90"
        );
        assert!(
            cfg.observer.latitude_degrees.abs() <= 90.0,
            "observer latitude-degrees must be within -90..=90"
        );
        assert!(
            cfg.observer.longitude_degrees.abs() <= 180.0,
            "observer longitude-degrees must be within -180..=180"
        );
        assert!(
            cfg.hold_down_seconds >= 0.0,
            "hold-down-seconds must not be negative"
        );
        assert!(
            cfg.pass_refresh_seconds >= 0.0,
            "pass-refresh-seconds must not be negative"
        );
        assert!(
            cfg.nav_resync_seconds >= 0.0,
            "nav-resync-seconds must not be negative"
        );

        cfg
    }

    pub fn observer_location(&self) -> ObserverLocation {
        ObserverLocation::from_degrees_and_meters(
            Angle::from_degrees(self.observer.latitude_degrees),
            Angle::from_degrees(self.observer.longitude_degrees),
            Length::from_meters(self.observer.altitude_meters),
        )
    }

    pub fn tracking_config(&self) -> TrackingSystemConfig {
        TrackingSystemConfig {
            observer: self.observer_location(),
            min_elevation: Angle::from_degrees(f64::from(self.min_elevation_degrees)),
            pass_refresh_interval: Time::from_secs(self.pass_refresh_seconds),
            visibility: VisibilityMonitorConfig {
                hold_duration: Time::from_secs(self.hold_down_seconds),
            },
            time_base: TimeBaseConfig {
                nav_resync_interval: Time::from_secs(self.nav_resync_seconds),
                ..TimeBaseConfig::default()
            },
            predictor: PassPredictorConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn defaults_when_keys_are_absent() {
        let cfg = Config::from_str_checked("");
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.min_elevation_degrees, 10);
    }

    #[test]
    fn kebab_case_keys() {
        let cfg = Config::from_str_checked(indoc! {r#"
            name = "station"
            min-elevation-degrees = 25
            utc-offset-hours = 2

            [observer]
            latitude-degrees = 48.2
            longitude-degrees = 16.37
            altitude-meters = 190.0
        "#});
        assert_eq!(cfg.name.as_deref(), Some("station"));
        assert_eq!(cfg.min_elevation_degrees, 25);
        assert_eq!(cfg.utc_offset_hours, 2);
        assert_eq!(cfg.observer.latitude_degrees, 48.2);
    }

    #[test]
    #[should_panic(expected = "min-elevation-degrees")]
    fn rejects_out_of_range_threshold() {
        Config::from_str_checked("min-elevation-degrees = 91");
    }

    #[test]
    #[should_panic(expected = "latitude-degrees")]
    fn rejects_out_of_range_latitude() {
        Config::from_str_checked(indoc! {r#"
            [observer]
            latitude-degrees = 123.0
        "#});
    }
}
