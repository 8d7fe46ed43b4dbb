//! A lightweight uom-ish library. The real thing breaks rust-analyzer.
#![allow(dead_code)]

use std::ops::{Add, AddAssign, Sub, SubAssign};

use chrono::{DateTime, Utc};

#[derive(Copy, Clone, PartialEq, PartialOrd)]
pub struct Time {
    seconds: f64,
}

impl std::fmt::Debug for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} s", self.seconds)
    }
}

impl Time {
    pub fn from_hours(hours: f64) -> Time {
        Self::from_minutes(hours * 60.0)
    }

    pub fn from_minutes(minutes: f64) -> Time {
        Self::from_secs(minutes * 60.0)
    }

    pub const fn from_secs(seconds: f64) -> Time {
        Time { seconds }
    }

    pub fn as_secs(&self) -> f64 {
        self.seconds
    }

    pub fn as_minutes(&self) -> f64 {
        self.seconds / 60.0
    }

    pub fn abs(&self) -> Time {
        Time {
            seconds: self.seconds.abs(),
        }
    }
}

impl Add<Time> for Time {
    type Output = Time;

    fn add(self, rhs: Time) -> Self::Output {
        Time::from_secs(self.as_secs() + rhs.as_secs())
    }
}

impl AddAssign<Time> for Time {
    fn add_assign(&mut self, rhs: Time) {
        self.seconds += rhs.as_secs()
    }
}

impl Sub<Time> for Time {
    type Output = Time;

    fn sub(self, rhs: Time) -> Self::Output {
        Time::from_secs(self.as_secs() - rhs.as_secs())
    }
}

/// A point in time as seconds offset from the Unix epoch, UTC.
///
/// All internal time arithmetic happens on this; local-offset conversion
/// exists only at the display edge.
#[derive(Copy, Clone, PartialEq, PartialOrd)]
pub struct Timestamp {
    unix_secs: f64,
}

impl std::fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}s", self.unix_secs)
    }
}

impl Timestamp {
    pub const fn epoch() -> Timestamp {
        Timestamp { unix_secs: 0.0 }
    }

    pub const fn from_unix_secs(unix_secs: f64) -> Timestamp {
        Timestamp { unix_secs }
    }

    pub fn as_unix_secs(&self) -> f64 {
        self.unix_secs
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        let secs = self.unix_secs.floor();
        let nanos = ((self.unix_secs - secs) * 1.0e9) as u32;
        DateTime::from_timestamp(secs as i64, nanos)
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Time;

    fn sub(self, rhs: Timestamp) -> Self::Output {
        Time::from_secs(self.as_unix_secs() - rhs.as_unix_secs())
    }
}

impl Add<Time> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Time) -> Self::Output {
        Timestamp::from_unix_secs(self.as_unix_secs() + rhs.as_secs())
    }
}

impl AddAssign<Time> for Timestamp {
    fn add_assign(&mut self, rhs: Time) {
        self.unix_secs += rhs.as_secs();
    }
}

impl Sub<Time> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Time) -> Self::Output {
        Timestamp::from_unix_secs(self.as_unix_secs() - rhs.as_secs())
    }
}

impl SubAssign<Time> for Timestamp {
    fn sub_assign(&mut self, rhs: Time) {
        self.unix_secs -= rhs.as_secs();
    }
}

#[derive(Copy, Clone, PartialEq, PartialOrd)]
pub struct Angle {
    degrees: f64,
}

impl std::fmt::Debug for Angle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees)
    }
}

impl Angle {
    pub const fn from_degrees(degrees: f64) -> Angle {
        Angle { degrees }
    }

    pub fn from_radians(radians: f64) -> Angle {
        Angle {
            degrees: radians.to_degrees(),
        }
    }

    pub fn as_degrees(&self) -> f64 {
        self.degrees
    }

    pub fn as_radians(&self) -> f64 {
        self.degrees.to_radians()
    }
}

impl Add<Angle> for Angle {
    type Output = Angle;

    fn add(self, rhs: Angle) -> Self::Output {
        Angle::from_degrees(self.as_degrees() + rhs.as_degrees())
    }
}

impl Sub<Angle> for Angle {
    type Output = Angle;

    fn sub(self, rhs: Angle) -> Self::Output {
        Angle::from_degrees(self.as_degrees() - rhs.as_degrees())
    }
}

#[derive(Copy, Clone, PartialEq, PartialOrd)]
pub struct Length {
    meters: f64,
}

impl std::fmt::Debug for Length {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} m", self.meters)
    }
}

impl Length {
    pub const fn from_meters(meters: f64) -> Length {
        Length { meters }
    }

    pub fn from_kilometers(km: f64) -> Length {
        Length {
            meters: km * 1000.0,
        }
    }

    pub fn as_meters(&self) -> f64 {
        self.meters
    }

    pub fn as_kilometers(&self) -> f64 {
        self.meters / 1000.0
    }
}

impl Add<Length> for Length {
    type Output = Length;

    fn add(self, rhs: Length) -> Self::Output {
        Length::from_meters(self.as_meters() + rhs.as_meters())
    }
}

impl Sub<Length> for Length {
    type Output = Length;

    fn sub(self, rhs: Length) -> Self::Output {
        Length::from_meters(self.as_meters() - rhs.as_meters())
    }
}
