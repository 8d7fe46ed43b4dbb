//! Validated element sets and their display-only orbital elements

use std::ops::Range;

use tracing::debug;

use crate::{parser::ParseError, ECC_IMPLIED_DECIMAL, TLE_LINE_MIN_LEN};

// Line 2 fixed columns (0-based byte ranges)
const INCLINATION: Range<usize> = 8..16;
const RIGHT_ASCENSION: Range<usize> = 17..25;
const ECCENTRICITY: Range<usize> = 26..33;
const ARGUMENT_OF_PERIGEE: Range<usize> = 34..42;
const MEAN_ANOMALY: Range<usize> = 43..51;
const MEAN_MOTION: Range<usize> = 52..63;

/// Classical elements extracted from line 2, for display only.
///
/// The propagation backend re-parses the raw lines itself; these never
/// feed back into the orbit math.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitalElements {
    /// Inclination [deg]
    pub inclination: f64,
    /// Right ascension of the ascending node [deg]
    pub right_ascension: f64,
    /// Eccentricity, normalized to [0, 1)
    pub eccentricity: f64,
    /// Argument of perigee [deg]
    pub argument_of_perigee: f64,
    /// Mean anomaly [deg]
    pub mean_anomaly: f64,
    /// Mean motion [rev/day]
    pub mean_motion: f64,
}

/// A named, validated two-line element set.
///
/// Replaced wholesale on every successful parse and read-only in
/// between; there is no incremental mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSet {
    pub name: String,
    pub line1: String,
    pub line2: String,
    pub elements: OrbitalElements,
}

impl ElementSet {
    pub(crate) fn from_lines(name: &str, line1: &str, line2: &str) -> Result<Self, ParseError> {
        let name = name.trim();
        let line1 = line1.trim_end_matches(|c| c == '\r' || c == '\n');
        let line2 = line2.trim_end_matches(|c| c == '\r' || c == '\n');

        if line1.len() < TLE_LINE_MIN_LEN {
            return Err(ParseError::TooShort {
                line: 1,
                len: line1.len(),
            });
        }
        if line2.len() < TLE_LINE_MIN_LEN {
            return Err(ParseError::TooShort {
                line: 2,
                len: line2.len(),
            });
        }

        let elements = OrbitalElements {
            inclination: field(line2, INCLINATION, "inclination")?,
            right_ascension: field(line2, RIGHT_ASCENSION, "right ascension")?,
            eccentricity: field(line2, ECCENTRICITY, "eccentricity")? / ECC_IMPLIED_DECIMAL,
            argument_of_perigee: field(line2, ARGUMENT_OF_PERIGEE, "argument of perigee")?,
            mean_anomaly: field(line2, MEAN_ANOMALY, "mean anomaly")?,
            mean_motion: field(line2, MEAN_MOTION, "mean motion")?,
        };

        debug!(name, "parsed element set");

        Ok(ElementSet {
            name: name.to_string(),
            line1: line1.to_string(),
            line2: line2.to_string(),
            elements,
        })
    }
}

fn field(line: &str, columns: Range<usize>, name: &'static str) -> Result<f64, ParseError> {
    let raw = line
        .get(columns)
        .ok_or(ParseError::InvalidField { name })?;
    raw.trim()
        .parse()
        .map_err(|_| ParseError::InvalidField { name })
}
