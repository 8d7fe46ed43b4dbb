//! Parsing and validation for two-line element set (TLE) text records
//! https://en.wikipedia.org/wiki/Two-line_element_set

pub use crate::element_set::{ElementSet, OrbitalElements};
pub use crate::parser::{parse_element_set, ParseError};

pub mod element_set;
pub mod parser;

/// Minimum usable element line length: enough columns to reach the
/// checksum position of the standard fixed-width layout.
pub const TLE_LINE_MIN_LEN: usize = 69;

/// The eccentricity field carries an implied leading decimal point.
pub const ECC_IMPLIED_DECIMAL: f64 = 1.0e7;
