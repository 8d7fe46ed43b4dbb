//! A very simplistic parser for raw TLE text records

use nom::{
    character::complete::{line_ending, not_line_ending},
    combinator::opt,
};

use crate::{element_set::ElementSet, TLE_LINE_MIN_LEN};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The input doesn't split into a name line and two element lines
    #[error("TLE text is missing a name line and two element lines")]
    MalformedInput,
    /// An element line ends before the checksum column
    #[error("element line {line} is {len} characters, expected at least {min}", min = TLE_LINE_MIN_LEN)]
    TooShort { line: u8, len: usize },
    /// A fixed-column field of line 2 isn't a decimal number
    #[error("element field '{name}' is not a decimal number")]
    InvalidField { name: &'static str },
}

type Result<I, O, E = nom::error::Error<I>> = std::result::Result<(I, O), nom::Err<E>>;

fn record(s: &str) -> Result<&str, (&str, &str, &str)> {
    let (s, name) = not_line_ending(s)?;
    let (s, _) = line_ending(s)?;
    let (s, line1) = not_line_ending(s)?;
    let (s, _) = line_ending(s)?;
    let (s, line2) = not_line_ending(s)?;
    let (s, _) = opt(line_ending)(s)?;
    Ok((s, (name, line1, line2)))
}

/// Splits a raw record on its first two line endings and validates the
/// element lines.
///
/// Parsing is pure: the caller decides whether to replace its previous
/// element set, so a failed refresh never clobbers a working one.
pub fn parse_element_set(raw: &str) -> std::result::Result<ElementSet, ParseError> {
    let (_, (name, line1, line2)) = record(raw).map_err(|_| ParseError::MalformedInput)?;
    ElementSet::from_lines(name, line1, line2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const ISS_TLE: &str = indoc! {r#"ISS (ZARYA)
        1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
        2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008
        "#};

    #[test]
    fn parse_three_line_record() {
        let set = parse_element_set(ISS_TLE).unwrap();
        assert_eq!(set.name, "ISS (ZARYA)");
        assert!(set.line1.starts_with("1 25544U"));
        assert!(set.line2.starts_with("2 25544"));
        assert_eq!(set.line1.len(), 69);
        assert_eq!(set.line2.len(), 69);
    }

    #[test]
    fn display_elements_from_fixed_columns() {
        let set = parse_element_set(ISS_TLE).unwrap();
        let elements = set.elements;
        assert_eq!(elements.inclination, 51.6461);
        assert_eq!(elements.right_ascension, 221.2784);
        assert_eq!(elements.argument_of_perigee, 89.1723);
        assert_eq!(elements.mean_anomaly, 280.4612);
        assert_eq!(elements.mean_motion, 15.49507896);
    }

    #[test]
    fn eccentricity_implied_decimal_point() {
        let raw = ISS_TLE.replace("0001413", "0001234");
        let set = parse_element_set(&raw).unwrap();
        assert!((set.elements.eccentricity - 0.0001234).abs() < 1e-12);
        assert!(set.elements.eccentricity >= 0.0 && set.elements.eccentricity < 1.0);
    }

    #[test]
    fn trailing_carriage_returns_are_trimmed() {
        let raw = ISS_TLE.replace('\n', "\r\n");
        let set = parse_element_set(&raw).unwrap();
        assert_eq!(set.line1.len(), 69);
        assert_eq!(set.line2.len(), 69);
    }

    #[test]
    fn missing_second_line_ending() {
        assert_eq!(
            parse_element_set("ISS (ZARYA)\n1 25544U 98067A"),
            Err(ParseError::MalformedInput)
        );
        assert_eq!(parse_element_set(""), Err(ParseError::MalformedInput));
    }

    #[test]
    fn short_element_line() {
        let mut lines: Vec<&str> = ISS_TLE.lines().collect();
        let truncated = &lines[2][..68];
        lines[2] = truncated;
        let raw = lines.join("\n");
        assert_eq!(
            parse_element_set(&raw),
            Err(ParseError::TooShort { line: 2, len: 68 })
        );
    }

    #[test]
    fn garbage_numeric_field() {
        let raw = ISS_TLE.replace("221.2784", "221.#784");
        assert_eq!(
            parse_element_set(&raw),
            Err(ParseError::InvalidField {
                name: "right ascension"
            })
        );
    }
}
