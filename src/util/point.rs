//! Parsing for the `coords=POINT(lon lat)` query parameter (spec.md §4.4,
//! §9 "Coordinate input parsing").

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

/// Parses `POINT(lon lat)` with optional internal whitespace. Rejects
/// malformed text and out-of-domain coordinates; never attempts to
/// "auto-correct" a lat/lon swap — a swapped pair is only caught when it
/// happens to fall outside the longitude domain.
pub fn parse_point(input: &str) -> Result<LonLat> {
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();
    if !upper.starts_with("POINT") {
        return Err(Error::invalid_input(format!(
            "expected POINT(lon lat), got '{input}'"
        )));
    }

    let open = trimmed
        .find('(')
        .ok_or_else(|| Error::invalid_input(format!("malformed POINT literal: '{input}'")))?;
    let close = trimmed
        .rfind(')')
        .ok_or_else(|| Error::invalid_input(format!("malformed POINT literal: '{input}'")))?;
    if close <= open {
        return Err(Error::invalid_input(format!(
            "malformed POINT literal: '{input}'"
        )));
    }

    let inner = trimmed[open + 1..close].trim();
    let parts: Vec<&str> = inner.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(Error::invalid_input(format!(
            "expected two coordinates in POINT literal: '{input}'"
        )));
    }

    let lon: f64 = parts[0]
        .parse()
        .map_err(|_| Error::invalid_input(format!("non-numeric longitude in '{input}'")))?;
    let lat: f64 = parts[1]
        .parse()
        .map_err(|_| Error::invalid_input(format!("non-numeric latitude in '{input}'")))?;

    if !(-180.0..=180.0).contains(&lon) {
        return Err(Error::invalid_input(format!(
            "longitude {lon} outside [-180, 180]"
        )));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(Error::invalid_input(format!(
            "latitude {lat} outside [-90, 90]"
        )));
    }

    Ok(LonLat { lon, lat })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_point() {
        let p = parse_point("POINT(-89.509 43.087)").unwrap();
        assert_eq!(p.lon, -89.509);
        assert_eq!(p.lat, 43.087);
    }

    #[test]
    fn parses_with_extra_whitespace() {
        let p = parse_point("POINT ( -89.509   43.087 )").unwrap();
        assert_eq!(p.lon, -89.509);
        assert_eq!(p.lat, 43.087);
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        assert!(parse_point("POINT(200 43.087)").is_err());
    }

    #[test]
    fn rejects_malformed_literal() {
        assert!(parse_point("not a point").is_err());
        assert!(parse_point("POINT(1 2 3)").is_err());
        assert!(parse_point("POINT(a b)").is_err());
    }

    #[test]
    fn swapped_coordinates_are_taken_literally_not_corrected() {
        // A caller who accidentally swaps lat/lon gets back a different
        // point rather than a silently "corrected" one, as long as the
        // swapped values still fall inside both domains.
        let correct = parse_point("POINT(-89.509 43.087)").unwrap();
        let swapped = parse_point("POINT(43.087 -89.509)").unwrap();
        assert_ne!(correct, swapped);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(parse_point("POINT(95.0 182.0)").is_err());
    }
}
