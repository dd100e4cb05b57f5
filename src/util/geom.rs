//! Geometry helpers: GeoJSON <-> `geo-types` conversion, and measure-based
//! trimming of flowline geometry (spec.md §4.5, §4.6).

use geo::algorithm::simplify::Simplify;
use geo_types::{Coord, Geometry, LineString};

use crate::error::{Error, Result};

/// Parses the text produced by `ST_AsGeoJSON(geom)` into a `geo-types`
/// geometry.
pub fn parse_geojson_geometry(text: &str) -> Result<Geometry<f64>> {
    let geojson: geojson::GeoJson = text.parse().map_err(|e| Error::GeometryError {
        message: format!("failed to parse geometry: {e}"),
    })?;
    let geojson::GeoJson::Geometry(g) = geojson else {
        return Err(Error::GeometryError {
            message: "expected a bare GeoJSON geometry".to_owned(),
        });
    };
    Geometry::try_from(g).map_err(|e| Error::GeometryError {
        message: format!("unsupported geometry shape: {e}"),
    })
}

pub fn to_geojson_geometry(geometry: &Geometry<f64>) -> Result<geojson::Geometry> {
    geojson::Geometry::try_from(geometry.clone()).map_err(|e| Error::GeometryError {
        message: format!("failed to encode geometry: {e}"),
    })
}

/// Simplifies any geometry with the Douglas-Peucker tolerance `epsilon`, in
/// the geometry's own coordinate units (degrees, for our WGS84 data).
pub fn simplify_linestring(line: &LineString<f64>, epsilon: f64) -> LineString<f64> {
    line.simplify(&epsilon)
}

/// NHDPlus convention: measure 100 is the upstream end of a reach, measure 0
/// is the downstream end; flowline geometry is stored in the direction of
/// flow, so the first vertex is upstream and the last is downstream. This
/// converts a measure into the corresponding fraction-along-line in
/// geometry order (0.0 = start/upstream, 1.0 = end/downstream).
pub fn measure_to_fraction(measure: f64) -> f64 {
    (100.0 - measure.clamp(0.0, 100.0)) / 100.0
}

fn euclidean_len(a: Coord<f64>, b: Coord<f64>) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn lerp(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Coord {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
    }
}

/// Returns the coordinate at `fraction` (clamped to `[0, 1]`) along `line`,
/// measured by cumulative Euclidean length of its segments.
pub fn point_at_fraction(line: &LineString<f64>, fraction: f64) -> Coord<f64> {
    let fraction = fraction.clamp(0.0, 1.0);
    let coords = line.0.as_slice();
    if coords.len() < 2 {
        return coords.first().copied().unwrap_or(Coord { x: 0.0, y: 0.0 });
    }

    let total: f64 = coords.windows(2).map(|w| euclidean_len(w[0], w[1])).sum();
    if total == 0.0 {
        return coords[0];
    }

    let target = total * fraction;
    let mut walked = 0.0;
    for w in coords.windows(2) {
        let seg_len = euclidean_len(w[0], w[1]);
        if walked + seg_len >= target || seg_len == 0.0 {
            let remaining = (target - walked).max(0.0);
            let t = if seg_len > 0.0 {
                (remaining / seg_len).clamp(0.0, 1.0)
            } else {
                0.0
            };
            return lerp(w[0], w[1], t);
        }
        walked += seg_len;
    }
    coords[coords.len() - 1]
}

/// Clips `line` to the sub-segment spanning `[f0, f1]` (geometry-order
/// fractions in `[0, 1]`, `f0 <= f1`), preserving all original interior
/// vertices that fall strictly inside the range and adding interpolated
/// endpoints. A pure function of `line` and the fraction bounds: clipping
/// the same `(line, f0, f1)` twice yields identical output both times
/// (spec.md §8 invariant 5, "trim idempotence").
pub fn clip_linestring(line: &LineString<f64>, f0: f64, f1: f64) -> LineString<f64> {
    let f0 = f0.clamp(0.0, 1.0);
    let f1 = f1.clamp(0.0, 1.0);
    let (f0, f1) = if f0 <= f1 { (f0, f1) } else { (f1, f0) };

    let coords = line.0.as_slice();
    if coords.len() < 2 {
        return line.clone();
    }

    let total: f64 = coords.windows(2).map(|w| euclidean_len(w[0], w[1])).sum();
    if total == 0.0 {
        return line.clone();
    }

    let start_target = total * f0;
    let end_target = total * f1;

    let mut out = Vec::new();
    let mut walked = 0.0;
    for w in coords.windows(2) {
        let seg_len = euclidean_len(w[0], w[1]);
        let seg_start = walked;
        let seg_end = walked + seg_len;

        if seg_end >= start_target && seg_start <= end_target {
            if out.is_empty() {
                let t = if seg_len > 0.0 {
                    ((start_target - seg_start) / seg_len).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                out.push(lerp(w[0], w[1], t));
            }
            if seg_end <= end_target {
                out.push(w[1]);
            } else {
                let t = if seg_len > 0.0 {
                    ((end_target - seg_start) / seg_len).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                out.push(lerp(w[0], w[1], t));
                break;
            }
        }
        walked += seg_len;
    }

    if out.len() < 2 {
        out = vec![point_at_fraction(line, f0), point_at_fraction(line, f1)];
    }

    LineString::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_line() -> LineString<f64> {
        LineString::new(vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 0.0 },
            Coord { x: 2.0, y: 0.0 },
        ])
    }

    #[test]
    fn measure_100_is_start() {
        assert_eq!(measure_to_fraction(100.0), 0.0);
        assert_eq!(measure_to_fraction(0.0), 1.0);
        assert_eq!(measure_to_fraction(50.0), 0.5);
    }

    #[test]
    fn point_at_fraction_interpolates() {
        let line = sample_line();
        let p = point_at_fraction(&line, 0.5);
        assert!((p.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn clip_produces_strict_subsegment() {
        let line = sample_line();
        let clipped = clip_linestring(&line, 0.5, 1.0);
        assert!((clipped.0.first().unwrap().x - 1.0).abs() < 1e-9);
        assert!((clipped.0.last().unwrap().x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn clip_is_idempotent() {
        let line = sample_line();
        let once = clip_linestring(&line, 0.4, 1.0);
        let twice = clip_linestring(&clip_linestring(&line, 0.4, 1.0), 0.0, 1.0);
        assert_eq!(once, twice);
    }
}
