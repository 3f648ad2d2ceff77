//! Geometry helpers for latitude/longitude polylines
//!
//! Projection and splitting work in plain degree space (latitude and longitude
//! treated as planar axes). Lengths, simplification tolerances and duplicate
//! tolerances are measured in meters on a spherical Earth.

use geo::{Coord, LineString, Point, Rect, SimplifyIdx};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// Meters spanned by one degree of latitude (and of longitude at the equator)
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// A WGS84 position in degrees, without elevation
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[inline]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Euclidean distance in degree space
    #[inline]
    pub fn planar_distance(&self, other: Coordinate) -> f64 {
        (self.lat - other.lat).hypot(self.lng - other.lng)
    }
}

impl From<(f64, f64)> for Coordinate {
    #[inline]
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinate> for Point<f64> {
    #[inline]
    fn from(c: Coordinate) -> Self {
        Point::new(c.lng, c.lat)
    }
}

impl From<Point<f64>> for Coordinate {
    #[inline]
    fn from(p: Point<f64>) -> Self {
        Self {
            lat: p.y(),
            lng: p.x(),
        }
    }
}

/// Result of projecting a query onto a polyline
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosestPoint {
    /// Closest location on the polyline
    pub point: Coordinate,
    /// Degree-space distance from the query to `point`
    pub distance: f64,
    /// Index of the segment (`points[i]..points[i + 1]`) that holds `point`
    pub segment_index: usize,
}

/// Great-circle distance between two coordinates in meters
#[inline]
pub fn haversine_distance(p1: Coordinate, p2: Coordinate) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let delta_lat = (p2.lat - p1.lat).to_radians();
    let delta_lon = (p2.lng - p1.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Project `query` onto the closed segment `a..b`
///
/// Returns the closest point on the segment and its degree-space distance to
/// `query`. A zero-length segment behaves as the single point `a`. Projections
/// that clamp to an end return that end exactly, so splitting at a vertex
/// reproduces the vertex bit for bit.
pub fn project_onto_segment(a: Coordinate, b: Coordinate, query: Coordinate) -> (Coordinate, f64) {
    let d_lat = b.lat - a.lat;
    let d_lng = b.lng - a.lng;
    let segment_length = d_lat.hypot(d_lng);
    if segment_length == 0.0 {
        return (a, a.planar_distance(query));
    }

    let u_lat = d_lat / segment_length;
    let u_lng = d_lng / segment_length;
    let t = ((query.lat - a.lat) * u_lat + (query.lng - a.lng) * u_lng).clamp(0.0, segment_length);

    let closest = if t <= 0.0 {
        a
    } else if t >= segment_length {
        b
    } else {
        Coordinate::new(a.lat + t * u_lat, a.lng + t * u_lng)
    };
    (closest, closest.planar_distance(query))
}

/// Find the closest point to `query` over every segment of `points`
///
/// Ties go to the lowest segment index. Returns `None` for polylines with
/// fewer than two points.
pub fn closest_point_on_polyline(points: &[Coordinate], query: Coordinate) -> Option<ClosestPoint> {
    let mut best: Option<ClosestPoint> = None;
    for (segment_index, pair) in points.windows(2).enumerate() {
        let (point, distance) = project_onto_segment(pair[0], pair[1], query);
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(ClosestPoint {
                point,
                distance,
                segment_index,
            });
        }
    }
    best
}

/// Total length of a polyline in meters
///
/// Empty and single-point polylines have length 0.
pub fn polyline_length(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(w[0], w[1]))
        .sum()
}

/// Project `points` to planar meters around the first point
///
/// The longitude scale comes from the first and last latitudes only, so any
/// subset that keeps both ends projects its points to the same coordinates.
fn project_to_meters(points: &[Coordinate]) -> Vec<Coord<f64>> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let lng_scale = ((first.lat + last.lat) / 2.0).to_radians().cos();
    points
        .iter()
        .map(|p| Coord {
            x: (p.lng - first.lng) * lng_scale * METERS_PER_DEGREE,
            y: (p.lat - first.lat) * METERS_PER_DEGREE,
        })
        .collect()
}

/// Douglas-Peucker simplification with a tolerance in meters
///
/// Interior points whose deviation from the chord of their kept neighbours is
/// within `tolerance` are dropped. The first and last points are always kept.
/// A tolerance that is not strictly positive (including NaN) keeps every point.
pub fn simplify_polyline(points: &[Coordinate], tolerance: f64) -> Vec<Coordinate> {
    if points.len() <= 2 || tolerance.is_nan() || tolerance <= 0.0 {
        return points.to_vec();
    }

    let linestring = LineString::from(project_to_meters(points));
    linestring
        .simplify_idx(tolerance)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

/// Whether two polylines have the same number of points and every pair of
/// corresponding points lies within `tolerance` meters
pub fn polylines_approx_equal(a: &[Coordinate], b: &[Coordinate], tolerance: f64) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(p, q)| haversine_distance(*p, *q) <= tolerance)
}

/// Bounding box of all coordinates (x = longitude, y = latitude)
///
/// Returns `None` when the iterator is empty.
pub fn bounding_box<'a>(coords: impl IntoIterator<Item = &'a Coordinate>) -> Option<Rect<f64>> {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut found = false;

    for c in coords {
        min_x = min_x.min(c.lng);
        min_y = min_y.min(c.lat);
        max_x = max_x.max(c.lng);
        max_y = max_y.max(c.lat);
        found = true;
    }

    found.then(|| Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y }))
}
