//! GPX import and export
//!
//! Imported routes carry their `#label` name suffixes as labels and their GPX
//! `type` as activity. Exported routes re-append the labels to the name so a
//! round trip through a track file keeps them.

use crate::geometry::Coordinate;
use crate::labels;
use crate::style::Activity;
use crate::{Result, Route, RouteMapError};
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Imported routes are never drawn thinner than this
pub const IMPORT_MIN_WIDTH: f64 = 5.0;

/// Name given to GPX routes and tracks that have none
const DEFAULT_NAME: &str = "route";

const CREATOR: &str = concat!("route-map ", env!("CARGO_PKG_VERSION"));

/// A route flattened for a track-file writer
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportedRoute {
    /// Name with ` #label` suffixes
    pub name: String,
    /// `(longitude, latitude)` pairs
    pub coordinates: Vec<(f64, f64)>,
    pub description: String,
    /// `ffBBGGRR`
    pub color: String,
    pub width: f64,
    pub activity: Option<Activity>,
}

impl ExportedRoute {
    pub fn from_route(route: &Route, max_width: f64) -> Self {
        Self {
            name: labels::name_with_labels(route.name(), route.labels()),
            coordinates: route.points().iter().map(|p| (p.lng, p.lat)).collect(),
            description: route.description().to_string(),
            color: route.style().color.to_track_color(),
            width: route.style().width.min(max_width),
            activity: route.activity(),
        }
    }
}

fn waypoints_to_coordinates(points: &[Waypoint]) -> Vec<Coordinate> {
    points.iter().map(|wp| Coordinate::from(wp.point())).collect()
}

/// `suffix` is appended to the name after its labels are taken out
fn build_route(
    name: Option<&str>,
    suffix: Option<usize>,
    description: Option<&str>,
    kind: Option<&str>,
    points: &[Waypoint],
) -> Option<Route> {
    let (mut name, labels) = labels::extract_name_labels(name.unwrap_or(DEFAULT_NAME));
    if let Some(i) = suffix {
        name = format!("{name}_{i}");
    }
    let route = match Route::new(name, waypoints_to_coordinates(points)) {
        Ok(route) => route,
        Err(RouteMapError::EmptyRoute) => {
            tracing::debug!("Skipping empty GPX path");
            return None;
        }
        Err(err) => {
            tracing::warn!(%err, "Skipping invalid GPX path");
            return None;
        }
    };

    let activity = kind.and_then(|kind| match kind.parse::<Activity>() {
        Ok(activity) => Some(activity),
        Err(err) => {
            tracing::warn!(name = route.name(), %err, "Ignoring unknown GPX type");
            None
        }
    });
    let mut style = *route.style();
    if let Some(activity) = activity {
        style.color = activity.color();
    }

    Some(
        route
            .with_description(description.unwrap_or_default())
            .with_labels(labels)
            .with_style(style)
            .with_activity(activity),
    )
}

/// One route per GPX route and per non-empty track segment
///
/// A track with several segments yields names suffixed `_<i>`.
pub fn import_gpx(gpx: &Gpx) -> Vec<Route> {
    let mut routes = Vec::new();

    for route in &gpx.routes {
        routes.extend(build_route(
            route.name.as_deref(),
            None,
            route.description.as_deref(),
            route.type_.as_deref(),
            &route.points,
        ));
    }

    for track in &gpx.tracks {
        let multi = track.segments.len() > 1;
        for (i, segment) in track.segments.iter().enumerate() {
            routes.extend(build_route(
                track.name.as_deref(),
                multi.then_some(i),
                track.description.as_deref(),
                track.type_.as_deref(),
                &segment.points,
            ));
        }
    }

    tracing::debug!(count = routes.len(), "Imported GPX routes");
    routes
}

/// Parse GPX from any reader
pub fn read_gpx<R: Read>(reader: R) -> Result<Gpx> {
    Ok(gpx::read(reader)?)
}

/// Read and import a GPX file
pub fn load_gpx_file(path: impl AsRef<Path>) -> Result<Vec<Route>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("gpx_io::load_gpx_file");

    let path = path.as_ref();
    let file = File::open(path)?;
    let gpx = read_gpx(BufReader::new(file))?;
    let routes = import_gpx(&gpx);
    tracing::info!(path = %path.display(), routes = routes.len(), "Loaded GPX file");
    Ok(routes)
}

/// Read and import several GPX files in parallel, keeping input order
pub fn load_gpx_files<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<Vec<Route>> {
    let per_file: Result<Vec<Vec<Route>>> = paths.par_iter().map(|path| load_gpx_file(path)).collect();
    Ok(per_file?.into_iter().flatten().collect())
}

/// Normalize a freshly imported route
///
/// Simplifies with `tolerance` meters, infers the activity from an exact
/// color match when none is set and raises the width to [`IMPORT_MIN_WIDTH`].
pub fn prepare_import(route: &Route, tolerance: f64) -> Route {
    let mut prepared = route.simplify(tolerance);
    if prepared.activity().is_none() {
        let inferred = Activity::from_color(prepared.style().color);
        prepared = prepared.with_activity(inferred);
    }
    let style = prepared.style_mut();
    style.width = style.width.max(IMPORT_MIN_WIDTH);
    prepared
}

/// [`prepare_import`] over many routes in parallel
pub fn prepare_imports(routes: &[Route], tolerance: f64) -> Vec<Route> {
    routes
        .par_iter()
        .map(|route| prepare_import(route, tolerance))
        .collect()
}

/// Build a GPX 1.1 document with one single-segment track per route
pub fn export_gpx(routes: &[ExportedRoute]) -> Gpx {
    let tracks = routes
        .iter()
        .map(|route| {
            let mut segment = TrackSegment::default();
            segment.points = route
                .coordinates
                .iter()
                .map(|&(lon, lat)| Waypoint::new(geo::Point::new(lon, lat)))
                .collect();

            let mut track = Track::default();
            track.name = Some(route.name.clone());
            track.description = (!route.description.is_empty()).then(|| route.description.clone());
            track.type_ = route.activity.map(|a| a.as_str().to_string());
            track.segments.push(segment);
            track
        })
        .collect();

    let mut gpx = Gpx::default();
    gpx.version = GpxVersion::Gpx11;
    gpx.creator = Some(CREATOR.to_string());
    gpx.tracks = tracks;
    gpx
}

/// Serialize a GPX document
pub fn write_gpx<W: Write>(gpx: &Gpx, writer: W) -> Result<()> {
    gpx::write(gpx, writer)?;
    Ok(())
}

/// Export routes to a GPX file, replacing it
pub fn save_gpx_file(path: impl AsRef<Path>, routes: &[ExportedRoute]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_gpx(&export_gpx(routes), &mut writer)?;
    writer.flush()?;
    tracing::info!(path = %path.display(), routes = routes.len(), "Saved GPX file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Rgb, Style};

    fn waypoint(lat: f64, lon: f64) -> Waypoint {
        Waypoint::new(geo::Point::new(lon, lat))
    }

    fn create_test_gpx() -> Gpx {
        let mut gpx = Gpx::default();
        gpx.version = GpxVersion::Gpx11;

        let mut track = Track::default();
        track.name = Some("Ridge #primary #2024".to_string());
        track.description = Some("windy".to_string());
        track.type_ = Some("trail".to_string());
        let mut first = TrackSegment::default();
        first.points = vec![waypoint(45.0, 7.0), waypoint(45.1, 7.1)];
        let mut second = TrackSegment::default();
        second.points = vec![waypoint(46.0, 8.0)];
        track.segments = vec![first, second, TrackSegment::default()];
        gpx.tracks.push(track);

        let mut route = gpx::Route::default();
        route.name = None;
        route.type_ = Some("skiing".to_string());
        route.points = vec![waypoint(1.0, 2.0), waypoint(1.5, 2.5)];
        gpx.routes.push(route);

        gpx
    }

    #[test]
    fn test_import_gpx() {
        let routes = import_gpx(&create_test_gpx());
        assert_eq!(routes.len(), 3);

        // GPX routes come first
        assert_eq!(routes[0].name(), "route");
        assert_eq!(routes[0].activity(), None);
        assert_eq!(routes[0].points()[0], Coordinate::new(1.0, 2.0));

        assert_eq!(routes[1].name(), "Ridge_0");
        assert_eq!(routes[1].description(), "windy");
        assert_eq!(routes[1].activity(), Some(Activity::Trail));
        assert_eq!(routes[1].style().color, Activity::Trail.color());
        assert_eq!(
            routes[1].labels().iter().collect::<Vec<_>>(),
            vec!["2024", "primary"]
        );
        assert_eq!(routes[2].name(), "Ridge_1");
        assert_eq!(routes[2].points().len(), 1);
    }

    #[test]
    fn test_single_segment_track_keeps_name() {
        let mut gpx = Gpx::default();
        let mut track = Track::default();
        track.name = Some("Lake".to_string());
        let mut segment = TrackSegment::default();
        segment.points = vec![waypoint(0.0, 0.0), waypoint(0.0, 0.1)];
        track.segments.push(segment);
        gpx.tracks.push(track);

        let routes = import_gpx(&gpx);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].name(), "Lake");
    }

    #[test]
    fn test_import_skips_non_finite_paths() {
        let mut gpx = Gpx::default();
        let mut broken = gpx::Route::default();
        broken.name = Some("broken".to_string());
        broken.points = vec![waypoint(0.0, 0.0), waypoint(f64::NAN, 0.1)];
        let mut fine = gpx::Route::default();
        fine.name = Some("fine".to_string());
        fine.points = vec![waypoint(0.0, 0.0), waypoint(0.0, 0.1)];
        gpx.routes = vec![broken, fine];

        let routes = import_gpx(&gpx);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].name(), "fine");
    }

    #[test]
    fn test_prepare_import() {
        let points: Vec<Coordinate> = (0..30).map(|i| Coordinate::new(0.0, i as f64 * 0.00001)).collect();
        let route = Route::new("r", points)
            .unwrap()
            .with_style(Style::new(Activity::Paddle.color(), 2.0));

        let prepared = prepare_import(&route, 1.0);
        assert_eq!(prepared.points().len(), 2);
        assert_eq!(prepared.activity(), Some(Activity::Paddle));
        assert_eq!(prepared.style().width, IMPORT_MIN_WIDTH);

        let wide = route.clone().with_style(Style::new(Rgb::new(1, 2, 3), 8.0));
        let prepared = prepare_import(&wide, 1.0);
        assert_eq!(prepared.activity(), None);
        assert_eq!(prepared.style().width, 8.0);

        assert_eq!(prepare_imports(&[route.clone(), wide], 1.0).len(), 2);
    }

    #[test]
    fn test_exported_route() {
        let route = Route::new("Ridge", vec![Coordinate::new(45.0, 7.0), Coordinate::new(46.0, 8.0)])
            .unwrap()
            .with_labels(labels::parse_label_list("b,a"))
            .with_style(Style::new(Rgb::new(0x12, 0x34, 0x56), 6.0));

        let exported = ExportedRoute::from_route(&route, 4.0);
        assert_eq!(exported.name, "Ridge #a #b");
        assert_eq!(exported.coordinates, vec![(7.0, 45.0), (8.0, 46.0)]);
        assert_eq!(exported.color, "ff563412");
        assert_eq!(exported.width, 4.0);
    }

    #[test]
    fn test_write_then_read_keeps_labels_and_activity() {
        let route = Route::new("Ridge", vec![Coordinate::new(45.0, 7.0), Coordinate::new(46.0, 8.0)])
            .unwrap()
            .with_description("windy")
            .with_labels(labels::parse_label_list("primary"))
            .with_activity(Some(Activity::Bush));

        let gpx = export_gpx(&[ExportedRoute::from_route(&route, 10.0)]);
        let mut buffer = Vec::new();
        write_gpx(&gpx, &mut buffer).unwrap();

        let imported = import_gpx(&read_gpx(buffer.as_slice()).unwrap());
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].name(), "Ridge");
        assert_eq!(imported[0].description(), "windy");
        assert_eq!(imported[0].activity(), Some(Activity::Bush));
        assert!(imported[0].labels().contains("primary"));
        assert_eq!(imported[0].points().len(), 2);
    }

    #[test]
    fn test_read_invalid_gpx_fails() {
        let result = read_gpx("not xml at all".as_bytes());
        assert!(matches!(result, Err(crate::RouteMapError::GpxParse(_))));
    }
}
