//! Route value type
//!
//! A `Route` is a named, labeled, styled polyline with an optional activity
//! classification. Edits that change geometry (split, simplify) return new
//! values; the original is left untouched.

use crate::geometry::{self, Coordinate};
use crate::labels::LabelSet;
use crate::style::{Activity, Style};
use crate::{Result, RouteMapError};

/// A single editable route
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Route {
    name: String,
    points: Vec<Coordinate>,
    labels: LabelSet,
    description: String,
    style: Style,
    /// `None` means unclassified
    activity: Option<Activity>,
    /// Length in meters, kept in sync with `points`
    #[cfg_attr(feature = "serde", serde(skip))]
    cached_length: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Route {
    /// Create a route from a name and at least one finite point
    pub fn new(name: impl Into<String>, points: Vec<Coordinate>) -> Result<Self> {
        validate_points(&points)?;
        let cached_length = geometry::polyline_length(&points);
        Ok(Self {
            name: name.into(),
            points,
            labels: LabelSet::new(),
            description: String::new(),
            style: Style::default(),
            activity: None,
            cached_length,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_activity(mut self, activity: Option<Activity>) -> Self {
        self.activity = activity;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    #[inline]
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn style(&self) -> &Style {
        &self.style
    }

    #[inline]
    pub fn activity(&self) -> Option<Activity> {
        self.activity
    }

    /// Activity name, empty when unclassified
    pub fn activity_name(&self) -> &'static str {
        self.activity.map(|a| a.as_str()).unwrap_or("")
    }

    /// Length in meters (0 for single-point routes)
    #[inline]
    pub fn length(&self) -> f64 {
        self.cached_length
    }

    /// Points as `[lat, lng]` pairs
    pub fn as_coordinate_list(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| [p.lat, p.lng]).collect()
    }

    /// Split the route at the point of its polyline closest to `latlng`
    ///
    /// The split point becomes the shared endpoint of both halves. When it
    /// coincides with an existing vertex, that vertex is not repeated unless
    /// a half would otherwise drop below two points.
    pub fn split(&self, latlng: Coordinate) -> Result<(Route, Route)> {
        if !latlng.is_finite() {
            return Err(RouteMapError::InvalidCoordinate(format!("{latlng:?}")));
        }
        let closest = geometry::closest_point_on_polyline(&self.points, latlng).ok_or_else(|| {
            RouteMapError::InvalidOperation(format!(
                "cannot split route '{}' with {} point(s)",
                self.name,
                self.points.len()
            ))
        })?;
        let split_point = closest.point;
        let idx = closest.segment_index;

        let mut first: Vec<Coordinate> = self.points[..=idx].to_vec();
        if first.len() < 2 || first.last() != Some(&split_point) {
            first.push(split_point);
        }

        let rest = &self.points[idx + 1..];
        let rest = match rest.split_first() {
            Some((head, tail)) if *head == split_point && !tail.is_empty() => tail,
            _ => rest,
        };
        let mut second = Vec::with_capacity(rest.len() + 1);
        second.push(split_point);
        second.extend_from_slice(rest);

        Ok((self.derive(first), self.derive(second)))
    }

    /// New route with Douglas-Peucker simplified points (tolerance in meters)
    pub fn simplify(&self, tolerance: f64) -> Route {
        self.derive(geometry::simplify_polyline(&self.points, tolerance))
    }

    /// Build a new route carrying this route's attributes and the given points
    fn derive(&self, points: Vec<Coordinate>) -> Route {
        let cached_length = geometry::polyline_length(&points);
        Route {
            name: self.name.clone(),
            points,
            labels: self.labels.clone(),
            description: self.description.clone(),
            style: self.style,
            activity: self.activity,
            cached_length,
        }
    }

    pub(crate) fn set_points(&mut self, points: Vec<Coordinate>) -> Result<()> {
        validate_points(&points)?;
        self.cached_length = geometry::polyline_length(&points);
        self.points = points;
        Ok(())
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub(crate) fn labels_mut(&mut self) -> &mut LabelSet {
        &mut self.labels
    }

    pub(crate) fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    pub(crate) fn set_activity(&mut self, activity: Activity) {
        self.activity = Some(activity);
        self.style.color = activity.color();
    }
}

fn validate_points(points: &[Coordinate]) -> Result<()> {
    if points.is_empty() {
        return Err(RouteMapError::EmptyRoute);
    }
    match points.iter().position(|p| !p.is_finite()) {
        Some(i) => Err(RouteMapError::InvalidCoordinate(format!("point {i}: {:?}", points[i]))),
        None => Ok(()),
    }
}
