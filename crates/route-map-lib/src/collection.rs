//! RouteCollection - the registry of loaded routes and owner of every edit
//!
//! Each mutation updates the route map and appends the matching client
//! instructions to the collection's [`UpdateChannel`]. An operation that fails
//! leaves both untouched.

use crate::geometry::{self, Coordinate};
use crate::gpx_io::ExportedRoute;
use crate::labels;
use crate::render::{HandleAllocator, RouteHandles, RouteId};
use crate::stats::{self, StatsReport};
use crate::style::Activity;
use crate::update::{Instruction, Popup, PopupRow, StylePatch, UpdateChannel, ViewBounds};
use crate::{Result, Route, RouteMapError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for the route collection
///
/// The duplicate and simplification tolerances are in meters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Max per-point distance for two same-named routes to count as duplicates
    pub duplicate_tolerance: f64,
    /// Douglas-Peucker tolerance used by [`RouteCollection::simplify`]
    pub simplify_tolerance: f64,
    /// Polylines are never drawn thinner than this
    pub min_render_width: f64,
    /// Label that marks a route as primary
    pub primary_label: String,
    /// Line width of primary routes after a label change
    pub primary_width: f64,
    /// Line width of other routes after a label change
    pub regular_width: f64,
    /// Opacity of routes outside a highlight filter
    pub dimmed_opacity: f64,
    /// Dash pattern of routes outside a highlight filter
    pub dimmed_dash: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duplicate_tolerance: 0.1,
            simplify_tolerance: 5.0,
            min_render_width: 3.0,
            primary_label: "primary".to_string(),
            primary_width: 4.5,
            regular_width: 3.0,
            dimmed_opacity: 0.3,
            dimmed_dash: "4 8".to_string(),
        }
    }
}

/// How a newly added route reaches the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Part of the base scene rendered up front, see [`RouteCollection::base_scene`]
    Static,
    /// Added to the live scene through the update channel
    Live,
}

/// Result of [`RouteCollection::add`]
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(RouteId),
    /// A near-identical route with the same name is already loaded
    Skipped { duplicate_of: RouteId },
}

impl AddOutcome {
    /// Identifier of the new route, `None` when skipped
    pub fn id(&self) -> Option<&RouteId> {
        match self {
            AddOutcome::Added(id) => Some(id),
            AddOutcome::Skipped { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    route: Route,
    handles: RouteHandles,
    placement: Placement,
}

/// The single source of truth for every loaded route
///
/// Route and render handles live in one entry, so they are always inserted
/// and removed together.
#[derive(Debug, Clone)]
pub struct RouteCollection {
    entries: BTreeMap<RouteId, Entry>,
    allocator: HandleAllocator,
    updates: UpdateChannel,
    config: Config,
    markers_visible: bool,
    /// Last view framed by `fit_bounds`
    view: Option<ViewBounds>,
}

impl Default for RouteCollection {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl RouteCollection {
    /// Create an empty collection with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            entries: BTreeMap::new(),
            allocator: HandleAllocator::default(),
            updates: UpdateChannel::new(),
            config,
            markers_visible: true,
            view: None,
        }
    }

    fn entry(&self, id: &RouteId) -> Result<&Entry> {
        self.entries
            .get(id)
            .ok_or_else(|| RouteMapError::NotFound(id.clone()))
    }

    fn entry_mut<'a>(entries: &'a mut BTreeMap<RouteId, Entry>, id: &RouteId) -> Result<&'a mut Entry> {
        entries
            .get_mut(id)
            .ok_or_else(|| RouteMapError::NotFound(id.clone()))
    }

    fn find_duplicate(&self, route: &Route) -> Option<&RouteId> {
        self.entries.iter().find_map(|(id, entry)| {
            (entry.route.name() == route.name()
                && geometry::polylines_approx_equal(
                    entry.route.points(),
                    route.points(),
                    self.config.duplicate_tolerance,
                ))
            .then_some(id)
        })
    }

    fn marker_visibility(handles: &RouteHandles, visible: bool) -> impl Iterator<Item = Instruction> + '_ {
        handles.markers().map(move |handle| Instruction::SetVisibility {
            handle: handle.clone(),
            visible,
        })
    }

    /// Add a route unless a near-duplicate is already loaded
    ///
    /// Live routes emit the instructions that build their elements; static
    /// routes are only rendered through [`Self::base_scene`].
    pub fn add(&mut self, route: Route, placement: Placement) -> AddOutcome {
        if let Some(existing) = self.find_duplicate(&route) {
            tracing::warn!(name = route.name(), duplicate_of = %existing, "Skipping duplicate route");
            return AddOutcome::Skipped {
                duplicate_of: existing.clone(),
            };
        }

        let handles = RouteHandles::allocate(&mut self.allocator);
        let id = handles.route_id();

        if placement == Placement::Live {
            self.updates
                .extend(handles.scene_instructions(&route, self.config.min_render_width));
            if !self.markers_visible {
                self.updates.extend(Self::marker_visibility(&handles, false));
            }
        }

        tracing::debug!(%id, name = route.name(), points = route.points().len(), ?placement, "Added route");
        self.entries.insert(
            id.clone(),
            Entry {
                route,
                handles,
                placement,
            },
        );
        AddOutcome::Added(id)
    }

    /// Remove a route and its elements, returning the route
    pub fn remove(&mut self, id: &RouteId) -> Result<Route> {
        let entry = self
            .entries
            .remove(id)
            .ok_or_else(|| RouteMapError::NotFound(id.clone()))?;
        self.updates.push(Instruction::RemoveElement {
            handle: entry.handles.group,
        });
        tracing::debug!(%id, "Removed route");
        Ok(entry.route)
    }

    /// Split a route at the point closest to `latlng`
    ///
    /// Observably a removal followed by two live adds.
    pub fn split(&mut self, id: &RouteId, latlng: Coordinate) -> Result<(AddOutcome, AddOutcome)> {
        let (first, second) = self.entry(id)?.route.split(latlng)?;
        self.remove(id)?;
        let first = self.add(first, Placement::Live);
        let second = self.add(second, Placement::Live);
        Ok((first, second))
    }

    /// Replace a route with its simplified version (remove, then add)
    pub fn simplify(&mut self, id: &RouteId) -> Result<AddOutcome> {
        let simplified = self.entry(id)?.route.simplify(self.config.simplify_tolerance);
        self.remove(id)?;
        Ok(self.add(simplified, Placement::Live))
    }

    /// Classify a route and recolor it with the activity's fixed color
    pub fn set_activity_type(&mut self, id: &RouteId, activity: &str) -> Result<()> {
        let entry = Self::entry_mut(&mut self.entries, id)?;
        let activity: Activity = activity.parse()?;
        entry.route.set_activity(activity);
        self.updates.push(Instruction::SetStyle {
            handle: entry.handles.polyline.clone(),
            patch: StylePatch::color(activity.color()),
        });
        tracing::debug!(%id, %activity, "Set activity");
        Ok(())
    }

    /// Apply the primary-label width rule and emit the resulting weight
    fn refresh_label_width(config: &Config, updates: &mut UpdateChannel, entry: &mut Entry) {
        let width = if entry.route.labels().contains(&config.primary_label) {
            config.primary_width
        } else {
            config.regular_width
        };
        entry.route.style_mut().width = width;
        updates.push(Instruction::SetStyle {
            handle: entry.handles.polyline.clone(),
            patch: StylePatch::weight(entry.route.style().render_width(config.min_render_width)),
        });
    }

    /// Add every label of a comma separated list
    pub fn add_labels(&mut self, id: &RouteId, labels_csv: &str) -> Result<()> {
        let entry = Self::entry_mut(&mut self.entries, id)?;
        entry.route.labels_mut().extend(labels::parse_label_list(labels_csv));
        Self::refresh_label_width(&self.config, &mut self.updates, entry);
        tracing::debug!(%id, labels = ?entry.route.labels(), "Added labels");
        Ok(())
    }

    /// Remove every label of a comma separated list; absent labels are ignored
    pub fn remove_labels(&mut self, id: &RouteId, labels_csv: &str) -> Result<()> {
        let entry = Self::entry_mut(&mut self.entries, id)?;
        let to_remove = labels::parse_label_list(labels_csv);
        entry.route.labels_mut().retain(|l| !to_remove.contains(l));
        Self::refresh_label_width(&self.config, &mut self.updates, entry);
        tracing::debug!(%id, labels = ?entry.route.labels(), "Removed labels");
        Ok(())
    }

    /// Replace name, description and labels in one go
    pub fn update_info(&mut self, id: &RouteId, name: &str, description: &str, labels_csv: &str) -> Result<()> {
        let entry = Self::entry_mut(&mut self.entries, id)?;
        entry.route.set_name(name.to_string());
        entry.route.set_description(description.to_string());
        *entry.route.labels_mut() = labels::parse_label_list(labels_csv);
        Self::refresh_label_width(&self.config, &mut self.updates, entry);
        tracing::debug!(%id, name, "Updated route info");
        Ok(())
    }

    /// Replace a route's points in place, keeping its identity
    ///
    /// The client already shows the edited geometry, so nothing is emitted.
    pub fn edit_points(&mut self, id: &RouteId, points: Vec<Coordinate>) -> Result<()> {
        let entry = Self::entry_mut(&mut self.entries, id)?;
        entry.route.set_points(points)?;
        tracing::debug!(%id, points = entry.route.points().len(), "Edited route points");
        Ok(())
    }

    /// Length and count per activity over routes carrying every filter label
    pub fn compute_stats(&self, labels_csv: &str) -> StatsReport {
        let filter = labels::parse_label_list(labels_csv);
        let samples = self
            .entries
            .values()
            .filter(|e| labels::matches_filter(e.route.labels(), &filter))
            .map(|e| {
                let bucket = e.route.activity().map_or(stats::UNKNOWN_BUCKET, |a| a.as_str());
                (bucket, e.route.length())
            })
            .collect();
        StatsReport::from_samples(filter, samples)
    }

    /// Compute statistics and show them in a popup at the view centre
    pub fn stats(&mut self, labels_csv: &str) -> StatsReport {
        let report = self.compute_stats(labels_csv);
        self.updates.push(Instruction::ShowPopup {
            at: None,
            popup: report.to_popup(),
        });
        report
    }

    /// Show a route's details in a popup at `latlng`
    pub fn info(&mut self, id: &RouteId, latlng: Coordinate) -> Result<()> {
        let route = &self.entry(id)?.route;
        let popup = Popup {
            title: None,
            rows: vec![
                PopupRow::new("Name", route.name()),
                PopupRow::new("Description", route.description()),
                PopupRow::new("Labels", labels::display_labels(route.labels())),
                PopupRow::new("Length", stats::format_length(route.length())),
                PopupRow::new("Activity", route.activity_name()),
            ],
        };
        self.updates.push(Instruction::ShowPopup {
            at: Some(latlng),
            popup,
        });
        Ok(())
    }

    /// Emphasize routes carrying every filter label and dim the rest
    ///
    /// An empty filter restores every route.
    pub fn enable_highlight(&mut self, labels_csv: &str) {
        let filter = labels::parse_label_list(labels_csv);
        let config = &self.config;
        let patches = self.entries.values().map(|entry| {
            let weight = entry.route.style().render_width(config.min_render_width);
            let patch = if labels::matches_filter(entry.route.labels(), &filter) {
                StylePatch {
                    weight: Some(weight),
                    opacity: Some(1.0),
                    dash_array: Some(None),
                    ..StylePatch::default()
                }
            } else {
                StylePatch {
                    weight: Some(config.min_render_width),
                    opacity: Some(config.dimmed_opacity),
                    dash_array: Some(Some(config.dimmed_dash.clone())),
                    ..StylePatch::default()
                }
            };
            Instruction::SetStyle {
                handle: entry.handles.polyline.clone(),
                patch,
            }
        });
        self.updates.extend(patches);
    }

    /// Frame the client view around every loaded point
    pub fn fit_bounds(&mut self) -> Result<ViewBounds> {
        let rect = geometry::bounding_box(self.entries.values().flat_map(|e| e.route.points()))
            .ok_or(RouteMapError::EmptyCollection)?;
        let bounds = ViewBounds::from(rect);
        self.view = Some(bounds);
        self.updates.push(Instruction::SetView { bounds });
        Ok(bounds)
    }

    /// Ask the client to start drawing a new route
    pub fn begin_create(&mut self) {
        self.updates.push(Instruction::BeginDraw);
    }

    /// Turn a finished client drawing into a route named `noname`
    pub fn end_create(&mut self, points: Vec<Coordinate>) -> Result<AddOutcome> {
        let route = Route::new("noname", points)?;
        let outcome = self.add(route, Placement::Live);
        if let AddOutcome::Added(id) = &outcome {
            let handle = self.entry(id)?.handles.polyline.clone();
            self.updates.push(Instruction::Redraw { handle });
        }
        Ok(outcome)
    }

    /// Ask the client to put a route in vertex-edit mode
    pub fn begin_edit(&mut self, id: &RouteId) -> Result<()> {
        let handle = self.entry(id)?.handles.polyline.clone();
        self.updates.push(Instruction::BeginEdit { handle });
        Ok(())
    }

    /// Flip start/end marker visibility for every route, returning the new state
    pub fn toggle_markers(&mut self) -> bool {
        self.markers_visible = !self.markers_visible;
        let visible = self.markers_visible;
        let instructions: Vec<Instruction> = self
            .entries
            .values()
            .flat_map(|e| Self::marker_visibility(&e.handles, visible))
            .collect();
        self.updates.extend(instructions);
        visible
    }

    /// Instructions that build the initial scene
    ///
    /// Covers every static route still loaded, then the last fitted view.
    pub fn base_scene(&self) -> Vec<Instruction> {
        let mut out = Vec::new();
        for entry in self.entries.values().filter(|e| e.placement == Placement::Static) {
            out.extend(
                entry
                    .handles
                    .scene_instructions(&entry.route, self.config.min_render_width),
            );
            if !self.markers_visible {
                out.extend(Self::marker_visibility(&entry.handles, false));
            }
        }
        if let Some(bounds) = self.view {
            out.push(Instruction::SetView { bounds });
        }
        out
    }

    /// Routes carrying every filter label, ready for a track-file writer
    pub fn export(&self, labels_csv: &str, max_width: f64) -> Vec<ExportedRoute> {
        let filter = labels::parse_label_list(labels_csv);
        self.entries
            .values()
            .filter(|e| labels::matches_filter(e.route.labels(), &filter))
            .map(|e| ExportedRoute::from_route(&e.route, max_width))
            .collect()
    }

    /// Take all pending instructions
    pub fn drain_updates(&mut self) -> Vec<Instruction> {
        self.updates.drain()
    }

    #[inline]
    pub fn updates(&self) -> &UpdateChannel {
        &self.updates
    }

    #[inline]
    pub fn get(&self, id: &RouteId) -> Option<&Route> {
        self.entries.get(id).map(|e| &e.route)
    }

    #[inline]
    pub fn handles(&self, id: &RouteId) -> Option<&RouteHandles> {
        self.entries.get(id).map(|e| &e.handles)
    }

    /// All routes in identifier order
    pub fn routes(&self) -> impl Iterator<Item = (&RouteId, &Route)> {
        self.entries.iter().map(|(id, e)| (id, &e.route))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn markers_visible(&self) -> bool {
        self.markers_visible
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
