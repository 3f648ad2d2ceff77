//! Route Map Library - Editable GPS Route Collections
//!
//! This library keeps a collection of named, labeled and styled GPS routes and
//! applies edits to it (split, simplify, relabel, reclassify, statistics). Every
//! edit appends typed instructions to an update channel that a map client
//! replays to stay in sync without re-rendering the whole scene.
//!
//! # Architecture
//!
//! - **[`geometry`]**: Coordinates, closest-point projection, Douglas-Peucker
//! - **[`Route`]**: Polyline value type with labels, style and activity
//! - **[`RouteCollection`]**: Registry of routes keyed by [`RouteId`], owner of all edits
//! - **[`UpdateChannel`]**: Ordered [`Instruction`] buffer drained once per request
//! - **[`gpx_io`]**: GPX import and export
//!
//! # Example
//!
//! ```
//! use route_map_lib::{Coordinate, Placement, Route, RouteCollection};
//!
//! let mut collection = RouteCollection::default();
//! let route = Route::new(
//!     "r1",
//!     vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0), Coordinate::new(0.0, 2.0)],
//! )
//! .unwrap();
//! let id = collection.add(route, Placement::Live).id().cloned().unwrap();
//! collection.drain_updates();
//!
//! let (first, second) = collection.split(&id, Coordinate::new(0.0, 1.0)).unwrap();
//! assert!(first.id().is_some() && second.id().is_some());
//! assert_eq!(collection.len(), 2);
//! assert_eq!(collection.drain_updates().len(), 1 + 6 + 6);
//! ```

mod collection;
pub mod geometry;
pub mod gpx_io;
pub mod labels;
mod render;
mod route;
pub mod stats;
mod style;
mod update;

// Public API exports
pub use collection::{AddOutcome, Config, Placement, RouteCollection};
pub use geometry::Coordinate;
pub use gpx_io::ExportedRoute;
pub use labels::LabelSet;
pub use render::{ElementName, RouteHandles, RouteId};
pub use route::Route;
pub use stats::{ActivityStats, StatsReport};
pub use style::{Activity, Rgb, Style};
pub use update::{Element, Instruction, Popup, PopupRow, StylePatch, UpdateChannel, ViewBounds};

/// Error types for route map operations
#[derive(Debug, thiserror::Error)]
pub enum RouteMapError {
    #[error("Route not found: {0}")]
    NotFound(RouteId),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid activity type: {0}")]
    InvalidActivity(String),

    #[error("Collection has no routes")]
    EmptyCollection,

    #[error("Empty route")]
    EmptyRoute,

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RouteMapError>;
