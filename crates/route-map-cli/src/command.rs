//! One JSON command per request, mapped onto a single collection operation

use crate::settings::Settings;
use route_map_lib::{
    ActivityStats, AddOutcome, Coordinate, LabelSet, Placement, RouteCollection, RouteId, RouteMapError,
    gpx_io,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Errors surfaced to the client in an `ERROR` response
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Malformed command: {0}")]
    Parse(serde_json::Error),

    #[error("Failed to encode result: {0}")]
    Encode(serde_json::Error),

    #[error(transparent)]
    RouteMap(#[from] RouteMapError),
}

/// A client request
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    Remove {
        id: RouteId,
    },
    Split {
        id: RouteId,
        at: Coordinate,
    },
    Simplify {
        id: RouteId,
    },
    SetActivity {
        id: RouteId,
        activity: String,
    },
    AddLabels {
        id: RouteId,
        labels: String,
    },
    RemoveLabels {
        id: RouteId,
        labels: String,
    },
    UpdateInfo {
        id: RouteId,
        name: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        labels: String,
    },
    EditPoints {
        id: RouteId,
        points: Vec<Coordinate>,
    },
    Info {
        id: RouteId,
        at: Coordinate,
    },
    Stats {
        #[serde(default)]
        labels: String,
    },
    Highlight {
        #[serde(default)]
        labels: String,
    },
    FitBounds,
    BeginCreate,
    EndCreate {
        points: Vec<Coordinate>,
    },
    BeginEdit {
        id: RouteId,
    },
    ToggleMarkers,
    /// Instructions for the initial page
    Scene,
    /// Import a GPX file into the live scene
    Load {
        path: PathBuf,
    },
    /// Export routes matching `labels` to GPX
    Save {
        #[serde(default)]
        labels: String,
        path: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct StatsResult<'a> {
    labels: &'a LabelSet,
    rows: Vec<(&'static str, ActivityStats)>,
}

fn encode<T: Serialize>(value: T) -> Result<Option<Value>, CommandError> {
    serde_json::to_value(value).map(Some).map_err(CommandError::Encode)
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        serde_json::from_str(line).map_err(CommandError::Parse)
    }

    /// Run against the collection, returning the command's own result value
    ///
    /// Instructions produced along the way stay in the collection's channel.
    pub fn apply(self, collection: &mut RouteCollection, settings: &Settings) -> Result<Option<Value>, CommandError> {
        match self {
            Command::Remove { id } => {
                collection.remove(&id)?;
                Ok(None)
            }
            Command::Split { id, at } => {
                let (first, second) = collection.split(&id, at)?;
                encode([first.id(), second.id()])
            }
            Command::Simplify { id } => encode(collection.simplify(&id)?.id()),
            Command::SetActivity { id, activity } => {
                collection.set_activity_type(&id, &activity)?;
                Ok(None)
            }
            Command::AddLabels { id, labels } => {
                collection.add_labels(&id, &labels)?;
                Ok(None)
            }
            Command::RemoveLabels { id, labels } => {
                collection.remove_labels(&id, &labels)?;
                Ok(None)
            }
            Command::UpdateInfo {
                id,
                name,
                description,
                labels,
            } => {
                collection.update_info(&id, &name, &description, &labels)?;
                Ok(None)
            }
            Command::EditPoints { id, points } => {
                collection.edit_points(&id, points)?;
                Ok(None)
            }
            Command::Info { id, at } => {
                collection.info(&id, at)?;
                Ok(None)
            }
            Command::Stats { labels } => {
                let report = collection.stats(&labels);
                encode(StatsResult {
                    labels: &report.labels,
                    rows: report.rows(),
                })
            }
            Command::Highlight { labels } => {
                collection.enable_highlight(&labels);
                Ok(None)
            }
            Command::FitBounds => match collection.fit_bounds() {
                Ok(bounds) => encode(bounds),
                Err(RouteMapError::EmptyCollection) => {
                    tracing::debug!("Nothing to fit");
                    Ok(None)
                }
                Err(err) => Err(err.into()),
            },
            Command::BeginCreate => {
                collection.begin_create();
                Ok(None)
            }
            Command::EndCreate { points } => encode(collection.end_create(points)?.id()),
            Command::BeginEdit { id } => {
                collection.begin_edit(&id)?;
                Ok(None)
            }
            Command::ToggleMarkers => encode(collection.toggle_markers()),
            Command::Scene => encode(collection.base_scene()),
            Command::Load { path } => {
                let routes = gpx_io::load_gpx_file(&path)?;
                let ids: Vec<RouteId> = gpx_io::prepare_imports(&routes, settings.import_tolerance)
                    .into_iter()
                    .filter_map(|route| match collection.add(route, Placement::Live) {
                        AddOutcome::Added(id) => Some(id),
                        AddOutcome::Skipped { .. } => None,
                    })
                    .collect();
                encode(ids)
            }
            Command::Save { labels, path } => {
                let path = path.unwrap_or_else(|| settings.output.clone());
                let exported = collection.export(&labels, settings.max_export_width);
                gpx_io::save_gpx_file(&path, &exported)?;
                encode(exported.len())
            }
        }
    }
}
