//! The request cycle: one command in, one mutation, one drain, one response out

use crate::command::{Command, CommandError};
use crate::settings::Settings;
use route_map_lib::{Instruction, Placement, RouteCollection, RouteMapError, gpx_io};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, BufRead, Write};

/// One response line
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum Response {
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        instructions: Vec<Instruction>,
    },
    Error {
        message: String,
    },
}

/// Single owner of the collection and its update channel
///
/// Requests are handled strictly one after another, so a drain always
/// returns exactly the instructions of the request that produced them.
pub struct Session {
    collection: RouteCollection,
    settings: Settings,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            collection: RouteCollection::new(settings.collection_config()),
            settings,
        }
    }

    pub fn collection(&self) -> &RouteCollection {
        &self.collection
    }

    /// Load the startup files as static routes and frame them
    pub fn load_startup_files(&mut self) -> Result<usize, RouteMapError> {
        let routes = gpx_io::load_gpx_files(&self.settings.gpx_files)?;
        let mut added = 0;
        for route in gpx_io::prepare_imports(&routes, self.settings.import_tolerance) {
            if self.collection.add(route, Placement::Static).id().is_some() {
                added += 1;
            }
        }

        match self.collection.fit_bounds() {
            Ok(_) | Err(RouteMapError::EmptyCollection) => {}
            Err(err) => return Err(err),
        }
        // The fitted view is part of the base scene
        self.collection.drain_updates();

        tracing::info!(files = self.settings.gpx_files.len(), routes = added, "Startup routes loaded");
        Ok(added)
    }

    /// Handle one request line
    pub fn handle_line(&mut self, line: &str) -> Response {
        let outcome = Command::parse(line).and_then(|command| {
            tracing::debug!(?command, "Handling command");
            command.apply(&mut self.collection, &self.settings)
        });
        let instructions = self.collection.drain_updates();

        match outcome {
            Ok(result) => Response::Ok { result, instructions },
            Err(err) => {
                report_error(&err);
                Response::Error {
                    message: err.to_string(),
                }
            }
        }
    }

    /// Serve requests until the input ends
    ///
    /// The first line written is the base scene.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        let scene = Response::Ok {
            result: None,
            instructions: self.collection.base_scene(),
        };
        write_response(&mut output, &scene)?;

        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line);
            write_response(&mut output, &response)?;
        }
        Ok(())
    }
}

fn report_error(err: &CommandError) {
    match err {
        CommandError::RouteMap(RouteMapError::Io(_)) | CommandError::Encode(_) => {
            tracing::error!(%err, "Command failed")
        }
        _ => tracing::warn!(%err, "Command rejected"),
    }
}

fn write_response<W: Write>(output: &mut W, response: &Response) -> io::Result<()> {
    serde_json::to_writer(&mut *output, response)?;
    output.write_all(b"\n")?;
    output.flush()
}
