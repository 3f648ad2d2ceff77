//! Route Map - JSON-lines driver
//!
//! Loads the given GPX files, prints the base scene, then answers one JSON
//! command per stdin line with one JSON response line on stdout. Logs go to
//! stderr.

mod command;
mod logging;
mod session;
mod settings;

use clap::Parser;
use session::Session;
use settings::Settings;
use std::process::ExitCode;

fn main() -> ExitCode {
    let settings = Settings::parse();
    logging::setup_logging(&settings.log_level);

    let mut session = Session::new(settings);
    if let Err(err) = session.load_startup_files() {
        tracing::error!(%err, "Failed to load startup files");
        return ExitCode::FAILURE;
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    match session.run(stdin.lock(), stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "Request loop stopped");
            ExitCode::FAILURE
        }
    }
}
