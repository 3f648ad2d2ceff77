use clap::Parser;
use route_map_lib::Config;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Route Map - edit GPS route collections through JSON commands on stdin
pub struct Settings {
    /// GPX files to load on startup
    #[clap(short, long, value_name = "FILE")]
    pub gpx_files: Vec<PathBuf>,

    /// Where `save` writes when the command gives no path
    #[clap(short, long, value_name = "FILE", default_value = "routes.gpx")]
    pub output: PathBuf,

    /// Simplification tolerance applied to imported tracks, in meters
    #[clap(long, default_value = "1.0", value_parser = parse_non_negative)]
    pub import_tolerance: f64,

    /// Line width cap for exported routes
    #[clap(long, default_value = "5.0", value_parser = parse_non_negative)]
    pub max_export_width: f64,

    /// Max per-point distance for same-named routes to count as duplicates, in meters
    #[clap(long, default_value = "0.1", value_parser = parse_non_negative)]
    pub duplicate_tolerance: f64,

    /// Tolerance of the `simplify` command, in meters
    #[clap(long, default_value = "5.0", value_parser = parse_non_negative)]
    pub simplify_tolerance: f64,

    /// Log filter used when RUST_LOG is not set
    #[clap(long, default_value = "info")]
    pub log_level: String,
}

/// Tolerances and widths must be finite and not negative
fn parse_non_negative(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|err| format!("{err}"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("expected a finite value >= 0, got {value}"))
    }
}

impl Settings {
    /// Collection configuration with the tolerances overridden from the command line
    pub fn collection_config(&self) -> Config {
        Config {
            duplicate_tolerance: self.duplicate_tolerance,
            simplify_tolerance: self.simplify_tolerance,
            ..Config::default()
        }
    }
}
