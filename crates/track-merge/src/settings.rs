use clap::Parser;
use std::path::{Path, PathBuf};
use track_merge_lib::{Config, FormatKind};

/// Output path meaning "write to standard output"
pub const STDOUT_PATH: &str = "-";

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Track Merge - Combine several GPX or TCX recordings into a single GPX track
pub struct Settings {
    /// Track files to merge, in merge order
    #[clap(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Input format (gpx or tcx); defaults to the first file's extension
    #[clap(short, long)]
    pub format: Option<FormatKind>,

    /// Title written to the output metadata [default: combined_<n>_<format>_gps_tracks]
    #[clap(short, long)]
    pub title: Option<String>,

    /// Output file, or "-" for standard output [default: combined_<n>_<format>_gps_tracks.gpx]
    #[clap(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Minimum number of sources required to merge
    #[clap(long, default_value = "2")]
    pub min_sources: usize,

    /// Print statistics about the merged track as JSON to stderr
    #[clap(long, default_value = "false")]
    pub stats: bool,
}

impl Settings {
    /// Parse the process arguments, exiting with usage help on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Format given on the command line, or guessed from the first file name
    pub fn input_format(&self) -> Option<FormatKind> {
        self.format
            .or_else(|| self.files.first().and_then(FormatKind::from_path))
    }

    pub fn source_config(&self) -> Config {
        Config {
            min_sources: self.min_sources,
        }
    }

    /// Whether the merged document goes to standard output
    pub fn writes_to_stdout(&self) -> bool {
        self.output
            .as_deref()
            .is_some_and(|path| path == Path::new(STDOUT_PATH))
    }
}
