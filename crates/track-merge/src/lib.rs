//! Track Merge - Command-line application library
//!
//! Reads the requested track files, merges them with `track-merge-lib` and
//! writes the combined GPX document.

pub mod logging;
mod settings;

pub use settings::{STDOUT_PATH, Settings};

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use track_merge_lib::{SourceError, SourceSet, write_to};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Cannot tell the input format of {0}, pass --format gpx or --format tcx")]
    UnknownFormat(PathBuf),

    #[error("{count} of {total} source(s) could not be loaded")]
    SourcesFailed { count: usize, total: usize },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to write {path}: {error}")]
    Write {
        path: String,
        #[source]
        error: io::Error,
    },

    #[error("Failed to encode statistics: {0}")]
    Stats(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Where the merged document was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Stdout => f.write_str("standard output"),
            Output::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Load, merge and write according to `settings`
pub fn run(settings: &Settings) -> Result<Output> {
    let format = settings.input_format().ok_or_else(|| {
        CliError::UnknownFormat(settings.files.first().cloned().unwrap_or_default())
    })?;
    tracing::debug!("Merging {} {} files", settings.files.len(), format);

    let mut sources = SourceSet::new(format, settings.source_config());
    let errors = sources.load_from_files(settings.files.clone());
    if !errors.is_empty() {
        for error in &errors {
            tracing::error!("{}", error);
        }
        return Err(CliError::SourcesFailed {
            count: errors.len(),
            total: settings.files.len(),
        });
    }

    let info = sources.info();
    if info.defaulted_coordinates > 0 {
        tracing::warn!(
            "{} coordinate(s) were missing and written as 0.0",
            info.defaulted_coordinates
        );
    }

    let title = settings
        .title
        .clone()
        .unwrap_or_else(|| sources.default_title());
    let merged = sources.merge(title)?;
    tracing::info!(
        "Merged {} points from {} sources into \"{}\"",
        merged.points().len(),
        merged.source_count(),
        merged.title()
    );

    if settings.stats {
        eprintln!("{}", serde_json::to_string_pretty(&merged.stats())?);
    }

    if settings.writes_to_stdout() {
        write_to(&merged, io::stdout().lock()).map_err(|error| CliError::Write {
            path: STDOUT_PATH.to_string(),
            error,
        })?;
        return Ok(Output::Stdout);
    }

    let path = settings
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(sources.default_file_name()));
    File::create(&path)
        .and_then(|file| write_to(&merged, BufWriter::new(file)))
        .map_err(|error| CliError::Write {
            path: path.display().to_string(),
            error,
        })?;
    Ok(Output::File(path))
}
