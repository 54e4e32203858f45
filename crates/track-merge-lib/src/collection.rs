//! SourceSet - Caller-level manager for the sources of one merge
//!
//! The merge engine itself accepts anything. This module is the layer that
//! enforces the preconditions around it: every source has the set's format,
//! and at least [`Config::min_sources`] sources are loaded before merging.
//! Documents are parsed in parallel, and a failing document is reported with
//! its name without affecting its siblings.

use crate::parser::{self, ParseDiagnostics};
use crate::{FormatKind, MergedTrack, Result, SourceError, TrackSource, merge};

use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a source set
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Minimum number of loaded sources required by [`SourceSet::merge`].
    /// Default: 2
    pub min_sources: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { min_sources: 2 }
    }
}

/// Information about the source set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollectionInfo {
    /// Number of sources loaded
    pub source_count: usize,
    /// Total number of track points
    pub total_points: usize,
    /// Coordinates defaulted to 0.0 across all sources
    pub defaulted_coordinates: usize,
}

/// Ordered, single-format set of parsed sources
#[derive(Debug, Clone)]
pub struct SourceSet {
    format: FormatKind,
    config: Config,
    /// Parsed sources, kept contiguous so they can be handed to `merge` as a slice
    sources: Vec<TrackSource>,
    /// Name and diagnostics of each source (same indices as `sources`)
    labels: Vec<(String, ParseDiagnostics)>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SourceSet {
    /// Create an empty set accepting sources of `format`
    pub fn new(format: FormatKind, config: Config) -> Self {
        Self {
            format,
            config,
            sources: Vec::new(),
            labels: Vec::new(),
        }
    }

    #[inline]
    pub fn format(&self) -> FormatKind {
        self.format
    }

    /// Switch the accepted format; changing it drops every loaded source
    pub fn set_format(&mut self, format: FormatKind) {
        if format != self.format {
            if !self.is_empty() {
                tracing::info!(
                    "Switching from {} to {}, dropping {} loaded sources",
                    self.format,
                    format,
                    self.len()
                );
            }
            self.clear();
            self.format = format;
        }
    }

    /// Parse one document and append it
    ///
    /// On failure the set is left unchanged and the error names the document.
    pub fn add_document(&mut self, name: impl Into<String>, document: &str) -> Result<()> {
        let name = name.into();
        let outcome = parser::parse_with_diagnostics(self.format, document)
            .map_err(|error| SourceError::Parse {
                name: name.clone(),
                error,
            })?;
        self.push(name, TrackSource::new(self.format, outcome.points), outcome.diagnostics);
        Ok(())
    }

    /// Parse several documents in parallel and append the successful ones in input order
    ///
    /// Each document is parsed independently into its own result slot; the
    /// returned errors list every document that failed, in input order.
    pub fn add_documents_parallel(&mut self, documents: Vec<(String, String)>) -> Vec<SourceError> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::add_documents_parallel");

        let format = self.format;
        let results: Vec<(String, std::result::Result<parser::ParseOutcome, _>)> = documents
            .into_par_iter()
            .map(|(name, text)| {
                let outcome = parser::parse_with_diagnostics(format, &text);
                (name, outcome)
            })
            .collect();

        let mut errors = Vec::new();
        for (name, outcome) in results {
            match outcome {
                Ok(outcome) => {
                    self.push(name, TrackSource::new(format, outcome.points), outcome.diagnostics)
                }
                Err(error) => {
                    tracing::warn!("Failed to parse {}: {}", name, error);
                    errors.push(SourceError::Parse { name, error });
                }
            }
        }
        errors
    }

    /// Load track files in parallel
    ///
    /// Files whose extension does not match the set's format are rejected
    /// before reading. Sources are named after their file names.
    pub fn load_from_files<P: AsRef<Path> + Send + Sync>(&mut self, paths: Vec<P>) -> Vec<SourceError> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::load_from_files");

        let format = self.format;
        let read: Vec<Result<(String, String)>> = paths
            .into_par_iter()
            .map(|path| {
                let path = path.as_ref();
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                if FormatKind::from_path(path) != Some(format) {
                    let found = path
                        .extension()
                        .map(|e| e.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "no extension".to_string());
                    return Err(SourceError::FormatMismatch {
                        name,
                        expected: format,
                        found,
                    });
                }
                let text = std::fs::read_to_string(path)
                    .map_err(|error| SourceError::Io {
                        name: name.clone(),
                        error,
                    })?;
                Ok((name, text))
            })
            .collect();

        let mut errors = Vec::new();
        let mut documents = Vec::with_capacity(read.len());
        for entry in read {
            match entry {
                Ok(document) => documents.push(document),
                Err(error) => {
                    tracing::warn!("{}", error);
                    errors.push(error);
                }
            }
        }
        errors.extend(self.add_documents_parallel(documents));
        errors
    }

    /// Append an already-parsed source
    pub fn add_source(&mut self, name: impl Into<String>, source: TrackSource) -> Result<()> {
        let name = name.into();
        if source.format() != self.format {
            return Err(SourceError::FormatMismatch {
                name,
                expected: self.format,
                found: source.format().to_string(),
            });
        }
        self.push(name, source, ParseDiagnostics::default());
        Ok(())
    }

    fn push(&mut self, name: String, source: TrackSource, diagnostics: ParseDiagnostics) {
        tracing::info!("Loaded {} ({} points)", name, source.len());
        self.sources.push(source);
        self.labels.push((name, diagnostics));
    }

    /// Remove the source at `index`, shifting later sources down
    pub fn remove(&mut self, index: usize) -> Option<TrackSource> {
        if index >= self.sources.len() {
            return None;
        }
        self.labels.remove(index);
        Some(self.sources.remove(index))
    }

    /// Merge all loaded sources in order
    pub fn merge(&self, title: impl Into<String>) -> Result<MergedTrack<'_>> {
        if self.sources.len() < self.config.min_sources {
            return Err(SourceError::TooFewSources {
                required: self.config.min_sources,
                available: self.sources.len(),
            });
        }
        Ok(merge(&self.sources, title))
    }

    /// Title used when the caller does not provide one, e.g. `combined_3_gpx_gps_tracks`
    pub fn default_title(&self) -> String {
        format!(
            "combined_{}_{}_gps_tracks",
            self.sources.len(),
            self.format.extension()
        )
    }

    /// Output file name matching [`Self::default_title`]
    pub fn default_file_name(&self) -> String {
        format!("{}.gpx", self.default_title())
    }

    #[inline]
    pub fn sources(&self) -> &[TrackSource] {
        &self.sources
    }

    /// Source names, in merge order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|(name, _)| name.as_str())
    }

    /// Parse diagnostics of the source at `index`
    pub fn diagnostics(&self, index: usize) -> Option<ParseDiagnostics> {
        self.labels.get(index).map(|(_, diagnostics)| *diagnostics)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn clear(&mut self) {
        self.sources.clear();
        self.labels.clear();
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn info(&self) -> CollectionInfo {
        CollectionInfo {
            source_count: self.sources.len(),
            total_points: self.sources.iter().map(TrackSource::len).sum(),
            defaulted_coordinates: self
                .labels
                .iter()
                .map(|(_, d)| d.defaulted_coordinates)
                .sum(),
        }
    }
}
