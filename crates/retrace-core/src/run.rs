// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Run files (`*.mcg`): a starting graph, the frame log, and free-form
//! metadata. Also the directory scan that lists the runs a viewer can open.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use retrace_graph::GraphSnapshot;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::log::Log;

/// File extension of run files.
pub const RUN_EXTENSION: &str = "mcg";

/// Errors raised while reading run files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Filesystem failure.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File or directory being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid run document.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// File being parsed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Run metadata. Only a few keys mean anything to replay; the rest is kept
/// verbatim for display layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    /// Human-readable name shown in run lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Run name; defaults to the file stem when loaded from disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Stylesheet the run was recorded for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Whether links animate flow particles.
    #[serde(default, deserialize_with = "truthy")]
    pub particles: bool,
    /// Everything else.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Json>,
}

/// A parsed run document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunFile {
    /// Metadata.
    #[serde(default)]
    pub meta: RunMeta,
    /// Starting graph. Older files call it `data`.
    #[serde(default, alias = "data")]
    pub graph: GraphSnapshot,
    /// The operation log.
    #[serde(default)]
    pub frames: Log,
    /// Viewer settings; opaque to replay.
    #[serde(default)]
    pub settings: Option<Json>,
}

impl RunFile {
    /// Parses a run document from memory.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Reads and parses `path`; `meta.filename` falls back to the file stem.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;
        let mut run = Self::from_slice(&bytes).map_err(|source| LoadError::Json {
            path: path.to_owned(),
            source,
        })?;
        if run.meta.filename.is_none() {
            run.meta.filename = file_stem(path);
        }
        debug!(
            path = %path.display(),
            frames = run.frames.frame_count(),
            steps = run.frames.total_steps(),
            "loaded run"
        );
        Ok(run)
    }

    /// Title if present, otherwise the run name.
    pub fn display_name(&self) -> &str {
        self.meta
            .title
            .as_deref()
            .or(self.meta.filename.as_deref())
            .unwrap_or("untitled")
    }
}

/// One openable run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEntry {
    /// Display name (`meta.title`, else the file stem).
    pub name: String,
    /// File stem; what `open` accepts.
    pub file: String,
    /// Full path.
    pub path: PathBuf,
}

/// The runs found in one directory, sorted by file stem.
#[derive(Debug, Clone, Default)]
pub struct RunCatalog {
    entries: Vec<RunEntry>,
}

impl RunCatalog {
    /// Lists every parseable `*.mcg` file in `dir`. Files that cannot be read
    /// or parsed are skipped with a warning; only an unreadable `dir` fails.
    pub fn scan(dir: &Path) -> Result<Self, LoadError> {
        let io_err = |source| LoadError::Io {
            path: dir.to_owned(),
            source,
        };
        let mut entries = Vec::new();
        for dirent in fs::read_dir(dir).map_err(io_err)? {
            let path = dirent.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RUN_EXTENSION) {
                continue;
            }
            match RunFile::load(&path) {
                Ok(run) => {
                    let file = run.meta.filename.clone().unwrap_or_default();
                    entries.push(RunEntry {
                        name: run.display_name().to_owned(),
                        file,
                        path,
                    });
                }
                Err(err) => warn!(%err, "skipping run file"),
            }
        }
        entries.sort_by(|a, b| a.file.cmp(&b.file));
        Ok(Self { entries })
    }

    /// Entries in file order.
    pub fn entries(&self) -> &[RunEntry] {
        &self.entries
    }

    /// Looks a run up by file stem.
    pub fn find(&self, file: &str) -> Option<&RunEntry> {
        self.entries.iter().find(|e| e.file == file)
    }

    /// Number of runs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no run was found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Path a run named `name` would have inside `dir`.
pub fn run_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{RUN_EXTENSION}"))
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
}

fn truthy<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    Ok(match Json::deserialize(de)? {
        Json::Null => false,
        Json::Bool(b) => b,
        Json::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Json::String(s) => !s.is_empty(),
        Json::Array(_) | Json::Object(_) => true,
    })
}
