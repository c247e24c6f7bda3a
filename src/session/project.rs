//! Project persistence
//!
//! A saved project is a snapshot of both stores:
//!
//! ```text
//! {
//!   "blocks":   { "<layer_id>": { "name": ..., "type": ..., "data": {...} } },
//!   "segments": { "<layer_id>": [ { "start": ..., "stop": ..., "type": ... } ] }
//! }
//! ```
//!
//! Segment ids are not stored; loading allocates fresh ones.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{EditorError, Result};
use crate::model::{Block, FieldData, LayerId, Polarity, Segment};

/// Stored form of a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub device_kind: Option<String>,
    #[serde(default)]
    pub data: FieldData,
}

impl From<&Block> for BlockRecord {
    fn from(block: &Block) -> Self {
        Self {
            name: block.name.clone(),
            device_kind: block.device_kind.clone(),
            data: block.data.clone(),
        }
    }
}

/// Stored form of a segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub start: f64,
    pub stop: f64,
    #[serde(rename = "type")]
    pub polarity: Polarity,
}

impl From<&Segment> for SegmentRecord {
    fn from(segment: &Segment) -> Self {
        Self {
            start: segment.start,
            stop: segment.stop,
            polarity: segment.polarity,
        }
    }
}

/// Serialized session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub blocks: BTreeMap<LayerId, BlockRecord>,
    #[serde(default)]
    pub segments: BTreeMap<LayerId, Vec<SegmentRecord>>,
}

impl ProjectFile {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Saved project entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    pub name: String,
    pub modified_at: DateTime<Utc>,
}

/// Directory of saved projects, one JSON file per project name
#[derive(Debug, Clone)]
pub struct ProjectStorage {
    dir: PathBuf,
}

impl ProjectStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for a project name. Names are single path components, so a
    /// project always lives directly inside the storage directory.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(|c: char| c == '/' || c == '\\' || c == '\0');
        if invalid {
            return Err(EditorError::InvalidProjectName {
                name: name.to_string(),
            });
        }
        Ok(self.dir.join(name))
    }

    pub fn exists(&self, name: &str) -> bool {
        matches!(self.path_for(name), Ok(path) if path.is_file())
    }

    /// Write a project, creating the directory if needed
    pub fn save(&self, name: &str, project: &ProjectFile) -> Result<()> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir)?;
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, project)?;
        writer.flush()?;
        info!("Saved project '{}' to {}", name, path.display());
        Ok(())
    }

    pub fn restore(&self, name: &str) -> Result<ProjectFile> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(EditorError::ProjectNotFound { path });
        }
        let reader = BufReader::new(File::open(&path)?);
        let project = serde_json::from_reader(reader)?;
        info!("Restored project '{}' from {}", name, path.display());
        Ok(project)
    }

    /// Saved projects sorted by name. A missing directory lists nothing.
    pub fn list(&self) -> Result<Vec<ProjectEntry>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let metadata = entry.metadata().map_err(std::io::Error::from)?;
            entries.push(ProjectEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                modified_at: DateTime::<Utc>::from(metadata.modified()?),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
