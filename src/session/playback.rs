//! Playback submission payload
//!
//! The transport posts this structure to the playback server; the server
//! reads `config.tempo` and one entry per configured layer out of
//! `config.devices`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Tempo used for measure-to-time conversion on the server
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    pub bpm: f64,
    pub beats_per_measure: u32,
    pub beat_duration: u32,
}

impl Default for Tempo {
    fn default() -> Self {
        Self {
            bpm: 100.0,
            beats_per_measure: 4,
            beat_duration: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub tempo: Tempo,
    pub devices: Vec<Value>,
}

/// Body of a play request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackRequest {
    pub config: PlaybackConfig,
}

impl PlaybackRequest {
    pub fn new(tempo: Tempo, devices: Vec<Value>) -> Self {
        Self {
            config: PlaybackConfig { tempo, devices },
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the request as JSON, the form the playback runner reads
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
