//! Editor configuration
//!
//! Files are loaded in order (later wins):
//! 1. Compiled defaults
//! 2. `<config_dir>/looper/editor.toml` (user)
//! 3. `./looper.toml`, or the `--config` path when one is given
//! 4. Environment variables (`LOOPER_PROJECTS_DIR`, `LOOPER_LOG_LEVEL`)
//!
//! # Example Config
//!
//! ```toml
//! projects_dir = "~/looper/projects"
//! layer_count = 11
//! log_level = "info"
//!
//! [tempo]
//! bpm = 100
//! beats_per_measure = 4
//! beat_duration = 4
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::session::Tempo;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Where saved projects live
    pub projects_dir: PathBuf,
    /// Number of empty layers a new session starts with
    pub layer_count: usize,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    pub tempo: Tempo,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            projects_dir: home_dir().join("looper").join("projects"),
            layer_count: 11,
            log_level: "info".to_string(),
            tempo: Tempo::default(),
        }
    }
}

/// One config file; anything left out keeps the value from earlier layers
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    projects_dir: Option<String>,
    layer_count: Option<usize>,
    log_level: Option<String>,
    tempo: Option<TempoFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TempoFile {
    bpm: Option<f64>,
    beats_per_measure: Option<u32>,
    beat_duration: Option<u32>,
}

/// Where config values came from
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

impl EditorConfig {
    /// Load from the standard locations plus an optional override path
    pub fn load(config_path: Option<&Path>) -> Result<(Self, ConfigSources)> {
        let mut sources = ConfigSources::default();
        let mut config = EditorConfig::default();

        for path in discover_config_files(config_path) {
            config.apply_file(&path)?;
            sources.files.push(path);
        }
        config.apply_env(|key| std::env::var(key).ok(), &mut sources);

        Ok((config, sources))
    }

    /// Overlay one TOML file
    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| EditorError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.apply_toml(&contents, path)
    }

    fn apply_toml(&mut self, contents: &str, path: &Path) -> Result<()> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| EditorError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if let Some(dir) = file.projects_dir {
            self.projects_dir = expand_path(&dir);
        }
        if let Some(count) = file.layer_count {
            self.layer_count = count;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if let Some(tempo) = file.tempo {
            if let Some(bpm) = tempo.bpm {
                self.tempo.bpm = bpm;
            }
            if let Some(beats) = tempo.beats_per_measure {
                self.tempo.beats_per_measure = beats;
            }
            if let Some(duration) = tempo.beat_duration {
                self.tempo.beat_duration = duration;
            }
        }
        Ok(())
    }

    /// Overlay environment variables read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F, sources: &mut ConfigSources)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("LOOPER_PROJECTS_DIR") {
            self.projects_dir = expand_path(&dir);
            sources.env_overrides.push("LOOPER_PROJECTS_DIR".to_string());
        }
        if let Some(level) = lookup("LOOPER_LOG_LEVEL") {
            self.log_level = level;
            sources.env_overrides.push("LOOPER_LOG_LEVEL".to_string());
        }
    }
}

/// Existing config files in load order
pub fn discover_config_files(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Some(dirs) = directories::BaseDirs::new() {
        let user = dirs.config_dir().join("looper").join("editor.toml");
        if user.exists() {
            files.push(user);
        }
    }

    // CLI override takes precedence over local
    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("looper.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

fn home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Expand a leading `~` to the home directory
fn expand_path(path: &str) -> PathBuf {
    if path == "~" {
        home_dir()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else {
        PathBuf::from(path)
    }
}
