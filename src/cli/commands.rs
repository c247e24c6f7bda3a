//! CLI Command Implementations
//!
//! Each command restores the named project into a fresh session, runs one
//! operation through the session, and saves again if anything changed.

use std::path::Path;

use log::{info, warn};

use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::model::{LayerId, Polarity, Segment, SegmentId};
use crate::schema::{Cardinality, DeviceSchemaRegistry};
use crate::session::{ClickTarget, ProjectStorage, Session, SettingsForm};

fn storage(config: &EditorConfig) -> ProjectStorage {
    ProjectStorage::new(&config.projects_dir)
}

fn open_session(config: &EditorConfig, project: &str) -> Result<Session> {
    let saved = storage(config).restore(project)?;
    let mut session = Session::new(DeviceSchemaRegistry::with_defaults(), 0, config.tempo);
    session.load(&saved)?;
    Ok(session)
}

fn save_session(config: &EditorConfig, project: &str, session: &Session) -> Result<()> {
    storage(config).save(project, &session.snapshot())
}

fn describe(cardinality: Option<Cardinality>) -> String {
    match cardinality {
        None => "-".to_string(),
        Some(c) if c.is_unbounded() => format!("{}..", c.min_count),
        Some(c) => format!("{}..{}", c.min_count, c.max_count),
    }
}

/// List device kinds.
pub fn kinds() -> Result<()> {
    let registry = DeviceSchemaRegistry::with_defaults();

    for kind in registry.list_kinds() {
        let schema = registry.get_schema(kind)?;
        println!("{}", kind);
        for field in &schema.required_fields {
            println!("    {} ({:?}, required)", field.name, field.field_type);
        }
        for field in &schema.optional_fields {
            println!("    {} ({:?}, optional)", field.name, field.field_type);
        }
        println!(
            "    channels in: {} out: {} | segments in: {} out: {}",
            describe(schema.input_channels),
            describe(schema.output_channels),
            describe(schema.input_segments),
            describe(schema.output_segments),
        );
    }
    Ok(())
}

/// List saved projects.
pub fn projects(config: &EditorConfig) -> Result<()> {
    let entries = storage(config).list()?;
    if entries.is_empty() {
        println!("No projects in {}", config.projects_dir.display());
        return Ok(());
    }
    for entry in entries {
        println!(
            "{:<32} {}",
            entry.name,
            entry.modified_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

/// Create a project with the configured number of empty layers.
pub fn new_project(config: &EditorConfig, project: &str) -> Result<()> {
    info!("Creating project: {}", project);
    let storage = storage(config);
    let path = storage.path_for(project)?;
    if storage.exists(project) {
        warn!("Overwriting existing project '{}'", project);
    }
    storage.save(project, &Session::from_config(config).snapshot())?;
    println!("Project created: {}", path.display());
    Ok(())
}

/// Print every layer with its configuration and segments.
pub fn show(config: &EditorConfig, project: &str) -> Result<()> {
    let session = open_session(config, project)?;
    let timeline = session.timeline();

    println!("Project: {}", project);
    println!("{:-<60}", "");
    for layer in session.layers() {
        let block = timeline.block(layer)?;
        match &block.device_kind {
            Some(kind) => println!("[{}] {} ({})", layer, block.name, kind),
            None => println!("[{}] {} (unconfigured)", layer, block.name),
        }
        for (key, value) in &block.data {
            println!("      {} = {}", key, serde_json::to_string(value)?);
        }
        for segment in timeline.segments(layer) {
            println!(
                "      segment {}: {} {} -> {}",
                segment.id, segment.polarity, segment.start, segment.stop
            );
        }
    }
    println!("{:-<60}", "");
    Ok(())
}

/// Run the settings commit for one layer and save on success.
pub fn configure(config: &EditorConfig, project: &str, layer: u64, form: &SettingsForm) -> Result<()> {
    info!("Configuring layer {} in {}", layer, project);
    let mut session = open_session(config, project)?;

    if let Err(errors) = session.commit_settings(LayerId(layer), form) {
        for error in errors.iter() {
            println!("error: {}", error);
        }
        return Err(errors.into());
    }

    save_session(config, project, &session)?;
    println!("Layer {} configured as {}", layer, form.device_kind);
    Ok(())
}

/// Add a segment to a layer and save.
pub fn add_segment(
    config: &EditorConfig,
    project: &str,
    layer: u64,
    start: f64,
    stop: f64,
    polarity: Polarity,
) -> Result<()> {
    let mut session = open_session(config, project)?;
    let id = session.place_segment(LayerId(layer), start, stop, polarity)?;
    save_session(config, project, &session)?;
    println!("Added segment {} to layer {}", id, layer);
    Ok(())
}

/// Update an existing segment and save.
pub fn update_segment(
    config: &EditorConfig,
    project: &str,
    layer: u64,
    segment: u64,
    start: f64,
    stop: f64,
    polarity: Polarity,
) -> Result<()> {
    let mut session = open_session(config, project)?;
    let edited = Segment::new(SegmentId(segment), start, stop, polarity);
    session.edit_segment(LayerId(layer), &edited)?;
    save_session(config, project, &session)?;
    println!("Updated segment {} on layer {}", segment, layer);
    Ok(())
}

/// Report whether a click at `measure` would edit or create.
pub fn at(config: &EditorConfig, project: &str, layer: u64, measure: f64) -> Result<()> {
    let session = open_session(config, project)?;
    let layer = LayerId(layer);
    let timeline = session.timeline();
    // Surface unknown layers instead of silently reporting "create"
    timeline.block(layer)?;

    match timeline.resolve_click(layer, measure) {
        ClickTarget::Edit(id) => {
            let segment = timeline
                .segments(layer)
                .iter()
                .find(|s| s.id == id)
                .ok_or(EditorError::UpdateTargetMissing { layer, segment: id })?;
            println!(
                "edit segment {}: {} {} -> {}",
                id, segment.polarity, segment.start, segment.stop
            );
        }
        ClickTarget::Create { measure } => println!("create new segment at {}", measure),
    }
    Ok(())
}

/// Print the play request or write it to a file.
pub fn play_request(config: &EditorConfig, project: &str, out: Option<&Path>) -> Result<()> {
    let session = open_session(config, project)?;
    let request = session.playback_request();

    match out {
        Some(path) => {
            request.write_to(path)?;
            println!(
                "Wrote play request with {} devices to {}",
                request.config.devices.len(),
                path.display()
            );
        }
        None => println!("{}", request.to_json_pretty()?),
    }
    Ok(())
}
