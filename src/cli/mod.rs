//! CLI Module
//!
//! Command-line front end over saved looper projects.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::Polarity;

/// Looper Editor - configure layers and place segments in looper projects
#[derive(Parser, Debug)]
#[command(name = "looper-editor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of ./looper.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List device kinds and what they support
    #[command(name = "kinds")]
    Kinds,

    /// List saved projects
    #[command(name = "projects")]
    Projects,

    /// Create a new project with empty layers
    #[command(name = "new")]
    New {
        /// Project name
        project: String,
    },

    /// Print layers and segments of a project
    #[command(name = "show")]
    Show {
        /// Project name
        project: String,
    },

    /// Commit settings for a layer
    #[command(name = "configure")]
    Configure {
        /// Project name
        project: String,

        /// Layer id
        #[arg(short, long)]
        layer: u64,

        /// Layer display name
        #[arg(short, long)]
        name: String,

        /// Device kind
        #[arg(short, long)]
        kind: String,

        /// Field value as key=value (repeatable)
        #[arg(short, long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,

        /// Input channel list
        #[arg(long)]
        inputs: Option<String>,

        /// Output channel list
        #[arg(long)]
        outputs: Option<String>,
    },

    /// Add a segment to a layer
    #[command(name = "add-segment")]
    AddSegment {
        /// Project name
        project: String,

        #[arg(short, long)]
        layer: u64,

        #[arg(long)]
        start: f64,

        #[arg(long)]
        stop: f64,

        #[arg(short, long, value_parser = parse_polarity)]
        polarity: Polarity,
    },

    /// Change an existing segment
    #[command(name = "update-segment")]
    UpdateSegment {
        /// Project name
        project: String,

        #[arg(short, long)]
        layer: u64,

        /// Segment id as printed by `show`
        #[arg(short, long)]
        segment: u64,

        #[arg(long)]
        start: f64,

        #[arg(long)]
        stop: f64,

        #[arg(short, long, value_parser = parse_polarity)]
        polarity: Polarity,
    },

    /// Show what a click at a measure would hit
    #[command(name = "at")]
    At {
        /// Project name
        project: String,

        #[arg(short, long)]
        layer: u64,

        #[arg(short, long)]
        measure: f64,
    },

    /// Print or write the play request for a project
    #[command(name = "play-request")]
    PlayRequest {
        /// Project name
        project: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn parse_polarity(raw: &str) -> Result<Polarity, String> {
    raw.parse()
}
