//! Command-line interface for voxgate
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Live speech segmentation and transcription
#[derive(Parser, Debug)]
#[command(name = "voxgate", version, about = "Live speech segmentation and transcription")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress operational output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print per-frame speech probabilities in addition to transcripts
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print events as JSON lines instead of plain text
    #[arg(long)]
    pub json: bool,

    /// Audio input device (e.g., pipewire)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Whisper model file for transcription
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Language code for transcription (e.g., en, de) or "auto"
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Speech probability threshold (0.0 to 1.0)
    #[arg(long, value_name = "THRESHOLD")]
    pub threshold: Option<f32>,

    /// Silence duration that ends a segment. Examples: 100ms, 1s
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub silence_timeout: Option<u32>,

    /// Audio kept from before speech onset. Examples: 500ms, 1s
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub pre_roll: Option<u32>,

    /// Lookahead audio appended after a segment. Examples: 500ms, 1s
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub post_roll: Option<u32>,
}

/// Parse a duration string into milliseconds.
///
/// Supports any format accepted by `humantime`: bare numbers (milliseconds),
/// single-unit (`100ms`, `2s`), and compound (`1s500ms`).
fn parse_duration_ms(s: &str) -> Result<u32, String> {
    let s = s.trim();
    // Bare number → milliseconds
    if let Ok(ms) = s.parse::<u32>() {
        return Ok(ms);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_millis().min(u32::MAX as u128) as u32)
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,
}
