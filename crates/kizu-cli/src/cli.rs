//! CLI definition using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use kizu_types::{CameraSlot, OutputFormat};

#[derive(Parser)]
#[command(name = "kizu-checker")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Vehicle damage inspection using AI photo analysis")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// External AI backend command (e.g., "gemini analyze"); stub if unset
    #[arg(long, global = true)]
    pub backend_command: Option<String>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Store directory override
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new vehicle
    Register {
        /// Manufacturer (e.g., "Toyota")
        make: String,

        /// Model name (e.g., "Camry")
        model: String,

        /// License registration number
        registration: String,
    },

    /// Attach photos to a vehicle, in slot order
    Photos {
        /// Vehicle id
        id: String,

        /// Photo files in slot order (front, rear, left, right, ...)
        photos: Vec<PathBuf>,

        /// Scan a directory for photos named by slot (front.jpg, rear.png, ...)
        #[arg(long, short = 'd')]
        dir: Option<PathBuf>,

        /// Skip the photo-quality pre-check
        #[arg(long)]
        skip_check: bool,
    },

    /// Pre-screen a single photo for a slot
    Check {
        /// Path to the photo
        image: PathBuf,

        /// Expected photo slot
        #[arg(value_enum)]
        slot: CameraSlot,
    },

    /// Analyze a vehicle's photo set and record a new inspection stage
    Analyze {
        /// Vehicle id
        id: String,

        /// Pause between analysis calls in milliseconds. Uses config value
        /// if not specified.
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Show a vehicle report
    Report {
        /// Vehicle id
        id: String,

        /// Show a specific stage instead of the latest
        #[arg(long, short = 's')]
        stage: Option<u32>,
    },

    /// Compare two inspection stages field by field
    Diff {
        /// Vehicle id
        id: String,

        /// Earlier stage number
        from: u32,

        /// Later stage number
        to: u32,
    },

    /// List registered vehicles
    List,

    /// Remove a vehicle and its whole inspection history
    Remove {
        /// Vehicle id
        id: String,
    },

    /// Remove all vehicles
    Clear {
        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set the external AI backend command ("" resets to the stub)
        #[arg(long)]
        set_backend_command: Option<String>,

        /// Set the pause between analysis calls in milliseconds
        #[arg(long)]
        set_delay_ms: Option<u64>,

        /// Set the per-call timeout in seconds
        #[arg(long)]
        set_timeout: Option<u64>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}
