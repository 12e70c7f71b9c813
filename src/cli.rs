use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dashreel")]
#[command(author, version, about = "Dashcam route reassembly and streaming server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the footage server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Remux a route or a single segment to an MP4 file
    #[command(group(ArgGroup::new("source").required(true).args(["route", "segment"])))]
    Export {
        /// Camera to export (qcamera, fcamera, dcamera, ecamera)
        #[arg(long)]
        camera: String,

        /// Route id (all segments, concatenated)
        #[arg(long)]
        route: Option<String>,

        /// Single segment id
        #[arg(long)]
        segment: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Bytes per chunk read from the transcoder
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// List recorded routes, newest first
    Routes,

    /// List the segments of a route and the cameras each one has
    Segments {
        /// Route id
        route: String,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
