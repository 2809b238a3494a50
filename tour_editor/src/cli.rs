use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(about = "Inspect, check and export 360° hotspot tours", version)]
pub struct Args {
    /// Optional settings JSON (hotspot distance, cache-bust parameter, asset layout)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print scenes, hotspots and navigation portals of a tour
    Inspect {
        /// Tour configuration JSON or package directory
        source: PathBuf,
    },
    /// Write a portable package (config.json plus image and audio files)
    Export {
        /// Tour configuration JSON or package directory
        source: PathBuf,
        /// Directory to write the package into
        #[arg(long)]
        out: PathBuf,
        /// Tour name recorded in the package (defaults to the stored name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Write a config-only JSON template with embedded images kept inline
    Template {
        /// Tour configuration JSON or package directory
        source: PathBuf,
        /// File to write the template to
        #[arg(long)]
        out: PathBuf,
        /// Tour name recorded in the template (defaults to the stored name)
        #[arg(long)]
        name: Option<String>,
    },
    /// List asset files a package directory references but does not contain
    Check {
        /// Package directory containing config.json
        package: PathBuf,
    },
    /// Follow every navigation portal from the entry scene and report problems
    Walk {
        /// Tour configuration JSON or package directory
        source: PathBuf,
    },
}
