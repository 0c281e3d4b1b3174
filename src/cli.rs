use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "exif2kmz",
    about = "Convert EXIF geotagged images into a KMZ file",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show GPS and capture-time metadata for each image
    Inspect {
        /// Image files to inspect
        #[arg(required = true)]
        images: Vec<String>,
    },

    /// Convert geotagged images into a .kmz file
    Convert {
        /// Output .kmz path
        out: String,
        /// Input image files, in placemark order
        #[arg(required = true)]
        images: Vec<String>,
        /// Embed downscaled thumbnails in the archive
        #[arg(long = "embed-thumbnails")]
        embed_thumbnails: bool,
        /// Maximum thumbnail dimension in pixels
        #[arg(long = "thumbnail-size", default_value_t = 512)]
        thumbnail_size: u32,
        /// Dry-run: extract and report but do not write any KMZ
        #[arg(long = "dry-run")]
        dry_run: bool,
        /// Show progress bar (enabled by default)
        #[arg(long = "progress", action = ArgAction::SetTrue, default_value_t = true)]
        progress: bool,
        /// Extract metadata on a thread pool
        #[arg(long = "parallel")]
        parallel: bool,
        /// Write a JSON conversion report (counts and skip reasons) here
        #[arg(long = "report-json")]
        report_json: Option<String>,
    },

    /// Show supported EXIF tag → KML element mappings
    Schema {},

    /// Validate an existing .kmz file
    Validate { kmz: String },
}
