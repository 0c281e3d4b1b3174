use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use exif2kmz::cli::{Cli, Commands};
use exif2kmz::convert::{ConvertOptions, ConvertOutcome};
use exif2kmz::{convert, inspect, schema, validate};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Inspect { images } => {
            inspect::inspect_images(&images)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Convert {
            out,
            images,
            embed_thumbnails,
            thumbnail_size,
            dry_run,
            progress,
            parallel,
            report_json,
        } => {
            let options = ConvertOptions {
                input_paths: images,
                output_path: out,
                embed_thumbnails,
                thumbnail_max_dim: thumbnail_size,
                dry_run,
                show_progress: progress,
                parallel,
                report_json,
            };
            // Exit status distinguishes full success, success with skipped
            // inputs, and failure: 0 / 2 / 1.
            match convert::convert_images(&options)? {
                ConvertOutcome::Complete { placemarks } => {
                    println!("Converted {placemarks} images");
                    Ok(ExitCode::SUCCESS)
                }
                ConvertOutcome::Partial {
                    placemarks,
                    skipped,
                } => {
                    println!("Converted {placemarks} images, skipped {skipped}");
                    Ok(ExitCode::from(2))
                }
            }
        }
        Commands::Schema {} => {
            schema::print_schema()?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { kmz } => {
            validate::validate_kmz(&kmz)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
