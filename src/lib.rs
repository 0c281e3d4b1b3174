//! exif2kmz - Convert EXIF geotagged images into KMZ (zipped KML) files
//!
//! This library reads EXIF geotag metadata (GPS coordinates, altitude,
//! capture timestamp, orientation) from a batch of image files and writes a
//! single KMZ archive with one KML placemark per geotagged image, suitable
//! for viewing in mapping applications.
//!
//! # Features
//!
//! - **Extraction**: GPS DMS → signed decimal degrees, altitude with
//!   sea-level reference, capture time with optional UTC offset
//! - **Skip-and-continue**: files without GPS tags, unreadable files and
//!   corrupt metadata become skip-report entries, never job failures
//! - **KMZ output**: `doc.kml` plus optional embedded thumbnails, written
//!   atomically, byte-identical across reruns of the same input
//! - **Parallel extraction**: optional rayon fan-out with output order
//!   pinned to input order
//!
//! # Example
//!
//! ```rust,no_run
//! use exif2kmz::{convert_images, ConvertOptions};
//!
//! let options = ConvertOptions {
//!     input_paths: vec!["photo1.jpg".to_string(), "photo2.jpg".to_string()],
//!     output_path: "photos.kmz".to_string(),
//!     embed_thumbnails: true,
//!     thumbnail_max_dim: 512,
//!     dry_run: false,
//!     show_progress: false,
//!     parallel: false,
//!     report_json: None,
//! };
//!
//! convert_images(&options)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Known limitation: EXIF timestamps without an `OffsetTime*` tag are local
//! wall-clock times with no zone; they are reported as-is and never assumed
//! to be UTC.

pub mod cli;
pub mod convert;
pub mod extract;
pub mod inspect;
pub mod kml;
pub mod kmz;
pub mod schema;
pub mod thumbnail;
pub mod validate;

// Re-export main types for convenience
pub use convert::{convert_images, ConvertOptions, ConvertOutcome, SkipEntry};
pub use extract::{extract_placemark, CaptureTime, ExtractionError, PlacemarkRecord};
pub use kmz::{write_kmz, KmzArchive, WriteError};
