//! Inspect command: per-file summary of the geotag metadata the converter
//! would use, without writing anything.

use anyhow::Result;

use crate::extract;

/// Print a table of GPS and capture-time metadata for each image, with the
/// skip reason for files that would not become placemarks.
pub fn inspect_images(paths: &[String]) -> Result<()> {
    println!(
        "{:<40} {:>12} {:>12} {:>9} {:<32} {}",
        "File", "Latitude", "Longitude", "Alt(m)", "Captured", "Status"
    );
    println!("{}", "-".repeat(120));

    let mut geotagged = 0usize;
    for path in paths {
        match extract::extract_placemark(std::path::Path::new(path)) {
            Ok(record) => {
                geotagged += 1;
                println!(
                    "{:<40} {:>12.6} {:>12.6} {:>9} {:<32} ok",
                    path,
                    record.latitude,
                    record.longitude,
                    record
                        .altitude_m
                        .map(|a| format!("{a:.1}"))
                        .unwrap_or_else(|| "-".to_string()),
                    record
                        .timestamp
                        .map(|ts| ts.display())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            Err(e) => {
                println!(
                    "{:<40} {:>12} {:>12} {:>9} {:<32} {}",
                    path,
                    "-",
                    "-",
                    "-",
                    "-",
                    e.kind()
                );
            }
        }
    }

    println!();
    println!("{} of {} files geotagged", geotagged, paths.len());
    Ok(())
}
