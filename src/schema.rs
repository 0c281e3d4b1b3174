//! Schema command - Print supported EXIF → KML mappings

use anyhow::Result;

/// Print how EXIF tags map onto elements of the generated KML document.
pub fn print_schema() -> Result<()> {
    println!("Supported EXIF → KML mappings:");
    println!("---------------------------------------------------------------");

    let mappings = vec![
        ("GPSLatitude + GPSLatitudeRef", "<Point><coordinates> (lat)"),
        ("GPSLongitude + GPSLongitudeRef", "<Point><coordinates> (lon)"),
        ("GPSAltitude + GPSAltitudeRef", "<Point><coordinates> (alt)"),
        ("DateTimeOriginal / DateTime", "<description> capture time"),
        ("OffsetTimeOriginal / OffsetTime", "<TimeStamp><when>"),
        ("ImageDescription", "<name> (falls back to file stem)"),
        ("Orientation", "embedded thumbnail rotation"),
    ];

    for (exif_tags, kml_element) in mappings {
        println!("{:<34} → {}", exif_tags, kml_element);
    }

    println!();
    println!("Coordinates are signed decimal degrees: deg + min/60 + sec/3600,");
    println!("negated for S/W hemisphere references.");
    println!("Timestamps without an OffsetTime tag stay local-naive and are");
    println!("reported in the description only, never assumed to be UTC.");

    Ok(())
}
