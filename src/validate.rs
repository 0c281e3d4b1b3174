//! Validate command - Check .kmz file structure and consistency

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Result;
use quick_xml::events::Event;
use zip::ZipArchive;

/// Validate an existing .kmz file.
///
/// Performs lightweight structural checks:
/// - the archive opens and contains `doc.kml` at its root
/// - the KML parses as XML
/// - every `<coordinates>` value is a lon,lat[,alt] float tuple in range
/// - the document contains at least one placemark
pub fn validate_kmz(kmz_path: &str) -> Result<()> {
    match check_kmz(Path::new(kmz_path)) {
        Ok(placemarks) => {
            println!("Validation of {}: PASSED", kmz_path);
            println!("Placemarks: {}", placemarks);
            Ok(())
        }
        Err(e) => {
            println!("Validation of {}: FAILED", kmz_path);
            println!("[ERROR] {e}");
            Err(e)
        }
    }
}

fn check_kmz(path: &Path) -> Result<usize> {
    if !path.exists() {
        anyhow::bail!("file does not exist");
    }

    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut kml = String::new();
    archive
        .by_name("doc.kml")
        .map_err(|_| anyhow::anyhow!("archive has no doc.kml at its root"))?
        .read_to_string(&mut kml)?;

    if kml.is_empty() {
        anyhow::bail!("doc.kml is empty");
    }

    let mut reader = quick_xml::Reader::from_str(&kml);
    let mut placemarks = 0usize;
    let mut in_coordinates = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"Placemark" => placemarks += 1,
            Event::Start(e) if e.name().as_ref() == b"coordinates" => in_coordinates = true,
            Event::End(e) if e.name().as_ref() == b"coordinates" => in_coordinates = false,
            Event::Text(text) if in_coordinates => {
                check_coordinates(&text.unescape()?)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if placemarks == 0 {
        anyhow::bail!("doc.kml contains no placemarks");
    }
    Ok(placemarks)
}

fn check_coordinates(value: &str) -> Result<()> {
    let parts: Vec<&str> = value.trim().split(',').collect();
    if parts.len() < 2 || parts.len() > 3 {
        anyhow::bail!("coordinates \"{value}\" are not lon,lat[,alt]");
    }
    let lon: f64 = parts[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("longitude \"{}\" is not a number", parts[0]))?;
    let lat: f64 = parts[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("latitude \"{}\" is not a number", parts[1]))?;
    if let Some(alt) = parts.get(2) {
        alt.parse::<f64>()
            .map_err(|_| anyhow::anyhow!("altitude \"{alt}\" is not a number"))?;
    }
    if !(-180.0..=180.0).contains(&lon) {
        anyhow::bail!("longitude {lon} out of range");
    }
    if !(-90.0..=90.0).contains(&lat) {
        anyhow::bail!("latitude {lat} out of range");
    }
    Ok(())
}
