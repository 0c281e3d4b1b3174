//! Conversion driver: extract placemark records from the input list, then
//! hand the survivors to the KMZ writer in input order.

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;

use crate::extract::{self, ExtractionError, PlacemarkRecord};
use crate::kmz::{self, KmzArchive};
use crate::thumbnail;

/// Options for one conversion job. Built once per invocation and immutable
/// afterwards.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Input image paths, in the order placemarks should appear
    pub input_paths: Vec<String>,
    /// Path of the output .kmz file
    pub output_path: String,
    /// Embed a downscaled JPEG preview per placemark
    pub embed_thumbnails: bool,
    /// Maximum thumbnail dimension in pixels
    pub thumbnail_max_dim: u32,
    /// Dry run: extract and report but don't write output
    pub dry_run: bool,
    /// Show progress bar
    pub show_progress: bool,
    /// Extract metadata on a rayon thread pool
    pub parallel: bool,
    /// Write a JSON conversion report to this path
    pub report_json: Option<String>,
}

/// One skipped input file and why it was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct SkipEntry {
    pub path: String,
    pub reason: &'static str,
    pub detail: String,
}

/// How the job ended when it did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    /// Every input became a placemark
    Complete { placemarks: usize },
    /// Some inputs were skipped but at least one placemark was written
    Partial { placemarks: usize, skipped: usize },
}

#[derive(Serialize)]
struct ConvertReport<'a> {
    inputs: usize,
    placemarks: usize,
    skipped: &'a [SkipEntry],
}

/// Convert a list of geotagged images into one KMZ file.
///
/// Per-file extraction failures are collected into the skip report and the
/// job continues; an empty surviving record set or an output I/O error is
/// fatal and leaves no output file behind.
pub fn convert_images(options: &ConvertOptions) -> Result<ConvertOutcome> {
    if options.input_paths.is_empty() {
        anyhow::bail!("no input files given");
    }
    if options.embed_thumbnails && options.thumbnail_max_dim == 0 {
        anyhow::bail!("thumbnail-size must be > 0");
    }

    let pb = if options.show_progress {
        let pb = ProgressBar::new(options.input_paths.len() as u64);
        pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} images").unwrap());
        Some(pb)
    } else {
        None
    };

    let extract_one = |path: &String| {
        let result = extract::extract_placemark(Path::new(path));
        if let Some(pb) = &pb {
            pb.inc(1);
        }
        result
    };

    // Records are independent; collecting an indexed parallel iterator
    // restores input order regardless of completion order.
    let results: Vec<Result<PlacemarkRecord, ExtractionError>> = if options.parallel {
        options.input_paths.par_iter().map(extract_one).collect()
    } else {
        options.input_paths.iter().map(extract_one).collect()
    };

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for (path, result) in options.input_paths.iter().zip(results) {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(path = %path, reason = e.kind(), "skipping input: {e}");
                skipped.push(SkipEntry {
                    path: path.clone(),
                    reason: e.kind(),
                    detail: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        inputs = options.input_paths.len(),
        placemarks = records.len(),
        skipped = skipped.len(),
        "extraction finished"
    );

    if let Some(report_path) = &options.report_json {
        let report = ConvertReport {
            inputs: options.input_paths.len(),
            placemarks: records.len(),
            skipped: &skipped,
        };
        let file = std::fs::File::create(report_path)
            .with_context(|| format!("failed to create report: {report_path}"))?;
        serde_json::to_writer_pretty(file, &report)?;
    }

    if records.is_empty() {
        return Err(kmz::WriteError::EmptyRecordSet.into());
    }

    if options.dry_run {
        println!(
            "Plan: {} inputs, {} placemarks, {} skipped → output: {}",
            options.input_paths.len(),
            records.len(),
            skipped.len(),
            options.output_path
        );
        return Ok(outcome(records.len(), skipped.len()));
    }

    let thumbnails: Vec<Option<Vec<u8>>> = if options.embed_thumbnails {
        records
            .iter()
            .map(|record| {
                match thumbnail::render_thumbnail(
                    &record.source_path,
                    record.orientation,
                    options.thumbnail_max_dim,
                ) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        // Non-fatal: the placemark keeps its point, just
                        // without a preview image.
                        tracing::warn!(path = %record.source_path.display(), "no thumbnail: {e:#}");
                        None
                    }
                }
            })
            .collect()
    } else {
        vec![None; records.len()]
    };

    let archive = KmzArchive::build(&records, &thumbnails)?;
    kmz::write_kmz(&archive, Path::new(&options.output_path))?;
    tracing::info!(
        output = %options.output_path,
        placemarks = records.len(),
        embedded = archive.embedded_files.len(),
        "saved KMZ"
    );

    Ok(outcome(records.len(), skipped.len()))
}

fn outcome(placemarks: usize, skipped: usize) -> ConvertOutcome {
    if skipped == 0 {
        ConvertOutcome::Complete { placemarks }
    } else {
        ConvertOutcome::Partial {
            placemarks,
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(inputs: Vec<String>, out: &Path) -> ConvertOptions {
        ConvertOptions {
            input_paths: inputs,
            output_path: out.to_string_lossy().into_owned(),
            embed_thumbnails: false,
            thumbnail_max_dim: 512,
            dry_run: false,
            show_progress: false,
            parallel: false,
            report_json: None,
        }
    }

    #[test]
    fn test_no_inputs_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.kmz");
        assert!(convert_images(&options(vec![], &out)).is_err());
    }

    #[test]
    fn test_all_invalid_inputs_fail_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.jpg");
        std::fs::write(&bad, b"junk").unwrap();
        let out = dir.path().join("out.kmz");

        let err =
            convert_images(&options(vec![bad.to_string_lossy().into_owned()], &out)).unwrap_err();
        assert!(err.downcast_ref::<kmz::WriteError>().is_some());
        assert!(!out.exists());
    }

    #[test]
    fn test_report_json_written_even_when_job_fails() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.jpg");
        std::fs::write(&bad, b"junk").unwrap();
        let out = dir.path().join("out.kmz");
        let report = dir.path().join("report.json");

        let mut opts = options(vec![bad.to_string_lossy().into_owned()], &out);
        opts.report_json = Some(report.to_string_lossy().into_owned());
        assert!(convert_images(&opts).is_err());

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(parsed["inputs"], 1);
        assert_eq!(parsed["placemarks"], 0);
        assert_eq!(parsed["skipped"][0]["reason"], "CorruptMetadata");
    }
}
