//! Payload file generation from raw datasets

use crate::error::PayloadError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufRead, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Payloads produced from a dataset, plus how many rows were dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generated {
    pub payloads: Vec<Value>,
    pub skipped: usize,
}

/// `{"features": [f64; feature_count]}` per CSV row
///
/// The first row is a header. Extra columns (e.g. the label) are ignored;
/// rows that are too short or do not parse as numbers are skipped.
pub fn from_csv<R: Read>(reader: R, feature_count: usize) -> Result<Generated, PayloadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut generated = Generated::default();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        // Header is line 1
        let line = index + 2;

        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() < feature_count {
            warn!(line, "Skipping row with {} of {} columns", record.len(), feature_count);
            generated.skipped += 1;
            continue;
        }

        let features: Result<Vec<f64>, _> = record
            .iter()
            .take(feature_count)
            .map(str::parse::<f64>)
            .collect();
        match features {
            Ok(features) => generated.payloads.push(json!({ "features": features })),
            Err(e) => {
                warn!(line, "Skipping row: {}", e);
                generated.skipped += 1;
            }
        }
    }

    Ok(generated)
}

/// `{"text": line}` per non-blank line
pub fn from_text_lines<R: BufRead>(reader: R) -> std::io::Result<Vec<Value>> {
    let mut payloads = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let text = line.trim();
        if !text.is_empty() {
            payloads.push(json!({ "text": text }));
        }
    }
    Ok(payloads)
}

/// `{"image": <base64>}` per image file
pub fn from_images(paths: &[PathBuf]) -> Result<Vec<Value>, PayloadError> {
    paths
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path).map_err(|source| PayloadError::Read {
                path: path.clone(),
                source,
            })?;
            Ok(json!({ "image": STANDARD.encode(bytes) }))
        })
        .collect()
}

/// Writes `payloads` as a pretty-printed JSON array
pub fn write_payloads(path: &Path, payloads: &[Value]) -> Result<(), PayloadError> {
    let write_err = |source| PayloadError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, payloads)?;
    writer.write_all(b"\n").map_err(write_err)?;
    writer.flush().map_err(write_err)?;
    Ok(())
}
