use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{AnnotateError, Result};

pub type Row = Map<String, Value>;

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Reads a dataset file: a JSON array of row objects, gzip-compressed when
/// the path ends in `.gz`.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let file = BufReader::new(File::open(path)?);
    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let value: Value = serde_json::from_reader(reader)?;
    let Value::Array(items) = value else {
        return Err(AnnotateError::Schema(format!(
            "{} must hold a JSON array of rows",
            path.display()
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(row) => Ok(row),
            other => Err(AnnotateError::Schema(format!(
                "row {i} of {} is not an object: {other}",
                path.display()
            ))),
        })
        .collect()
}

/// Copies `path` to `path + suffix` when `path` exists. Returns the backup
/// path when a copy was made.
pub fn backup_file(path: &Path, suffix: &str) -> Result<Option<PathBuf>> {
    if !path.is_file() {
        return Ok(None);
    }
    let mut backup = path.to_path_buf().into_os_string();
    backup.push(suffix);
    let backup = PathBuf::from(backup);

    fs::copy(path, &backup)?;
    info!(backup = %backup.display(), "backup");
    Ok(Some(backup))
}

/// Writes all rows to `path`, first copying an existing file aside when
/// `backup` is set.
pub fn write_rows(path: &Path, rows: &[Row], backup: bool, backup_suffix: &str) -> Result<()> {
    if backup {
        backup_file(path, backup_suffix)?;
    }

    let file = BufWriter::new(File::create(path)?);
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(file, Compression::default());
        serde_json::to_writer(&mut encoder, rows)?;
        encoder.finish()?.flush()?;
    } else {
        let mut file = file;
        serde_json::to_writer(&mut file, rows)?;
        file.flush()?;
    }

    info!(path = %path.display(), rows = rows.len(), "dataset saved");
    Ok(())
}
