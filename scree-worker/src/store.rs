//! Partition files on disk.
//!
//! Partitions are headerless numeric CSV files under the worker's data
//! directory. Answer labels live next to them as `answers-{file}` with one
//! value per row, and projected scores are written back as
//! `projected-{file}`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayView2};

use crate::error::{Result, WorkerError};

/// Resolve a file name inside the data directory.
///
/// Names are bare file names; anything that would resolve outside the
/// directory (separators, `..`) is rejected.
pub fn partition_path(data_dir: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() || Path::new(name).file_name() != Some(OsStr::new(name)) {
        return Err(WorkerError::InvalidName(name.to_string()));
    }
    Ok(data_dir.join(name))
}

fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    Ok(csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?)
}

/// Read a headerless numeric CSV into a dense matrix.
///
/// Every row must have the same number of fields as the first row; a file
/// with no rows is an error.
pub fn read_matrix(path: &Path) -> Result<Array2<f64>> {
    let mut rows = 0;
    let mut cols = 0;
    let mut flat = Vec::new();

    for (i, record) in reader(path)?.records().enumerate() {
        let record = record?;
        if i == 0 {
            cols = record.len();
        } else if record.len() != cols {
            return Err(WorkerError::InconsistentRows);
        }
        for field in record.iter() {
            flat.push(parse_field(field, path, i)?);
        }
        rows += 1;
    }

    if rows == 0 {
        return Err(WorkerError::EmptyPartition(path.display().to_string()));
    }
    Ok(Array2::from_shape_vec((rows, cols), flat)?)
}

/// Read the answer labels, one per row.
pub fn read_answers(path: &Path) -> Result<Vec<f64>> {
    let mut labels = Vec::new();
    for (i, record) in reader(path)?.records().enumerate() {
        let record = record?;
        if record.len() != 1 {
            return Err(WorkerError::BadAnswerRow);
        }
        labels.push(parse_field(&record[0], path, i)?);
    }
    Ok(labels)
}

/// Write one score row per partition row, with its answer label appended.
pub fn write_scores(path: &Path, scores: ArrayView2<'_, f64>, labels: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (row, label) in scores.outer_iter().zip(labels) {
        let mut record: Vec<String> = row.iter().map(f64::to_string).collect();
        record.push(label.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_field(field: &str, path: &Path, row: usize) -> Result<f64> {
    field.parse::<f64>().map_err(|source| WorkerError::BadNumber {
        file: path.display().to_string(),
        row: row + 1,
        source,
    })
}
