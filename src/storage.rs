use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::Result;
use crate::pipeline::assembler::{Dataset, COLUMNS};

/// Output formats the pipeline can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    /// Case-insensitive parse; `None` means the format is unsupported.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Serialization seam between the assembler and the filesystem
pub trait DatasetWriter {
    fn write(&self, dataset: &Dataset, path: &Path) -> Result<()>;
}

/// Headerless CSV in the declared column order, encoded for legacy
/// single-byte (ISO-8859-1) consumers.
pub struct CsvWriter;

impl DatasetWriter for CsvWriter {
    fn write(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        let file = fs::File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        for row in &dataset.rows {
            // Encode per field; the delimiter and quoting bytes are ASCII
            // and identical in Windows-1252. Unmappable characters become
            // numeric character references rather than failing the run.
            let encoded: Vec<Vec<u8>> = row
                .iter()
                .map(|field| {
                    let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(field);
                    bytes.into_owned()
                })
                .collect();
            writer.write_record(&encoded)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Human-inspectable structured dump: one JSON array of objects with
/// explicit field names, UTF-8.
pub struct JsonWriter;

impl DatasetWriter for JsonWriter {
    fn write(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        let objects: Vec<Value> = dataset
            .rows
            .iter()
            .map(|row| {
                let mut object = Map::new();
                for (column, value) in COLUMNS.iter().zip(row.iter()) {
                    object.insert((*column).to_string(), Value::String(value.clone()));
                }
                Value::Object(object)
            })
            .collect();

        let text = serde_json::to_string_pretty(&Value::Array(objects))?;
        fs::write(path, text)?;
        Ok(())
    }
}

/// A dataset written out to a temporary file but not yet visible under its
/// final name. Artifacts only appear once every dataset of the run has been
/// staged, so an aborted run never leaves a partial artifact set behind.
#[derive(Debug)]
pub struct StagedDataset {
    tmp_path: PathBuf,
    final_path: PathBuf,
}

/// Stage one dataset in the requested format under `dir`, creating the
/// directory if needed. An unsupported format string is a no-op with a
/// diagnostic, not a failure, and leaves the dataset untouched in memory.
pub fn stage_dataset(
    format: &str,
    dataset: &Dataset,
    dir: &Path,
    stem: &str,
) -> Result<Option<StagedDataset>> {
    let Some(parsed) = OutputFormat::parse(format) else {
        warn!(format, "unsupported output format, no file written");
        println!("Unsupported output format '{format}', file not created.");
        return Ok(None);
    };

    fs::create_dir_all(dir)?;
    let final_path = dir.join(format!("{stem}.{}", parsed.extension()));
    let tmp_path = dir.join(format!("{stem}.{}.tmp", parsed.extension()));
    match parsed {
        OutputFormat::Csv => CsvWriter.write(dataset, &tmp_path)?,
        OutputFormat::Json => JsonWriter.write(dataset, &tmp_path)?,
    }
    info!(path = %final_path.display(), rows = dataset.rows.len(), "dataset staged");
    Ok(Some(StagedDataset {
        tmp_path,
        final_path,
    }))
}

/// Rename every staged dataset into place and return the final paths
pub fn commit_staged(staged: Vec<StagedDataset>) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(staged.len());
    for artifact in staged {
        fs::rename(&artifact.tmp_path, &artifact.final_path)?;
        info!(path = %artifact.final_path.display(), "dataset written");
        written.push(artifact.final_path);
    }
    Ok(written)
}

/// Best-effort removal of staged temp files after a failed run
pub fn discard_staged(staged: &[StagedDataset]) {
    for artifact in staged {
        if let Err(e) = fs::remove_file(&artifact.tmp_path) {
            warn!(path = %artifact.tmp_path.display(), error = %e, "could not remove staged file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset() -> Dataset {
        Dataset {
            rows: vec![[
                "010101-123A".to_string(),
                "Maija".to_string(),
                "Virtanen".to_string(),
                "Maija".to_string(),
                "Ryhmä A".to_string(),
                "Päiväkoti Keskusta".to_string(),
                "esioppilas".to_string(),
            ]],
        }
    }

    #[test]
    fn format_parse_is_case_insensitive() {
        assert_eq!(OutputFormat::parse("CSV"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::parse(" json "), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("xlsx"), None);
    }

    fn write_dataset(format: &str, dataset: &Dataset, dir: &Path, stem: &str) -> Option<PathBuf> {
        let staged = stage_dataset(format, dataset, dir, stem).unwrap()?;
        commit_staged(vec![staged]).unwrap().pop()
    }

    #[test]
    fn csv_output_has_no_header_and_is_latin1() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_dataset("csv", &sample_dataset(), dir.path(), "roster").unwrap();

        let bytes = fs::read(&path).unwrap();
        // ä encodes to a single 0xE4 byte in ISO-8859-1 / Windows-1252
        assert!(bytes.contains(&0xE4));
        let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
        let first_line = decoded.lines().next().unwrap();
        assert!(first_line.starts_with("010101-123A,"));
        assert!(!decoded.contains("identifier"));
        assert_eq!(decoded.lines().count(), 1);
    }

    #[test]
    fn json_output_carries_explicit_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_dataset("json", &sample_dataset(), dir.path(), "roster").unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        let first = &value.as_array().unwrap()[0];
        assert_eq!(first["identifier"], "010101-123A");
        assert_eq!(first["group_name"], "Ryhmä A");
        assert_eq!(first["student_category"], "esioppilas");
    }

    #[test]
    fn unsupported_format_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = sample_dataset();
        let staged = stage_dataset("parquet", &dataset, dir.path(), "roster").unwrap();

        assert!(staged.is_none());
        // nothing created, dataset untouched
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
        assert_eq!(dataset.rows.len(), 1);
    }

    #[test]
    fn staged_datasets_only_appear_after_commit() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = sample_dataset();

        let first = stage_dataset("csv", &dataset, dir.path(), "roster").unwrap().unwrap();
        let second = stage_dataset("csv", &dataset, dir.path(), "rejects").unwrap().unwrap();
        assert!(!dir.path().join("roster.csv").exists());
        assert!(!dir.path().join("rejects.csv").exists());

        let written = commit_staged(vec![first, second]).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("roster.csv").exists());
        assert!(dir.path().join("rejects.csv").exists());
        assert!(!dir.path().join("roster.csv.tmp").exists());
    }

    #[test]
    fn discard_removes_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = sample_dataset();

        let staged = stage_dataset("csv", &dataset, dir.path(), "roster").unwrap().unwrap();
        discard_staged(&[staged]);

        // only the output directory itself remains
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
