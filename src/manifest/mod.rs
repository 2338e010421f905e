use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::dataset::{DatasetEntry, DatasetLayout};
use crate::DatasetError;

/// The CSV manifest of a dataset directory
///
/// Rows are only ever appended. Ids are not checked for uniqueness, so
/// processing the same video twice records its clips twice.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Manifest at the canonical location of `output_dir`
    pub fn for_output_dir(output_dir: &Path) -> Self {
        Self::new(DatasetLayout::new(output_dir).manifest_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read every row, or nothing if the manifest does not exist yet
    pub fn load(&self) -> Result<Vec<DatasetEntry>> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let file = fs_err::File::open(&self.path)?;
        let mut reader = csv::Reader::from_reader(file);
        let mut entries = Vec::new();
        for (row, record) in reader.deserialize::<DatasetEntry>().enumerate() {
            let entry = record.map_err(|e| {
                DatasetError::InvalidManifest(format!("{} row {}: {}", self.path.display(), row + 1, e))
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Append `entries` after the existing rows and rewrite the file
    ///
    /// Returns the total number of rows in the manifest.
    pub fn append(&self, entries: &[DatasetEntry]) -> Result<usize> {
        let mut rows = self.load()?;
        rows.extend_from_slice(entries);
        self.write_all(&rows)?;

        tracing::info!(
            "Manifest {} now has {} rows ({} new)",
            self.path.display(),
            rows.len(),
            entries.len()
        );
        Ok(rows.len())
    }

    fn write_all(&self, rows: &[DatasetEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let file = fs_err::File::create(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .has_headers(false)
            .from_writer(file);

        // Written explicitly so an empty manifest still carries its header
        writer.write_record(MANIFEST_COLUMNS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write manifest {}", self.path.display()))?;
        Ok(())
    }
}

/// Column order of the manifest
pub const MANIFEST_COLUMNS: [&str; 7] = [
    "id",
    "video_filename",
    "wav_filename",
    "text",
    "duration",
    "start_time",
    "end_time",
];

/// Merge `entries` into the manifest of `output_dir`
pub fn write_manifest(output_dir: &Path, entries: &[DatasetEntry]) -> Result<usize> {
    Manifest::for_output_dir(output_dir).append(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, text: &str) -> DatasetEntry {
        DatasetEntry {
            id: id.to_string(),
            video_filename: format!("{}.mp4", id),
            wav_filename: format!("{}.wav", id),
            text: text.to_string(),
            duration: 2.5,
            start_time: 1.0,
            end_time: 3.5,
        }
    }

    #[test]
    fn test_fresh_directory_contains_exactly_new_rows() {
        let temp = tempfile::tempdir().unwrap();
        let a = entry("vid_0001", "First clip text here.");

        assert_eq!(write_manifest(temp.path(), &[a.clone()]).unwrap(), 1);

        let manifest = Manifest::for_output_dir(temp.path());
        assert_eq!(manifest.path(), temp.path().join("metadata.csv"));
        assert_eq!(manifest.load().unwrap(), vec![a]);
    }

    #[test]
    fn test_second_write_appends_after_existing_rows() {
        let temp = tempfile::tempdir().unwrap();
        let a = entry("vid_0001", "First clip text here.");
        let b = entry("other_0003", "Second clip text here.");

        write_manifest(temp.path(), &[a.clone()]).unwrap();
        assert_eq!(write_manifest(temp.path(), &[b.clone()]).unwrap(), 2);

        assert_eq!(Manifest::for_output_dir(temp.path()).load().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_duplicate_ids_are_kept() {
        let temp = tempfile::tempdir().unwrap();
        let a = entry("vid_0001", "First clip text here.");

        write_manifest(temp.path(), &[a.clone()]).unwrap();
        write_manifest(temp.path(), &[a.clone()]).unwrap();

        assert_eq!(Manifest::for_output_dir(temp.path()).load().unwrap(), vec![a.clone(), a]);
    }

    #[test]
    fn test_all_fields_are_quoted() {
        let temp = tempfile::tempdir().unwrap();
        write_manifest(temp.path(), &[entry("vid_0001", "He said \"hi\", then left.")]).unwrap();

        let content = std::fs::read_to_string(temp.path().join("metadata.csv")).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some(r#""id","video_filename","wav_filename","text","duration","start_time","end_time""#)
        );
        assert_eq!(
            lines.next(),
            Some(r#""vid_0001","vid_0001.mp4","vid_0001.wav","He said ""hi"", then left.","2.5","1.0","3.5""#)
        );
    }

    #[test]
    fn test_utf8_text_survives() {
        let temp = tempfile::tempdir().unwrap();
        let a = entry("vid_0001", "こんにちは、世界 café");
        write_manifest(temp.path(), &[a.clone()]).unwrap();
        assert_eq!(Manifest::for_output_dir(temp.path()).load().unwrap(), vec![a]);
    }

    #[test]
    fn test_empty_append_writes_header_only() {
        let temp = tempfile::tempdir().unwrap();
        write_manifest(temp.path(), &[]).unwrap();

        let content = std::fs::read_to_string(temp.path().join("metadata.csv")).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(Manifest::for_output_dir(temp.path()).load().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_manifest_is_left_untouched() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("metadata.csv");
        std::fs::write(&path, "\"id\",\"duration\"\n\"x\",\"not a number\"\n").unwrap();

        assert!(write_manifest(temp.path(), &[entry("vid_0001", "First clip text here.")]).is_err());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "\"id\",\"duration\"\n\"x\",\"not a number\"\n"
        );
    }
}
