use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod builder;
pub mod extractor;
pub mod subtitles;
pub mod text;
pub mod validator;

pub use builder::DatasetBuilder;
pub use extractor::{ClipExtractor, ClipRange, ClipTargets, FfmpegClipExtractor, VideoSource};
pub use subtitles::SubtitleEntry;
pub use text::normalize_text;
pub use validator::SegmentLimits;

/// One row of the dataset manifest
///
/// Field order is the manifest column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    /// `{video_id}_{index:04}` where index is the cue position in the subtitle file
    pub id: String,

    /// Clip video file name inside `videos/`
    pub video_filename: String,

    /// Clip audio file name inside `wavs/`
    pub wav_filename: String,

    /// Normalized transcript
    pub text: String,

    /// Clip length in seconds, rounded to milliseconds
    pub duration: f64,

    /// Start offset in the source video, in seconds
    pub start_time: f64,

    /// End offset in the source video, in seconds
    pub end_time: f64,
}

impl DatasetEntry {
    /// Build the identifier for the cue at `index`
    pub fn clip_id(video_id: &str, index: usize) -> String {
        format!("{}_{:04}", video_id, index)
    }
}

/// Round seconds to three decimals
pub fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Directory layout of a dataset
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub const MANIFEST_FILE: &'static str = "metadata.csv";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.root.join("videos")
    }

    pub fn wavs_dir(&self) -> PathBuf {
        self.root.join("wavs")
    }

    /// Reserved for transcripts; created but not written to
    pub fn transcript_dir(&self) -> PathBuf {
        self.root.join("transcript")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(Self::MANIFEST_FILE)
    }

    /// Create the clip directories
    pub fn create(&self) -> Result<()> {
        for dir in [self.transcript_dir(), self.videos_dir(), self.wavs_dir()] {
            fs_err::create_dir_all(&dir)
                .with_context(|| format!("Failed to create dataset directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_id_is_zero_padded() {
        assert_eq!(DatasetEntry::clip_id("abc", 0), "abc_0000");
        assert_eq!(DatasetEntry::clip_id("abc", 42), "abc_0042");
        assert_eq!(DatasetEntry::clip_id("abc", 12345), "abc_12345");
    }

    #[test]
    fn test_round_millis() {
        assert_eq!(round_millis(1.23456), 1.235);
        assert_eq!(round_millis(2.0), 2.0);
    }

    #[test]
    fn test_layout_create() {
        let temp = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(temp.path().join("dataset"));
        layout.create().unwrap();

        assert!(layout.videos_dir().is_dir());
        assert!(layout.wavs_dir().is_dir());
        assert!(layout.transcript_dir().is_dir());
        assert_eq!(layout.manifest_path(), temp.path().join("dataset").join("metadata.csv"));
    }
}
