//! ytdataset - A Rust CLI tool for building speech datasets from YouTube videos
//!
//! This library downloads a video together with its subtitles, cuts the video on
//! subtitle boundaries into short clips, derives a speech-ready WAV file for every
//! clip and records the result in a CSV manifest.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod fetcher;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod playlist;
pub mod progress;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use dataset::{DatasetEntry, DatasetLayout, SegmentLimits, SubtitleEntry};
pub use fetcher::{MediaFetcher, VideoInfo};
pub use pipeline::{BatchReport, DatasetPipeline, DatasetSummary, RunOutcome};
pub use progress::{ProgressEvent, ProgressObserver};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to dataset creation
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("Unsupported URL format: {0}")]
    UnsupportedUrl(String),

    #[error("Failed to retrieve video info: {0}")]
    VideoInfoUnavailable(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Subtitle file not found: {0}")]
    MissingSubtitles(std::path::PathBuf),

    #[error("Invalid subtitle file: {0}")]
    InvalidSubtitles(String),

    #[error("Clip extraction failed: {0}")]
    ClipExtractionFailed(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Playlist fetch failed: {0}")]
    PlaylistFetchFailed(String),
}
