use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub mod youtube;

pub use youtube::YtDlpFetcher;

use crate::progress::ProgressObserver;
use crate::Result;

/// Metadata reported for a video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Platform video id, used as the clip id prefix
    pub id: String,

    /// Title of the video
    #[serde(default)]
    pub title: Option<String>,

    /// Upload date as `YYYYMMDD`
    #[serde(default)]
    pub upload_date: Option<String>,

    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,

    /// Container extension of the selected format
    #[serde(default)]
    pub ext: Option<String>,
}

/// A video downloaded to local storage
#[derive(Debug, Clone)]
pub struct DownloadedMedia {
    /// Path of the final (merged) video file
    pub video_path: PathBuf,

    /// Metadata of the downloaded video
    pub info: VideoInfo,
}

impl DownloadedMedia {
    /// Subtitle path for `language` following the `<stem>.<lang>.srt` convention
    pub fn subtitle_path(&self, language: &str) -> PathBuf {
        subtitle_path_for(&self.video_path, language)
    }
}

/// `<video-stem>.<lang>.srt` next to the video
pub fn subtitle_path_for(video_path: &Path, language: &str) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    video_path.with_file_name(format!("{}.{}.srt", stem, language))
}

/// Trait for resolving a URL to a local video with subtitles
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch metadata without downloading
    async fn get_video_info(&self, url: &str) -> Result<VideoInfo>;

    /// Download the video and its subtitles into `dest_dir`, returning the video path
    async fn download(&self, url: &str, dest_dir: &Path, observer: &dyn ProgressObserver) -> Result<PathBuf>;

    /// Check if this fetcher supports the given URL
    fn supports_url(&self, url: &str) -> bool;

    /// Get the name of this platform
    fn platform_name(&self) -> &'static str;
}

/// Validate and normalize URLs
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtitle_path_convention() {
        let media = DownloadedMedia {
            video_path: PathBuf::from("dataset/My Talk_20240101.mp4"),
            info: VideoInfo::default(),
        };
        assert_eq!(
            media.subtitle_path("en"),
            PathBuf::from("dataset/My Talk_20240101.en.srt")
        );
    }

    #[test]
    fn test_subtitle_path_with_dots_in_title() {
        assert_eq!(
            subtitle_path_for(Path::new("out/v1.2 release_20240101.mp4"), "ja"),
            PathBuf::from("out/v1.2 release_20240101.ja.srt")
        );
    }

    #[test]
    fn test_video_info_from_yt_dlp_json() {
        let json = r#"{"id": "dQw4w9WgXcQ", "title": "Song", "upload_date": "20091025", "duration": 212, "ext": "mp4", "extra": [1, 2]}"#;
        let info: VideoInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.id, "dQw4w9WgXcQ");
        assert_eq!(info.duration, Some(212.0));
        assert_eq!(info.upload_date.as_deref(), Some("20091025"));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not a url").is_err());
    }
}
