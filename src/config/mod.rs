use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::dataset::SegmentLimits;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset output settings
    pub dataset: DatasetConfig,

    /// Bounds a subtitle cue must satisfy to become a clip
    pub segment: SegmentLimits,

    /// Clip encoding parameters
    pub encoding: EncodingConfig,

    /// External executables
    pub tools: ToolsConfig,

    /// yt-dlp download options
    pub download: DownloadConfig,

    /// Playlist scraping options
    pub playlist: PlaylistConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Directory receiving downloads, clips and the manifest
    pub output_dir: PathBuf,

    /// Runs producing fewer clips than this are discarded
    pub min_clips: usize,

    /// Language code of the subtitle track used for segmentation
    pub subtitle_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Video codec of the trimmed clips
    pub video_codec: String,

    /// Audio codec muxed into the trimmed clips
    pub video_audio_codec: String,

    /// Codec of the derived WAV files
    pub wav_codec: String,

    /// Sample rate of the derived WAV files
    pub sample_rate: u32,

    /// Channel count of the derived WAV files
    pub channels: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub yt_dlp_path: String,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// yt-dlp format selector
    pub format: String,

    /// yt-dlp output template, relative to the output directory
    pub output_template: String,

    /// Subtitle languages to download (manual and automatic)
    pub subtitle_languages: Vec<String>,

    /// Also save the video thumbnail
    pub write_thumbnail: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    /// User agent sent when fetching playlist pages
    pub user_agent: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("dataset"),
            min_clips: 10,
            subtitle_language: "en".to_string(),
        }
    }
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            video_audio_codec: "aac".to_string(),
            wav_codec: "pcm_s16le".to_string(),
            sample_rate: 22050,
            channels: 1,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            format: "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string(),
            output_template: "%(title)s_%(upload_date)s.%(ext)s".to_string(),
            subtitle_languages: vec!["en".to_string(), "ja".to_string()],
            write_thumbnail: true,
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `explicit_path`, or from the default location
    ///
    /// An explicit path must exist. Without one, a missing default file is
    /// created with default values.
    pub async fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load_from(path);
        }

        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load and validate a configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("ytdataset").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let limits = &self.segment;
        if limits.min_text_chars > limits.max_text_chars {
            anyhow::bail!(
                "segment.min_text_chars ({}) exceeds segment.max_text_chars ({})",
                limits.min_text_chars,
                limits.max_text_chars
            );
        }
        if !(limits.min_duration >= 0.0 && limits.min_duration <= limits.max_duration) {
            anyhow::bail!(
                "segment durations must satisfy 0 <= min_duration ({}) <= max_duration ({})",
                limits.min_duration,
                limits.max_duration
            );
        }
        if self.encoding.sample_rate == 0 || self.encoding.channels == 0 {
            anyhow::bail!("encoding.sample_rate and encoding.channels must be positive");
        }
        if self.dataset.subtitle_language.trim().is_empty() {
            anyhow::bail!("dataset.subtitle_language must not be empty");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Output Directory: {}", self.dataset.output_dir.display());
        println!("  Minimum Clips: {}", self.dataset.min_clips);
        println!("  Subtitle Language: {}", self.dataset.subtitle_language);
        println!(
            "  Text Length: {}-{} chars",
            self.segment.min_text_chars, self.segment.max_text_chars
        );
        println!(
            "  Clip Duration: {:.2}-{:.2}s",
            self.segment.min_duration, self.segment.max_duration
        );
        println!(
            "  WAV Output: {} Hz, {} channel(s), {}",
            self.encoding.sample_rate, self.encoding.channels, self.encoding.wav_codec
        );
        println!("  yt-dlp: {}", self.tools.yt_dlp_path);
        println!("  ffmpeg: {}", self.tools.ffmpeg_path);
    }
}
