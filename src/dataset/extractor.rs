use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;

use crate::config::{EncodingConfig, ToolsConfig};
use crate::DatasetError;

/// An opened source video
///
/// Owns a scratch directory for intermediate files. The directory is removed
/// by [`VideoSource::close`] or when the handle is dropped.
#[derive(Debug)]
pub struct VideoSource {
    path: PathBuf,
    duration: Option<f64>,
    scratch: TempDir,
}

impl VideoSource {
    pub fn new(path: impl Into<PathBuf>, duration: Option<f64>) -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("ytdataset-")
            .tempdir()
            .context("Failed to create scratch directory")?;
        Ok(Self {
            path: path.into(),
            duration,
            scratch,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Duration in seconds, when the container reports one
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Release the handle and its scratch directory
    pub fn close(self) -> Result<()> {
        self.scratch.close().context("Failed to remove scratch directory")
    }
}

/// Half-open time range `[start, end)` in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRange {
    pub start: f64,
    pub end: f64,
}

impl ClipRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check the range against itself and the source length
    pub fn check(&self, source_duration: Option<f64>) -> Result<()> {
        if !(self.start >= 0.0 && self.end > self.start) {
            return Err(DatasetError::ClipExtractionFailed(format!(
                "invalid range {:.3}s..{:.3}s",
                self.start, self.end
            ))
            .into());
        }
        if let Some(total) = source_duration {
            if self.end > total {
                return Err(DatasetError::ClipExtractionFailed(format!(
                    "range end {:.3}s is past the video duration {:.3}s",
                    self.end, total
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// Output files for one clip
#[derive(Debug, Clone)]
pub struct ClipTargets {
    pub video_path: PathBuf,
    pub wav_path: PathBuf,
}

impl ClipTargets {
    /// Best-effort removal of whatever a failed extraction left behind
    pub fn remove_partial(&self) {
        for path in [&self.video_path, &self.wav_path] {
            if path.exists() {
                if let Err(e) = fs_err::remove_file(path) {
                    tracing::debug!("Could not remove partial output: {}", e);
                }
            }
        }
    }
}

/// Cuts clips out of a source video
#[async_trait]
pub trait ClipExtractor: Send + Sync {
    /// Open a video for clipping
    async fn open(&self, video_path: &Path) -> Result<VideoSource>;

    /// Write the trimmed video and its derived WAV for `range`
    async fn extract(&self, source: &VideoSource, range: ClipRange, targets: &ClipTargets) -> Result<()>;

    /// Release a source opened by [`ClipExtractor::open`]
    fn close(&self, source: VideoSource) -> Result<()> {
        source.close()
    }
}

/// Clip extractor driving the ffmpeg and ffprobe executables
pub struct FfmpegClipExtractor {
    ffmpeg_path: String,
    ffprobe_path: String,
    encoding: EncodingConfig,
}

impl FfmpegClipExtractor {
    pub fn new(tools: &ToolsConfig, encoding: &EncodingConfig) -> Self {
        Self {
            ffmpeg_path: tools.ffmpeg_path.clone(),
            ffprobe_path: tools.ffprobe_path.clone(),
            encoding: encoding.clone(),
        }
    }

    /// Read the container duration using ffprobe
    async fn probe_duration(&self, path: &Path) -> Result<Option<f64>> {
        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.ffprobe_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to analyze video with ffprobe: {}", error);
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        Ok(info["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok()))
    }

    async fn run_ffmpeg(&self, args: &[String]) -> Result<()> {
        tracing::debug!("Running {} {}", self.ffmpeg_path, args.join(" "));

        let output = Command::new(&self.ffmpeg_path)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.ffmpeg_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(DatasetError::ClipExtractionFailed(error.trim().to_string()).into());
        }

        Ok(())
    }

    /// Encode the audio of `range` into a temporary AAC file
    fn temp_audio_args(&self, source: &VideoSource, range: ClipRange, temp_audio: &Path) -> Vec<String> {
        vec![
            "-y".into(), "-v".into(), "error".into(),
            "-ss".into(), format!("{:.3}", range.start),
            "-i".into(), source.path().to_string_lossy().into_owned(),
            "-t".into(), format!("{:.3}", range.duration()),
            "-vn".into(),
            "-c:a".into(), self.encoding.video_audio_codec.clone(),
            temp_audio.to_string_lossy().into_owned(),
        ]
    }

    /// Encode the video of `range` and mux it with the temporary audio
    fn video_args(&self, source: &VideoSource, range: ClipRange, temp_audio: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".into(), "-v".into(), "error".into(),
            "-ss".into(), format!("{:.3}", range.start),
            "-i".into(), source.path().to_string_lossy().into_owned(),
            "-i".into(), temp_audio.to_string_lossy().into_owned(),
            "-t".into(), format!("{:.3}", range.duration()),
            "-map".into(), "0:v:0".into(),
            "-map".into(), "1:a:0".into(),
            "-c:v".into(), self.encoding.video_codec.clone(),
            "-c:a".into(), "copy".into(),
            output.to_string_lossy().into_owned(),
        ]
    }

    /// Derive the speech WAV from the encoded clip
    fn wav_args(&self, clip: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".into(), "-v".into(), "error".into(),
            "-i".into(), clip.to_string_lossy().into_owned(),
            "-vn".into(),
            "-ac".into(), self.encoding.channels.to_string(),
            "-ar".into(), self.encoding.sample_rate.to_string(),
            "-c:a".into(), self.encoding.wav_codec.clone(),
            output.to_string_lossy().into_owned(),
        ]
    }

    async fn encode(&self, source: &VideoSource, range: ClipRange, targets: &ClipTargets, temp_audio: &Path) -> Result<()> {
        self.run_ffmpeg(&self.temp_audio_args(source, range, temp_audio)).await?;
        self.run_ffmpeg(&self.video_args(source, range, temp_audio, &targets.video_path)).await?;
        fs_err::remove_file(temp_audio)?;
        self.run_ffmpeg(&self.wav_args(&targets.video_path, &targets.wav_path)).await
    }
}

#[async_trait]
impl ClipExtractor for FfmpegClipExtractor {
    async fn open(&self, video_path: &Path) -> Result<VideoSource> {
        crate::utils::check_file_accessible(video_path)?;
        let duration = self.probe_duration(video_path).await?;
        VideoSource::new(video_path, duration)
    }

    async fn extract(&self, source: &VideoSource, range: ClipRange, targets: &ClipTargets) -> Result<()> {
        range.check(source.duration())?;

        let stem = targets
            .video_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "clip".to_string());
        let temp_audio = source.scratch_dir().join(format!("{}-temp-audio.m4a", stem));

        let result = self.encode(source, range, targets, &temp_audio).await;
        if temp_audio.exists() {
            let _ = fs_err::remove_file(&temp_audio);
        }
        if result.is_err() {
            targets.remove_partial();
        }
        result
    }
}
