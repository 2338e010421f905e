use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::{MediaFetcher, VideoInfo};
use crate::config::{DownloadConfig, ToolsConfig};
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::{DatasetError, Result};

const PROGRESS_PREFIX: &str = "[progress]";
const FILE_PREFIX: &str = "[file]";

/// YouTube fetcher using yt-dlp
pub struct YtDlpFetcher {
    yt_dlp_path: String,
    download: DownloadConfig,
}

impl YtDlpFetcher {
    pub fn new(tools: &ToolsConfig, download: &DownloadConfig) -> Self {
        Self {
            yt_dlp_path: tools.yt_dlp_path.clone(),
            download: download.clone(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Arguments for downloading `url` into `dest_dir`
    fn download_args(&self, url: &str, dest_dir: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--format".into(), self.download.format.clone(),
            "--output".into(), dest_dir.join(&self.download.output_template).to_string_lossy().into_owned(),
            "--no-playlist".into(),
            "--no-warnings".into(),
            "--newline".into(),
            "--progress".into(),
            "--progress-template".into(),
            format!("download:{} %(progress._percent_str)s %(progress._speed_str)s", PROGRESS_PREFIX),
            "--no-simulate".into(),
            "--print".into(), format!("after_move:{} %(filepath)s", FILE_PREFIX),
        ];

        if self.download.write_thumbnail {
            args.push("--write-thumbnail".into());
        }

        if !self.download.subtitle_languages.is_empty() {
            args.extend([
                "--write-subs".into(),
                "--write-auto-subs".into(),
                "--sub-langs".into(),
                self.download.subtitle_languages.join(","),
                "--convert-subs".into(),
                "srt".into(),
            ]);
        }

        args.push(url.to_string());
        args
    }

    /// Interpret one output line; returns false for lines that are neither progress nor path
    fn handle_line(line: &str, filepath: &mut Option<PathBuf>, observer: &dyn ProgressObserver) -> bool {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(PROGRESS_PREFIX) {
            let mut parts = rest.split_whitespace();
            let percent = parts.next().unwrap_or("N/A").to_string();
            let speed = parts.next().unwrap_or("N/A").to_string();
            observer.on_event(&ProgressEvent::DownloadProgress { percent, speed });
            true
        } else if let Some(rest) = line.strip_prefix(FILE_PREFIX) {
            *filepath = Some(PathBuf::from(rest.trim()));
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn get_video_info(&self, url: &str) -> Result<VideoInfo> {
        if !self.check_availability().await {
            return Err(DatasetError::VideoInfoUnavailable(format!(
                "{} is not available. Please install it: https://github.com/yt-dlp/yt-dlp",
                self.yt_dlp_path
            ))
            .into());
        }

        tracing::debug!("Extracting video info for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", "--quiet", "--no-warnings", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(DatasetError::VideoInfoUnavailable(error.trim().to_string()).into());
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout)
            .context("Failed to parse yt-dlp video info")?;

        if info.id.is_empty() {
            return Err(DatasetError::VideoInfoUnavailable(format!("no video id reported for {}", url)).into());
        }

        Ok(info)
    }

    async fn download(&self, url: &str, dest_dir: &Path, observer: &dyn ProgressObserver) -> Result<PathBuf> {
        tracing::debug!("Downloading video and subtitles for: {}", url);
        observer.on_event(&ProgressEvent::DownloadStarted { url: url.to_string() });

        let mut child = Command::new(&self.yt_dlp_path)
            .args(self.download_args(url, dest_dir))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        let stdout = child.stdout.take().context("yt-dlp stdout not captured")?;
        let stderr = child.stderr.take().context("yt-dlp stderr not captured")?;
        let mut stdout_lines = BufReader::new(stdout).lines();
        let mut stderr_lines = BufReader::new(stderr).lines();

        let mut filepath = None;
        let mut errors = Vec::new();
        let mut stdout_open = true;
        let mut stderr_open = true;

        while stdout_open || stderr_open {
            tokio::select! {
                line = stdout_lines.next_line(), if stdout_open => match line? {
                    Some(line) => {
                        Self::handle_line(&line, &mut filepath, observer);
                    }
                    None => stdout_open = false,
                },
                line = stderr_lines.next_line(), if stderr_open => match line? {
                    Some(line) => {
                        if !Self::handle_line(&line, &mut filepath, observer) {
                            errors.push(line);
                        }
                    }
                    None => stderr_open = false,
                },
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(DatasetError::DownloadFailed(errors.join("\n")).into());
        }

        let video_path = filepath.ok_or_else(|| {
            DatasetError::DownloadFailed(format!("yt-dlp did not report an output file for {}", url))
        })?;
        observer.on_event(&ProgressEvent::DownloadFinished { path: video_path.clone() });

        Ok(video_path)
    }

    fn supports_url(&self, url: &str) -> bool {
        // Support various YouTube URL formats
        let url_lower = url.to_lowercase();
        url_lower.contains("youtube.com/watch") ||
        url_lower.contains("youtu.be/") ||
        url_lower.contains("youtube.com/embed/") ||
        url_lower.contains("youtube.com/shorts/") ||
        url_lower.contains("youtube.com/v/") ||
        url_lower.contains("m.youtube.com/")
    }

    fn platform_name(&self) -> &'static str {
        "YouTube"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingObserver;

    fn fetcher() -> YtDlpFetcher {
        YtDlpFetcher::new(&ToolsConfig::default(), &DownloadConfig::default())
    }

    #[test]
    fn test_supports_youtube_urls() {
        let fetcher = fetcher();
        assert!(fetcher.supports_url("https://www.youtube.com/watch?v=abc"));
        assert!(fetcher.supports_url("https://youtu.be/abc"));
        assert!(fetcher.supports_url("https://m.youtube.com/watch?v=abc"));
        assert!(!fetcher.supports_url("https://vimeo.com/123"));
    }

    #[test]
    fn test_download_args() {
        let args = fetcher().download_args("https://youtu.be/abc", Path::new("out"));
        let joined = args.join(" ");
        assert!(joined.contains("--format bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best"));
        assert!(joined.contains("--sub-langs en,ja"));
        assert!(joined.contains("--convert-subs srt"));
        assert!(joined.contains("--write-thumbnail"));
        assert!(args.contains(&Path::new("out").join("%(title)s_%(upload_date)s.%(ext)s").to_string_lossy().into_owned()));
        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/abc"));
    }

    #[test]
    fn test_download_args_without_subtitles_or_thumbnail() {
        let download = DownloadConfig {
            subtitle_languages: Vec::new(),
            write_thumbnail: false,
            ..DownloadConfig::default()
        };
        let fetcher = YtDlpFetcher::new(&ToolsConfig::default(), &download);
        let args = fetcher.download_args("https://youtu.be/abc", Path::new("out"));
        assert!(!args.iter().any(|a| a == "--write-subs" || a == "--write-thumbnail"));
    }

    #[test]
    fn test_handle_progress_and_file_lines() {
        let observer = RecordingObserver::default();
        let mut filepath = None;

        assert!(YtDlpFetcher::handle_line("[progress]  42.0% 1.20MiB/s", &mut filepath, &observer));
        assert!(YtDlpFetcher::handle_line("[file] out/Talk_20240101.mp4", &mut filepath, &observer));
        assert!(!YtDlpFetcher::handle_line("ERROR: video unavailable", &mut filepath, &observer));

        assert_eq!(filepath, Some(PathBuf::from("out/Talk_20240101.mp4")));
        assert_eq!(
            observer.events(),
            vec![ProgressEvent::DownloadProgress {
                percent: "42.0%".to_string(),
                speed: "1.20MiB/s".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let tools = ToolsConfig {
            yt_dlp_path: "definitely-not-yt-dlp-binary".to_string(),
            ..ToolsConfig::default()
        };
        let fetcher = YtDlpFetcher::new(&tools, &DownloadConfig::default());
        assert!(!fetcher.check_availability().await);
        assert!(fetcher.get_video_info("https://youtu.be/abc").await.is_err());
    }
}
