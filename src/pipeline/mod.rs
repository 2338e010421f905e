use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::dataset::{ClipExtractor, DatasetBuilder, DatasetEntry, DatasetLayout, FfmpegClipExtractor};
use crate::fetcher::{DownloadedMedia, MediaFetcher, YtDlpFetcher};
use crate::manifest::write_manifest;
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::DatasetError;

/// Statistics of the clips produced by one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Number of clips produced
    pub clips: usize,

    /// Sum of clip durations in seconds
    pub total_duration: f64,

    /// Mean clip duration in seconds
    pub mean_duration: f64,
}

impl DatasetSummary {
    pub fn from_entries(entries: &[DatasetEntry]) -> Self {
        let total_duration: f64 = entries.iter().map(|entry| entry.duration).sum();
        let mean_duration = if entries.is_empty() {
            0.0
        } else {
            total_duration / entries.len() as f64
        };
        Self {
            clips: entries.len(),
            total_duration,
            mean_duration,
        }
    }
}

/// Result of processing one URL
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Clips were produced and appended to the manifest
    Written {
        summary: DatasetSummary,
        manifest_path: PathBuf,
    },

    /// Too few clips were produced; the manifest was not touched
    Discarded { produced: usize, required: usize },
}

/// Per-URL tally of a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub written: usize,
    pub discarded: usize,
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.written + self.discarded + self.failed.len()
    }
}

/// Builds datasets from video URLs
pub struct DatasetPipeline {
    config: Config,
    fetcher: Box<dyn MediaFetcher>,
    extractor: Box<dyn ClipExtractor>,
    observer: Box<dyn ProgressObserver>,
}

impl DatasetPipeline {
    /// Pipeline backed by yt-dlp and ffmpeg
    pub fn new(config: Config, observer: Box<dyn ProgressObserver>) -> Self {
        let fetcher = Box::new(YtDlpFetcher::new(&config.tools, &config.download));
        let extractor = Box::new(FfmpegClipExtractor::new(&config.tools, &config.encoding));
        Self::with_components(config, fetcher, extractor, observer)
    }

    pub fn with_components(
        config: Config,
        fetcher: Box<dyn MediaFetcher>,
        extractor: Box<dyn ClipExtractor>,
        observer: Box<dyn ProgressObserver>,
    ) -> Self {
        Self {
            config,
            fetcher,
            extractor,
            observer,
        }
    }

    /// Build clips for one video and append them to the manifest of `output_dir`
    ///
    /// Fetch, download and missing-subtitle failures are errors. A run that
    /// yields fewer than `min_clips` clips returns [`RunOutcome::Discarded`]
    /// and leaves the manifest as it was.
    pub async fn create_from_url(&self, url: &str, output_dir: &Path, min_clips: usize) -> Result<RunOutcome> {
        if !self.fetcher.supports_url(url) {
            return Err(DatasetError::UnsupportedUrl(url.to_string()).into());
        }

        tracing::info!("Fetching video info from {}: {}", self.fetcher.platform_name(), url);
        let info = self.fetcher.get_video_info(url).await?;

        fs_err::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
        let video_path = self.fetcher.download(url, output_dir, self.observer.as_ref()).await?;
        let media = DownloadedMedia { video_path, info };

        let language = &self.config.dataset.subtitle_language;
        let subtitle_path = media.subtitle_path(language);
        if !subtitle_path.exists() {
            return Err(DatasetError::MissingSubtitles(subtitle_path).into());
        }

        let layout = DatasetLayout::new(output_dir);
        layout.create()?;

        let entries = DatasetBuilder::new(
            self.extractor.as_ref(),
            &layout,
            self.config.segment,
            self.observer.as_ref(),
        )
        .build(&media.video_path, &subtitle_path, &media.info.id)
        .await?;

        if entries.len() < min_clips {
            self.observer.on_event(&ProgressEvent::RunDiscarded {
                produced: entries.len(),
                required: min_clips,
            });
            return Ok(RunOutcome::Discarded {
                produced: entries.len(),
                required: min_clips,
            });
        }

        write_manifest(output_dir, &entries)?;

        Ok(RunOutcome::Written {
            summary: DatasetSummary::from_entries(&entries),
            manifest_path: layout.manifest_path(),
        })
    }

    /// Process every URL of a JSON array file, one after another
    ///
    /// A failing URL is logged and recorded in the report; later URLs still run.
    pub async fn create_from_url_json(&self, json_path: &Path, output_dir: &Path, min_clips: usize) -> Result<BatchReport> {
        let urls = read_url_list(json_path)?;
        tracing::info!("Processing {} URLs from {}", urls.len(), json_path.display());

        let mut report = BatchReport::default();
        for (index, url) in urls.iter().enumerate() {
            tracing::info!("[{}/{}] {}", index + 1, urls.len(), url);
            match self.create_from_url(url, output_dir, min_clips).await {
                Ok(RunOutcome::Written { .. }) => report.written += 1,
                Ok(RunOutcome::Discarded { .. }) => report.discarded += 1,
                Err(e) => {
                    tracing::error!("Failed to process {}: {:#}", url, e);
                    report.failed.push((url.clone(), format!("{:#}", e)));
                }
            }
        }

        Ok(report)
    }
}

/// Read a JSON array of URL strings
pub fn read_url_list(json_path: &Path) -> Result<Vec<String>> {
    let content = fs_err::read_to_string(json_path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} must contain a JSON array of URL strings", json_path.display()))
}
