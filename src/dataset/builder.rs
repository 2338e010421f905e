use anyhow::{Context, Result};
use std::path::Path;

use super::extractor::{ClipExtractor, ClipRange, ClipTargets};
use super::subtitles::read_srt_file;
use super::{normalize_text, round_millis, DatasetEntry, DatasetLayout, SegmentLimits};
use crate::progress::{ProgressEvent, ProgressObserver};

/// Turns a video and its subtitle track into dataset entries
pub struct DatasetBuilder<'a> {
    extractor: &'a dyn ClipExtractor,
    layout: &'a DatasetLayout,
    limits: SegmentLimits,
    observer: &'a dyn ProgressObserver,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(
        extractor: &'a dyn ClipExtractor,
        layout: &'a DatasetLayout,
        limits: SegmentLimits,
        observer: &'a dyn ProgressObserver,
    ) -> Self {
        Self {
            extractor,
            layout,
            limits,
            observer,
        }
    }

    /// Split `video_path` on the cues of `subtitle_path`
    ///
    /// Clip ids keep the cue's position in the subtitle file, so rejected
    /// or failed cues leave gaps. A clip that fails to encode is reported and
    /// skipped; only failures to read the inputs abort the build.
    pub async fn build(&self, video_path: &Path, subtitle_path: &Path, video_id: &str) -> Result<Vec<DatasetEntry>> {
        let cues = read_srt_file(subtitle_path)?;
        let source = self
            .extractor
            .open(video_path)
            .await
            .with_context(|| format!("Failed to open video {}", video_path.display()))?;

        self.observer
            .on_event(&ProgressEvent::SegmentationStarted { total: cues.len() });

        let mut entries = Vec::new();
        for (index, cue) in cues.iter().enumerate() {
            let text = normalize_text(&cue.raw_text);
            let duration = cue.duration();

            if !self.limits.accepts(&text, duration) {
                self.observer.on_event(&ProgressEvent::SegmentRejected {
                    index,
                    text_chars: text.chars().count(),
                    duration,
                });
                continue;
            }

            let clip_id = DatasetEntry::clip_id(video_id, index);
            let video_filename = format!("{}.mp4", clip_id);
            let wav_filename = format!("{}.wav", clip_id);
            let targets = ClipTargets {
                video_path: self.layout.videos_dir().join(&video_filename),
                wav_path: self.layout.wavs_dir().join(&wav_filename),
            };
            let range = ClipRange::new(cue.start_time(), cue.end_time());

            match self.extractor.extract(&source, range, &targets).await {
                Ok(()) => {
                    self.observer.on_event(&ProgressEvent::ClipWritten {
                        clip_id: clip_id.clone(),
                    });
                    entries.push(DatasetEntry {
                        id: clip_id,
                        video_filename,
                        wav_filename,
                        text,
                        duration: round_millis(duration),
                        start_time: round_millis(cue.start_time()),
                        end_time: round_millis(cue.end_time()),
                    });
                }
                Err(e) => {
                    tracing::warn!("Failed to process clip {}: {:#}", clip_id, e);
                    self.observer.on_event(&ProgressEvent::ClipFailed {
                        clip_id,
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        // Clips are already written; a failed release only warns
        if let Err(e) = self.extractor.close(source) {
            tracing::warn!("Failed to release video {}: {:#}", video_path.display(), e);
        }

        self.observer.on_event(&ProgressEvent::SegmentationFinished {
            produced: entries.len(),
            total: cues.len(),
        });

        Ok(entries)
    }
}
