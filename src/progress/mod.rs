use std::path::PathBuf;
use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress notifications emitted while a dataset is being built
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// The fetcher started downloading a URL
    DownloadStarted { url: String },

    /// A progress line reported by the downloader
    DownloadProgress { percent: String, speed: String },

    /// The download finished and the merged file is at `path`
    DownloadFinished { path: PathBuf },

    /// Segmentation started over `total` subtitle cues
    SegmentationStarted { total: usize },

    /// A cue was rejected by the segment limits
    SegmentRejected {
        index: usize,
        text_chars: usize,
        duration: f64,
    },

    /// A clip was encoded and recorded
    ClipWritten { clip_id: String },

    /// A clip failed to encode and was skipped
    ClipFailed { clip_id: String, error: String },

    /// Segmentation finished with `produced` clips out of `total` cues
    SegmentationFinished { produced: usize, total: usize },

    /// The run produced too few clips and its manifest update was dropped
    RunDiscarded { produced: usize, required: usize },
}

/// Sink for [`ProgressEvent`]s
///
/// Implementations must be cheap; events are delivered inline from the
/// processing loop.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Observer that ignores every event
pub struct SilentObserver;

impl ProgressObserver for SilentObserver {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Observer that forwards events to `tracing`
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::DownloadStarted { url } => {
                tracing::info!("Downloading {}", url);
            }
            ProgressEvent::DownloadProgress { percent, speed } => {
                tracing::debug!("Download progress: {} at {}", percent, speed);
            }
            ProgressEvent::DownloadFinished { path } => {
                tracing::info!("Download complete: {}", path.display());
            }
            ProgressEvent::SegmentationStarted { total } => {
                tracing::info!("Splitting video on {} subtitle cues", total);
            }
            ProgressEvent::SegmentRejected {
                index,
                text_chars,
                duration,
            } => {
                tracing::debug!(
                    "Skipping cue {}: {} chars, {:.3}s",
                    index,
                    text_chars,
                    duration
                );
            }
            ProgressEvent::ClipWritten { clip_id } => {
                tracing::debug!("Wrote clip {}", clip_id);
            }
            ProgressEvent::ClipFailed { clip_id, error } => {
                tracing::debug!("Clip {} skipped: {}", clip_id, error);
            }
            ProgressEvent::SegmentationFinished { produced, total } => {
                tracing::info!("Produced {} clips from {} cues", produced, total);
            }
            ProgressEvent::RunDiscarded { produced, required } => {
                tracing::warn!(
                    "Too few clips were produced ({} < {}), discarding run",
                    produced,
                    required
                );
            }
        }
    }
}

/// Console observer drawing download spinners and a segmentation progress bar
pub struct ConsoleObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn replace_bar(&self, bar: Option<ProgressBar>) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.take() {
                previous.finish_and_clear();
            }
            *slot = bar;
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                f(bar);
            }
        }
    }
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::DownloadStarted { url } => {
                let spinner = ProgressBar::new_spinner();
                if let Ok(style) =
                    ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
                {
                    spinner.set_style(style);
                }
                spinner.set_message(format!("Downloading {}", url));
                spinner.enable_steady_tick(std::time::Duration::from_millis(120));
                self.replace_bar(Some(spinner));
            }
            ProgressEvent::DownloadProgress { percent, speed } => {
                self.with_bar(|bar| bar.set_message(format!("Downloading: {} at {}", percent, speed)));
            }
            ProgressEvent::DownloadFinished { .. } => {
                self.with_bar(|bar| bar.finish_with_message("Download complete, processing..."));
                if let Ok(mut slot) = self.bar.lock() {
                    slot.take();
                }
            }
            ProgressEvent::SegmentationStarted { total } => {
                let bar = ProgressBar::new(*total as u64);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar.set_message("Splitting video on subtitles...");
                self.replace_bar(Some(bar));
            }
            ProgressEvent::SegmentRejected { .. } | ProgressEvent::ClipWritten { .. } => {
                self.with_bar(|bar| bar.inc(1));
            }
            ProgressEvent::ClipFailed { clip_id, error } => {
                self.with_bar(|bar| {
                    bar.println(format!("Failed to process clip {}: {}", clip_id, error));
                    bar.inc(1);
                });
            }
            ProgressEvent::SegmentationFinished { produced, .. } => {
                self.with_bar(|bar| bar.finish_with_message(format!("{} clips", produced)));
                if let Ok(mut slot) = self.bar.lock() {
                    slot.take();
                }
            }
            ProgressEvent::RunDiscarded { .. } => {}
        }
        TracingObserver.on_event(event);
    }
}

/// Observer that records every event, for assertions in tests
#[cfg(test)]
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ProgressEvent>>,
}

#[cfg(test)]
impl RecordingObserver {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl ProgressObserver for RecordingObserver {
    fn on_event(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
