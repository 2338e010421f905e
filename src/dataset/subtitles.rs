use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;

use crate::DatasetError;

// SRT timing line, accepting `,` or `.` before the milliseconds
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})\s*-->\s*(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})",
    )
    .expect("valid SRT timing pattern")
});

/// A single subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    /// Start offset in milliseconds
    pub start_ms: u64,

    /// End offset in milliseconds
    pub end_ms: u64,

    /// Cue text, lines joined with `\n`
    pub raw_text: String,
}

impl SubtitleEntry {
    pub fn new(start_ms: u64, end_ms: u64, raw_text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            raw_text: raw_text.into(),
        }
    }

    pub fn start_time(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    pub fn end_time(&self) -> f64 {
        self.end_ms as f64 / 1000.0
    }

    /// Length of the cue in seconds; negative when the cue ends before it starts
    pub fn duration(&self) -> f64 {
        (self.end_ms as i64 - self.start_ms as i64) as f64 / 1000.0
    }
}

/// Read a SubRip file, keeping cues in file order
pub fn read_srt_file(path: &Path) -> Result<Vec<SubtitleEntry>> {
    let bytes = fs_err::read(path).context("Failed to read subtitle file")?;
    let content = String::from_utf8_lossy(&bytes);
    parse_srt(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse SubRip content into cues
///
/// Cues are returned in the order they appear; they are never sorted or
/// renumbered, so a cue's position is a stable index. Blocks without a timing
/// line, blocks made of a timing line alone and timestamps too large to
/// represent are skipped.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleEntry>> {
    let content = content.trim_start_matches('\u{feff}');
    let mut entries = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut skipped = 0usize;

    for line in content.lines().chain(std::iter::once("")) {
        let line = line.trim_end_matches('\r');
        if !line.trim().is_empty() {
            block.push(line);
            continue;
        }
        if block.is_empty() {
            continue;
        }
        match parse_block(&block) {
            Some(entry) => entries.push(entry),
            None => {
                skipped += 1;
                tracing::warn!("Skipping malformed subtitle block: {:?}", block.first());
            }
        }
        block.clear();
    }

    if entries.is_empty() && skipped > 0 {
        return Err(DatasetError::InvalidSubtitles(format!(
            "no cue with a valid timing line ({} malformed blocks)",
            skipped
        ))
        .into());
    }

    Ok(entries)
}

// A block needs a timing line plus at least one more line (index or text),
// so a lone timing line is malformed and does not take up a cue index
fn parse_block(lines: &[&str]) -> Option<SubtitleEntry> {
    if lines.len() < 2 {
        return None;
    }
    // The index line is optional; the timing line is either first or second
    let timing_pos = lines
        .iter()
        .take(2)
        .position(|line| TIMING_REGEX.is_match(line.trim()))?;
    let caps = TIMING_REGEX.captures(lines[timing_pos].trim())?;

    let start_ms = timestamp_ms(&caps, 1)?;
    let end_ms = timestamp_ms(&caps, 5)?;
    let raw_text = lines[timing_pos + 1..].join("\n");

    Some(SubtitleEntry::new(start_ms, end_ms, raw_text))
}

fn timestamp_ms(caps: &Captures, start_idx: usize) -> Option<u64> {
    let field = |offset: usize| -> Option<u64> { caps.get(start_idx + offset)?.as_str().parse().ok() };
    let hours = field(0)?;
    let minutes = field(1)?;
    let seconds = field(2)?;
    let millis = field(3)?;
    let total_seconds = hours.checked_mul(3600)?.checked_add(minutes * 60 + seconds)?;
    total_seconds.checked_mul(1000)?.checked_add(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:03,500\nHello there.\nSecond line\n\n2\n00:00:04,000 --> 00:00:05,250\nNext cue\n";

    #[test]
    fn test_parse_basic() {
        let entries = parse_srt(SAMPLE).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], SubtitleEntry::new(1000, 3500, "Hello there.\nSecond line"));
        assert_eq!(entries[1].start_time(), 4.0);
        assert_eq!(entries[1].end_time(), 5.25);
        assert_eq!(entries[1].duration(), 1.25);
    }

    #[test]
    fn test_parse_crlf_and_bom() {
        let content = format!("\u{feff}{}", SAMPLE.replace('\n', "\r\n"));
        let entries = parse_srt(&content).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].raw_text, "Hello there.\nSecond line");
    }

    #[test]
    fn test_parse_dot_separator_and_long_hours() {
        let entries = parse_srt("7\n100:00:00.250 --> 100:00:01.750\ntext\n").unwrap();
        assert_eq!(entries[0].start_ms, 360_000_250);
        assert_eq!(entries[0].duration(), 1.5);
    }

    #[test]
    fn test_parse_without_index_line() {
        let entries = parse_srt("00:00:01,000 --> 00:00:02,000\nno index\n").unwrap();
        assert_eq!(entries, vec![SubtitleEntry::new(1000, 2000, "no index")]);
    }

    #[test]
    fn test_keeps_file_order_and_empty_cues() {
        let content = "1\n00:00:05,000 --> 00:00:06,000\nlater\n\n2\n00:00:01,000 --> 00:00:02,000\n\n3\n00:00:07,000 --> 00:00:08,000\nlast\n";
        let entries = parse_srt(content).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].raw_text, "later");
        assert_eq!(entries[1].raw_text, "");
        assert_eq!(entries[2].raw_text, "last");
    }

    #[test]
    fn test_skips_malformed_blocks() {
        let content = "garbage block\nwithout timing\n\n1\n00:00:01,000 --> 00:00:02,000\nok\n";
        let entries = parse_srt(content).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].raw_text, "ok");
    }

    #[test]
    fn test_skips_overflowing_timestamps() {
        let content = "1\n9999999999999999:00:00,000 --> 9999999999999999:00:02,000\nsome text here ok\n\n2\n00:00:01,000 --> 00:00:03,000\nsecond cue text here\n";
        let entries = parse_srt(content).unwrap();
        assert_eq!(entries, vec![SubtitleEntry::new(1000, 3000, "second cue text here")]);
    }

    #[test]
    fn test_overflowing_timestamps_alone_is_error() {
        assert!(parse_srt("1\n99999999999999999999:00:00,000 --> 00:00:02,000\ntext\n").is_err());
    }

    #[test]
    fn test_lone_timing_line_is_skipped() {
        let content = "00:00:01,000 --> 00:00:02,000\n\n2\n00:00:03,000 --> 00:00:04,000\nkept\n";
        let entries = parse_srt(content).unwrap();
        assert_eq!(entries, vec![SubtitleEntry::new(3000, 4000, "kept")]);
    }

    #[test]
    fn test_only_malformed_blocks_is_error() {
        assert!(parse_srt("nothing\nuseful here\n").is_err());
    }

    #[test]
    fn test_empty_file_has_no_cues() {
        assert!(parse_srt("").unwrap().is_empty());
    }

    #[test]
    fn test_negative_duration() {
        let entry = SubtitleEntry::new(2000, 1500, "x");
        assert_eq!(entry.duration(), -0.5);
    }

    #[test]
    fn test_read_srt_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("clip.en.srt");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(read_srt_file(&path).unwrap().len(), 2);
        assert!(read_srt_file(&temp.path().join("missing.srt")).is_err());
    }
}
