use serde::{Deserialize, Serialize};

/// Bounds a cue must fall within to become a clip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentLimits {
    /// Minimum transcript length in characters
    pub min_text_chars: usize,

    /// Maximum transcript length in characters
    pub max_text_chars: usize,

    /// Minimum clip duration in seconds
    pub min_duration: f64,

    /// Maximum clip duration in seconds
    pub max_duration: f64,
}

impl Default for SegmentLimits {
    fn default() -> Self {
        Self {
            min_text_chars: 10,
            max_text_chars: 200,
            min_duration: 1.0,
            max_duration: 10.0,
        }
    }
}

impl SegmentLimits {
    /// Check whether a cleaned transcript and its duration are acceptable
    pub fn accepts(&self, text: &str, duration: f64) -> bool {
        let chars = text.chars().count();
        (self.min_text_chars..=self.max_text_chars).contains(&chars)
            && (self.min_duration..=self.max_duration).contains(&duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(len: usize) -> String {
        "a".repeat(len)
    }

    #[test]
    fn test_text_length_bounds() {
        let limits = SegmentLimits::default();
        assert!(!limits.accepts(&text_of(9), 5.0));
        assert!(limits.accepts(&text_of(10), 5.0));
        assert!(limits.accepts(&text_of(200), 5.0));
        assert!(!limits.accepts(&text_of(201), 5.0));
    }

    #[test]
    fn test_duration_bounds() {
        let limits = SegmentLimits::default();
        let text = text_of(20);
        assert!(!limits.accepts(&text, 0.99));
        assert!(limits.accepts(&text, 1.0));
        assert!(limits.accepts(&text, 10.0));
        assert!(!limits.accepts(&text, 10.01));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let limits = SegmentLimits::default();
        // 10 characters, 30 bytes
        assert!(limits.accepts("あいうえおかきくけこ", 2.0));
    }

    #[test]
    fn test_rejects_negative_and_nan_durations() {
        let limits = SegmentLimits::default();
        assert!(!limits.accepts(&text_of(20), -2.0));
        assert!(!limits.accepts(&text_of(20), f64::NAN));
    }

    #[test]
    fn test_custom_limits() {
        let limits = SegmentLimits {
            min_text_chars: 1,
            max_text_chars: 5,
            min_duration: 0.5,
            max_duration: 2.0,
        };
        assert!(limits.accepts("hi", 0.5));
        assert!(!limits.accepts("hello!", 1.0));
    }
}
