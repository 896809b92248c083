//! Word timings and cue time ranges.

use serde::{Deserialize, Serialize};

/// A single spoken word with its timing, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Half-open time interval `[lower, upper)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub lower: f64,
    pub upper: f64,
}

impl WordTiming {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `t` falls inside `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    /// Clamp timestamps into a usable shape.
    ///
    /// Non-finite or negative values become 0, the start is pushed to at
    /// least `floor` (the previous word's end) and the end is never before
    /// the start. Returns whether anything had to be changed.
    pub fn clamp_after(&mut self, floor: f64) -> bool {
        let original = (self.start, self.end);
        self.start = sanitize_secs(self.start).max(floor);
        self.end = sanitize_secs(self.end).max(self.start);
        original != (self.start, self.end)
    }
}

impl TimeRange {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn duration(&self) -> f64 {
        self.upper - self.lower
    }

    /// Whether `t` falls inside `[lower, upper)`.
    pub fn contains(&self, t: f64) -> bool {
        self.lower <= t && t < self.upper
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.lower < other.upper && other.lower < self.upper
    }

    /// Whether the range is finite, non-negative and non-empty.
    pub fn is_valid(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite() && self.lower >= 0.0 && self.lower < self.upper
    }
}

/// Replace NaN, infinities and negative values with 0.
pub fn sanitize_secs(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Spread `words` evenly across `range`.
///
/// Used when a persisted karaoke cue has lost its word timings. The last
/// word always ends exactly at `range.upper`.
pub fn even_word_timings<S: AsRef<str>>(words: &[S], range: TimeRange) -> Vec<WordTiming> {
    if words.is_empty() {
        return vec![];
    }
    let step = range.duration().max(0.0) / words.len() as f64;
    let last = words.len() - 1;
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let start = range.lower + step * i as f64;
            let end = if i == last {
                range.upper.max(start)
            } else {
                range.lower + step * (i + 1) as f64
            };
            WordTiming::new(word.as_ref(), start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_after_fixes_bad_timestamps() {
        let mut word = WordTiming::new("hi", f64::NAN, -3.0);
        assert!(word.clamp_after(0.0));
        assert_eq!((word.start, word.end), (0.0, 0.0));

        let mut overlapping = WordTiming::new("there", 0.4, 0.9);
        assert!(overlapping.clamp_after(0.5));
        assert_eq!((overlapping.start, overlapping.end), (0.5, 0.9));

        let mut fine = WordTiming::new("ok", 1.0, 2.0);
        assert!(!fine.clamp_after(0.5));
    }

    #[test]
    fn test_time_range_is_half_open() {
        let range = TimeRange::new(1.0, 2.0);
        assert!(range.contains(1.0));
        assert!(!range.contains(2.0));
        assert!(!range.overlaps(&TimeRange::new(2.0, 3.0)));
        assert!(range.overlaps(&TimeRange::new(1.5, 3.0)));
    }

    #[test]
    fn test_even_word_timings() {
        let timings = even_word_timings(&["a", "b", "c", "d"], TimeRange::new(2.0, 4.0));
        assert_eq!(timings.len(), 4);
        assert!((timings[1].start - 2.5).abs() < 1e-9);
        assert!((timings[1].end - 3.0).abs() < 1e-9);
        assert_eq!(timings[3].end, 4.0);
        for pair in timings.windows(2) {
            assert!(pair[0].end <= pair[1].start + 1e-12);
        }
    }

    #[test]
    fn test_even_word_timings_empty() {
        let words: [&str; 0] = [];
        assert!(even_word_timings(&words, TimeRange::new(0.0, 1.0)).is_empty());
    }
}
