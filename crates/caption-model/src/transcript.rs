//! Word-level transcription input.
//!
//! The transcription service returns sentences, each with per-word
//! timestamps. Field names are accepted in both snake_case and the
//! camelCase the service emits.

use serde::{Deserialize, Serialize};

use crate::timing::WordTiming;

/// A full transcript: ordered speech segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
}

/// One contiguous speech segment (usually a sentence).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    #[serde(alias = "sentenceWords", default)]
    pub sentence_words: Vec<TranscriptWord>,
}

/// A transcribed word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
    /// Recognition confidence. Carried through but not used for layout.
    #[serde(default)]
    pub probability: Option<f64>,
}

impl Transcript {
    /// Parse a transcript from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn word_count(&self) -> usize {
        self.segments.iter().map(|s| s.sentence_words.len()).sum()
    }
}

impl TranscriptSegment {
    /// Word timings of this segment in transcript order.
    pub fn word_timings(&self) -> Vec<WordTiming> {
        self.sentence_words
            .iter()
            .map(TranscriptWord::to_word_timing)
            .collect()
    }
}

impl TranscriptWord {
    pub fn to_word_timing(&self) -> WordTiming {
        WordTiming::new(self.word.trim(), self.start, self.end)
    }
}
