//! Cue segmentation: the "words-to-cues" algorithm.
//!
//! Turns a word-level transcript into display cues.
//!
//! # Algorithm
//!
//! 1. **Clamp** timestamps: NaN/negative values become 0, starts never
//!    precede the previous word's end.
//! 2. **Group** words greedily while the word count stays within
//!    `max_words_per_line` and neither the reading time
//!    (`chars / target_chars_per_second`) nor the spoken span exceeds
//!    `max_cue_duration`. A word that does not fit alone still gets a cue.
//! 3. **Merge** a zero-length group that starts exactly where the next
//!    group starts into its neighbour, since no non-empty range fits it.
//! 4. **Time** each group as `[first.start, last.end)`. Short cues may be
//!    stretched toward `min_cue_duration`, stopping `inter_cue_gap` before
//!    the next cue.
//!
//! Output cues are ordered and never overlap.

use capcue_common::config::SegmentationDefaults;
use capcue_caption_model::color::Color;
use capcue_caption_model::cue::{Cue, KaraokeVariant};
use capcue_caption_model::timing::{TimeRange, WordTiming};
use capcue_caption_model::transcript::Transcript;

/// Smallest cue length produced for zero-duration words.
const MIN_CUE_EPSILON: f64 = 0.001;

/// Configuration for the cue segmenter.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// String placed between words in the cue text.
    pub joiner: String,

    /// Reading speed used to estimate how long a cue needs on screen.
    pub target_chars_per_second: f64,

    /// Cues shorter than this are stretched when `expand_short_cues` is set.
    pub min_cue_duration: f64,

    /// Maximum reading duration / spoken span of a single cue.
    pub max_cue_duration: f64,

    /// Gap kept between an extended cue and the following one.
    pub inter_cue_gap: f64,

    /// Maximum words per cue (values below 1 are treated as 1).
    pub max_words_per_line: usize,

    /// Whether short cues are stretched toward `min_cue_duration`.
    pub expand_short_cues: bool,

    /// Karaoke variant attached to every produced cue, so each cue keeps the
    /// word timings it was built from.
    pub variant: KaraokeVariant,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self::from(&SegmentationDefaults::default())
    }
}

impl From<&SegmentationDefaults> for SegmenterConfig {
    fn from(defaults: &SegmentationDefaults) -> Self {
        Self {
            joiner: defaults.joiner.clone(),
            target_chars_per_second: defaults.target_chars_per_second,
            min_cue_duration: defaults.min_cue_duration,
            max_cue_duration: defaults.max_cue_duration,
            inter_cue_gap: defaults.inter_cue_gap,
            max_words_per_line: defaults.max_words_per_line,
            expand_short_cues: defaults.expand_short_cues,
            variant: KaraokeVariant::WordHighlight {
                highlight_color: Color::YELLOW,
                font_color: Color::WHITE,
            },
        }
    }
}

/// The cue segmenter.
pub struct CueSegmenter {
    config: SegmenterConfig,
}

impl CueSegmenter {
    /// Create a new segmenter with the given configuration.
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Create a segmenter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SegmenterConfig::default())
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment one contiguous run of words.
    pub fn segment(&self, words: &[WordTiming]) -> Vec<Cue> {
        let (words, clamped) = clamp_words(words, 0.0);
        let groups = self
            .group_words(words)
            .into_iter()
            .map(|group| (0, group))
            .collect();
        let groups = merge_empty_groups(groups);
        self.log_result(&groups, clamped);
        self.build_cues(groups)
    }

    /// Segment every speech segment of a transcript.
    ///
    /// Cues never span two segments. Timestamps are clamped across segment
    /// boundaries too, so the combined list stays ordered.
    pub fn segment_transcript(&self, transcript: &Transcript) -> Vec<Cue> {
        let mut groups = vec![];
        let mut clamped = 0;
        let mut floor = 0.0;

        for (index, segment) in transcript.segments.iter().enumerate() {
            let (words, segment_clamped) = clamp_words(&segment.word_timings(), floor);
            clamped += segment_clamped;
            if let Some(last) = words.last() {
                floor = last.end;
            }
            groups.extend(
                self.group_words(words)
                    .into_iter()
                    .map(|group| (index, group)),
            );
        }

        let groups = merge_empty_groups(groups);
        self.log_result(&groups, clamped);
        self.build_cues(groups)
    }

    /// Greedily pack words into cue-sized groups.
    fn group_words(&self, words: Vec<WordTiming>) -> Vec<Vec<WordTiming>> {
        let max_words = self.config.max_words_per_line.max(1);
        let joiner_len = self.config.joiner.chars().count();

        let mut groups = vec![];
        let mut current: Vec<WordTiming> = vec![];
        let mut chars = 0usize;

        for word in words {
            let word_len = word.text.chars().count();
            if let Some(first) = current.first() {
                let candidate_chars = chars + joiner_len + word_len;
                let span = word.end - first.start;
                let fits = current.len() < max_words
                    && self.reading_secs(candidate_chars).max(span) <= self.config.max_cue_duration;
                if !fits {
                    groups.push(std::mem::take(&mut current));
                    chars = 0;
                }
            }
            chars += if current.is_empty() {
                word_len
            } else {
                joiner_len + word_len
            };
            current.push(word);
        }

        if !current.is_empty() {
            groups.push(current);
        }
        groups
    }

    /// Time each group and turn it into a cue.
    fn build_cues(&self, groups: Vec<Vec<WordTiming>>) -> Vec<Cue> {
        let next_starts: Vec<Option<f64>> = (0..groups.len())
            .map(|i| groups.get(i + 1).and_then(|g| g.first()).map(|w| w.start))
            .collect();

        groups
            .into_iter()
            .zip(next_starts)
            .enumerate()
            .filter_map(|(index, (words, next_start))| {
                let lower = words.first()?.start;
                let natural_upper = words.last()?.end;
                let upper = self.cue_upper(lower, natural_upper, next_start);
                let text = words
                    .iter()
                    .map(|w| w.text.as_str())
                    .collect::<Vec<_>>()
                    .join(&self.config.joiner);
                let id = format!("cue-{:04}", index + 1);
                let range = TimeRange::new(lower, upper);
                Some(Cue::karaoke(id, text, range, self.config.variant, words))
            })
            .collect()
    }

    /// End of a cue starting at `lower` whose last word ends at `natural_upper`.
    ///
    /// Never earlier than `natural_upper`, never later than the next cue's start.
    fn cue_upper(&self, lower: f64, natural_upper: f64, next_start: Option<f64>) -> f64 {
        let mut upper = natural_upper;

        if self.config.expand_short_cues && upper - lower < self.config.min_cue_duration {
            let mut target = lower + self.config.min_cue_duration;
            if let Some(next) = next_start {
                target = target.min(next - self.config.inter_cue_gap.max(0.0));
            }
            upper = upper.max(target);
        }

        if upper <= lower {
            let mut target = lower + self.config.min_cue_duration.max(MIN_CUE_EPSILON);
            if let Some(next) = next_start {
                target = target.min(next);
            }
            upper = upper.max(target);
        }

        upper
    }

    fn reading_secs(&self, chars: usize) -> f64 {
        let cps = self.config.target_chars_per_second;
        if cps.is_finite() && cps > 0.0 {
            chars as f64 / cps
        } else {
            0.0
        }
    }

    fn log_result(&self, groups: &[Vec<WordTiming>], clamped: usize) {
        if clamped > 0 {
            tracing::warn!(
                clamped,
                "Clamped malformed transcript timestamps during segmentation"
            );
        }
        tracing::debug!(
            cues = groups.len(),
            words = groups.iter().map(Vec::len).sum::<usize>(),
            max_words_per_line = self.config.max_words_per_line,
            "Segmented transcript into cues"
        );
    }
}

/// Fold groups that cannot get a non-empty time range into a neighbour.
///
/// A group is stuck when all its words are zero-length and the next group
/// starts at the same instant. It joins the previous group of the same
/// transcript segment, or else the next group. The merged group may exceed
/// `max_words_per_line`; dropping the words would lose them.
fn merge_empty_groups(groups: Vec<(usize, Vec<WordTiming>)>) -> Vec<Vec<WordTiming>> {
    let next_starts: Vec<Option<f64>> = (0..groups.len())
        .map(|i| groups.get(i + 1).and_then(|(_, g)| g.first()).map(|w| w.start))
        .collect();

    let mut merged: Vec<(usize, Vec<WordTiming>)> = vec![];
    let mut carry: Vec<WordTiming> = vec![];

    for ((segment, group), next_start) in groups.into_iter().zip(next_starts) {
        let mut words = std::mem::take(&mut carry);
        words.extend(group);
        let (Some(first), Some(last)) = (words.first(), words.last()) else {
            continue;
        };
        let stuck = last.end <= first.start && next_start.is_some_and(|next| next <= first.start);
        if !stuck {
            merged.push((segment, words));
            continue;
        }
        match merged.last_mut() {
            Some((previous_segment, previous)) if *previous_segment == segment => {
                previous.extend(words);
            }
            _ => carry = words,
        }
    }

    merged.into_iter().map(|(_, group)| group).collect()
}

/// Drop empty words and clamp timestamps so they are ordered.
fn clamp_words(words: &[WordTiming], floor: f64) -> (Vec<WordTiming>, usize) {
    let mut floor = floor;
    let mut clamped = 0;
    let words = words
        .iter()
        .filter(|w| !w.text.trim().is_empty())
        .map(|w| {
            let mut word = WordTiming::new(w.text.trim(), w.start, w.end);
            if word.clamp_after(floor) {
                clamped += 1;
            }
            floor = word.end;
            word
        })
        .collect();
    (words, clamped)
}
