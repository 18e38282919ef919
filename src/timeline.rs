//! Proportional screen-time allocation.
//!
//! Each article's slice of the video is proportional to how many words the
//! narration spends on it, fitted into the window between the intro and the
//! outro. A minimum duration keeps short stories readable; when the minimums
//! push past the window, everything is scaled back down once.

use serde::Serialize;

use crate::opts::RenderOpts;

/// A time-boxed slice of the final video devoted to one article.
///
/// `article_index` points into the article list the chunks were built from.
/// Start times are absolute within the video, not within the narration
/// window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub article_index: usize,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

impl Segment {
    /// The absolute time this segment ends.
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }
}

/// Allocate one segment per chunk across `total_duration` seconds of audio.
///
/// Segments are contiguous, starting where the intro ends. The minimum
/// duration floor is applied before the overflow scale-down and deliberately
/// not re-applied after it; a second pass would loop.
pub fn allocate(total_duration: f64, chunks: &[String], opts: &RenderOpts) -> Vec<Segment> {
    if chunks.is_empty() {
        return Vec::new();
    }

    let usable =
        (total_duration - opts.intro_duration_seconds - opts.outro_duration_seconds).max(0.0);

    let words: Vec<usize> = chunks.iter().map(|chunk| word_count(chunk)).collect();
    let total_words: usize = words.iter().sum();

    let mut durations: Vec<f64> = if total_words == 0 {
        // No words anywhere; nothing to be proportional to.
        vec![usable / chunks.len() as f64; chunks.len()]
    } else {
        words
            .iter()
            .map(|&count| count as f64 / total_words as f64 * usable)
            .collect()
    };

    for duration in &mut durations {
        if *duration < opts.min_segment_seconds {
            *duration = opts.min_segment_seconds;
        }
    }

    let sum: f64 = durations.iter().sum();
    if usable > 0.0 && sum > usable {
        let scale = usable / sum;
        for duration in &mut durations {
            *duration *= scale;
        }
    }

    let mut start = opts.intro_duration_seconds;
    durations
        .into_iter()
        .enumerate()
        .map(|(article_index, duration_seconds)| {
            let segment = Segment {
                article_index,
                start_seconds: start,
                duration_seconds,
            };
            start += duration_seconds;
            segment
        })
        .collect()
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
