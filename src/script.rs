//! Script segmentation: attributing narration sentences to articles.
//!
//! The narration arrives as one flat string. We strip the boilerplate the
//! script template wraps around the body, split what remains into sentences,
//! and attribute each sentence to the article whose headline it most likely
//! talks about. Sentences that match nothing are distributed so every article
//! ends up with some narration, and articles the script never mentions fall
//! back to their own summary.
//!
//! This module never fails: for N articles it always returns exactly N chunks.

use crate::article::Article;
use crate::opts::RenderOpts;

/// Words too generic to link a sentence to a headline, even when longer than
/// the significance cutoff.
const STOPWORDS: &[&str] = &[
    "this", "that", "with", "from", "have", "will", "been", "they", "their", "about", "after",
    "which", "would", "could", "should", "there", "these", "today", "into", "over", "more", "news",
];

/// Punctuation trimmed next to boilerplate phrases.
const EDGE_PUNCTUATION: &[char] = &['.', '!', '?', ',', ':', ';'];

/// Text used when an article has no narration and no summary.
const EMPTY_CHUNK: &str = "No content available";

/// Split a narration script into one text chunk per article.
///
/// The chunks are index-aligned with `articles` and drive the timeline
/// allocation; they are not displayed themselves.
pub fn segment_script(narration: &str, articles: &[Article], opts: &RenderOpts) -> Vec<String> {
    if articles.is_empty() {
        return Vec::new();
    }

    let cleaned = strip_boilerplate(narration, &opts.intro_phrase, &opts.outro_phrase);
    let sentences = split_sentences(&cleaned);

    if sentences.is_empty() {
        // Nothing to attribute. Reuse the whole cleaned narration for every
        // article, falling back to summaries when the script is empty too.
        return articles
            .iter()
            .map(|article| {
                if cleaned.trim().is_empty() {
                    fallback_chunk(article)
                } else {
                    cleaned.clone()
                }
            })
            .collect();
    }

    let title_words: Vec<Vec<String>> = articles
        .iter()
        .map(|article| significant_words(&article.title))
        .collect();

    let mut assigned: Vec<Vec<String>> = vec![Vec::new(); articles.len()];
    let mut unmatched: Vec<String> = Vec::new();
    for sentence in sentences {
        match best_article(&sentence, &title_words) {
            Some(index) => assigned[index].push(sentence),
            None => unmatched.push(sentence),
        }
    }

    distribute_unmatched(&mut assigned, unmatched);

    assigned
        .iter()
        .zip(articles)
        .map(|(sentences, article)| {
            if sentences.is_empty() {
                fallback_chunk(article)
            } else {
                sentences.join(" ")
            }
        })
        .collect()
}

/// Remove the configured intro/outro phrases from the narration edges.
///
/// Matching is case-insensitive and tolerates punctuation and whitespace
/// around either phrase. Curly apostrophes compare equal to straight ones;
/// the upstream script generator emits both spellings.
fn strip_boilerplate(narration: &str, intro_phrase: &str, outro_phrase: &str) -> String {
    let normalized = normalize_apostrophes(narration);
    let intro = normalize_apostrophes(intro_phrase);
    let outro = normalize_apostrophes(outro_phrase);

    let mut rest: &str = normalized.trim();

    if let Some(end) = match_prefix_ci(rest, &intro) {
        rest = rest[end..].trim_start_matches(is_edge_char);
    }

    let tail_trimmed = rest.trim_end_matches(is_edge_char);
    if let Some(start) = match_suffix_ci(tail_trimmed, &outro) {
        rest = tail_trimmed[..start].trim_end_matches(is_edge_char);
    }

    rest.to_string()
}

fn is_edge_char(c: char) -> bool {
    c.is_whitespace() || EDGE_PUNCTUATION.contains(&c)
}

fn normalize_apostrophes(text: &str) -> String {
    text.replace(['\u{2018}', '\u{2019}'], "'")
}

/// Byte offset just past `phrase` if `text` starts with it (ignoring case).
fn match_prefix_ci(text: &str, phrase: &str) -> Option<usize> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return None;
    }

    let mut end = 0;
    let mut text_chars = text.char_indices();
    for expected in phrase.chars() {
        let (index, actual) = text_chars.next()?;
        if !chars_eq_ci(actual, expected) {
            return None;
        }
        end = index + actual.len_utf8();
    }
    Some(end)
}

/// Byte offset where `phrase` begins if `text` ends with it (ignoring case).
fn match_suffix_ci(text: &str, phrase: &str) -> Option<usize> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return None;
    }

    let mut start = text.len();
    let mut text_chars = text.char_indices().rev();
    for expected in phrase.chars().rev() {
        let (index, actual) = text_chars.next()?;
        if !chars_eq_ci(actual, expected) {
            return None;
        }
        start = index;
    }
    Some(start)
}

fn chars_eq_ci(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Split on `.`, `!`, `?` followed by whitespace (or end of text).
///
/// Terminators stay attached to their sentence. An unterminated tail still
/// counts as a sentence so no narration is silently dropped.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let end = index + c.len_utf8();
        let boundary = match chars.peek() {
            Some((_, next)) => next.is_whitespace(),
            None => true,
        };
        if boundary {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

/// Headline words worth matching on: longer than three characters, not a
/// stopword, lowercased with surrounding punctuation removed.
fn significant_words(title: &str) -> Vec<String> {
    title
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| word.chars().count() > 3 && !STOPWORDS.contains(&word.as_str()))
        .collect()
}

/// The article a sentence most likely belongs to.
///
/// Scores count significant headline words appearing in the sentence as
/// case-insensitive substrings. Ties keep the earliest article; that
/// tie-break is implementation-defined, not a contract.
fn best_article(sentence: &str, title_words: &[Vec<String>]) -> Option<usize> {
    let sentence_lower = sentence.to_lowercase();
    let mut best: Option<(usize, usize)> = None;
    for (index, words) in title_words.iter().enumerate() {
        let score = words
            .iter()
            .filter(|word| sentence_lower.contains(word.as_str()))
            .count();
        if score == 0 {
            continue;
        }
        if best.is_none_or(|(top, _)| score > top) {
            best = Some((score, index));
        }
    }
    best.map(|(_, index)| index)
}

/// Distribute sentences that matched no article.
///
/// Articles with no narration are filled first, as contiguous runs split
/// evenly with earlier articles taking the remainder. When every article
/// already has narration, the leftovers are dealt round-robin instead.
fn distribute_unmatched(assigned: &mut [Vec<String>], unmatched: Vec<String>) {
    if unmatched.is_empty() || assigned.is_empty() {
        return;
    }

    let empties: Vec<usize> = assigned
        .iter()
        .enumerate()
        .filter(|(_, sentences)| sentences.is_empty())
        .map(|(index, _)| index)
        .collect();

    if empties.is_empty() {
        let count = assigned.len();
        for (offset, sentence) in unmatched.into_iter().enumerate() {
            assigned[offset % count].push(sentence);
        }
        return;
    }

    let per_article = unmatched.len() / empties.len();
    let extra = unmatched.len() % empties.len();
    let mut queue = unmatched.into_iter();
    for (position, &article_index) in empties.iter().enumerate() {
        let take = per_article + usize::from(position < extra);
        for sentence in queue.by_ref().take(take) {
            assigned[article_index].push(sentence);
        }
    }
}

fn fallback_chunk(article: &Article) -> String {
    let summary = article.summary.trim();
    if summary.is_empty() {
        EMPTY_CHUNK.to_string()
    } else {
        summary.to_string()
    }
}
