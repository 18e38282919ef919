use serde::{Deserialize, Serialize};

/// One summarized news item, as produced by the upstream summarization stage.
///
/// Articles are immutable once handed to the render pipeline: the segmenter and
/// layout read from them, nothing writes back. The CLI loads these from a JSON
/// array, so both serde directions are derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Headline shown on screen and scored against narration sentences.
    pub title: String,

    /// Short summary shown as the caption, and the fallback text chunk for
    /// articles the narration never mentions.
    pub summary: String,

    /// The article's origin URL, handed to the image resolver.
    pub source_url: String,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        summary: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            source_url: source_url.into(),
        }
    }
}
