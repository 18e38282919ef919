//! The content service seam.

use crate::Result;

/// One image a content or metadata service advertises for an article.
///
/// Dimensions are optional because many services omit them; candidates
/// without both dimensions cannot be size-filtered and are ignored by the
/// resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Pluggable content/metadata lookup for article URLs.
///
/// Implementations return whatever candidates the service knows about, in
/// any order; the resolver filters and ranks them. Errors are treated the
/// same as an empty answer.
pub trait ContentService {
    fn image_candidates(&self, url: &str) -> Result<Vec<ImageCandidate>>;
}

/// The service for deployments without a metadata provider.
///
/// Always answers with no candidates, which sends the resolver straight to
/// the article page itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContentService;

impl ContentService for NoContentService {
    fn image_candidates(&self, _url: &str) -> Result<Vec<ImageCandidate>> {
        Ok(Vec::new())
    }
}
