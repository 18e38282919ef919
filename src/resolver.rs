//! Staged image resolution for article URLs.
//!
//! For each article we try, in order: candidates from the content service,
//! then the article page's own markup, then an optional placeholder card.
//! Every stage may fail and every failure falls through silently (logged at
//! debug); a missing image never fails a render.
//!
//! Resolved files live in an [`ImageStore`], a temporary directory scoped to
//! exactly one render and removed when the store drops.

use std::path::PathBuf;

use anyhow::{Context, ensure};
use image::{GenericImageView, Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::Result;
use crate::content::ContentService;
use crate::fetch::PageFetcher;
use crate::page;

/// Downloads decoding below this edge length are junk (tracking pixels,
/// spacer GIFs) and are rejected.
const MIN_DECODED_EDGE: u32 = 10;

const PLACEHOLDER_WIDTH: u32 = 600;
const PLACEHOLDER_HEIGHT: u32 = 338;
const PLACEHOLDER_COLOR: [u8; 4] = [60, 60, 80, 255];

/// A decoded image persisted for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Render-scoped storage for resolved images.
///
/// The directory name carries a fresh render id, so concurrent renders never
/// share a namespace; file names derive from the article URL's SHA-256, so
/// one article maps to one file. Dropping the store deletes everything,
/// on success and failure alike.
pub struct ImageStore {
    dir: TempDir,
    render_id: Uuid,
}

impl ImageStore {
    pub fn create() -> Result<Self> {
        Ok(Self::create_inner()?)
    }

    fn create_inner() -> anyhow::Result<Self> {
        let render_id = Uuid::new_v4();
        let dir = tempfile::Builder::new()
            .prefix(&format!("newsreel-{render_id}-"))
            .tempdir()
            .context("failed to create the image store directory")?;
        Ok(Self { dir, render_id })
    }

    pub fn render_id(&self) -> Uuid {
        self.render_id
    }

    /// Decode `bytes`, validate the dimensions, and persist as PNG.
    fn persist(&self, url: &str, bytes: &[u8]) -> anyhow::Result<ResolvedImage> {
        let decoded = image::load_from_memory(bytes).context("failed to decode image bytes")?;
        let (width, height) = decoded.dimensions();
        ensure!(
            width >= MIN_DECODED_EDGE && height >= MIN_DECODED_EDGE,
            "decoded image is too small ({width}x{height})"
        );

        let path = self.path_for("img", url);
        decoded
            .save(&path)
            .with_context(|| format!("failed to write image '{}'", path.display()))?;
        Ok(ResolvedImage {
            path,
            width,
            height,
        })
    }

    /// Write the solid-color placeholder card for `url`.
    fn placeholder(&self, url: &str) -> anyhow::Result<ResolvedImage> {
        let card = RgbaImage::from_pixel(
            PLACEHOLDER_WIDTH,
            PLACEHOLDER_HEIGHT,
            Rgba(PLACEHOLDER_COLOR),
        );
        let path = self.path_for("default", url);
        card.save(&path)
            .with_context(|| format!("failed to write placeholder '{}'", path.display()))?;
        Ok(ResolvedImage {
            path,
            width: PLACEHOLDER_WIDTH,
            height: PLACEHOLDER_HEIGHT,
        })
    }

    fn path_for(&self, kind: &str, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        self.dir.path().join(format!("{kind}_{}.png", &digest[..16]))
    }
}

/// Finds zero or one representative image per article URL.
pub struct ImageResolver<C: ContentService, F: PageFetcher> {
    content: C,
    fetcher: F,
    min_candidate_width: u32,
    min_candidate_height: u32,
    use_placeholder: bool,
}

impl<C: ContentService, F: PageFetcher> ImageResolver<C, F> {
    pub fn new(content: C, fetcher: F) -> Self {
        Self {
            content,
            fetcher,
            min_candidate_width: 300,
            min_candidate_height: 200,
            use_placeholder: false,
        }
    }

    /// Substitute a solid-color card when every stage fails.
    pub fn use_placeholder(mut self, enabled: bool) -> Self {
        self.use_placeholder = enabled;
        self
    }

    /// Resolve an image for `url`, persisting it into `store`.
    ///
    /// Never fails: an error inside any stage falls through to the next, and
    /// exhausting all of them resolves to `None`.
    pub fn resolve(&self, url: &str, store: &ImageStore) -> Option<ResolvedImage> {
        let candidate = self
            .candidate_from_content(url)
            .or_else(|| self.candidate_from_page(url));

        match candidate {
            Some(image_url) => match self.download(&image_url, url, store) {
                Ok(image) => return Some(image),
                Err(err) => debug!(url, image_url, "image download failed: {err:#}"),
            },
            None => debug!(url, "no image candidate found"),
        }

        if !self.use_placeholder {
            return None;
        }
        match store.placeholder(url) {
            Ok(image) => Some(image),
            Err(err) => {
                debug!(url, "placeholder creation failed: {err:#}");
                None
            }
        }
    }

    /// Largest candidate from the content service that clears the size bar.
    ///
    /// Candidates missing either dimension cannot be filtered and are
    /// dropped.
    fn candidate_from_content(&self, url: &str) -> Option<String> {
        let candidates = match self.content.image_candidates(url) {
            Ok(candidates) => candidates,
            Err(err) => {
                debug!(url, "content service lookup failed: {err:#}");
                return None;
            }
        };

        candidates
            .into_iter()
            .filter_map(|candidate| match (candidate.width, candidate.height) {
                (Some(width), Some(height))
                    if width >= self.min_candidate_width
                        && height >= self.min_candidate_height =>
                {
                    Some((u64::from(width) * u64::from(height), candidate.url))
                }
                _ => None,
            })
            .max_by_key(|(area, _)| *area)
            .map(|(_, candidate_url)| candidate_url)
    }

    fn candidate_from_page(&self, url: &str) -> Option<String> {
        let html = match self.fetcher.fetch_text(url) {
            Ok(html) => html,
            Err(err) => {
                debug!(url, "page fetch failed: {err:#}");
                return None;
            }
        };
        let base = match Url::parse(url) {
            Ok(base) => base,
            Err(err) => {
                debug!(url, "article URL does not parse: {err}");
                return None;
            }
        };
        page::extract_image_url(&html, &base)
    }

    fn download(
        &self,
        image_url: &str,
        article_url: &str,
        store: &ImageStore,
    ) -> anyhow::Result<ResolvedImage> {
        let bytes = self.fetcher.fetch_bytes(image_url)?;
        store.persist(article_url, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ImageCandidate, NoContentService};
    use std::collections::HashMap;
    use std::io::Cursor;

    struct StaticCandidates(Vec<ImageCandidate>);

    impl ContentService for StaticCandidates {
        fn image_candidates(&self, _url: &str) -> crate::Result<Vec<ImageCandidate>> {
            Ok(self.0.clone())
        }
    }

    struct FailingContent;

    impl ContentService for FailingContent {
        fn image_candidates(&self, _url: &str) -> crate::Result<Vec<ImageCandidate>> {
            Err(crate::Error::msg("content service is down"))
        }
    }

    #[derive(Default)]
    struct MapFetcher {
        pages: HashMap<String, String>,
        files: HashMap<String, Vec<u8>>,
    }

    impl PageFetcher for MapFetcher {
        fn fetch_text(&self, url: &str) -> crate::Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| crate::Error::msg(format!("no page for {url}")))
        }

        fn fetch_bytes(&self, url: &str) -> crate::Result<Vec<u8>> {
            self.files
                .get(url)
                .cloned()
                .ok_or_else(|| crate::Error::msg(format!("no file for {url}")))
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    fn candidate(url: &str, width: u32, height: u32) -> ImageCandidate {
        ImageCandidate {
            url: url.to_string(),
            width: Some(width),
            height: Some(height),
        }
    }

    const ARTICLE: &str = "https://news.example.com/story/1";

    #[test]
    fn largest_qualifying_content_candidate_wins() {
        let content = StaticCandidates(vec![
            candidate("https://cdn.example.com/medium.jpg", 400, 300),
            candidate("https://cdn.example.com/large.jpg", 800, 600),
            // Wide enough area but below the minimum width.
            candidate("https://cdn.example.com/narrow.jpg", 200, 900),
        ]);
        let mut fetcher = MapFetcher::default();
        fetcher
            .files
            .insert("https://cdn.example.com/large.jpg".to_string(), png_bytes(64, 48));

        let store = ImageStore::create().unwrap();
        let resolved = ImageResolver::new(content, fetcher)
            .resolve(ARTICLE, &store)
            .unwrap();
        assert_eq!((resolved.width, resolved.height), (64, 48));
        assert!(resolved.path.exists());
    }

    #[test]
    fn content_failure_falls_through_to_the_page() {
        let mut fetcher = MapFetcher::default();
        fetcher.pages.insert(
            ARTICLE.to_string(),
            r#"<meta property="og:image" content="https://cdn.example.com/og.png">"#.to_string(),
        );
        fetcher
            .files
            .insert("https://cdn.example.com/og.png".to_string(), png_bytes(32, 32));

        let store = ImageStore::create().unwrap();
        let resolved = ImageResolver::new(FailingContent, fetcher).resolve(ARTICLE, &store);
        assert!(resolved.is_some());
    }

    #[test]
    fn exhausted_stages_resolve_to_none() {
        let store = ImageStore::create().unwrap();
        let resolved =
            ImageResolver::new(NoContentService, MapFetcher::default()).resolve(ARTICLE, &store);
        assert!(resolved.is_none());
    }

    #[test]
    fn tiny_downloads_are_rejected() {
        let content = StaticCandidates(vec![candidate("https://cdn.example.com/px.gif", 500, 500)]);
        let mut fetcher = MapFetcher::default();
        fetcher
            .files
            .insert("https://cdn.example.com/px.gif".to_string(), png_bytes(4, 4));

        let store = ImageStore::create().unwrap();
        let resolved = ImageResolver::new(content, fetcher).resolve(ARTICLE, &store);
        assert!(resolved.is_none());
    }

    #[test]
    fn placeholder_covers_total_failure_when_enabled() {
        let store = ImageStore::create().unwrap();
        let resolved = ImageResolver::new(NoContentService, MapFetcher::default())
            .use_placeholder(true)
            .resolve(ARTICLE, &store)
            .unwrap();
        assert_eq!(
            (resolved.width, resolved.height),
            (PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT)
        );
        assert!(resolved.path.exists());
    }

    #[test]
    fn store_paths_are_keyed_by_url() {
        let store = ImageStore::create().unwrap();
        let a = store.path_for("img", "https://example.com/a");
        let b = store.path_for("img", "https://example.com/b");
        assert_ne!(a, b);
        assert_eq!(a, store.path_for("img", "https://example.com/a"));
        assert!(a.starts_with(store.dir.path()));
    }

    #[test]
    fn dropping_the_store_removes_its_files() {
        let store = ImageStore::create().unwrap();
        let resolved = store.placeholder("https://example.com/a").unwrap();
        let dir = store.dir.path().to_path_buf();
        assert!(resolved.path.exists());

        drop(store);
        assert!(!resolved.path.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn distinct_stores_use_distinct_directories() {
        let first = ImageStore::create().unwrap();
        let second = ImageStore::create().unwrap();
        assert_ne!(first.render_id(), second.render_id());
        assert_ne!(first.dir.path(), second.dir.path());
    }
}
