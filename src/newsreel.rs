//! High-level API for composing news videos.
//!
//! We expose a single, ergonomic entry point (`Newsreel`) that wires together
//! the lower-level segmentation, timing, layout, image resolution, and
//! encoding logic.
//!
//! The intent is:
//! - We build the HTTP client and the encoder once.
//! - We reuse them to compose multiple videos.
//! - Callers choose canvas geometry, timing, and branding via `RenderOpts`.
//!
//! This module is deliberately "high level": it sequences script → timeline →
//! images → layout → encode, while keeping the lower-level pieces testable in
//! their own modules.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, ensure};
use tracing::{debug, info};

use crate::Result;
use crate::article::Article;
use crate::audio::NarrationAudio;
use crate::content::{ContentService, NoContentService};
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::ffmpeg_encoder::FfmpegEncoder;
use crate::layout;
use crate::opts::RenderOpts;
use crate::resolver::{ImageResolver, ImageStore};
use crate::script;
use crate::timeline;
use crate::video_encoder::VideoEncoder;

/// The main high-level composition entry point.
///
/// `Newsreel` owns the long-lived resources required for rendering:
/// - a `VideoEncoder` (ffmpeg by default)
/// - an `ImageResolver` with its content service and page fetcher
/// - the `RenderOpts` applied to every render
///
/// Typical usage:
/// - Construct once.
/// - Call `compose_video` many times with different scripts and articles.
pub struct Newsreel<E = FfmpegEncoder, C = NoContentService, F = HttpFetcher>
where
    E: VideoEncoder,
    C: ContentService,
    F: PageFetcher,
{
    encoder: E,
    resolver: ImageResolver<C, F>,
    opts: RenderOpts,
}

impl Newsreel<FfmpegEncoder, NoContentService, HttpFetcher> {
    /// Create a `Newsreel` with the default encoder and resolver.
    ///
    /// We fail fast if the HTTP client cannot be built. This keeps invariants
    /// simple: once `Newsreel::new` succeeds, a render can only fail on its
    /// own inputs or on the encoder.
    pub fn new(opts: RenderOpts) -> Result<Self> {
        let fetcher = HttpFetcher::new()?;
        let resolver =
            ImageResolver::new(NoContentService, fetcher).use_placeholder(opts.use_placeholder_image);
        Ok(Self::with_parts(FfmpegEncoder::new(), resolver, opts))
    }
}

impl<E, C, F> Newsreel<E, C, F>
where
    E: VideoEncoder,
    C: ContentService,
    F: PageFetcher,
{
    /// Assemble a `Newsreel` from explicit parts.
    ///
    /// This is the seam for swapping in a different encoder (for example the
    /// JSON manifest encoder), a real content service, or an offline fetcher.
    pub fn with_parts(encoder: E, resolver: ImageResolver<C, F>, opts: RenderOpts) -> Self {
        Self {
            encoder,
            resolver,
            opts,
        }
    }

    /// Access the configured options.
    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    /// Access the configured encoder.
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Compose one narrated news video and return its output path.
    ///
    /// Fatal conditions are an unreadable narration track, an uncreatable
    /// output directory, and encoder failure. Everything else degrades:
    /// articles without narration fall back to their summaries, articles
    /// without images render without one. Temporary image files are removed
    /// before this returns, on success and on error.
    pub fn compose_video(
        &self,
        narration: &str,
        articles: &[Article],
        audio: &NarrationAudio,
        output_path: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        Ok(self.compose_inner(narration, articles, audio, output_path.as_ref())?)
    }

    fn compose_inner(
        &self,
        narration: &str,
        articles: &[Article],
        audio: &NarrationAudio,
        output_path: &Path,
    ) -> anyhow::Result<PathBuf> {
        ensure!(
            audio.duration_seconds.is_finite() && audio.duration_seconds > 0.0,
            "narration duration must be positive, got {}",
            audio.duration_seconds
        );
        ensure!(
            audio.path.is_file(),
            "narration audio not found at '{}'",
            audio.path.display()
        );

        info!(
            articles = articles.len(),
            duration_seconds = audio.duration_seconds,
            "composing news video"
        );

        let chunks = script::segment_script(narration, articles, &self.opts);
        let segments = timeline::allocate(audio.duration_seconds, &chunks, &self.opts);
        debug!(segments = segments.len(), "timeline allocated");

        // The store lives for exactly this render; dropping it on any return
        // path below removes every temporary image.
        let store = ImageStore::create()?;
        let mut images = Vec::with_capacity(articles.len());
        for article in articles {
            images.push(self.resolver.resolve(&article.source_url, &store));
        }
        debug!(
            resolved = images.iter().flatten().count(),
            render_id = %store.render_id(),
            "image resolution finished"
        );

        let composition = layout::compose(&self.opts, articles, &segments, &images, audio);

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create output directory '{}'", parent.display())
                })?;
            }
        }

        self.encoder.encode(&composition, output_path)?;
        info!(output = %output_path.display(), "news video written");
        Ok(output_path.to_path_buf())
    }
}
