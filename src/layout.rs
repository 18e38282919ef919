//! Collision-free canvas layout.
//!
//! `compose` turns articles, their timeline segments, and any resolved images
//! into a [`Composition`]: a flat list of timed visual elements on a fixed
//! canvas. Geometry is decided here, once, with estimated text metrics;
//! encoders only draw what they are told and never reflow anything.
//!
//! The bottom of the canvas belongs to the ticker band. Per-article content
//! (headline, image, summary) must stay above it: images shrink to make
//! room, summaries never do.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use crate::article::Article;
use crate::audio::NarrationAudio;
use crate::opts::RenderOpts;
use crate::resolver::ResolvedImage;
use crate::text;
use crate::timeline::Segment;

/// Corner inset for the station logo.
const LOGO_INSET_PX: u32 = 20;

/// A solid RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The hex form ffmpeg filter arguments understand.
    pub fn to_hex(self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Horizontal anchoring for a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalPos {
    /// Every line centered on the canvas.
    Center,
    /// Left edge at a fixed pixel offset.
    Left(u32),
}

/// Pre-wrapped text at a fixed vertical position.
#[derive(Debug, Clone, Serialize)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub font_size: u32,
    pub line_height: u32,
    pub x: HorizontalPos,
    pub top: u32,
    pub color: Rgb,
}

/// A resolved image scaled to its final on-canvas size, centered horizontally.
#[derive(Debug, Clone, Serialize)]
pub struct ImagePlacement {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub top: u32,
}

/// The scrolling headline text.
///
/// Its horizontal position over time follows [`ticker_x_at`]; encoders either
/// evaluate that per frame or emit an equivalent expression.
#[derive(Debug, Clone, Serialize)]
pub struct TickerText {
    pub text: String,
    pub font_size: u32,
    pub estimated_width: u32,
    pub band_top: u32,
    pub band_height: u32,
    pub color: Rgb,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Background { color: Rgb },
    Band { top: u32, height: u32, color: Rgb },
    Text(TextBlock),
    Image(ImagePlacement),
    Ticker(TickerText),
}

/// One visual element with the time window it is on screen.
#[derive(Debug, Clone, Serialize)]
pub struct Element {
    #[serde(flatten)]
    pub kind: ElementKind,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

/// The fully timed set of visual elements for one video.
///
/// Element order is z-order: later elements draw on top of earlier ones.
/// A composition borrows nothing and can outlive the render that built it,
/// but it points at image files that a render's store deletes on drop.
#[derive(Debug, Clone, Serialize)]
pub struct Composition {
    pub width: u32,
    pub height: u32,
    pub total_duration_seconds: f64,
    pub audio_path: PathBuf,
    pub elements: Vec<Element>,
}

/// The ticker's left edge at time `t`.
///
/// Starts fully off screen on the right and ends fully off screen on the
/// left at `total`, moving at constant speed. A non-positive total parks the
/// text off screen.
pub fn ticker_x_at(t: f64, total: f64, canvas_width: u32, ticker_width: u32) -> f64 {
    let width = f64::from(canvas_width);
    if total <= 0.0 {
        return width;
    }
    width - (width + f64::from(ticker_width)) * (t / total)
}

/// Lay out the full video.
///
/// `images` is index-aligned with `articles`; a `None` entry simply leaves
/// more room for the summary. Segments pointing past the article list are
/// skipped with a warning rather than failing the render.
pub fn compose(
    opts: &RenderOpts,
    articles: &[Article],
    segments: &[Segment],
    images: &[Option<ResolvedImage>],
    audio: &NarrationAudio,
) -> Composition {
    let total = audio.duration_seconds;
    let mut elements = Vec::new();

    elements.push(Element {
        kind: ElementKind::Background {
            color: opts.background_color,
        },
        start_seconds: 0.0,
        duration_seconds: total,
    });

    if !opts.logo_text.is_empty() {
        elements.push(Element {
            kind: ElementKind::Text(TextBlock {
                lines: vec![opts.logo_text.clone()],
                font_size: opts.logo_font_size,
                line_height: text::line_height(opts.logo_font_size),
                x: HorizontalPos::Left(LOGO_INSET_PX),
                top: LOGO_INSET_PX,
                color: opts.text_color,
            }),
            start_seconds: 0.0,
            duration_seconds: total,
        });
    }

    if let Some(block) = centered_title(opts, &opts.intro_title, opts.intro_font_size) {
        elements.push(Element {
            kind: ElementKind::Text(block),
            start_seconds: 0.0,
            duration_seconds: opts.intro_duration_seconds.min(total),
        });
    }

    if let Some(block) = centered_title(opts, &opts.outro_title, opts.outro_font_size) {
        let start = (total - opts.outro_duration_seconds).max(0.0);
        elements.push(Element {
            kind: ElementKind::Text(block),
            start_seconds: start,
            duration_seconds: total - start,
        });
    }

    let ticker_top = opts.ticker_top();
    elements.push(Element {
        kind: ElementKind::Band {
            top: ticker_top,
            height: opts.ticker_height,
            color: opts.ticker_color,
        },
        start_seconds: 0.0,
        duration_seconds: total,
    });

    let ticker_text = if articles.is_empty() {
        "No headlines".to_string()
    } else {
        articles
            .iter()
            .map(|article| article.title.as_str())
            .collect::<Vec<_>>()
            .join(&opts.ticker_separator)
    };
    elements.push(Element {
        kind: ElementKind::Ticker(TickerText {
            estimated_width: text::text_width(&ticker_text, opts.ticker_font_size),
            text: ticker_text,
            font_size: opts.ticker_font_size,
            band_top: ticker_top,
            band_height: opts.ticker_height,
            color: opts.text_color,
        }),
        start_seconds: 0.0,
        duration_seconds: total,
    });

    for segment in segments {
        let Some(article) = articles.get(segment.article_index) else {
            warn!(
                article_index = segment.article_index,
                "segment points past the article list; skipping"
            );
            continue;
        };
        let image = images
            .get(segment.article_index)
            .and_then(|image| image.as_ref());
        push_segment_elements(opts, &mut elements, segment, article, image);
    }

    Composition {
        width: opts.canvas_width,
        height: opts.canvas_height,
        total_duration_seconds: total,
        audio_path: audio.path.clone(),
        elements,
    }
}

/// A title wrapped and centered on both axes. `None` when there is no text.
fn centered_title(opts: &RenderOpts, title: &str, font_size: u32) -> Option<TextBlock> {
    let wrap_width = opts.canvas_width.saturating_sub(opts.headline_side_margin);
    let lines = text::wrap(title, wrap_width, font_size);
    if lines.is_empty() {
        return None;
    }
    let height = text::block_height(lines.len(), font_size);
    let top = opts.canvas_height.saturating_sub(height) / 2;
    Some(TextBlock {
        line_height: text::line_height(font_size),
        lines,
        font_size,
        x: HorizontalPos::Center,
        top,
        color: opts.text_color,
    })
}

/// Vertical plan for one segment's image and summary.
#[derive(Debug, Clone, Copy)]
enum ContentPlan {
    /// Image above the summary, both inside the safe area.
    Stacked {
        image_size: (u32, u32),
        summary_top: u32,
    },
    /// No image; the summary is centered in the remaining region and
    /// truncated if it still does not fit.
    Centered { region_top: u32, region_height: u32 },
}

fn push_segment_elements(
    opts: &RenderOpts,
    elements: &mut Vec<Element>,
    segment: &Segment,
    article: &Article,
    image: Option<&ResolvedImage>,
) {
    let start = segment.start_seconds;
    let duration = segment.duration_seconds;

    let headline_width = opts.canvas_width.saturating_sub(opts.headline_side_margin);
    let headline_lines = text::wrap(&article.title, headline_width, opts.headline_font_size);
    let headline_bottom =
        opts.headline_top + text::block_height(headline_lines.len(), opts.headline_font_size);

    // The image slot sits at its reference offset unless a tall headline
    // pushes it down.
    let content_top = opts.image_top.max(headline_bottom);
    let safe_bottom = opts.safe_bottom();

    let summary_width = opts.canvas_width.saturating_sub(opts.summary_side_margin);
    let summary_lines = text::wrap(&article.summary, summary_width, opts.summary_font_size);
    let summary_height = text::block_height(summary_lines.len(), opts.summary_font_size);

    let plan = plan_content(opts, content_top, safe_bottom, image, summary_height);

    // Image goes in first so text draws on top if metrics underestimate.
    if let ContentPlan::Stacked {
        image_size: (width, height),
        ..
    } = plan
    {
        if let Some(resolved) = image {
            elements.push(Element {
                kind: ElementKind::Image(ImagePlacement {
                    path: resolved.path.clone(),
                    width,
                    height,
                    top: content_top,
                }),
                start_seconds: start,
                duration_seconds: duration,
            });
        }
    }

    if !headline_lines.is_empty() {
        elements.push(Element {
            kind: ElementKind::Text(TextBlock {
                lines: headline_lines,
                font_size: opts.headline_font_size,
                line_height: text::line_height(opts.headline_font_size),
                x: HorizontalPos::Center,
                top: opts.headline_top,
                color: opts.text_color,
            }),
            start_seconds: start,
            duration_seconds: duration,
        });
    }

    let summary_placement = match plan {
        ContentPlan::Stacked { summary_top, .. } => {
            // Fits whole by construction; the image absorbed the overflow.
            (summary_lines, summary_top)
        }
        ContentPlan::Centered {
            region_top,
            region_height,
        } => {
            let (kept, truncated) =
                text::fit_lines(summary_lines, region_height, opts.summary_font_size);
            if truncated {
                warn!(title = %article.title, "summary does not fit above the ticker; truncating");
            }
            let block = text::block_height(kept.len(), opts.summary_font_size);
            let top = region_top + region_height.saturating_sub(block) / 2;
            (kept, top)
        }
    };

    let (lines, top) = summary_placement;
    if lines.is_empty() {
        if !article.summary.trim().is_empty() {
            warn!(title = %article.title, "no room for the summary; skipping it");
        }
        return;
    }
    elements.push(Element {
        kind: ElementKind::Text(TextBlock {
            lines,
            font_size: opts.summary_font_size,
            line_height: text::line_height(opts.summary_font_size),
            x: HorizontalPos::Center,
            top,
            color: opts.text_color,
        }),
        start_seconds: start,
        duration_seconds: duration,
    });
}

/// Decide where the image and summary go for one segment.
///
/// The summary's height is non-negotiable. The image takes whatever vertical
/// space is left between the content top and the summary, shrinking with its
/// aspect ratio intact, and is dropped entirely when no room remains.
fn plan_content(
    opts: &RenderOpts,
    content_top: u32,
    safe_bottom: u32,
    image: Option<&ResolvedImage>,
    summary_height: u32,
) -> ContentPlan {
    let region_top = content_top;
    let region_height = safe_bottom.saturating_sub(region_top);

    let Some(resolved) = image else {
        return ContentPlan::Centered {
            region_top,
            region_height,
        };
    };

    let (width, height) = fit_box(
        resolved.width,
        resolved.height,
        opts.image_max_width,
        opts.image_max_height,
    );
    if width == 0 || height == 0 {
        return ContentPlan::Centered {
            region_top,
            region_height,
        };
    }

    // Signed arithmetic; the canvas is far too small for i64 to overflow.
    let safe = i64::from(safe_bottom);
    let top = i64::from(region_top);
    let needed = i64::from(summary_height);
    let gap = i64::from(opts.content_gap);

    let desired_top = i64::from(opts.summary_top).max(top + i64::from(height) + gap);
    if desired_top + needed <= safe {
        return ContentPlan::Stacked {
            image_size: (width, height),
            summary_top: desired_top as u32,
        };
    }

    // Overflow: pull the summary up to the boundary and give the image only
    // what is left above it.
    let summary_top = safe - needed;
    let available = summary_top - gap - top;
    if available <= 0 {
        debug!("image shrank to nothing; dropping it for this segment");
        return ContentPlan::Centered {
            region_top,
            region_height,
        };
    }

    let new_height = (available as u32).min(height);
    let new_width = ((u64::from(width) * u64::from(new_height)) / u64::from(height)).max(1) as u32;
    ContentPlan::Stacked {
        image_size: (new_width, new_height),
        summary_top: summary_top as u32,
    }
}

/// Scale `(width, height)` down to fit inside `(max_width, max_height)`,
/// preserving aspect ratio. Images already inside the box are untouched.
fn fit_box(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let scale = (f64::from(max_width) / f64::from(width))
        .min(f64::from(max_height) / f64::from(height));
    let scaled_width = ((f64::from(width) * scale) as u32).max(1);
    let scaled_height = ((f64::from(height) * scale) as u32).max(1);
    (scaled_width, scaled_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> RenderOpts {
        RenderOpts::default()
    }

    fn audio() -> NarrationAudio {
        NarrationAudio::new("narration.wav", 30.0)
    }

    fn article(title: &str, summary: &str) -> Article {
        Article::new(title, summary, "https://example.com/story")
    }

    fn segment(start: f64, duration: f64) -> Segment {
        Segment {
            article_index: 0,
            start_seconds: start,
            duration_seconds: duration,
        }
    }

    fn resolved(width: u32, height: u32) -> ResolvedImage {
        ResolvedImage {
            path: PathBuf::from("/tmp/article.png"),
            width,
            height,
        }
    }

    fn texts(composition: &Composition) -> Vec<&TextBlock> {
        composition
            .elements
            .iter()
            .filter_map(|element| match &element.kind {
                ElementKind::Text(block) => Some(block),
                _ => None,
            })
            .collect()
    }

    fn images(composition: &Composition) -> Vec<&ImagePlacement> {
        composition
            .elements
            .iter()
            .filter_map(|element| match &element.kind {
                ElementKind::Image(placement) => Some(placement),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn fixed_elements_cover_the_whole_video() {
        let composition = compose(&opts(), &[], &[], &[], &audio());

        assert!(matches!(
            composition.elements[0].kind,
            ElementKind::Background { .. }
        ));

        let band = composition
            .elements
            .iter()
            .find(|element| matches!(element.kind, ElementKind::Band { .. }))
            .unwrap();
        assert_eq!(band.start_seconds, 0.0);
        assert_eq!(band.duration_seconds, 30.0);
        if let ElementKind::Band { top, height, .. } = band.kind {
            assert_eq!(top, 580);
            assert_eq!(height, 60);
        }
    }

    #[test]
    fn intro_and_outro_are_centered_and_timed() {
        let options = opts();
        let composition = compose(&options, &[], &[], &[], &audio());
        let blocks = texts(&composition);

        let intro = blocks
            .iter()
            .find(|block| block.lines == vec![options.intro_title.clone()])
            .unwrap();
        let expected_top =
            (options.canvas_height - text::block_height(1, options.intro_font_size)) / 2;
        assert_eq!(intro.top, expected_top);
        assert_eq!(intro.x, HorizontalPos::Center);

        let outro_element = composition
            .elements
            .iter()
            .find(|element| match &element.kind {
                ElementKind::Text(block) => block.lines == vec![options.outro_title.clone()],
                _ => false,
            })
            .unwrap();
        assert_eq!(outro_element.start_seconds, 27.0);
        assert_eq!(outro_element.duration_seconds, 3.0);
    }

    #[test]
    fn logo_sits_in_the_corner_for_the_full_duration() {
        let composition = compose(&opts(), &[], &[], &[], &audio());
        let logo = composition
            .elements
            .iter()
            .find(|element| match &element.kind {
                ElementKind::Text(block) => block.x == HorizontalPos::Left(LOGO_INSET_PX),
                _ => false,
            })
            .unwrap();
        assert_eq!(logo.start_seconds, 0.0);
        assert_eq!(logo.duration_seconds, 30.0);
    }

    #[test]
    fn ticker_joins_titles_and_falls_back_without_articles() {
        let articles = vec![article("First story", "a"), article("Second story", "b")];
        let composition = compose(&opts(), &articles, &[], &[], &audio());
        let ticker = composition
            .elements
            .iter()
            .find_map(|element| match &element.kind {
                ElementKind::Ticker(ticker) => Some(ticker),
                _ => None,
            })
            .unwrap();
        assert_eq!(ticker.text, "First story \u{2022} Second story");
        assert!(ticker.estimated_width > 0);

        let empty = compose(&opts(), &[], &[], &[], &audio());
        let fallback = empty
            .elements
            .iter()
            .find_map(|element| match &element.kind {
                ElementKind::Ticker(ticker) => Some(ticker),
                _ => None,
            })
            .unwrap();
        assert_eq!(fallback.text, "No headlines");
    }

    #[test]
    fn ticker_crosses_the_full_canvas() {
        assert_eq!(ticker_x_at(0.0, 30.0, 1280, 500), 1280.0);
        assert_eq!(ticker_x_at(30.0, 30.0, 1280, 500), -500.0);
        assert!(ticker_x_at(10.0, 30.0, 1280, 500) > ticker_x_at(20.0, 30.0, 1280, 500));
        // Degenerate duration parks the text off screen.
        assert_eq!(ticker_x_at(0.0, 0.0, 1280, 500), 1280.0);
    }

    #[test]
    fn summary_without_image_is_centered_in_the_content_region() {
        let options = opts();
        let articles = vec![article("Short headline", "A one line summary.")];
        let segments = vec![segment(5.0, 10.0)];
        let composition = compose(&options, &articles, &segments, &[None], &audio());

        let summary = texts(&composition)
            .into_iter()
            .find(|block| block.font_size == options.summary_font_size)
            .unwrap()
            .clone();

        // One-line headline bottom lands exactly on the reference image slot.
        let region_top = options.image_top;
        let region_height = options.safe_bottom() - region_top;
        let block = text::block_height(1, options.summary_font_size);
        assert_eq!(summary.top, region_top + (region_height - block) / 2);
        assert!(summary.top + block <= options.safe_bottom());
        assert!(images(&composition).is_empty());
    }

    #[test]
    fn long_summary_shrinks_the_image_but_not_itself() {
        let options = opts();
        let summary = "significant detail about the story ".repeat(12);
        let articles = vec![article("Short headline", summary.trim())];
        let segments = vec![segment(2.0, 6.0)];
        let images_in = vec![Some(resolved(600, 338))];
        let composition = compose(&options, &articles, &segments, &images_in, &audio());

        let placement = images(&composition)[0].clone();
        assert!(placement.height < 338);
        assert_eq!(placement.top, options.image_top);
        // Aspect ratio preserved under integer truncation.
        let expected_width = (600 * u64::from(placement.height) / 338) as u32;
        assert_eq!(placement.width, expected_width);

        let summary_block = texts(&composition)
            .into_iter()
            .find(|block| block.font_size == options.summary_font_size)
            .unwrap()
            .clone();
        let block_height =
            text::block_height(summary_block.lines.len(), options.summary_font_size);
        // Pulled up exactly to the safe boundary, nothing truncated.
        assert_eq!(summary_block.top + block_height, options.safe_bottom());
        assert_eq!(
            placement.top + placement.height + options.content_gap,
            summary_block.top
        );
    }

    #[test]
    fn image_is_dropped_when_the_summary_fills_the_region() {
        let options = opts();
        let summary = "an unusually verbose report sentence ".repeat(40);
        let articles = vec![article("Short headline", summary.trim())];
        let segments = vec![segment(2.0, 6.0)];
        let images_in = vec![Some(resolved(600, 338))];
        let composition = compose(&options, &articles, &segments, &images_in, &audio());

        assert!(images(&composition).is_empty());

        let summary_block = texts(&composition)
            .into_iter()
            .find(|block| block.font_size == options.summary_font_size)
            .unwrap()
            .clone();
        let block_height =
            text::block_height(summary_block.lines.len(), options.summary_font_size);
        assert!(summary_block.top + block_height <= options.safe_bottom());
    }

    #[test]
    fn small_image_keeps_its_size_and_reference_offsets() {
        let options = opts();
        let articles = vec![article("Short headline", "Tiny summary.")];
        let segments = vec![segment(2.0, 6.0)];
        let images_in = vec![Some(resolved(320, 180))];
        let composition = compose(&options, &articles, &segments, &images_in, &audio());

        let placement = images(&composition)[0].clone();
        assert_eq!((placement.width, placement.height), (320, 180));
        assert_eq!(placement.top, options.image_top);

        let summary_block = texts(&composition)
            .into_iter()
            .find(|block| block.font_size == options.summary_font_size)
            .unwrap()
            .clone();
        assert_eq!(summary_block.top, options.summary_top);
    }

    #[test]
    fn oversized_image_is_fit_into_the_reference_box() {
        assert_eq!(fit_box(1200, 676, 600, 338), (600, 338));
        assert_eq!(fit_box(4000, 1000, 600, 338), (600, 150));
        assert_eq!(fit_box(100, 2000, 600, 338), (16, 338));
        assert_eq!(fit_box(320, 180, 600, 338), (320, 180));
    }

    #[test]
    fn segment_past_the_article_list_is_skipped() {
        let articles = vec![article("Only story", "Summary.")];
        let segments = vec![
            segment(2.0, 6.0),
            Segment {
                article_index: 7,
                start_seconds: 8.0,
                duration_seconds: 4.0,
            },
        ];
        let composition = compose(&opts(), &articles, &segments, &[None], &audio());

        let headline_count = texts(&composition)
            .iter()
            .filter(|block| block.font_size == opts().headline_font_size)
            .count();
        assert_eq!(headline_count, 1);
    }

    #[test]
    fn segment_elements_share_the_segment_window() {
        let articles = vec![article("Windowed story", "Summary text.")];
        let segments = vec![segment(4.5, 7.25)];
        let composition = compose(&opts(), &articles, &segments, &[None], &audio());

        for element in composition
            .elements
            .iter()
            .filter(|element| element.start_seconds == 4.5)
        {
            assert_eq!(element.duration_seconds, 7.25);
        }
        assert!(
            composition
                .elements
                .iter()
                .any(|element| element.start_seconds == 4.5)
        );
    }

    #[test]
    fn hex_colors_render_for_ffmpeg() {
        assert_eq!(Rgb::new(0, 20, 40).to_hex(), "0x001428");
        assert_eq!(Rgb::new(200, 50, 50).to_hex(), "0xC83232");
        assert_eq!(Rgb::new(255, 255, 255).to_hex(), "0xFFFFFF");
    }
}
