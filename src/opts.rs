use crate::layout::Rgb;

/// Options that control how a news video is composed.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI is responsible for mapping user input into this type so that:
/// - the library remains reusable outside of a CLI context
/// - other frontends (APIs, tests, batch jobs) can construct options programmatically
///
/// `Default` carries the reference renderer's constants: a 1280x720 canvas, a
/// 2 second intro and 3 second outro, and the SonicPress branding strings.
#[derive(Debug, Clone)]
pub struct RenderOpts {
    /// Canvas width in pixels.
    pub canvas_width: u32,

    /// Canvas height in pixels.
    pub canvas_height: u32,

    /// Solid background color for the full canvas.
    pub background_color: Rgb,

    /// Seconds reserved for the intro title at the start of the narration.
    pub intro_duration_seconds: f64,

    /// Seconds reserved for the outro title at the end of the narration.
    pub outro_duration_seconds: f64,

    /// Minimum on-screen time for one article segment, in seconds.
    ///
    /// The allocator floors proportional durations at this value before
    /// scaling them back into the narration window. The reference renderer
    /// used 1.0; the refined default is 3.0.
    pub min_segment_seconds: f64,

    /// Static text drawn in the top-left corner for the full duration.
    pub logo_text: String,
    pub logo_font_size: u32,

    /// Centered title shown during the intro window.
    pub intro_title: String,
    pub intro_font_size: u32,

    /// Centered title shown during the outro window.
    pub outro_title: String,
    pub outro_font_size: u32,

    /// Boilerplate phrase the narration opens with; stripped before
    /// sentence attribution (case-insensitive prefix match).
    pub intro_phrase: String,

    /// Boilerplate phrase the narration closes with; stripped before
    /// sentence attribution (case-insensitive suffix match).
    pub outro_phrase: String,

    /// Height of the scrolling ticker band.
    pub ticker_height: u32,

    /// Pixels reserved between the ticker band and the bottom canvas edge.
    pub ticker_bottom_margin: u32,

    /// Ticker band color.
    pub ticker_color: Rgb,
    pub ticker_font_size: u32,

    /// Separator placed between headlines in the ticker text.
    pub ticker_separator: String,

    /// Vertical offset of the per-segment headline.
    pub headline_top: u32,
    pub headline_font_size: u32,

    /// Horizontal margin subtracted from the canvas width when wrapping headlines.
    pub headline_side_margin: u32,

    /// Vertical offset of the per-segment image slot.
    pub image_top: u32,

    /// Maximum bounding box a resolved image is scaled into (aspect preserved).
    pub image_max_width: u32,
    pub image_max_height: u32,

    /// Vertical offset of the summary caption when an image is present.
    pub summary_top: u32,
    pub summary_font_size: u32,

    /// Horizontal margin subtracted from the canvas width when wrapping summaries.
    pub summary_side_margin: u32,

    /// Minimum vertical gap between stacked per-segment elements.
    pub content_gap: u32,

    /// Pixels kept clear between per-segment content and the ticker band.
    pub safe_margin: u32,

    /// Color for all rendered text.
    pub text_color: Rgb,

    /// Substitute a solid-color placeholder card when image resolution fails
    /// at every stage. Off by default; a missing image already has a defined
    /// layout (summary centered in the safe area).
    pub use_placeholder_image: bool,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            canvas_width: 1280,
            canvas_height: 720,
            background_color: Rgb::new(0, 20, 40),
            intro_duration_seconds: 2.0,
            outro_duration_seconds: 3.0,
            min_segment_seconds: 3.0,
            logo_text: "SonicPress".to_string(),
            logo_font_size: 36,
            intro_title: "SonicPress News".to_string(),
            intro_font_size: 70,
            outro_title: "Thanks for watching!".to_string(),
            outro_font_size: 50,
            intro_phrase: "Here are your news highlights".to_string(),
            outro_phrase: "That's your update".to_string(),
            ticker_height: 60,
            ticker_bottom_margin: 80,
            ticker_color: Rgb::new(200, 50, 50),
            ticker_font_size: 24,
            ticker_separator: " \u{2022} ".to_string(),
            headline_top: 80,
            headline_font_size: 34,
            headline_side_margin: 100,
            image_top: 120,
            image_max_width: 600,
            image_max_height: 338,
            summary_top: 500,
            summary_font_size: 26,
            summary_side_margin: 150,
            content_gap: 20,
            safe_margin: 20,
            text_color: Rgb::new(255, 255, 255),
            use_placeholder_image: false,
        }
    }
}

impl RenderOpts {
    /// Top edge of the ticker band.
    pub fn ticker_top(&self) -> u32 {
        self.canvas_height
            .saturating_sub(self.ticker_height + self.ticker_bottom_margin)
    }

    /// The safe bottom boundary: per-segment content never extends below this.
    pub fn safe_bottom(&self) -> u32 {
        self.ticker_top().saturating_sub(self.safe_margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_canvas() {
        let opts = RenderOpts::default();
        assert_eq!(opts.canvas_width, 1280);
        assert_eq!(opts.canvas_height, 720);
        assert_eq!(opts.intro_duration_seconds, 2.0);
        assert_eq!(opts.outro_duration_seconds, 3.0);
        assert_eq!(opts.min_segment_seconds, 3.0);
    }

    #[test]
    fn ticker_band_reserves_bottom_margin() {
        let opts = RenderOpts::default();
        // 720 - 60 - 80
        assert_eq!(opts.ticker_top(), 580);
        assert_eq!(opts.safe_bottom(), 560);
    }
}
