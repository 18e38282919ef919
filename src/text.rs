//! Deterministic text metrics used for layout decisions.
//!
//! The composer never rasterizes fonts. It estimates glyph widths from the font
//! size alone so that wrapping and collision math produce identical results for
//! identical inputs, on every machine. Encoders are free to render with real
//! fonts; the estimates only decide *where* blocks go, not how pixels look.

/// Estimated horizontal advance of one character, in pixels.
///
/// A fixed 0.55 x font-size advance approximates the reference renderer's
/// proportional captions closely enough for wrapping decisions.
pub fn char_advance(font_size: u32) -> u32 {
    (font_size * 11 / 20).max(1)
}

/// Estimated rendered width of a single-line string, in pixels.
pub fn text_width(text: &str, font_size: u32) -> u32 {
    let chars = text.chars().count() as u32;
    chars * char_advance(font_size)
}

/// Line height including leading (1.2 x font size).
pub fn line_height(font_size: u32) -> u32 {
    (font_size * 12 / 10).max(1)
}

/// Total height of a block of `lines` lines.
pub fn block_height(lines: usize, font_size: u32) -> u32 {
    lines as u32 * line_height(font_size)
}

/// Greedy word wrap to a maximum pixel width.
///
/// Words are never split; a single word wider than `max_width` gets its own
/// line and overflows horizontally rather than being broken mid-word.
/// Whitespace runs collapse to single spaces. Empty input yields no lines.
pub fn wrap(text: &str, max_width: u32, font_size: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate_width = text_width(&current, font_size)
            + char_advance(font_size)
            + text_width(word, font_size);
        if candidate_width <= max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Keep only as many leading lines as fit within `max_height`.
///
/// Returns the surviving lines and whether anything was dropped.
pub fn fit_lines(lines: Vec<String>, max_height: u32, font_size: u32) -> (Vec<String>, bool) {
    let per_line = line_height(font_size);
    let max_lines = (max_height / per_line) as usize;
    if lines.len() <= max_lines {
        return (lines, false);
    }

    let mut kept = lines;
    kept.truncate(max_lines);
    (kept, true)
}
