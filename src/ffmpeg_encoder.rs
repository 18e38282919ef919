//! Encoding through the system `ffmpeg` binary.
//!
//! The composition maps onto one ffmpeg invocation: a lavfi color source for
//! the background, the narration as the audio input, one looped input per
//! distinct image, and a filtergraph that draws the remaining elements in
//! composition order (which is z-order). Time windows become `enable`
//! expressions, and the ticker's motion becomes a drawtext `x` expression
//! equivalent to [`crate::layout::ticker_x_at`].
//!
//! Argument construction is pure and unit-tested; only `run` touches the
//! process table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::layout::{Composition, Element, ElementKind, HorizontalPos, Rgb, TextBlock};
use crate::video_encoder::VideoEncoder;

/// Encodes compositions by spawning `ffmpeg`.
///
/// Defaults mirror the reference renderer: H.264 at 3000k with AAC audio,
/// 24 fps, `medium` preset, one thread per logical CPU.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    /// Binary to invoke. Override for sandboxed or vendored installs.
    pub ffmpeg_path: PathBuf,
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub video_bitrate: String,
    pub threads: usize,
    /// Font file for every drawtext filter. `None` lets fontconfig pick.
    pub font_file: Option<PathBuf>,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            fps: 24,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "medium".to_string(),
            video_bitrate: "3000k".to_string(),
            threads: num_cpus::get(),
            font_file: None,
        }
    }

    /// Build the complete argument vector for one composition.
    pub fn build_args(&self, composition: &Composition, output_path: &Path) -> Result<Vec<String>> {
        let mut args = vec!["-y".to_string()];

        let background = composition
            .elements
            .iter()
            .find_map(|element| match &element.kind {
                ElementKind::Background { color } => Some(*color),
                _ => None,
            })
            .unwrap_or(Rgb::new(0, 0, 0));

        // Input 0: the flat background.
        args.push("-f".into());
        args.push("lavfi".into());
        args.push("-i".into());
        args.push(format!(
            "color=c={}:s={}x{}:r={}:d={}",
            background.to_hex(),
            composition.width,
            composition.height,
            self.fps,
            format_seconds(composition.total_duration_seconds),
        ));

        // Input 1: the narration.
        args.push("-i".into());
        args.push(composition.audio_path.to_string_lossy().into_owned());

        // Inputs 2..: one per distinct image, in first-use order.
        let (image_paths, image_indices) = collect_image_inputs(composition);
        for path in &image_paths {
            args.push("-loop".into());
            args.push("1".into());
            args.push("-i".into());
            args.push(path.to_string_lossy().into_owned());
        }

        args.push("-filter_complex".into());
        args.push(self.build_filter_complex(composition, &image_indices)?);

        args.push("-map".into());
        args.push("[vout]".into());
        args.push("-map".into());
        args.push("1:a".into());

        args.push("-c:v".into());
        args.push(self.video_codec.clone());
        args.push("-preset".into());
        args.push(self.preset.clone());
        args.push("-b:v".into());
        args.push(self.video_bitrate.clone());
        args.push("-c:a".into());
        args.push(self.audio_codec.clone());
        args.push("-r".into());
        args.push(self.fps.to_string());
        args.push("-threads".into());
        args.push(self.threads.to_string());

        // Looped image inputs are endless; bound the output explicitly.
        args.push("-t".into());
        args.push(format_seconds(composition.total_duration_seconds));

        args.push(output_path.to_string_lossy().into_owned());
        Ok(args)
    }

    fn build_filter_complex(
        &self,
        composition: &Composition,
        image_indices: &HashMap<PathBuf, usize>,
    ) -> Result<String> {
        let mut filters: Vec<String> = Vec::new();
        let mut current = "0:v".to_string();
        let mut next_label = 0usize;
        let mut scaled_count = 0usize;

        for element in &composition.elements {
            match &element.kind {
                // Already the base lavfi input.
                ElementKind::Background { .. } => {}
                ElementKind::Band { top, height, color } => {
                    let label = fresh_label(&mut next_label);
                    filters.push(format!(
                        "[{current}]drawbox=x=0:y={top}:w={width}:h={height}:color={color}@1:t=fill:enable='{enable}'[{label}]",
                        width = composition.width,
                        color = color.to_hex(),
                        enable = enable_window(element),
                    ));
                    current = label;
                }
                ElementKind::Text(block) => {
                    self.push_text_filters(&mut filters, &mut current, &mut next_label, element, block);
                }
                ElementKind::Ticker(ticker) => {
                    let x = if composition.total_duration_seconds > 0.0 {
                        format!(
                            "w-(w+text_w)*t/{}",
                            format_seconds(composition.total_duration_seconds)
                        )
                    } else {
                        "w".to_string()
                    };
                    let label = fresh_label(&mut next_label);
                    filters.push(format!(
                        "[{current}]drawtext=text='{text}':fontsize={size}:fontcolor={color}:x={x}:y={top}+({height}-text_h)/2{font}:enable='{enable}'[{label}]",
                        text = escape_drawtext(&ticker.text),
                        size = ticker.font_size,
                        color = ticker.color.to_hex(),
                        top = ticker.band_top,
                        height = ticker.band_height,
                        font = self.font_arg(),
                        enable = enable_window(element),
                    ));
                    current = label;
                }
                ElementKind::Image(placement) => {
                    let Some(input_index) = image_indices.get(&placement.path) else {
                        bail!(
                            "no ffmpeg input registered for image '{}'",
                            placement.path.display()
                        );
                    };
                    let scaled = format!("img{scaled_count}");
                    scaled_count += 1;
                    filters.push(format!(
                        "[{input_index}:v]scale={}:{}[{scaled}]",
                        placement.width, placement.height,
                    ));
                    let label = fresh_label(&mut next_label);
                    filters.push(format!(
                        "[{current}][{scaled}]overlay=x=(W-w)/2:y={top}:enable='{enable}'[{label}]",
                        top = placement.top,
                        enable = enable_window(element),
                    ));
                    current = label;
                }
            }
        }

        filters.push(format!("[{current}]format=yuv420p[vout]"));
        Ok(filters.join(";"))
    }

    /// One drawtext filter per line; multi-line drawtext cannot center each
    /// line independently.
    fn push_text_filters(
        &self,
        filters: &mut Vec<String>,
        current: &mut String,
        next_label: &mut usize,
        element: &Element,
        block: &TextBlock,
    ) {
        for (row, line) in block.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let y = block.top + row as u32 * block.line_height;
            let x = match block.x {
                HorizontalPos::Center => "(w-text_w)/2".to_string(),
                HorizontalPos::Left(offset) => offset.to_string(),
            };
            let label = fresh_label(next_label);
            filters.push(format!(
                "[{current}]drawtext=text='{text}':fontsize={size}:fontcolor={color}:x={x}:y={y}{font}:enable='{enable}'[{label}]",
                text = escape_drawtext(line),
                size = block.font_size,
                color = block.color.to_hex(),
                font = self.font_arg(),
                enable = enable_window(element),
            ));
            *current = label;
        }
    }

    fn font_arg(&self) -> String {
        match &self.font_file {
            Some(path) => format!(":fontfile='{}'", escape_drawtext(&path.to_string_lossy())),
            None => String::new(),
        }
    }

    fn run(&self, args: &[String]) -> Result<()> {
        debug!(ffmpeg = %self.ffmpeg_path.display(), "spawning encoder");
        let output = Command::new(&self.ffmpeg_path)
            .args(args)
            .output()
            .with_context(|| format!("failed to launch '{}'", self.ffmpeg_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "ffmpeg exited with {}: {}",
                output.status,
                tail(&stderr, 2000).trim()
            );
        }
        Ok(())
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn encode(&self, composition: &Composition, output_path: &Path) -> crate::Result<()> {
        let args = self.build_args(composition, output_path)?;
        self.run(&args)?;
        Ok(())
    }
}

fn fresh_label(next: &mut usize) -> String {
    let label = format!("v{next}");
    *next += 1;
    label
}

fn enable_window(element: &Element) -> String {
    format!(
        "between(t,{},{})",
        format_seconds(element.start_seconds),
        format_seconds(element.start_seconds + element.duration_seconds)
    )
}

fn format_seconds(value: f64) -> String {
    format!("{value:.6}")
}

fn collect_image_inputs(composition: &Composition) -> (Vec<PathBuf>, HashMap<PathBuf, usize>) {
    let mut order = Vec::new();
    let mut indices = HashMap::new();
    for element in &composition.elements {
        if let ElementKind::Image(placement) = &element.kind {
            if !indices.contains_key(&placement.path) {
                // Inputs 0 and 1 are the background and the narration.
                indices.insert(placement.path.clone(), 2 + order.len());
                order.push(placement.path.clone());
            }
        }
    }
    (order, indices)
}

/// Escape text for a single-quoted drawtext argument.
fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "'\\''")
        .replace(':', "\\:")
        .replace('%', "\\%")
}

fn tail(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let start = text.len() - max_bytes;
    match (start..text.len()).find(|&index| text.is_char_boundary(index)) {
        Some(boundary) => &text[boundary..],
        None => "",
    }
}
