use clap::ValueEnum;

/// The supported output targets for composed videos.
///
/// Why this exists:
/// - We want a single, strongly-typed representation of output targets
///   across the CLI and library code.
/// - Using an enum avoids stringly-typed conditionals and keeps target
///   selection explicit and discoverable.
///
/// Integration notes:
/// - `ValueEnum` allows this enum to be used directly as a CLI flag with `clap`.
/// - Each variant maps to a concrete `VideoEncoder` implementation.
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputType {
    /// Encode an H.264 video through the system ffmpeg.
    Mp4,

    /// Write the timed element list as a JSON manifest.
    Manifest,
}
