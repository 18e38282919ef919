//! The encoder seam.

use std::path::Path;

use crate::Result;
use crate::layout::Composition;

/// Turns a fully timed [`Composition`] into a file at `output_path`.
///
/// Encoders draw exactly what the composition says, in element order, and do
/// not reflow or retime anything. They also do not pick paths or create
/// parent directories; the caller owns output placement.
pub trait VideoEncoder {
    fn encode(&self, composition: &Composition, output_path: &Path) -> Result<()>;
}
