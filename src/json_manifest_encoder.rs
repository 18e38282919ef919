//! A [`VideoEncoder`] that writes the composition itself as JSON.
//!
//! No media toolchain required. The manifest carries every element with its
//! geometry and time window, so it is useful for inspection, for downstream
//! renderers, and for asserting on layout in tests. Output is deterministic
//! for identical compositions and can be compared byte for byte.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::layout::Composition;
use crate::video_encoder::VideoEncoder;

#[derive(Debug, Clone)]
pub struct JsonManifestEncoder {
    /// Pretty-print the manifest. On by default.
    pub pretty: bool,
}

impl Default for JsonManifestEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonManifestEncoder {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    fn write(&self, composition: &Composition, output_path: &Path) -> Result<()> {
        let file = File::create(output_path)
            .with_context(|| format!("failed to create manifest '{}'", output_path.display()))?;
        let mut writer = BufWriter::new(file);
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, composition)
        } else {
            serde_json::to_writer(&mut writer, composition)
        }
        .context("failed to serialize the composition")?;
        writer.flush().context("failed to flush the manifest")?;
        Ok(())
    }
}

impl VideoEncoder for JsonManifestEncoder {
    fn encode(&self, composition: &Composition, output_path: &Path) -> crate::Result<()> {
        Ok(self.write(composition, output_path)?)
    }
}
