//! `newsreel` — a small, focused news-video composer.
//!
//! This crate provides:
//! - Script segmentation (attributing narration sentences to articles)
//! - Proportional screen-time allocation inside the narration window
//! - Collision-free canvas layout with a scrolling headline ticker
//! - Staged image resolution for article URLs
//! - Pluggable video encoders (ffmpeg, JSON manifest)
//!
//! The library is designed to be used by both CLI tools and long-running services,
//! with an emphasis on determinism, graceful degradation, and minimal surprises.

// High-level API (most consumers should start here).
pub mod newsreel;
pub mod opts;

// Core data model shared across the pipeline.
pub mod article;
pub mod audio;

// The cooperating render stages: script → timeline → layout.
pub mod layout;
pub mod script;
pub mod text;
pub mod timeline;

// Image resolution and its collaborator seams.
pub mod content;
pub mod fetch;
pub mod page;
pub mod resolver;
pub mod retry;

// Encoder interface and implementations.
pub mod ffmpeg_encoder;
pub mod json_manifest_encoder;
pub mod video_encoder;

// Output selection for the CLI.
#[cfg(feature = "cli")]
pub mod output_type;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

mod error;

pub use error::{Error, Result};
