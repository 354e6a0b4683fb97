//! Keyword visualization: renders the missing-keyword list as a word cloud.
//!
//! `AppState` holds an `Arc<dyn KeywordVisualizer>`; the default backend is
//! `WordCloud`. The pipeline never calls a visualizer with an empty list.

pub mod colormap;
pub mod frequencies;
mod glyphs;
mod occupancy;
pub mod word_cloud;

use serde::Serialize;
use thiserror::Error;

pub use word_cloud::{SeedPolicy, WordCloud, WordCloudConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    /// Rotated 90° counter-clockwise.
    Vertical,
}

/// A word as laid out on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedWord {
    pub text: String,
    /// Frequency normalized to the most frequent word (0.0 – 1.0].
    pub weight: f64,
    /// Integer glyph magnification; a glyph cell is `8 * scale` pixels.
    pub scale: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
    pub color: [u8; 3],
}

/// Rendered keyword image plus the layout that produced it.
#[derive(Debug, Clone)]
pub struct KeywordImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
    pub words: Vec<PlacedWord>,
}

#[derive(Debug, Error)]
pub enum VisualizationError {
    #[error("no keyword could be rendered")]
    NoRenderableWords,

    #[error("image encoding failed: {0}")]
    Encoding(String),
}

pub trait KeywordVisualizer: Send + Sync {
    fn render(&self, keywords: &[String]) -> Result<KeywordImage, VisualizationError>;
}
