//! Word cloud renderer for missing keywords.
//!
//! Algorithm:
//! 1. Rank words by frequency (`frequencies::word_frequencies`), top `max_words`.
//! 2. For each word, pick an orientation (horizontal with probability
//!    `prefer_horizontal`) and a glyph scale derived from the previous word's:
//!    scale × (relative_scaling × f/f_prev + (1 − relative_scaling)).
//! 3. Shrink until the word (plus margin) fits somewhere free; trying the other
//!    orientation once first. Place at a uniformly random free position.
//! 4. Stop once a word would need a scale below `min_scale`.
//!
//! Colors sample viridis uniformly at random. All randomness comes from one
//! seeded RNG, so a given seed always produces the same image.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::colormap::viridis;
use super::frequencies::{word_frequencies, WordFrequency};
use super::glyphs::{rasterize, text_extent, Mask, GLYPH_SIZE};
use super::occupancy::OccupancyGrid;
use super::{KeywordImage, KeywordVisualizer, Orientation, PlacedWord, VisualizationError};

/// How the layout RNG is seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    /// Seed from a hash of the keyword list: same keywords, same image.
    Derived,
    Fixed(u64),
}

#[derive(Debug, Clone)]
pub struct WordCloudConfig {
    pub width: u32,
    pub height: u32,
    pub background: [u8; 3],
    pub max_words: usize,
    pub prefer_horizontal: f64,
    pub relative_scaling: f64,
    /// Padding in pixels kept free around each word.
    pub margin: u32,
    pub min_scale: u32,
    pub seed: SeedPolicy,
}

impl Default for WordCloudConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            background: [0x26, 0x27, 0x30],
            max_words: 50,
            prefer_horizontal: 0.7,
            relative_scaling: 0.5,
            margin: 2,
            min_scale: 1,
            seed: SeedPolicy::Derived,
        }
    }
}

struct Placement {
    word: PlacedWord,
    mask: Mask,
}

pub struct WordCloud {
    config: WordCloudConfig,
}

impl WordCloud {
    pub fn new(config: WordCloudConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WordCloudConfig {
        &self.config
    }

    fn seed_for(&self, keywords: &[String]) -> u64 {
        match self.config.seed {
            SeedPolicy::Fixed(seed) => seed,
            SeedPolicy::Derived => {
                let mut hasher = DefaultHasher::new();
                keywords.hash(&mut hasher);
                hasher.finish()
            }
        }
    }

    fn layout(&self, frequencies: &[WordFrequency], rng: &mut StdRng) -> Vec<Placement> {
        let cfg = &self.config;
        let mut grid = OccupancyGrid::new(cfg.width, cfg.height);
        let mut placements = Vec::with_capacity(frequencies.len());

        let min_scale = cfg.min_scale.max(1);
        let mut scale = (cfg.height / GLYPH_SIZE).max(min_scale);
        let mut last_weight = 1.0;

        for (index, freq) in frequencies.iter().enumerate() {
            if index > 0 && cfg.relative_scaling != 0.0 {
                let factor = cfg.relative_scaling * (freq.weight / last_weight)
                    + (1.0 - cfg.relative_scaling);
                scale = (factor * scale as f64).round() as u32;
            }

            let mut orientation = if rng.gen::<f64>() < cfg.prefer_horizontal {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let mut tried_other_orientation = false;

            let position = loop {
                if scale < min_scale {
                    break None;
                }
                let (w, h) = oriented_extent(&freq.word, scale, orientation);
                if let Some(pos) = grid.find_position(w + cfg.margin, h + cfg.margin, rng) {
                    break Some(pos);
                }
                if !tried_other_orientation && cfg.prefer_horizontal < 1.0 {
                    orientation = flip(orientation);
                    tried_other_orientation = true;
                } else {
                    scale -= 1;
                    orientation = Orientation::Horizontal;
                }
            };

            let Some((x, y)) = position else {
                debug!(
                    placed = placements.len(),
                    "Word cloud canvas full; dropping remaining words"
                );
                break;
            };

            let mask = rasterize(&freq.word, scale, orientation);
            let (x, y) = (x + cfg.margin / 2, y + cfg.margin / 2);
            grid.occupy(x, y, &mask);

            placements.push(Placement {
                word: PlacedWord {
                    text: freq.word.clone(),
                    weight: freq.weight,
                    scale,
                    x,
                    y,
                    width: mask.width,
                    height: mask.height,
                    orientation,
                    color: viridis(rng.gen::<f64>()),
                },
                mask,
            });
            last_weight = freq.weight;
        }

        placements
    }

    fn draw(&self, placements: &[Placement]) -> RgbImage {
        let cfg = &self.config;
        let mut canvas = RgbImage::from_pixel(cfg.width, cfg.height, Rgb(cfg.background));
        for placement in placements {
            let color = Rgb(placement.word.color);
            for (mx, my) in placement.mask.pixels() {
                let (px, py) = (placement.word.x + mx, placement.word.y + my);
                if px < cfg.width && py < cfg.height {
                    canvas.put_pixel(px, py, color);
                }
            }
        }
        canvas
    }
}

impl KeywordVisualizer for WordCloud {
    fn render(&self, keywords: &[String]) -> Result<KeywordImage, VisualizationError> {
        let frequencies = word_frequencies(keywords, self.config.max_words);
        if frequencies.is_empty() {
            return Err(VisualizationError::NoRenderableWords);
        }

        let mut rng = StdRng::seed_from_u64(self.seed_for(keywords));
        let placements = self.layout(&frequencies, &mut rng);
        if placements.is_empty() {
            return Err(VisualizationError::NoRenderableWords);
        }

        let canvas = self.draw(&placements);
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(canvas)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| VisualizationError::Encoding(e.to_string()))?;

        debug!(
            words = placements.len(),
            bytes = png.len(),
            "Rendered keyword cloud"
        );

        Ok(KeywordImage {
            width: self.config.width,
            height: self.config.height,
            png,
            words: placements.into_iter().map(|p| p.word).collect(),
        })
    }
}

fn oriented_extent(text: &str, scale: u32, orientation: Orientation) -> (u32, u32) {
    let (w, h) = text_extent(text, scale);
    match orientation {
        Orientation::Horizontal => (w, h),
        Orientation::Vertical => (h, w),
    }
}

fn flip(orientation: Orientation) -> Orientation {
    match orientation {
        Orientation::Horizontal => Orientation::Vertical,
        Orientation::Vertical => Orientation::Horizontal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    fn small_config() -> WordCloudConfig {
        WordCloudConfig {
            width: 240,
            height: 120,
            seed: SeedPolicy::Fixed(42),
            ..WordCloudConfig::default()
        }
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_default_config_matches_report_style() {
        let cfg = WordCloudConfig::default();
        assert_eq!((cfg.width, cfg.height), (800, 400));
        assert_eq!(cfg.background, [0x26, 0x27, 0x30]);
        assert_eq!(cfg.max_words, 50);
        assert!((cfg.prefer_horizontal - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_render_produces_png_of_configured_size() {
        let cloud = WordCloud::new(small_config());
        let image = cloud.render(&kw(&["Kubernetes", "Go", "Terraform"])).unwrap();

        assert_eq!((image.width, image.height), (240, 120));
        assert!(image.png.starts_with(PNG_SIGNATURE));
        assert!(!image.words.is_empty());
    }

    #[test]
    fn test_words_stay_inside_canvas() {
        let cloud = WordCloud::new(small_config());
        let image = cloud
            .render(&kw(&["Kafka", "Spark", "Airflow", "dbt", "Snowflake", "Python"]))
            .unwrap();

        for word in &image.words {
            assert!(word.x + word.width <= 240, "{word:?} overflows horizontally");
            assert!(word.y + word.height <= 120, "{word:?} overflows vertically");
        }
    }

    #[test]
    fn test_placed_words_do_not_overlap() {
        let cloud = WordCloud::new(small_config());
        let keywords = kw(&["Kafka", "Spark", "Airflow"]);
        let frequencies = word_frequencies(&keywords, 50);
        let mut rng = StdRng::seed_from_u64(42);
        let placements = cloud.layout(&frequencies, &mut rng);

        let mut canvas = vec![false; 240 * 120];
        for placement in &placements {
            for (mx, my) in placement.mask.pixels() {
                let idx = ((placement.word.y + my) * 240 + placement.word.x + mx) as usize;
                assert!(!canvas[idx], "pixel drawn twice by {}", placement.word.text);
                canvas[idx] = true;
            }
        }
    }

    #[test]
    fn test_most_frequent_word_is_largest() {
        let cloud = WordCloud::new(small_config());
        let image = cloud
            .render(&kw(&["AWS", "AWS", "AWS", "Docker", "Helm"]))
            .unwrap();

        assert_eq!(image.words[0].text, "AWS");
        assert!(image.words.iter().all(|w| w.scale <= image.words[0].scale));
    }

    #[test]
    fn test_same_seed_same_image() {
        let cloud = WordCloud::new(small_config());
        let keywords = kw(&["Rust", "Tokio", "gRPC", "PostgreSQL"]);
        let first = cloud.render(&keywords).unwrap();
        let second = cloud.render(&keywords).unwrap();
        assert_eq!(first.png, second.png);
        assert_eq!(first.words, second.words);
    }

    #[test]
    fn test_derived_seed_is_stable_per_keyword_list() {
        let cloud = WordCloud::new(WordCloudConfig {
            seed: SeedPolicy::Derived,
            ..small_config()
        });
        let a = kw(&["Rust", "Go"]);
        assert_eq!(cloud.seed_for(&a), cloud.seed_for(&a.clone()));
        assert_ne!(cloud.seed_for(&a), cloud.seed_for(&kw(&["Go", "Rust"])));
    }

    #[test]
    fn test_fully_horizontal_preference() {
        let cloud = WordCloud::new(WordCloudConfig {
            prefer_horizontal: 1.0,
            ..small_config()
        });
        let image = cloud
            .render(&kw(&["Java", "Spring", "Hibernate", "Maven", "JUnit"]))
            .unwrap();
        assert!(image
            .words
            .iter()
            .all(|w| w.orientation == Orientation::Horizontal));
    }

    #[test]
    fn test_max_words_limits_placements() {
        let cloud = WordCloud::new(WordCloudConfig {
            max_words: 3,
            ..small_config()
        });
        let image = cloud
            .render(&kw(&["aa", "bb", "cc", "dd", "ee", "ff"]))
            .unwrap();
        assert!(image.words.len() <= 3);
    }

    #[test]
    fn test_unrenderable_keywords_are_an_error() {
        let cloud = WordCloud::new(small_config());
        assert!(matches!(
            cloud.render(&kw(&["the", "2024"])),
            Err(VisualizationError::NoRenderableWords)
        ));
    }

    #[test]
    fn test_word_too_long_for_canvas_is_an_error() {
        let cloud = WordCloud::new(WordCloudConfig {
            width: 40,
            height: 20,
            ..small_config()
        });
        // 13 glyphs × 8 px exceeds both canvas dimensions at scale 1.
        assert!(matches!(
            cloud.render(&kw(&["Observability"])),
            Err(VisualizationError::NoRenderableWords)
        ));
    }

    #[test]
    fn test_colors_come_from_viridis() {
        let cloud = WordCloud::new(small_config());
        let image = cloud.render(&kw(&["SQL", "NoSQL"])).unwrap();
        for word in &image.words {
            // Viridis never has a red channel above its final anchor.
            assert!(word.color[0] <= 253);
            assert_ne!(word.color, [0x26, 0x27, 0x30]);
        }
    }

    #[test]
    fn test_default_canvas_renders() {
        let cloud = WordCloud::new(WordCloudConfig::default());
        let image = cloud
            .render(&kw(&["Kubernetes", "Go", "Kubernetes", "CI/CD", "observability"]))
            .unwrap();
        assert_eq!((image.width, image.height), (800, 400));
        assert!(image.png.starts_with(PNG_SIGNATURE));
    }
}
