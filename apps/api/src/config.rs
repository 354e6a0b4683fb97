use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::evaluation::pipeline::InputLimits;
use crate::llm_client::DEFAULT_API_BASE;
use crate::visualization::colormap::parse_hex_color;
use crate::visualization::{SeedPolicy, WordCloudConfig};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_MAX_RESUME_CHARS: usize = 50_000;
const DEFAULT_MAX_JOB_DESCRIPTION_CHARS: usize = 20_000;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub gemini_api_base: String,
    pub port: u16,
    pub rust_log: String,
    pub evaluation_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub max_resume_chars: usize,
    pub max_job_description_chars: usize,
    pub wordcloud_seed: Option<u64>,
    pub wordcloud_prefer_horizontal: f64,
    pub wordcloud_background: Option<[u8; 3]>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let wordcloud_prefer_horizontal = parse_env("WORDCLOUD_PREFER_HORIZONTAL", 0.7)?;
        if !(0.0..=1.0).contains(&wordcloud_prefer_horizontal) {
            anyhow::bail!("WORDCLOUD_PREFER_HORIZONTAL must be between 0 and 1");
        }

        let wordcloud_background = match std::env::var("WORDCLOUD_BACKGROUND") {
            Ok(hex) if !hex.trim().is_empty() => Some(parse_hex_color(&hex).with_context(|| {
                format!("WORDCLOUD_BACKGROUND must be a #rrggbb color, got '{hex}'")
            })?),
            _ => None,
        };

        Ok(Config {
            google_api_key: require_env("GOOGLE_API_KEY")?,
            gemini_api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            evaluation_timeout_secs: parse_env("EVALUATION_TIMEOUT_SECS", 60)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            max_resume_chars: parse_env("MAX_RESUME_CHARS", DEFAULT_MAX_RESUME_CHARS)?,
            max_job_description_chars: parse_env(
                "MAX_JOB_DESCRIPTION_CHARS",
                DEFAULT_MAX_JOB_DESCRIPTION_CHARS,
            )?,
            wordcloud_seed: optional_env("WORDCLOUD_SEED")?,
            wordcloud_prefer_horizontal,
            wordcloud_background,
        })
    }

    pub fn evaluation_timeout(&self) -> Duration {
        Duration::from_secs(self.evaluation_timeout_secs)
    }

    pub fn limits(&self) -> InputLimits {
        InputLimits {
            max_resume_chars: self.max_resume_chars,
            max_job_description_chars: self.max_job_description_chars,
        }
    }

    pub fn word_cloud_config(&self) -> WordCloudConfig {
        let defaults = WordCloudConfig::default();
        WordCloudConfig {
            background: self.wordcloud_background.unwrap_or(defaults.background),
            prefer_horizontal: self.wordcloud_prefer_horizontal,
            seed: self
                .wordcloud_seed
                .map(SeedPolicy::Fixed)
                .unwrap_or(SeedPolicy::Derived),
            ..defaults
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(optional_env(key)?.unwrap_or(default))
}

fn optional_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            google_api_key: "key".into(),
            gemini_api_base: DEFAULT_API_BASE.into(),
            port: 8080,
            rust_log: "info".into(),
            evaluation_timeout_secs: 60,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_resume_chars: DEFAULT_MAX_RESUME_CHARS,
            max_job_description_chars: DEFAULT_MAX_JOB_DESCRIPTION_CHARS,
            wordcloud_seed: None,
            wordcloud_prefer_horizontal: 0.7,
            wordcloud_background: None,
        }
    }

    #[test]
    fn test_word_cloud_seed_policy() {
        let mut config = sample();
        assert_eq!(config.word_cloud_config().seed, SeedPolicy::Derived);

        config.wordcloud_seed = Some(7);
        assert_eq!(config.word_cloud_config().seed, SeedPolicy::Fixed(7));
    }

    #[test]
    fn test_word_cloud_background_override() {
        let mut config = sample();
        assert_eq!(config.word_cloud_config().background, [0x26, 0x27, 0x30]);

        config.wordcloud_background = Some([0x0e, 0x11, 0x17]);
        assert_eq!(config.word_cloud_config().background, [0x0e, 0x11, 0x17]);
    }

    #[test]
    fn test_limits_follow_config() {
        let limits = sample().limits();
        assert_eq!(limits.max_resume_chars, 50_000);
        assert_eq!(limits.max_job_description_chars, 20_000);
    }

    #[test]
    fn test_optional_env_parses_and_rejects() {
        // Unique names so parallel tests never race on the same variable.
        std::env::set_var("ATS_TEST_TIMEOUT_OK", " 30 ");
        std::env::set_var("ATS_TEST_TIMEOUT_BAD", "soon");

        assert_eq!(optional_env::<u64>("ATS_TEST_TIMEOUT_OK").unwrap(), Some(30));
        assert_eq!(optional_env::<u64>("ATS_TEST_UNSET_VARIABLE").unwrap(), None);
        assert_eq!(parse_env::<u64>("ATS_TEST_UNSET_VARIABLE", 60).unwrap(), 60);

        let err = optional_env::<u64>("ATS_TEST_TIMEOUT_BAD").unwrap_err();
        assert!(err.to_string().contains("ATS_TEST_TIMEOUT_BAD"));
    }
}
