use crate::ai::ModelConfig;
use std::path::PathBuf;

pub const DEFAULT_MAX_SOURCE_CHARS: usize = 8000;
pub const DEFAULT_LOG_FILE: &str = "quiz_generator.log";
pub const DEFAULT_SOURCES_DIR: &str = "sources";

/// Runtime settings, read from `QUIZ_*` environment variables.
#[derive(Debug, Clone)]
pub struct QuizConfig {
    pub output_dir: PathBuf,
    pub sources_dir: PathBuf,
    pub log_file: PathBuf,
    pub stopwords_file: Option<PathBuf>,
    pub max_source_chars: usize,
    /// Extra TrueType font for PDF text the bundled fonts cannot draw.
    pub pdf_font: Option<PathBuf>,
    pub model: ModelConfig,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            sources_dir: PathBuf::from(DEFAULT_SOURCES_DIR),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            stopwords_file: None,
            max_source_chars: DEFAULT_MAX_SOURCE_CHARS,
            pdf_font: None,
            model: ModelConfig::default(),
        }
    }
}

impl QuizConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Blank values are
    /// treated as unset, unparsable numbers fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            output_dir: get("QUIZ_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            sources_dir: get("QUIZ_SOURCES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.sources_dir),
            log_file: get("QUIZ_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            stopwords_file: get("QUIZ_STOPWORDS_FILE").map(PathBuf::from),
            max_source_chars: get("QUIZ_MAX_SOURCE_CHARS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_source_chars),
            pdf_font: get("QUIZ_PDF_FONT").map(PathBuf::from),
            model: ModelConfig {
                model: get("QUIZ_MODEL").unwrap_or(defaults.model.model),
                temperature: get("QUIZ_TEMPERATURE")
                    .and_then(|v| v.trim().parse().ok())
                    .or(defaults.model.temperature),
                max_tokens: get("QUIZ_MAX_TOKENS")
                    .and_then(|v| v.trim().parse().ok())
                    .or(defaults.model.max_tokens),
            },
        }
    }

    /// Whether an OpenRouter key is present, which is what the LLM client needs.
    pub fn ai_enabled() -> bool {
        std::env::var("OPENROUTER_API_KEY")
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }
}
