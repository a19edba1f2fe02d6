pub mod ai;
pub mod analysis;
pub mod app;
pub mod config;
pub mod error;
pub mod export;
pub mod logger;
pub mod models;
pub mod preprocessing;
pub mod question_types;
pub mod session;
pub mod sources;
pub mod terminal;
pub mod ui;
pub mod utils;

// Re-exports for convenience
pub use ai::{CompletionBackend, DEFAULT_MODEL, ModelConfig, OpenRouterClient};
pub use analysis::{StatisticalAnalyzer, TextAnalyzer};
pub use app::{App, AppState, handle_menu_input, handle_quiz_input};
pub use config::QuizConfig;
pub use error::{QuizError, Result};
pub use export::ExportFormat;
pub use models::{DownloadOutcome, QuestionRecord, QuestionType, QuizState, SessionOutcome, SourceKind};
pub use preprocessing::{Preprocessor, StopWords};
pub use session::QuizSession;
pub use ui::{draw_menu, draw_quiz};
