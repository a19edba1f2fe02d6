pub mod client;
pub mod explain;
pub mod generator;

// Public API exports
pub use client::{BackendError, CompletionBackend, DEFAULT_MODEL, ModelConfig, OpenRouterClient};
pub use explain::{extract_first_question, format_mcq_quiz, generate_explanation};
pub use generator::{clean_json_response, generate_from_llm, parse_questions};
