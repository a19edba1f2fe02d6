//! Standalone quiz utilities that work without a `QuizSession`.

pub mod difficulty;
pub mod pools;
pub mod shuffle;
pub mod tags;

pub use difficulty::{Difficulty, DifficultyQuestion, generate_quiz};
pub use pools::{
    PoolSettings, QuestionPool, format_quiz, generate_quiz_from_pools, load_template, sample_pools,
    save_template,
};
pub use shuffle::shuffle_answers;
pub use tags::{TagScore, TaggedQuestion, calculate_tag_scores, filter_by_tag, sample_bank, tag_report};
