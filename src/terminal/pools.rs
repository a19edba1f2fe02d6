use crate::error::{QuizError, Result};
use rand::Rng;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::fs;
use std::path::Path;

pub const DEFAULT_TEMPLATE_FILE: &str = "quiz_template.json";

/// Topic name to its ordered list of questions.
pub type QuestionPool = BTreeMap<String, Vec<String>>;
/// Topic name to the number of questions wanted from it.
pub type PoolSettings = BTreeMap<String, usize>;

pub fn sample_pools() -> QuestionPool {
    let pools: [(&str, [&str; 3]); 3] = [
        (
            "Topic 1: NLP",
            ["What does NLP stand for?", "What is tokenization?", "Name one NLP application."],
        ),
        (
            "Topic 2: Machine Learning",
            ["What is supervised learning?", "Define overfitting.", "What is a dataset?"],
        ),
        (
            "Topic 3: Deep Learning",
            ["What is a neural network?", "Define activation function.", "What is backpropagation?"],
        ),
    ];

    pools
        .iter()
        .map(|(topic, questions)| {
            (
                topic.to_string(),
                questions.iter().map(|q| q.to_string()).collect(),
            )
        })
        .collect()
}

/// Samples, without replacement, the requested number of questions from
/// every topic in `pools`. Topics missing from `settings` contribute none.
pub fn generate_quiz_from_pools<R: Rng + ?Sized>(
    pools: &QuestionPool,
    settings: &PoolSettings,
    rng: &mut R,
) -> Result<Vec<String>> {
    let mut quiz = Vec::new();

    for (topic, questions) in pools {
        let requested = settings.get(topic).copied().unwrap_or(0);
        if requested == 0 {
            continue;
        }
        if requested > questions.len() {
            return Err(QuizError::SampleTooLarge {
                topic: topic.clone(),
                requested,
                available: questions.len(),
            });
        }

        let picked = rand::seq::index::sample(rng, questions.len(), requested);
        quiz.extend(picked.into_iter().map(|i| questions[i].clone()));
    }

    Ok(quiz)
}

/// Writes the settings as JSON with four-space indentation and returns a
/// confirmation line.
pub fn save_template(settings: &PoolSettings, path: &Path) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    settings.serialize(&mut serializer)?;
    fs::write(path, buf)?;
    Ok(format!("Template saved as {}", path.display()))
}

pub fn load_template(path: &Path) -> Result<PoolSettings> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn format_quiz(questions: &[String]) -> String {
    let mut out = String::from("Generating quiz...\n\n");
    for (i, question) in questions.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, question);
    }
    out
}
