use crate::error::{QuizError, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(QuizError::InvalidDifficulty(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyQuestion {
    pub question: String,
    pub answer: String,
    pub difficulty: Difficulty,
}

const BANK: &[(&str, &str, Difficulty)] = &[
    ("What does NLP stand for?", "Natural Language Processing", Difficulty::Easy),
    ("What is a token?", "A single unit of text, such as a word", Difficulty::Easy),
    ("What is a stopword?", "A very common word usually filtered out, like \"the\"", Difficulty::Easy),
    ("What is a corpus?", "A large collection of texts", Difficulty::Easy),
    ("What is stemming?", "Reducing words to their root form", Difficulty::Medium),
    ("What does TF-IDF measure?", "How important a word is to a document in a collection", Difficulty::Medium),
    ("What is named entity recognition?", "Finding names of people, places and organisations in text", Difficulty::Medium),
    ("What is lemmatization?", "Mapping a word to its dictionary form", Difficulty::Medium),
    ("What does LDA discover in a corpus?", "Latent topics as distributions over words", Difficulty::Hard),
    ("Why does attention help sequence models?", "It lets each position weigh every other position directly", Difficulty::Hard),
    ("What is the vanishing gradient problem?", "Gradients shrink through many layers and stall learning", Difficulty::Hard),
    ("What does a word embedding encode?", "Semantic similarity as distance in a vector space", Difficulty::Hard),
];

pub fn question_bank() -> Vec<DifficultyQuestion> {
    BANK.iter()
        .map(|(question, answer, difficulty)| DifficultyQuestion {
            question: question.to_string(),
            answer: answer.to_string(),
            difficulty: *difficulty,
        })
        .collect()
}

/// At most `num_questions` random questions of the named level.
pub fn generate_quiz<R: Rng + ?Sized>(
    level: &str,
    num_questions: usize,
    rng: &mut R,
) -> Result<Vec<DifficultyQuestion>> {
    let difficulty: Difficulty = level.parse()?;
    let matching: Vec<DifficultyQuestion> = question_bank()
        .into_iter()
        .filter(|q| q.difficulty == difficulty)
        .collect();

    Ok(matching
        .choose_multiple(rng, num_questions)
        .cloned()
        .collect())
}
