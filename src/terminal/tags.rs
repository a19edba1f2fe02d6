use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::fs;
use std::path::Path;

pub const DEFAULT_RESULTS_FILE: &str = "tag_results.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagScore {
    pub tag: String,
    pub correct: usize,
    pub total: usize,
}

impl TagScore {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64 * 100.0
        }
    }
}

fn tagged(question: &str, options: [&str; 4], tags: &[&str]) -> TaggedQuestion {
    TaggedQuestion {
        question: question.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_index: 0,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn sample_bank() -> Vec<TaggedQuestion> {
    vec![
        tagged(
            "What does NLP stand for?",
            [
                "Natural Language Processing",
                "New Logic Principle",
                "Node Link Protocol",
                "Neural Language Path",
            ],
            &["NLP", "Basics"],
        ),
        tagged(
            "What is overfitting in ML?",
            ["Model too fitted to training data", "Lack of data", "Too many layers", "None"],
            &["Machine Learning", "Modeling"],
        ),
        tagged(
            "What is a neural network?",
            [
                "A model inspired by the human brain",
                "A networking cable",
                "A file system",
                "None",
            ],
            &["Deep Learning", "Neural Networks"],
        ),
    ]
}

/// Questions carrying any of `tags`, matched exactly, in bank order.
pub fn filter_by_tag(bank: &[TaggedQuestion], tags: &[&str]) -> Vec<TaggedQuestion> {
    bank.iter()
        .filter(|q| q.tags.iter().any(|t| tags.contains(&t.as_str())))
        .cloned()
        .collect()
}

/// Per-tag tallies in first-seen order. `answers[i]` is the chosen option
/// for `bank[i]` and is correct exactly when it equals `correct_index`;
/// missing or negative answers count as wrong.
pub fn calculate_tag_scores(bank: &[TaggedQuestion], answers: &[i64]) -> Vec<TagScore> {
    let mut scores: Vec<TagScore> = Vec::new();

    for (i, question) in bank.iter().enumerate() {
        let is_correct = answers
            .get(i)
            .and_then(|&a| usize::try_from(a).ok())
            .is_some_and(|a| a == question.correct_index);

        for tag in &question.tags {
            let position = match scores.iter().position(|s| &s.tag == tag) {
                Some(p) => p,
                None => {
                    scores.push(TagScore {
                        tag: tag.clone(),
                        correct: 0,
                        total: 0,
                    });
                    scores.len() - 1
                }
            };
            scores[position].total += 1;
            if is_correct {
                scores[position].correct += 1;
            }
        }
    }

    scores
}

pub fn tag_report(scores: &[TagScore]) -> String {
    let rule = "=".repeat(40);
    let mut out = format!("{}\nTAG PERFORMANCE REPORT\n{}\n", rule, rule);
    for score in scores {
        let _ = writeln!(
            out,
            "{}: {}/{} correct ({:.2}%)",
            score.tag,
            score.correct,
            score.total,
            score.accuracy()
        );
    }
    out
}

pub fn save_tag_scores(scores: &[TagScore], path: &Path) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(scores)?)?;
    Ok(())
}
