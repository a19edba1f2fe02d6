use crate::error::QuizError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    FillBlank,
    Mcq,
    ShortAnswer,
    TrueFalse,
    Topic,
}

impl QuestionType {
    pub const GENERATED: [QuestionType; 4] = [
        QuestionType::FillBlank,
        QuestionType::Mcq,
        QuestionType::ShortAnswer,
        QuestionType::TrueFalse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::FillBlank => "fill_blank",
            QuestionType::Mcq => "mcq",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::TrueFalse => "true_false",
            QuestionType::Topic => "topic",
        }
    }

    /// Human label: underscores become spaces and each word is capitalised.
    pub fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "fill_blank" | "fill_in_the_blank" | "fill_in_blank" | "fill_blanks" => {
                Ok(QuestionType::FillBlank)
            }
            "mcq" | "multiple_choice" => Ok(QuestionType::Mcq),
            "short_answer" => Ok(QuestionType::ShortAnswer),
            "true_false" | "true/false" | "t/f" | "tf" => Ok(QuestionType::TrueFalse),
            "topic" => Ok(QuestionType::Topic),
            _ => Err(QuizError::InvalidQuestionType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    pub answer: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl QuestionRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, kind: QuestionType) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            kind,
            options: None,
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }
}

/// Everything a session knows about its current quiz. Transitions build a
/// new value instead of editing fields in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizState {
    pub questions: Vec<QuestionRecord>,
    pub num_questions: usize,
    pub question_types: BTreeSet<QuestionType>,
    pub input_text: String,
    pub rendered_markdown: String,
}

impl QuizState {
    /// Derives `num_questions` and `question_types` from the records so the
    /// two can never disagree.
    pub fn from_questions(
        questions: Vec<QuestionRecord>,
        input_text: String,
        rendered_markdown: String,
    ) -> Self {
        let question_types = questions.iter().map(|q| q.kind).collect();
        Self {
            num_questions: questions.len(),
            questions,
            question_types,
            input_text,
            rendered_markdown,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Result of a session transition: the questions to show and either the
/// rendered quiz or a message for the user.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub questions: Vec<QuestionRecord>,
    pub message: String,
}

impl SessionOutcome {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            questions: Vec::new(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutcome {
    pub filename: Option<PathBuf>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Text,
    File,
    Url,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "paste" => Ok(SourceKind::Text),
            "file" | "upload" => Ok(SourceKind::File),
            "url" | "link" => Ok(SourceKind::Url),
            other => Err(format!("unsupported source kind: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_type_labels() {
        assert_eq!(QuestionType::FillBlank.label(), "Fill Blank");
        assert_eq!(QuestionType::Mcq.label(), "Mcq");
        assert_eq!(QuestionType::ShortAnswer.label(), "Short Answer");
        assert_eq!(QuestionType::TrueFalse.label(), "True False");
    }

    #[test]
    fn test_question_type_aliases() {
        assert_eq!("Multiple choice".parse::<QuestionType>().unwrap(), QuestionType::Mcq);
        assert_eq!("multiple_choice".parse::<QuestionType>().unwrap(), QuestionType::Mcq);
        assert_eq!("t/f".parse::<QuestionType>().unwrap(), QuestionType::TrueFalse);
        assert_eq!("True/False".parse::<QuestionType>().unwrap(), QuestionType::TrueFalse);
        assert_eq!("Short answer".parse::<QuestionType>().unwrap(), QuestionType::ShortAnswer);
        assert!("essay".parse::<QuestionType>().is_err());
    }

    #[test]
    fn test_record_serializes_type_field() {
        let record = QuestionRecord::new("What is Python?", "A language", QuestionType::ShortAnswer);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "short_answer");
        assert!(json.get("options").is_none());
    }

    #[test]
    fn test_state_from_questions_keeps_invariants() {
        let questions = vec![
            QuestionRecord::new("A _____.", "a", QuestionType::FillBlank),
            QuestionRecord::new("B _____.", "b", QuestionType::FillBlank),
            QuestionRecord::new("True or False: C", "True", QuestionType::TrueFalse),
        ];
        let state = QuizState::from_questions(questions, "text".into(), String::new());
        assert_eq!(state.num_questions, 3);
        assert_eq!(state.question_types.len(), 2);
        assert!(state.question_types.contains(&QuestionType::TrueFalse));
    }
}
