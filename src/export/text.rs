use super::markdown::option_letter;
use crate::models::QuestionRecord;
use std::fmt::Write;

const RULE_WIDTH: usize = 50;

pub fn to_text(questions: &[QuestionRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Generated Quiz");
    let _ = writeln!(out, "{}\n", "=".repeat(RULE_WIDTH));

    for (i, q) in questions.iter().enumerate() {
        let _ = writeln!(out, "Q{}. [{}]", i + 1, q.kind.label());
        let _ = writeln!(out, "{}", q.question);
        if let Some(options) = &q.options {
            for (j, option) in options.iter().enumerate() {
                let _ = writeln!(out, "  {}) {}", option_letter(j), option);
            }
        }
        let _ = writeln!(out, "Answer: {}", q.answer);
        let _ = writeln!(out, "{}\n", "-".repeat(RULE_WIDTH));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionType;

    #[test]
    fn test_text_layout() {
        let questions = vec![
            QuestionRecord::new("Python is a _____ language.", "programming", QuestionType::FillBlank),
            QuestionRecord::new("Pick one _____.", "café", QuestionType::Mcq)
                .with_options(vec!["café".into(), "thé".into()]),
        ];
        let text = to_text(&questions);
        assert!(text.starts_with("Generated Quiz\n====="));
        assert!(text.contains("Q1. [Fill Blank]"));
        assert!(text.contains("Q2. [Mcq]"));
        assert!(text.contains("  B) thé"));
        assert!(text.contains("Answer: programming"));
        assert!(text.contains(&"-".repeat(50)));
    }
}
