use crate::models::QuestionRecord;
use std::fmt::Write;

/// Option letter for a zero-based index: A, B, C ...
pub fn option_letter(index: usize) -> char {
    char::from_u32('A' as u32 + (index % 26) as u32).unwrap_or('?')
}

/// Renders the quiz as Markdown. Shuffle and download both reuse this.
pub fn render_quiz(questions: &[QuestionRecord]) -> String {
    let mut out = format!("# Generated Quiz ({} questions)\n\n", questions.len());

    for (i, q) in questions.iter().enumerate() {
        let _ = writeln!(out, "**Q{}.** *({})* {}", i + 1, q.kind.label(), q.question);
        if let Some(options) = &q.options {
            out.push('\n');
            for (j, option) in options.iter().enumerate() {
                let _ = writeln!(out, "- {}) {}", option_letter(j), option);
            }
        }
        let _ = write!(out, "\n**Answer:** {}\n\n", q.answer);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionType;

    #[test]
    fn test_render_quiz_header_and_numbering() {
        let questions = vec![
            QuestionRecord::new("Python is a _____ language.", "programming", QuestionType::FillBlank),
            QuestionRecord::new("Who created _____?", "Guido", QuestionType::Mcq)
                .with_options(vec!["Guido".into(), "Linus".into()]),
        ];
        let md = render_quiz(&questions);
        assert!(md.starts_with("# Generated Quiz (2 questions)"));
        assert!(md.contains("**Q1.** *(Fill Blank)* Python is a _____ language."));
        assert!(md.contains("**Q2.** *(Mcq)*"));
        assert!(md.contains("- A) Guido\n- B) Linus"));
        assert!(md.contains("**Answer:** programming"));
    }

    #[test]
    fn test_render_empty_quiz() {
        assert_eq!(render_quiz(&[]), "# Generated Quiz (0 questions)\n\n");
    }

    #[test]
    fn test_option_letters() {
        assert_eq!(option_letter(0), 'A');
        assert_eq!(option_letter(3), 'D');
    }
}
