use crate::ai::client::{BackendError, CompletionBackend};
use crate::export::markdown::option_letter;
use crate::models::{QuestionRecord, QuestionType};

const SYSTEM_PROMPT: &str = "You are a patient tutor explaining quiz answers to students.";

/// The first numbered (or "Question"-prefixed) block of a quiz, up to and
/// including its `d)` option line.
pub fn extract_first_question(quiz_text: &str) -> String {
    let mut lines = Vec::new();
    let mut started = false;

    for line in quiz_text.lines() {
        let trimmed = line.trim();
        if !started {
            let opens = trimmed.chars().next().is_some_and(|c| c.is_ascii_digit())
                || trimmed.starts_with("Question");
            if !opens {
                continue;
            }
            started = true;
        }
        lines.push(trimmed);
        if trimmed.to_lowercase().starts_with("d)") {
            break;
        }
    }

    lines.join("\n").trim().to_string()
}

/// Plain-text quiz of the multiple-choice questions, numbered with
/// lettered options.
pub fn format_mcq_quiz(questions: &[QuestionRecord]) -> String {
    let mut blocks = Vec::new();
    let mcqs = questions
        .iter()
        .filter(|q| q.kind == QuestionType::Mcq && q.options.is_some());

    for (i, q) in mcqs.enumerate() {
        let mut block = vec![format!("{}. {}", i + 1, q.question)];
        for (j, option) in q.options.iter().flatten().enumerate() {
            block.push(format!("{}) {}", option_letter(j).to_ascii_lowercase(), option));
        }
        block.push(format!("Answer: {}", q.answer));
        blocks.push(block.join("\n"));
    }

    blocks.join("\n\n")
}

pub fn build_explanation_prompt(question_text: &str) -> String {
    format!(
        "Explain the correct answer to the following multiple-choice question.\n\n\
         Question:\n{}\n\n\
         Provide a short and clear explanation.",
        question_text
    )
}

pub async fn generate_explanation(
    backend: &dyn CompletionBackend,
    quiz_text: &str,
) -> Result<String, BackendError> {
    let question = extract_first_question(quiz_text);
    let prompt = build_explanation_prompt(&question);
    let completion = backend.complete(SYSTEM_PROMPT, &prompt).await?;
    Ok(completion.trim().to_string())
}
