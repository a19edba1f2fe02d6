use crate::ai::{self, CompletionBackend};
use crate::analysis::{StatisticalAnalyzer, TextAnalyzer};
use crate::config::QuizConfig;
use crate::export::{self, ExportFormat, render_quiz};
use crate::logger;
use crate::models::{DownloadOutcome, QuestionRecord, QuestionType, QuizState, SessionOutcome, SourceKind};
use crate::preprocessing::{Preprocessor, StopWords};
use crate::question_types;
use crate::sources;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::fmt::Write;
use std::sync::Arc;

pub const EMPTY_TEXT_MESSAGE: &str = "Please provide text to generate questions from.";
pub const EMPTY_SHUFFLE_MESSAGE: &str = "Please generate a quiz first before shuffling!";
pub const NO_TYPES_MESSAGE: &str = "Please select at least one question type.";
pub const NO_QUESTIONS_MESSAGE: &str = "No questions could be generated from the provided text.";
pub const NO_DOWNLOAD_MESSAGE: &str = "No quiz to download. Please generate a quiz first.";
pub const NO_MCQ_MESSAGE: &str = "Please generate a quiz with multiple-choice questions first.";

const ANALYSIS_KEYWORDS: usize = 10;
const ANALYSIS_ENTITIES: usize = 10;
const ANALYSIS_TOPICS: usize = 3;
const ANALYSIS_TOPIC_WORDS: usize = 5;

/// Splits `total` across `parts` slots; the remainder goes to the first slots.
pub fn split_count(total: usize, parts: usize) -> Vec<usize> {
    if parts == 0 {
        return Vec::new();
    }
    let base = total / parts;
    let rem = total % parts;
    (0..parts).map(|i| base + usize::from(i < rem)).collect()
}

fn dedup_types(types: &[QuestionType]) -> Vec<QuestionType> {
    let mut seen = Vec::with_capacity(types.len());
    for t in types {
        if !seen.contains(t) {
            seen.push(*t);
        }
    }
    seen
}

/// One user's quiz. Every transition replaces `QuizState` as a whole.
pub struct QuizSession {
    state: QuizState,
    preprocessor: Preprocessor,
    analyzer: Box<dyn TextAnalyzer>,
    config: QuizConfig,
    rng: StdRng,
}

impl QuizSession {
    pub fn new(config: QuizConfig, stopwords: Arc<StopWords>) -> Self {
        Self::with_rng(config, stopwords, StdRng::from_entropy())
    }

    /// Deterministic session for tests and reproducible CLI runs.
    pub fn seeded(config: QuizConfig, stopwords: Arc<StopWords>, seed: u64) -> Self {
        Self::with_rng(config, stopwords, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: QuizConfig, stopwords: Arc<StopWords>, rng: StdRng) -> Self {
        Self {
            state: QuizState::default(),
            analyzer: Box::new(StatisticalAnalyzer::new(Arc::clone(&stopwords))),
            preprocessor: Preprocessor::new(stopwords),
            config,
            rng,
        }
    }

    pub fn with_analyzer(mut self, analyzer: Box<dyn TextAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    fn load_text(kind: SourceKind, input: &str) -> Result<String, SessionOutcome> {
        sources::load_source(kind, input).map_err(|e| {
            logger::error(&format!("Failed to load {:?} source: {}", kind, e));
            SessionOutcome::message(format!("Could not load source: {}", e))
        })
    }

    fn install(&mut self, questions: Vec<QuestionRecord>, input_text: String) -> SessionOutcome {
        if questions.is_empty() {
            self.state = QuizState::from_questions(Vec::new(), input_text, String::new());
            return SessionOutcome::message(NO_QUESTIONS_MESSAGE);
        }

        let rendered = render_quiz(&questions);
        self.state = QuizState::from_questions(questions.clone(), input_text, rendered.clone());
        SessionOutcome {
            questions,
            message: rendered,
        }
    }

    /// Builds a quiz from local heuristics. Empty input leaves the current
    /// quiz untouched.
    pub fn generate(
        &mut self,
        kind: SourceKind,
        input: &str,
        num_questions: usize,
        question_types: &[QuestionType],
    ) -> SessionOutcome {
        let text = match Self::load_text(kind, input) {
            Ok(text) => text,
            Err(outcome) => return outcome,
        };
        if text.trim().is_empty() {
            return SessionOutcome::message(EMPTY_TEXT_MESSAGE);
        }
        let types = dedup_types(question_types);
        if types.is_empty() {
            return SessionOutcome::message(NO_TYPES_MESSAGE);
        }

        let sentences = self.preprocessor.sentences(&text);
        let counts = split_count(num_questions, types.len());
        let mut questions = Vec::with_capacity(num_questions);
        for (question_type, count) in types.iter().zip(counts) {
            questions.extend(question_types::generate(
                *question_type,
                &sentences,
                count,
                self.preprocessor.stopwords(),
                &mut self.rng,
            ));
        }

        logger::info(&format!(
            "Generated {} of {} requested questions from {} sentences",
            questions.len(),
            num_questions,
            sentences.len()
        ));
        self.install(questions, text)
    }

    /// Same contract as `generate`, with records written by the LLM.
    ///
    /// Blocks the calling thread until the backend answers. From async code,
    /// call `ai::generate_from_llm` instead; inside a tokio runtime this
    /// returns an error message without contacting the backend.
    pub fn generate_from_llm(
        &mut self,
        backend: &dyn CompletionBackend,
        kind: SourceKind,
        input: &str,
        num_questions: usize,
        question_types: &[QuestionType],
    ) -> SessionOutcome {
        let text = match Self::load_text(kind, input) {
            Ok(text) => text,
            Err(outcome) => return outcome,
        };
        if text.trim().is_empty() {
            return SessionOutcome::message(EMPTY_TEXT_MESSAGE);
        }
        let types = dedup_types(question_types);
        if types.is_empty() {
            return SessionOutcome::message(NO_TYPES_MESSAGE);
        }

        let max_chars = self.config.max_source_chars;
        let result = block_on(ai::generate_from_llm(
            backend,
            &text,
            num_questions,
            &types,
            max_chars,
        ));

        match result {
            Ok(questions) => self.install(questions, text),
            Err(e) => {
                logger::error(&format!("LLM generation failed: {}", e));
                SessionOutcome::message(format!("Error generating questions: {}", e))
            }
        }
    }

    /// Installs records produced elsewhere.
    pub fn load_questions(&mut self, questions: Vec<QuestionRecord>, input_text: &str) -> SessionOutcome {
        self.install(questions, input_text.to_string())
    }

    /// Shuffles a copy of the questions and renders it. The stored question
    /// list keeps its order.
    pub fn shuffle(&mut self) -> SessionOutcome {
        if self.state.is_empty() {
            return SessionOutcome::message(EMPTY_SHUFFLE_MESSAGE);
        }

        let mut shuffled = self.state.questions.clone();
        shuffled.shuffle(&mut self.rng);
        let rendered = render_quiz(&shuffled);

        self.state = QuizState {
            rendered_markdown: rendered.clone(),
            ..self.state.clone()
        };
        SessionOutcome {
            questions: shuffled,
            message: rendered,
        }
    }

    /// Appends keyword, entity and topic sections for the stored input text.
    pub fn analyze(&mut self) -> SessionOutcome {
        let text = &self.state.input_text;
        let keywords = self.analyzer.keywords(text, ANALYSIS_KEYWORDS);
        let entities = self.analyzer.entities(text);
        let topics = self.analyzer.topics(text, ANALYSIS_TOPICS);

        let mut section = String::from("\n\n---\n\n## Analysis\n\n");
        if !keywords.is_empty() {
            let terms: Vec<&str> = keywords.iter().map(|k| k.term.as_str()).collect();
            let _ = writeln!(section, "**Key Terms (TF-IDF):** {}\n", terms.join(", "));
        }
        if !entities.is_empty() {
            let listed: Vec<String> = entities
                .iter()
                .take(ANALYSIS_ENTITIES)
                .map(|e| format!("{} ({})", e.text, e.label))
                .collect();
            let _ = writeln!(section, "**Named Entities (NER):** {}\n", listed.join(", "));
        }
        if !topics.is_empty() {
            let _ = writeln!(section, "**Topics (LDA):**\n");
            for (i, topic) in topics.iter().enumerate() {
                let words: Vec<&str> = topic
                    .words
                    .iter()
                    .take(ANALYSIS_TOPIC_WORDS)
                    .map(String::as_str)
                    .collect();
                let _ = writeln!(section, "- Topic {}: {}", i + 1, words.join(", "));
            }
        }

        let rendered = format!("{}{}", self.state.rendered_markdown, section);
        self.state = QuizState {
            rendered_markdown: rendered.clone(),
            ..self.state.clone()
        };
        SessionOutcome {
            questions: self.state.questions.clone(),
            message: rendered,
        }
    }

    /// Writes `generated_quiz.<ext>` into the configured output directory.
    pub fn download(&self, format: ExportFormat) -> DownloadOutcome {
        if self.state.is_empty() {
            return DownloadOutcome {
                filename: None,
                message: NO_DOWNLOAD_MESSAGE.to_string(),
            };
        }

        match export::write_export(
            format,
            &self.state.questions,
            &self.state.rendered_markdown,
            &self.config.output_dir,
            self.config.pdf_font.as_deref(),
        ) {
            Ok(path) => DownloadOutcome {
                message: format!(
                    "Quiz downloaded as {}\n\n{}",
                    path.display(),
                    self.state.rendered_markdown
                ),
                filename: Some(path),
            },
            Err(e) => {
                logger::error(&format!("Download failed: {}", e));
                DownloadOutcome {
                    filename: None,
                    message: format!("Error downloading quiz: {}", e),
                }
            }
        }
    }

    /// Asks the LLM to explain the first multiple-choice question.
    ///
    /// Synchronous like `generate_from_llm`; async callers should use
    /// `ai::generate_explanation`.
    pub fn explain_first_question(&self, backend: &dyn CompletionBackend) -> String {
        let quiz_text = ai::format_mcq_quiz(&self.state.questions);
        if quiz_text.is_empty() {
            return NO_MCQ_MESSAGE.to_string();
        }
        match block_on(ai::generate_explanation(backend, &quiz_text)) {
            Ok(explanation) => explanation,
            Err(e) => {
                logger::error(&format!("Explanation failed: {}", e));
                format!("Error generating explanation: {}", e)
            }
        }
    }
}

const NESTED_RUNTIME_MESSAGE: &str =
    "session LLM calls block the current thread and cannot run inside an async runtime; \
     use the async functions in the ai module instead";

/// Drives an async LLM call from synchronous session code. Refuses to run on
/// a thread that is already inside a tokio runtime.
fn block_on<F, T>(future: F) -> Result<T, ai::BackendError>
where
    F: std::future::Future<Output = Result<T, ai::BackendError>>,
{
    if tokio::runtime::Handle::try_current().is_ok() {
        logger::warn("Blocking LLM call attempted inside a tokio runtime");
        return Err(NESTED_RUNTIME_MESSAGE.into());
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::FakeBackend;
    use crate::analysis::{Entity, Keyword, Topic};

    const TEXT: &str = "Python is a programming language. Guido van Rossum created Python in 1991. \
        Python emphasizes code readability. Libraries extend the interpreter. \
        Developers write scripts quickly.";

    fn session() -> QuizSession {
        QuizSession::seeded(QuizConfig::default(), Arc::new(StopWords::english()), 42)
    }

    struct CannedAnalyzer;

    impl TextAnalyzer for CannedAnalyzer {
        fn keywords(&self, _text: &str, top_n: usize) -> Vec<Keyword> {
            ["python", "programming", "language"]
                .iter()
                .take(top_n)
                .map(|t| Keyword {
                    term: t.to_string(),
                    score: 1.0,
                })
                .collect()
        }

        fn entities(&self, _text: &str) -> Vec<Entity> {
            (0..15)
                .map(|i| Entity {
                    text: if i == 0 {
                        "Guido van Rossum".to_string()
                    } else {
                        format!("Entity{}", i)
                    },
                    label: "PERSON".to_string(),
                })
                .collect()
        }

        fn topics(&self, _text: &str, n_topics: usize) -> Vec<Topic> {
            (0..n_topics)
                .map(|i| Topic {
                    words: (0..8).map(|w| format!("t{}w{}", i, w)).collect(),
                })
                .collect()
        }
    }

    struct EmptyAnalyzer;

    impl TextAnalyzer for EmptyAnalyzer {
        fn keywords(&self, _text: &str, _top_n: usize) -> Vec<Keyword> {
            Vec::new()
        }
        fn entities(&self, _text: &str) -> Vec<Entity> {
            Vec::new()
        }
        fn topics(&self, _text: &str, _n_topics: usize) -> Vec<Topic> {
            Vec::new()
        }
    }

    #[test]
    fn test_split_count() {
        assert_eq!(split_count(5, 2), vec![3, 2]);
        assert_eq!(split_count(4, 4), vec![1, 1, 1, 1]);
        assert_eq!(split_count(1, 3), vec![1, 0, 0]);
        assert!(split_count(3, 0).is_empty());
    }

    #[test]
    fn test_generate_empty_text_leaves_state() {
        let mut session = session();
        let outcome = session.generate(SourceKind::Text, "   \n", 5, &[QuestionType::FillBlank]);
        assert_eq!(outcome.message, EMPTY_TEXT_MESSAGE);
        assert!(outcome.questions.is_empty());
        assert_eq!(session.state(), &QuizState::default());
    }

    #[test]
    fn test_generate_invariants() {
        let mut session = session();
        let outcome = session.generate(
            SourceKind::Text,
            TEXT,
            4,
            &[QuestionType::FillBlank, QuestionType::ShortAnswer],
        );
        let state = session.state();
        assert_eq!(outcome.questions.len(), 4);
        assert_eq!(state.num_questions, state.questions.len());
        assert_eq!(state.input_text, TEXT);
        assert!(outcome.message.starts_with("# Generated Quiz (4 questions)"));
        assert_eq!(state.rendered_markdown, outcome.message);
        let expected: std::collections::BTreeSet<_> =
            [QuestionType::FillBlank, QuestionType::ShortAnswer].into_iter().collect();
        assert_eq!(state.question_types, expected);
        assert_eq!(state.questions[0].kind, QuestionType::FillBlank);
        assert_eq!(state.questions[3].kind, QuestionType::ShortAnswer);
    }

    #[test]
    fn test_generate_keeps_raw_input() {
        let mut session = session();
        let raw = "  Python is a programming language.  \n";
        session.generate(SourceKind::Text, raw, 1, &[QuestionType::FillBlank]);
        assert_eq!(session.state().input_text, raw);
    }

    #[test]
    fn test_generate_without_types() {
        let mut session = session();
        let outcome = session.generate(SourceKind::Text, TEXT, 3, &[]);
        assert_eq!(outcome.message, NO_TYPES_MESSAGE);
    }

    #[test]
    fn test_generate_nothing_produced_replaces_state() {
        let mut session = session();
        session.generate(SourceKind::Text, TEXT, 2, &[QuestionType::FillBlank]);
        let outcome = session.generate(SourceKind::Text, "It is. To be.", 2, &[QuestionType::FillBlank]);
        assert_eq!(outcome.message, NO_QUESTIONS_MESSAGE);
        assert!(session.state().is_empty());
        assert_eq!(session.state().num_questions, 0);
        assert!(session.state().question_types.is_empty());
    }

    #[test]
    fn test_generate_from_missing_file() {
        let mut session = session();
        let outcome = session.generate(SourceKind::File, "/no/such/file.txt", 2, &[QuestionType::Mcq]);
        assert!(outcome.message.starts_with("Could not load source"));
        assert!(session.state().is_empty());
    }

    #[test]
    fn test_generate_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, TEXT).unwrap();

        let mut session = session();
        let outcome = session.generate(
            SourceKind::File,
            path.to_str().unwrap(),
            3,
            &[QuestionType::Mcq],
        );
        assert_eq!(outcome.questions.len(), 3);
        assert!(outcome.questions.iter().all(|q| q.options.is_some()));
    }

    #[test]
    fn test_shuffle_empty() {
        let mut session = session();
        let outcome = session.shuffle();
        assert_eq!(outcome.message, EMPTY_SHUFFLE_MESSAGE);
        assert!(outcome.questions.is_empty());
    }

    #[test]
    fn test_shuffle_is_permutation_and_keeps_order() {
        let mut session = session();
        session.generate(SourceKind::Text, TEXT, 5, &[QuestionType::FillBlank]);
        let before = session.state().questions.clone();

        let outcome = session.shuffle();
        let by_text = |questions: &[QuestionRecord]| {
            let mut sorted = questions.to_vec();
            sorted.sort_by(|a, b| a.question.cmp(&b.question).then_with(|| a.answer.cmp(&b.answer)));
            sorted
        };
        assert_eq!(by_text(&outcome.questions), by_text(&before));
        assert_eq!(session.state().questions, before);
        assert_eq!(session.state().num_questions, before.len());
        assert_eq!(session.state().rendered_markdown, outcome.message);
    }

    #[test]
    fn test_analyze_sections_and_limits() {
        let mut session = session().with_analyzer(Box::new(CannedAnalyzer));
        session.load_questions(
            vec![QuestionRecord::new("Q _____?", "a", QuestionType::FillBlank)],
            TEXT,
        );
        let original = session.state().rendered_markdown.clone();

        let outcome = session.analyze();
        let md = &session.state().rendered_markdown;
        assert!(md.starts_with(&original));
        assert!(md.contains("\n\n---\n\n## Analysis\n\n"));
        assert!(md.contains("Key Terms (TF-IDF):"));
        assert!(md.contains("Guido van Rossum (PERSON)"));
        assert!(md.contains("Entity9 (PERSON)"));
        assert!(!md.contains("Entity10"));
        assert!(md.contains("Topic 1: t0w0, t0w1, t0w2, t0w3, t0w4"));
        assert!(!md.contains("t0w5"));
        assert!(md.contains("Topic 3:"));
        assert_eq!(&outcome.message, md);
    }

    #[test]
    fn test_analyze_omits_empty_sections_and_accumulates() {
        let mut session = session().with_analyzer(Box::new(EmptyAnalyzer));
        session.analyze();
        session.analyze();
        let md = &session.state().rendered_markdown;
        assert_eq!(md.matches("## Analysis").count(), 2);
        assert!(!md.contains("Key Terms"));
        assert!(!md.contains("Named Entities"));
        assert!(!md.contains("Topics (LDA)"));
    }

    #[test]
    fn test_download_without_quiz() {
        let session = session();
        let outcome = session.download(ExportFormat::Md);
        assert!(outcome.filename.is_none());
        assert!(outcome.message.contains("No quiz to download"));
    }

    #[test]
    fn test_download_formats() {
        let dir = tempfile::tempdir().unwrap();
        let config = QuizConfig {
            output_dir: dir.path().to_path_buf(),
            ..QuizConfig::default()
        };
        let mut session = QuizSession::seeded(config, Arc::new(StopWords::english()), 1);
        session.generate(SourceKind::Text, TEXT, 3, &[QuestionType::Mcq]);

        for format in [ExportFormat::Md, ExportFormat::Csv, ExportFormat::Txt, ExportFormat::Pdf] {
            let outcome = session.download(format);
            let path = outcome.filename.unwrap();
            assert!(path.exists());
            assert_eq!(path.extension().unwrap(), format.extension());
            assert!(outcome.message.starts_with("Quiz downloaded"));
        }

        let rows = export::parse_csv(&std::fs::read_to_string(dir.path().join("generated_quiz.csv")).unwrap());
        let questions = &session.state().questions;
        assert_eq!(rows.len(), questions.len() + 1);
        for (row, question) in rows[1..].iter().zip(questions) {
            assert_eq!(row[2], question.question);
            let options: Vec<String> = row[4].split('|').map(String::from).collect();
            assert_eq!(Some(&options), question.options.as_ref());
        }
    }

    #[test]
    fn test_download_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "file").unwrap();
        let config = QuizConfig {
            output_dir: blocker,
            ..QuizConfig::default()
        };
        let mut session = QuizSession::seeded(config, Arc::new(StopWords::english()), 1);
        session.generate(SourceKind::Text, TEXT, 2, &[QuestionType::FillBlank]);

        let outcome = session.download(ExportFormat::Txt);
        assert!(outcome.filename.is_none());
        assert!(outcome.message.starts_with("Error downloading quiz:"));
    }

    #[test]
    fn test_generate_from_llm() {
        let backend = FakeBackend::new(&[r#"```json
{"questions": [
  {"question": "Who created Python?", "answer": "Guido van Rossum", "type": "short_answer"},
  {"question": "Python was released in _____.", "answer": "1991", "type": "fill_blank"},
  {"question": "Broken"}
]}
```"#]);
        let mut session = session();
        let outcome = session.generate_from_llm(
            &backend,
            SourceKind::Text,
            TEXT,
            2,
            &[QuestionType::ShortAnswer, QuestionType::FillBlank],
        );
        assert_eq!(outcome.questions.len(), 2);
        assert_eq!(session.state().num_questions, 2);
        assert_eq!(session.state().question_types.len(), 2);
    }

    #[test]
    fn test_generate_from_llm_backend_error() {
        let backend = FakeBackend::new(&[]);
        let mut session = session();
        let outcome = session.generate_from_llm(&backend, SourceKind::Text, TEXT, 2, &[QuestionType::Mcq]);
        assert!(outcome.message.starts_with("Error generating questions"));
        assert!(session.state().is_empty());
    }

    #[tokio::test]
    async fn test_llm_calls_inside_runtime_return_message() {
        let backend = FakeBackend::new(&["Because."]);
        let mut session = session();
        let outcome = session.generate_from_llm(&backend, SourceKind::Text, TEXT, 2, &[QuestionType::Mcq]);
        assert!(outcome.message.starts_with("Error generating questions"));
        assert!(outcome.message.contains("async runtime"));
        assert!(session.state().is_empty());

        session.load_questions(
            vec![QuestionRecord::new("Capital of Italy?", "Rome", QuestionType::Mcq)
                .with_options(vec!["Rome".into(), "Oslo".into()])],
            "",
        );
        let explanation = session.explain_first_question(&backend);
        assert!(explanation.starts_with("Error generating explanation"));
        assert!(backend.last_prompt().is_empty());
    }

    #[test]
    fn test_explain_first_question() {
        let backend = FakeBackend::new(&["Because Paris is the capital."]);
        let mut session = session();
        assert_eq!(session.explain_first_question(&backend), NO_MCQ_MESSAGE);

        session.load_questions(
            vec![
                QuestionRecord::new("Capital of France?", "Paris", QuestionType::Mcq).with_options(vec![
                    "Berlin".into(),
                    "Paris".into(),
                    "Rome".into(),
                    "Madrid".into(),
                ]),
            ],
            "",
        );
        assert_eq!(session.explain_first_question(&backend), "Because Paris is the capital.");
        assert!(backend.last_prompt().contains("1. Capital of France?"));
    }
}
