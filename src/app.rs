use crate::ai::CompletionBackend;
use crate::export::ExportFormat;
use crate::logger;
use crate::models::{QuestionType, SessionOutcome, SourceKind};
use crate::session::QuizSession;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;

pub const MIN_QUESTIONS: usize = 1;
pub const MAX_QUESTIONS: usize = 50;
pub const DEFAULT_QUESTIONS: usize = 5;
const SCROLL_PAGE: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Menu,
    Quiz,
}

/// Everything the terminal front end needs between frames.
pub struct App {
    pub session: QuizSession,
    pub backend: Option<Box<dyn CompletionBackend>>,
    pub source_files: Vec<PathBuf>,
    pub selected_file_index: usize,
    pub num_questions: usize,
    /// Parallel to `QuestionType::GENERATED`.
    pub enabled_types: [bool; 4],
    pub content: String,
    pub status: Option<String>,
    pub scroll_y: u16,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        session: QuizSession,
        backend: Option<Box<dyn CompletionBackend>>,
        source_files: Vec<PathBuf>,
    ) -> Self {
        Self {
            session,
            backend,
            source_files,
            selected_file_index: 0,
            num_questions: DEFAULT_QUESTIONS,
            enabled_types: [true; 4],
            content: String::new(),
            status: None,
            scroll_y: 0,
            should_quit: false,
        }
    }

    pub fn ai_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn selected_types(&self) -> Vec<QuestionType> {
        QuestionType::GENERATED
            .iter()
            .zip(self.enabled_types.iter())
            .filter(|(_, enabled)| **enabled)
            .map(|(t, _)| *t)
            .collect()
    }

    fn selected_file(&self) -> Option<String> {
        self.source_files
            .get(self.selected_file_index)
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Shows a generation result; switches to the quiz view only when
    /// questions came back.
    fn apply_generation(&mut self, outcome: SessionOutcome, app_state: &mut AppState) {
        if outcome.questions.is_empty() {
            self.status = Some(outcome.message);
            return;
        }
        logger::info(&format!("Generated {} questions", outcome.questions.len()));
        self.content = outcome.message;
        self.status = None;
        self.scroll_y = 0;
        *app_state = AppState::Quiz;
    }

    fn generate(&mut self, use_llm: bool, app_state: &mut AppState) {
        let Some(path) = self.selected_file() else {
            self.status = Some("No source files found".to_string());
            return;
        };
        let types = self.selected_types();

        let outcome = if use_llm {
            let Some(backend) = self.backend.as_deref() else {
                self.status = Some("AI disabled: set OPENROUTER_API_KEY".to_string());
                return;
            };
            self.session.generate_from_llm(
                backend,
                SourceKind::File,
                &path,
                self.num_questions,
                &types,
            )
        } else {
            self.session
                .generate(SourceKind::File, &path, self.num_questions, &types)
        };

        self.apply_generation(outcome, app_state);
    }

    fn download(&mut self, format: ExportFormat) {
        let outcome = self.session.download(format);
        self.status = outcome.message.lines().next().map(str::to_string);
    }

    fn explain(&mut self) {
        let Some(backend) = self.backend.as_deref() else {
            self.status = Some("AI disabled: set OPENROUTER_API_KEY".to_string());
            return;
        };
        let explanation = self.session.explain_first_question(backend);
        self.content = format!(
            "{}\n\n---\n\n## Explanation\n\n{}",
            self.session.state().rendered_markdown,
            explanation
        );
        self.status = Some("Explanation added below the quiz".to_string());
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

pub fn handle_menu_input(app: &mut App, key: KeyEvent, app_state: &mut AppState) {
    if is_ctrl_c(&key) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Up => {
            app.selected_file_index = app.selected_file_index.saturating_sub(1);
        }
        KeyCode::Down => {
            if app.selected_file_index < app.source_files.len().saturating_sub(1) {
                app.selected_file_index += 1;
            }
        }
        KeyCode::Char('+') | KeyCode::Right => {
            app.num_questions = (app.num_questions + 1).min(MAX_QUESTIONS);
        }
        KeyCode::Char('-') | KeyCode::Left => {
            app.num_questions = app.num_questions.saturating_sub(1).max(MIN_QUESTIONS);
        }
        KeyCode::Char(c @ '1'..='4') => {
            let idx = (c as u8 - b'1') as usize;
            app.enabled_types[idx] = !app.enabled_types[idx];
        }
        KeyCode::Enter => app.generate(false, app_state),
        KeyCode::Char('l') => app.generate(true, app_state),
        _ => {}
    }
}

pub fn handle_quiz_input(app: &mut App, key: KeyEvent, app_state: &mut AppState) {
    if is_ctrl_c(&key) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('m') => {
            app.status = None;
            *app_state = AppState::Menu;
        }
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Up => app.scroll_y = app.scroll_y.saturating_sub(1),
        KeyCode::Down => app.scroll_y = app.scroll_y.saturating_add(1),
        KeyCode::PageUp => app.scroll_y = app.scroll_y.saturating_sub(SCROLL_PAGE),
        KeyCode::PageDown => app.scroll_y = app.scroll_y.saturating_add(SCROLL_PAGE),
        KeyCode::Char('s') => {
            let outcome = app.session.shuffle();
            app.content = outcome.message;
            app.status = Some("Questions shuffled".to_string());
            app.scroll_y = 0;
        }
        KeyCode::Char('a') => {
            app.content = app.session.analyze().message;
            app.status = Some("Analysis appended".to_string());
        }
        KeyCode::Char('d') => app.download(ExportFormat::Md),
        KeyCode::Char('c') => app.download(ExportFormat::Csv),
        KeyCode::Char('t') => app.download(ExportFormat::Txt),
        KeyCode::Char('p') => app.download(ExportFormat::Pdf),
        KeyCode::Char('e') => app.explain(),
        _ => {}
    }
}
