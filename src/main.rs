use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use quiz_generator::ai::{self, CompletionBackend, OpenRouterClient};
use quiz_generator::app::{App, AppState, handle_menu_input, handle_quiz_input};
use quiz_generator::config::QuizConfig;
use quiz_generator::export::ExportFormat;
use quiz_generator::models::{QuestionType, SourceKind};
use quiz_generator::preprocessing::StopWords;
use quiz_generator::session::QuizSession;
use quiz_generator::terminal::{self, PoolSettings};
use quiz_generator::{Result, logger, sources, ui};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "quiz-generator")]
#[command(about = "Generate quizzes from pasted text, files or web pages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a quiz and optionally export it
    Generate {
        /// Text, file path or URL depending on --source
        input: String,
        #[arg(long, default_value = "text")]
        source: SourceKind,
        #[arg(short, long, default_value_t = 5)]
        num: usize,
        #[arg(
            short,
            long,
            value_delimiter = ',',
            default_value = "fill_blank,mcq,short_answer,true_false"
        )]
        types: Vec<QuestionType>,
        /// md, csv, txt or pdf
        #[arg(short, long)]
        format: Option<String>,
        /// Ask the LLM instead of the local generators
        #[arg(long)]
        llm: bool,
        #[arg(long)]
        shuffle: bool,
        #[arg(long)]
        analyze: bool,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Sample a quiz from the built-in topic pools
    Pools {
        /// JSON template mapping topic to question count
        #[arg(long)]
        template: Option<PathBuf>,
        /// Write the settings in use to this path
        #[arg(long)]
        save: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Filter the tagged bank and score answers per tag
    Tags {
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
        answers: Vec<i64>,
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Random questions of one difficulty level
    Difficulty {
        level: String,
        #[arg(short, long, default_value_t = 5)]
        num: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Explain the first multiple-choice question in a quiz file
    Explain { file: PathBuf },
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn make_backend(config: &QuizConfig) -> Option<Box<dyn CompletionBackend>> {
    if !QuizConfig::ai_enabled() {
        return None;
    }
    match OpenRouterClient::new(config.model.clone()) {
        Ok(client) => {
            logger::info(&format!("AI enabled with model {}", client.model()));
            Some(Box::new(client))
        }
        Err(e) => {
            logger::error(&format!("Failed to create OpenRouter client: {}", e));
            None
        }
    }
}

fn load_stopwords(config: &QuizConfig) -> Arc<StopWords> {
    match StopWords::load(config.stopwords_file.as_deref()) {
        Ok(words) => Arc::new(words),
        Err(e) => {
            logger::warn(&format!("Could not read stopwords file, using defaults: {}", e));
            Arc::new(StopWords::english())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = QuizConfig::from_env();
    logger::init(&config.log_file);
    let stopwords = load_stopwords(&config);

    match cli.command {
        None => run_tui(config, stopwords),
        Some(Command::Generate {
            input,
            source,
            num,
            types,
            format,
            llm,
            shuffle,
            analyze,
            seed,
        }) => {
            let mut session = match seed {
                Some(seed) => QuizSession::seeded(config.clone(), stopwords, seed),
                None => QuizSession::new(config.clone(), stopwords),
            };

            let outcome = if llm {
                let Some(backend) = make_backend(&config) else {
                    eprintln!("AI disabled: set OPENROUTER_API_KEY");
                    return Ok(());
                };
                session.generate_from_llm(&*backend, source, &input, num, &types)
            } else {
                session.generate(source, &input, num, &types)
            };

            if outcome.questions.is_empty() {
                println!("{}", outcome.message);
                return Ok(());
            }

            let mut shown = outcome.message;
            if shuffle {
                shown = session.shuffle().message;
            }
            if analyze {
                shown = session.analyze().message;
            }
            println!("{}", shown);

            if let Some(name) = format {
                let download = session.download(ExportFormat::from_name(&name));
                if let Some(line) = download.message.lines().next() {
                    println!("{}", line);
                }
            }
            Ok(())
        }
        Some(Command::Pools { template, save, seed }) => {
            let settings: PoolSettings = match template {
                Some(path) => terminal::load_template(&path)?,
                None => terminal::sample_pools().keys().map(|t| (t.clone(), 1)).collect(),
            };
            if let Some(path) = save {
                println!("{}", terminal::save_template(&settings, &path)?);
            }

            let quiz =
                terminal::generate_quiz_from_pools(&terminal::sample_pools(), &settings, &mut rng_from(seed))?;
            print!("{}", terminal::format_quiz(&quiz));
            Ok(())
        }
        Some(Command::Tags { tags, answers, save }) => {
            let bank = terminal::sample_bank();
            let selected = if tags.is_empty() {
                bank
            } else {
                let wanted: Vec<&str> = tags.iter().map(String::as_str).collect();
                terminal::filter_by_tag(&bank, &wanted)
            };

            for (i, question) in selected.iter().enumerate() {
                println!("{}. {} [{}]", i + 1, question.question, question.tags.join(", "));
                for (j, option) in question.options.iter().enumerate() {
                    println!("   {}) {}", j, option);
                }
            }

            if !answers.is_empty() {
                let scores = terminal::calculate_tag_scores(&selected, &answers);
                print!("\n{}", terminal::tag_report(&scores));
                if let Some(path) = save {
                    terminal::tags::save_tag_scores(&scores, &path)?;
                    println!("Scores saved to {}", path.display());
                }
            }
            Ok(())
        }
        Some(Command::Difficulty { level, num, seed }) => {
            let quiz = terminal::generate_quiz(&level, num, &mut rng_from(seed))?;
            for (i, q) in quiz.iter().enumerate() {
                println!("{}. [{}] {}", i + 1, q.difficulty, q.question);
                println!("   Answer: {}", q.answer);
            }
            Ok(())
        }
        Some(Command::Explain { file }) => {
            let quiz_text = fs::read_to_string(&file)?;
            let Some(backend) = make_backend(&config) else {
                eprintln!("AI disabled: set OPENROUTER_API_KEY");
                return Ok(());
            };
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            match runtime.block_on(ai::generate_explanation(&*backend, &quiz_text)) {
                Ok(explanation) => println!("{}", explanation),
                Err(e) => {
                    logger::error(&format!("Explanation failed: {}", e));
                    eprintln!("Error generating explanation: {}", e);
                }
            }
            Ok(())
        }
    }
}

fn run_tui(config: QuizConfig, stopwords: Arc<StopWords>) -> Result<()> {
    let source_files = sources::list_source_files(&config.sources_dir);
    let backend = make_backend(&config);
    let session = QuizSession::new(config, stopwords);
    let mut app = App::new(session, backend, source_files);
    let mut app_state = AppState::Menu;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &mut app_state);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        logger::error(&format!("Terminal loop failed: {}", e));
    }
    Ok(result?)
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    app_state: &mut AppState,
) -> io::Result<()> {
    while !app.should_quit {
        terminal.draw(|f| match app_state {
            AppState::Menu => ui::draw_menu(f, app),
            AppState::Quiz => ui::draw_quiz(f, app),
        })?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match app_state {
                AppState::Menu => handle_menu_input(app, key, app_state),
                AppState::Quiz => handle_quiz_input(app, key, app_state),
            }
        }
    }
    Ok(())
}
