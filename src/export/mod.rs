pub mod csv;
pub mod markdown;
pub mod pdf;
pub mod text;

use crate::error::{QuizError, Result};
use crate::logger;
use crate::models::QuestionRecord;
use std::fs;
use std::path::{Path, PathBuf};

pub use csv::{parse_csv, to_csv};
pub use markdown::render_quiz;
pub use pdf::{clean_text_for_pdf, render_pdf};
pub use text::to_text;

pub const EXPORT_STEM: &str = "generated_quiz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Md,
    Csv,
    Txt,
    Pdf,
}

impl ExportFormat {
    /// Case-insensitive lookup; anything unrecognised falls back to Markdown.
    pub fn from_name(name: &str) -> Self {
        match name.trim().trim_start_matches('.').to_lowercase().as_str() {
            "md" | "markdown" => ExportFormat::Md,
            "csv" => ExportFormat::Csv,
            "txt" | "text" => ExportFormat::Txt,
            "pdf" => ExportFormat::Pdf,
            other => {
                logger::warn(&format!("Unknown export format '{}', using md", other));
                ExportFormat::Md
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Md => "md",
            ExportFormat::Csv => "csv",
            ExportFormat::Txt => "txt",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn filename(&self) -> String {
        format!("{}.{}", EXPORT_STEM, self.extension())
    }
}

/// Serialises the quiz in `format`. Markdown re-emits `rendered_markdown`
/// unless it is empty. `pdf_font` is an extra TrueType font consulted for
/// characters the bundled PDF fonts lack.
pub fn render(
    format: ExportFormat,
    questions: &[QuestionRecord],
    rendered_markdown: &str,
    pdf_font: Option<&Path>,
) -> Result<Vec<u8>> {
    let markdown = if rendered_markdown.trim().is_empty() {
        render_quiz(questions)
    } else {
        rendered_markdown.to_string()
    };

    match format {
        ExportFormat::Md => Ok(markdown.into_bytes()),
        ExportFormat::Csv => Ok(to_csv(questions).into_bytes()),
        ExportFormat::Txt => Ok(to_text(questions).into_bytes()),
        ExportFormat::Pdf => {
            let fallback = pdf_font
                .map(|path| {
                    fs::read(path).map_err(|e| {
                        QuizError::Pdf(format!("cannot read font {}: {}", path.display(), e))
                    })
                })
                .transpose()?;
            render_pdf(&markdown, fallback.as_deref())
        }
    }
}

/// Writes the export into `dir` and returns the full path.
pub fn write_export(
    format: ExportFormat,
    questions: &[QuestionRecord],
    rendered_markdown: &str,
    dir: &Path,
    pdf_font: Option<&Path>,
) -> Result<PathBuf> {
    let bytes = render(format, questions, rendered_markdown, pdf_font)?;
    if !dir.as_os_str().is_empty() && !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    let path = dir.join(format.filename());
    fs::write(&path, bytes)?;
    logger::info(&format!("Exported quiz to {}", path.display()));
    Ok(path)
}
