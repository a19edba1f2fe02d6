use crate::error::{QuizError, Result};
use crate::logger;
use crate::models::SourceKind;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const FETCH_TIMEOUT_SECS: u64 = 20;
const SOURCE_EXTENSIONS: &[&str] = &["txt", "md"];

lazy_static::lazy_static! {
    static ref SCRIPT_RE: Option<Regex> = Regex::new(r"(?is)<script[^>]*>.*?</script>").ok();
    static ref STYLE_RE: Option<Regex> = Regex::new(r"(?is)<style[^>]*>.*?</style>").ok();
    static ref BLOCK_TAG_RE: Option<Regex> =
        Regex::new(r"(?i)</?(p|div|br|li|h[1-6]|tr|section|article)[^>]*>").ok();
    static ref TAG_RE: Option<Regex> = Regex::new(r"<[^>]+>").ok();
    static ref SPACES_RE: Option<Regex> = Regex::new(r"[ \t\x0B\f]+").ok();
    static ref BLANK_LINES_RE: Option<Regex> = Regex::new(r"\n\s*\n+").ok();
}

/// Turns a source description into raw text.
pub fn load_source(kind: SourceKind, input: &str) -> Result<String> {
    match kind {
        SourceKind::Text => Ok(input.to_string()),
        SourceKind::File => read_text_file(Path::new(input.trim())),
        SourceKind::Url => fetch_url(input.trim()),
    }
}

/// Reads a file as UTF-8, silently dropping invalid byte sequences.
pub fn read_text_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    Ok(text)
}

pub fn fetch_url(url: &str) -> Result<String> {
    logger::info(&format!("Fetching source from {}", url));
    let fetch_err = |reason: String| QuizError::Fetch {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()
        .map_err(|e| fetch_err(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| fetch_err(e.to_string()))?;

    let is_html = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("html"))
        .unwrap_or(false);

    let body = response.text().map_err(|e| fetch_err(e.to_string()))?;

    if is_html || body.trim_start().starts_with('<') {
        Ok(html_to_text(&body))
    } else {
        Ok(body)
    }
}

fn replace(re: &Option<Regex>, text: &str, with: &str) -> String {
    match re {
        Some(re) => re.replace_all(text, with).into_owned(),
        None => text.to_string(),
    }
}

/// Reduces an HTML document to readable text: scripts and styles are
/// removed, block tags become line breaks, other tags vanish.
pub fn html_to_text(html: &str) -> String {
    let text = replace(&SCRIPT_RE, html, " ");
    let text = replace(&STYLE_RE, &text, " ");
    let text = replace(&BLOCK_TAG_RE, &text, "\n");
    let text = replace(&TAG_RE, &text, "");
    let text = decode_entities(&text);
    let text = replace(&SPACES_RE, &text, " ");
    let text = replace(&BLANK_LINES_RE, &text, "\n\n");

    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Source documents offered by the TUI menu, sorted by path.
pub fn list_source_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if dir.is_dir()
        && let Ok(entries) = fs::read_dir(dir)
    {
        for entry in entries.flatten() {
            let path = entry.path();
            if let Some(ext) = path.extension().and_then(|e| e.to_str())
                && SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
            {
                files.push(path);
            }
        }
    }

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_source_is_verbatim() {
        let text = "  Python is great.\n";
        assert_eq!(load_source(SourceKind::Text, text).unwrap(), text);
    }

    #[test]
    fn test_file_source_drops_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let mut bytes = "Café au lait. ".as_bytes().to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice("Second sentence.".as_bytes());
        fs::write(&path, bytes).unwrap();

        let text = load_source(SourceKind::File, path.to_str().unwrap()).unwrap();
        assert_eq!(text, "Café au lait. Second sentence.");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_source(SourceKind::File, "/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, QuizError::Io(_)));
    }

    #[test]
    fn test_html_to_text() {
        let html = "<html><head><style>p { color: red; }</style>\
                    <script>alert('x');</script></head>\
                    <body><h1>Python</h1><p>Python is a language &amp; a tool.</p>\
                    <p>It was created by Guido.</p></body></html>";
        let text = html_to_text(html);
        assert!(text.contains("Python is a language & a tool."));
        assert!(text.contains("It was created by Guido."));
        assert!(!text.contains("alert"));
        assert!(!text.contains("color"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_list_source_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.md"), "a").unwrap();
        fs::write(dir.path().join("c.csv"), "c").unwrap();

        let files = list_source_files(dir.path());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.md", "b.txt"]);
    }

    #[test]
    fn test_list_source_files_missing_dir() {
        assert!(list_source_files(Path::new("/no/such/dir")).is_empty());
    }
}
