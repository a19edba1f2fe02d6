use crate::error::Result;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "inc", "ltd", "co", "corp",
    "dept", "fig", "vol", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct",
    "nov", "dec", "mt", "gen", "col", "lt", "sgt", "rev", "approx",
];

/// Lowercase stopword set. Built once per process and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn english() -> Self {
        Self {
            words: ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// The embedded English list, extended with one word per line from
    /// `extra` when given. Blank lines and `#` comments are skipped.
    pub fn load(extra: Option<&Path>) -> Result<Self> {
        let mut stopwords = Self::english();
        if let Some(path) = extra {
            let content = std::fs::read_to_string(path)?;
            stopwords.words.extend(
                content
                    .lines()
                    .map(|line| line.trim())
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .map(|line| line.to_lowercase()),
            );
        }
        Ok(stopwords)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(|w| w.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Preprocessor {
    stopwords: Arc<StopWords>,
}

impl Preprocessor {
    pub fn new(stopwords: Arc<StopWords>) -> Self {
        Self { stopwords }
    }

    pub fn sentences(&self, text: &str) -> Vec<String> {
        split_sentences(text)
    }

    pub fn stopwords(&self) -> &StopWords {
        &self.stopwords
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '”' | '’' | '»')
}

/// The whitespace-delimited token that ends right before `end` (byte index),
/// without leading brackets or quotes.
fn token_before(text: &str, end: usize) -> &str {
    let head = &text[..end];
    let start = head
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    head[start..].trim_start_matches(['(', '[', '"', '\'', '“', '‘', '«'])
}

fn is_abbreviation(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    let lower = token.to_lowercase();
    if ABBREVIATIONS.contains(&lower.as_str()) {
        return true;
    }
    let mut chars = token.chars();
    if let (Some(first), None) = (chars.next(), chars.next())
        && first.is_alphabetic()
        && first.is_uppercase()
    {
        return true;
    }
    // e.g / i.e / U.S / Ph.D
    token.contains('.')
        && token
            .split('.')
            .all(|seg| !seg.is_empty() && seg.chars().count() <= 2 && seg.chars().all(char::is_alphabetic))
}

/// Rule-based sentence splitter. A run of terminal punctuation (plus any
/// closing quotes or brackets) followed by whitespace ends a sentence,
/// unless the single period belongs to an abbreviation or initial, or an
/// ellipsis is followed by a lowercase word. Sentences are trimmed but
/// otherwise verbatim.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let byte_at = |idx: usize| chars.get(idx).map(|(b, _)| *b).unwrap_or(text.len());

    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if !is_terminal(chars[i].1) {
            i += 1;
            continue;
        }

        let run_start = i;
        let mut run_end = i;
        while run_end < chars.len() && is_terminal(chars[run_end].1) {
            run_end += 1;
        }
        let mut j = run_end;
        while j < chars.len() && is_closing(chars[j].1) {
            j += 1;
        }

        if j >= chars.len() || !chars[j].1.is_whitespace() {
            i = j.max(i + 1);
            continue;
        }

        let next_word = chars[j..].iter().map(|(_, c)| *c).find(|c| !c.is_whitespace());
        let Some(next_char) = next_word else {
            break;
        };

        let run: String = chars[run_start..run_end].iter().map(|(_, c)| *c).collect();
        let boundary = if run == "." {
            !is_abbreviation(token_before(text, byte_at(run_start)))
        } else if run.contains("..") || run.contains('…') {
            !next_char.is_lowercase()
        } else {
            true
        };

        if boundary {
            let sentence = text[start..byte_at(j)].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = byte_at(j);
        }
        i = j;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }

    sentences
}

/// Lowercase word tokens: letters, digits and inner apostrophes or hyphens.
pub fn tokenize_words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .map(|w| w.trim_matches(|c: char| c == '\'' || c == '-'))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}
