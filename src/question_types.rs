use crate::logger;
use crate::models::{QuestionRecord, QuestionType};
use crate::preprocessing::StopWords;
use rand::Rng;
use rand::seq::SliceRandom;

pub const BLANK: &str = "_____";
const MIN_WORD_LEN: usize = 3;
const MAX_DISTRACTORS: usize = 3;

/// A word picked out of a sentence, with its byte range in that sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentWord {
    pub start: usize,
    pub end: usize,
    pub word: String,
}

impl ContentWord {
    fn replace_in(&self, sentence: &str, with: &str) -> String {
        format!("{}{}{}", &sentence[..self.start], with, &sentence[self.end..])
    }
}

fn word_spans(sentence: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in sentence.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push((s, &sentence[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        spans.push((s, &sentence[s..]));
    }
    spans
}

/// Longest letters-only token of at least three characters that is not a
/// stopword. The first one wins a tie.
pub fn content_word(sentence: &str, stopwords: &StopWords) -> Option<ContentWord> {
    let mut best: Option<ContentWord> = None;

    for (offset, token) in word_spans(sentence) {
        let leading = token.len() - token.trim_start_matches(|c: char| !c.is_alphanumeric()).len();
        let word = token.trim_matches(|c: char| !c.is_alphanumeric());
        let len = word.chars().count();

        if len < MIN_WORD_LEN || !word.chars().all(char::is_alphabetic) || stopwords.contains(word) {
            continue;
        }
        if best.as_ref().is_some_and(|b| b.word.chars().count() >= len) {
            continue;
        }

        let start = offset + leading;
        best = Some(ContentWord {
            start,
            end: start + word.len(),
            word: word.to_string(),
        });
    }

    best
}

fn distractors_for<R: Rng + ?Sized>(
    answer: &str,
    index: usize,
    words: &[Option<ContentWord>],
    rng: &mut R,
) -> Vec<String> {
    let mut pool: Vec<String> = Vec::new();
    for (i, candidate) in words.iter().enumerate() {
        let Some(candidate) = candidate else { continue };
        if i == index || candidate.word.eq_ignore_ascii_case(answer) {
            continue;
        }
        if !pool.iter().any(|w| w.eq_ignore_ascii_case(&candidate.word)) {
            pool.push(candidate.word.clone());
        }
    }
    pool.choose_multiple(rng, MAX_DISTRACTORS).cloned().collect()
}

pub fn fill_blank(sentences: &[String], count: usize, stopwords: &StopWords) -> Vec<QuestionRecord> {
    sentences
        .iter()
        .filter_map(|sentence| {
            let picked = content_word(sentence, stopwords)?;
            Some(QuestionRecord::new(
                picked.replace_in(sentence, BLANK),
                picked.word,
                QuestionType::FillBlank,
            ))
        })
        .take(count)
        .collect()
}

/// Fill-blank stems with the blanked word hidden among up to three words
/// taken from other sentences. Sentences with no usable distractor are
/// skipped.
pub fn multiple_choice<R: Rng + ?Sized>(
    sentences: &[String],
    count: usize,
    stopwords: &StopWords,
    rng: &mut R,
) -> Vec<QuestionRecord> {
    let words: Vec<Option<ContentWord>> =
        sentences.iter().map(|s| content_word(s, stopwords)).collect();
    let mut records = Vec::new();

    for (i, (sentence, picked)) in sentences.iter().zip(&words).enumerate() {
        if records.len() >= count {
            break;
        }
        let Some(picked) = picked else { continue };

        let distractors = distractors_for(&picked.word, i, &words, rng);
        if distractors.is_empty() {
            continue;
        }

        let mut options = vec![picked.word.clone()];
        options.extend(distractors);
        options.shuffle(rng);

        records.push(
            QuestionRecord::new(
                picked.replace_in(sentence, BLANK),
                picked.word.clone(),
                QuestionType::Mcq,
            )
            .with_options(options),
        );
    }

    records
}

pub fn short_answer(sentences: &[String], count: usize, stopwords: &StopWords) -> Vec<QuestionRecord> {
    sentences
        .iter()
        .filter_map(|sentence| {
            let picked = content_word(sentence, stopwords)?;
            Some(QuestionRecord::new(
                format!("What does the text say about \"{}\"?", picked.word),
                sentence.clone(),
                QuestionType::ShortAnswer,
            ))
        })
        .take(count)
        .collect()
}

/// Alternates true statements with false ones built by swapping the
/// content word for a word from another sentence.
pub fn true_false<R: Rng + ?Sized>(
    sentences: &[String],
    count: usize,
    stopwords: &StopWords,
    rng: &mut R,
) -> Vec<QuestionRecord> {
    let words: Vec<Option<ContentWord>> =
        sentences.iter().map(|s| content_word(s, stopwords)).collect();
    let mut records = Vec::new();

    for (i, (sentence, picked)) in sentences.iter().zip(&words).enumerate() {
        if records.len() >= count {
            break;
        }
        let Some(picked) = picked else { continue };

        let make_false = records.len() % 2 == 1;
        let swapped = if make_false {
            distractors_for(&picked.word, i, &words, rng).into_iter().next()
        } else {
            None
        };

        let (statement, answer) = match swapped {
            Some(replacement) => (picked.replace_in(sentence, &replacement), "False"),
            None => (sentence.clone(), "True"),
        };

        records.push(QuestionRecord::new(
            format!("True or False: {}", statement),
            answer,
            QuestionType::TrueFalse,
        ));
    }

    records
}

/// Runs the generator for `kind`. Types without a local generator produce
/// nothing.
pub fn generate<R: Rng + ?Sized>(
    kind: QuestionType,
    sentences: &[String],
    count: usize,
    stopwords: &StopWords,
    rng: &mut R,
) -> Vec<QuestionRecord> {
    if count == 0 {
        return Vec::new();
    }
    match kind {
        QuestionType::FillBlank => fill_blank(sentences, count, stopwords),
        QuestionType::Mcq => multiple_choice(sentences, count, stopwords, rng),
        QuestionType::ShortAnswer => short_answer(sentences, count, stopwords),
        QuestionType::TrueFalse => true_false(sentences, count, stopwords, rng),
        QuestionType::Topic => {
            logger::warn("No local generator for topic questions, skipping");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sentences() -> Vec<String> {
        vec![
            "Python is a programming language.".to_string(),
            "Guido van Rossum created Python in 1991.".to_string(),
            "Python emphasizes readability.".to_string(),
            "Libraries extend the interpreter.".to_string(),
        ]
    }

    #[test]
    fn test_content_word_prefers_longest() {
        let stopwords = StopWords::english();
        let picked = content_word("Python is a programming language.", &stopwords).unwrap();
        assert_eq!(picked.word, "programming");
        assert!(content_word("It is to be.", &stopwords).is_none());
    }

    #[test]
    fn test_content_word_skips_numbers_and_trims_punctuation() {
        let stopwords = StopWords::english();
        let picked = content_word("In 19999999, (readability) won.", &stopwords).unwrap();
        assert_eq!(picked.word, "readability");
        assert_eq!(
            picked.replace_in("In 19999999, (readability) won.", BLANK),
            "In 19999999, (_____) won."
        );
    }

    #[test]
    fn test_fill_blank() {
        let stopwords = StopWords::english();
        let records = fill_blank(&sentences(), 2, &stopwords);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question, "Python is a _____ language.");
        assert_eq!(records[0].answer, "programming");
        assert!(records.iter().all(|r| r.kind == QuestionType::FillBlank));
    }

    #[test]
    fn test_fewer_sentences_than_requested() {
        let stopwords = StopWords::english();
        let records = fill_blank(&sentences()[..1], 10, &stopwords);
        assert_eq!(records.len(), 1);
        assert!(fill_blank(&[], 5, &stopwords).is_empty());
    }

    #[test]
    fn test_multiple_choice_options_contain_answer() {
        let stopwords = StopWords::english();
        let mut rng = StdRng::seed_from_u64(7);
        let records = multiple_choice(&sentences(), 3, &stopwords, &mut rng);
        assert_eq!(records.len(), 3);
        for record in &records {
            let options = record.options.as_ref().unwrap();
            assert!(options.contains(&record.answer));
            assert!(options.len() >= 2 && options.len() <= 4);
            assert!(record.question.contains(BLANK));
        }
    }

    #[test]
    fn test_multiple_choice_skips_without_distractors() {
        let stopwords = StopWords::english();
        let mut rng = StdRng::seed_from_u64(7);
        let single = vec!["Python emphasizes readability.".to_string()];
        assert!(multiple_choice(&single, 1, &stopwords, &mut rng).is_empty());
    }

    #[test]
    fn test_short_answer() {
        let stopwords = StopWords::english();
        let records = short_answer(&sentences(), 1, &stopwords);
        assert_eq!(records[0].question, "What does the text say about \"programming\"?");
        assert_eq!(records[0].answer, "Python is a programming language.");
    }

    #[test]
    fn test_true_false_alternates() {
        let stopwords = StopWords::english();
        let mut rng = StdRng::seed_from_u64(3);
        let records = true_false(&sentences(), 4, &stopwords, &mut rng);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].answer, "True");
        assert_eq!(records[1].answer, "False");
        assert!(records[0].question.starts_with("True or False: "));
        assert_ne!(records[1].question, "True or False: Guido van Rossum created Python in 1991.");
    }

    #[test]
    fn test_generate_topic_is_empty() {
        let stopwords = StopWords::english();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate(QuestionType::Topic, &sentences(), 3, &stopwords, &mut rng).is_empty());
        assert!(generate(QuestionType::FillBlank, &sentences(), 0, &stopwords, &mut rng).is_empty());
    }
}
