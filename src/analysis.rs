use crate::preprocessing::{StopWords, split_sentences, tokenize_words};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

pub const LDA_SEED: u64 = 42;
const LDA_ITERATIONS: usize = 200;
const LDA_ALPHA: f64 = 0.1;
const LDA_BETA: f64 = 0.01;
const TOPIC_WORDS: usize = 10;

const NAME_CONNECTORS: &[&str] = &["van", "von", "de", "der", "den", "da", "di", "del", "la", "le", "of", "bin"];
const PERSON_TITLES: &[&str] = &["Mr", "Mrs", "Ms", "Dr", "Prof", "Sir"];
const ORG_SUFFIXES: &[&str] = &[
    "Inc", "Corp", "Corporation", "Company", "Ltd", "University", "Institute", "Foundation",
    "Association", "Organization", "Organisation", "Agency", "Labs", "Society", "Group",
];
const MONTHS: &[&str] = &[
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    pub term: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topic {
    pub words: Vec<String>,
}

/// Keyword, entity and topic extraction over raw text.
pub trait TextAnalyzer {
    fn keywords(&self, text: &str, top_n: usize) -> Vec<Keyword>;
    fn entities(&self, text: &str) -> Vec<Entity>;
    fn topics(&self, text: &str, n_topics: usize) -> Vec<Topic>;
}

/// TF-IDF keywords, capitalisation-based entities and Gibbs-sampled LDA,
/// all treating each sentence as a document.
#[derive(Debug, Clone)]
pub struct StatisticalAnalyzer {
    stopwords: Arc<StopWords>,
    seed: u64,
    iterations: usize,
}

impl StatisticalAnalyzer {
    pub fn new(stopwords: Arc<StopWords>) -> Self {
        Self {
            stopwords,
            seed: LDA_SEED,
            iterations: LDA_ITERATIONS,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn documents(&self, text: &str) -> Vec<Vec<String>> {
        split_sentences(text)
            .iter()
            .map(|sentence| {
                tokenize_words(sentence)
                    .into_iter()
                    .filter(|w| {
                        w.chars().count() >= 2
                            && w.chars().any(char::is_alphabetic)
                            && !self.stopwords.contains(w)
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|doc| !doc.is_empty())
            .collect()
    }
}

impl TextAnalyzer for StatisticalAnalyzer {
    fn keywords(&self, text: &str, top_n: usize) -> Vec<Keyword> {
        let docs = self.documents(text);
        if docs.is_empty() || top_n == 0 {
            return Vec::new();
        }

        let n = docs.len() as f64;
        let mut df: HashMap<&str, usize> = HashMap::new();
        for doc in &docs {
            let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let mut scores: HashMap<&str, f64> = HashMap::new();
        for doc in &docs {
            let len = doc.len() as f64;
            let mut tf: HashMap<&str, usize> = HashMap::new();
            for term in doc {
                *tf.entry(term.as_str()).or_insert(0) += 1;
            }
            for (term, count) in tf {
                let idf = ((1.0 + n) / (1.0 + df[term] as f64)).ln() + 1.0;
                *scores.entry(term).or_insert(0.0) += (count as f64 / len) * idf;
            }
        }

        let mut ranked: Vec<Keyword> = scores
            .into_iter()
            .map(|(term, score)| Keyword {
                term: term.to_string(),
                score,
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.term.cmp(&b.term)));
        ranked.truncate(top_n);
        ranked
    }

    fn entities(&self, text: &str) -> Vec<Entity> {
        let sentences = split_sentences(text);
        let tokenized: Vec<Vec<&str>> = sentences
            .iter()
            .map(|s| s.split_whitespace().collect())
            .collect();

        // Capitalised words seen away from the start of a sentence are
        // trusted when they also open one.
        let mut mid_sentence_caps: HashSet<&str> = HashSet::new();
        for tokens in &tokenized {
            for token in tokens.iter().skip(1) {
                let word = strip(token);
                if is_capitalized(word) {
                    mid_sentence_caps.insert(word);
                }
            }
        }

        let mut seen = HashSet::new();
        let mut entities = Vec::new();
        let mut push = |entity: Entity| {
            if seen.insert(entity.clone()) {
                entities.push(entity);
            }
        };

        for tokens in &tokenized {
            let mut i = 0;
            while i < tokens.len() {
                let word = strip(tokens[i]);

                if is_year(word) {
                    push(Entity {
                        text: word.to_string(),
                        label: "DATE".to_string(),
                    });
                    i += 1;
                    continue;
                }

                if !is_capitalized(word) {
                    i += 1;
                    continue;
                }

                let start = i;
                let mut run = vec![word];
                let mut closed = ends_run(tokens[i]);
                i += 1;
                while !closed && i < tokens.len() {
                    let next = strip(tokens[i]);
                    if is_capitalized(next) {
                        run.push(next);
                        closed = ends_run(tokens[i]);
                        i += 1;
                    } else if NAME_CONNECTORS.contains(&next)
                        && i + 1 < tokens.len()
                        && !ends_run(tokens[i])
                        && is_capitalized(strip(tokens[i + 1]))
                    {
                        run.push(next);
                        i += 1;
                    } else {
                        break;
                    }
                }

                while run.first().is_some_and(|w| self.stopwords.contains(w)) {
                    run.remove(0);
                }
                if run.is_empty() {
                    continue;
                }

                if start == 0 && run.len() == 1 {
                    let only = run[0];
                    let trusted = mid_sentence_caps.contains(only) || is_acronym(only);
                    if !trusted {
                        continue;
                    }
                }

                push(classify(&run));
            }
        }

        entities
    }

    fn topics(&self, text: &str, n_topics: usize) -> Vec<Topic> {
        let docs = self.documents(text);
        if docs.is_empty() || n_topics == 0 {
            return Vec::new();
        }

        let vocab: Vec<String> = docs
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: HashMap<&str, usize> = vocab
            .iter()
            .enumerate()
            .map(|(i, w)| (w.as_str(), i))
            .collect();
        let docs: Vec<Vec<usize>> = docs
            .iter()
            .map(|doc| doc.iter().map(|w| index[w.as_str()]).collect())
            .collect();

        let k = n_topics;
        let v = vocab.len();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut doc_topic = vec![vec![0usize; k]; docs.len()];
        let mut topic_word = vec![vec![0usize; v]; k];
        let mut topic_total = vec![0usize; k];
        let mut assignments: Vec<Vec<usize>> = Vec::with_capacity(docs.len());

        for (d, doc) in docs.iter().enumerate() {
            let mut z = Vec::with_capacity(doc.len());
            for &w in doc {
                let t = rng.gen_range(0..k);
                doc_topic[d][t] += 1;
                topic_word[t][w] += 1;
                topic_total[t] += 1;
                z.push(t);
            }
            assignments.push(z);
        }

        let mut weights = vec![0.0f64; k];
        for _ in 0..self.iterations {
            for (d, doc) in docs.iter().enumerate() {
                for (i, &w) in doc.iter().enumerate() {
                    let old = assignments[d][i];
                    doc_topic[d][old] -= 1;
                    topic_word[old][w] -= 1;
                    topic_total[old] -= 1;

                    let mut total = 0.0;
                    for t in 0..k {
                        let weight = (doc_topic[d][t] as f64 + LDA_ALPHA)
                            * (topic_word[t][w] as f64 + LDA_BETA)
                            / (topic_total[t] as f64 + v as f64 * LDA_BETA);
                        total += weight;
                        weights[t] = total;
                    }

                    let draw = rng.gen_range(0.0..total);
                    let new = weights.iter().position(|&c| draw < c).unwrap_or(k - 1);

                    doc_topic[d][new] += 1;
                    topic_word[new][w] += 1;
                    topic_total[new] += 1;
                    assignments[d][i] = new;
                }
            }
        }

        topic_word
            .iter()
            .map(|counts| {
                let mut ranked: Vec<(usize, usize)> = counts
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| **c > 0)
                    .map(|(w, c)| (w, *c))
                    .collect();
                ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
                Topic {
                    words: ranked
                        .into_iter()
                        .take(TOPIC_WORDS)
                        .map(|(w, _)| vocab[w].clone())
                        .collect(),
                }
            })
            .filter(|topic| !topic.words.is_empty())
            .collect()
    }
}

fn strip(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

fn ends_run(token: &str) -> bool {
    token.ends_with([',', '.', ';', ':', '!', '?', ')', '"'])
}

fn is_capitalized(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_uppercase()) && word.chars().all(char::is_alphabetic)
}

fn is_acronym(word: &str) -> bool {
    word.chars().count() >= 2 && word.chars().all(|c| c.is_ascii_uppercase())
}

fn is_year(word: &str) -> bool {
    word.len() == 4
        && word.chars().all(|c| c.is_ascii_digit())
        && word.parse::<u32>().is_ok_and(|y| (1000..=2100).contains(&y))
}

fn classify(run: &[&str]) -> Entity {
    let text = run.join(" ");
    let first = run[0];
    let last = run[run.len() - 1];

    let label = if run.len() == 1 && MONTHS.contains(&first) {
        "DATE"
    } else if ORG_SUFFIXES.contains(&last) || (run.len() == 1 && is_acronym(first)) {
        "ORG"
    } else if PERSON_TITLES.contains(&first)
        || (run.len() >= 2 && run.len() <= 4 && !run.iter().any(|w| MONTHS.contains(w)))
    {
        "PERSON"
    } else {
        "MISC"
    };

    Entity {
        text,
        label: label.to_string(),
    }
}
