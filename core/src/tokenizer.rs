use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Tokens shorter than this (in chars) are dropped by the filtering analyzers.
pub const MIN_TOKEN_LEN: usize = 2;

/// Field-level normalization applied at ingestion and to every query string.
/// Absent values normalize to the empty string.
pub fn normalize(raw: Option<&str>) -> String {
    raw.map(str::to_lowercase).unwrap_or_default()
}

/// Turns normalized text into indexable `(term, position)` pairs.
///
/// An index records which analyzer produced its terms (see [`AnalyzerConfig`]),
/// and queries against it must go through the same one.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Vec<(String, usize)>;
}

/// Word splitting with no filtering. Expects already-folded input.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseAnalyzer;

impl Analyzer for LowercaseAnalyzer {
    fn analyze(&self, text: &str) -> Vec<(String, usize)> {
        words(text).map(|(pos, w)| (w.to_string(), pos)).collect()
    }
}

/// Stopword removal, minimum length, and optional English stemming over
/// already-folded input.
#[derive(Debug, Clone)]
pub struct FilteringAnalyzer {
    stem: bool,
    stopwords: Option<HashSet<String>>,
}

impl FilteringAnalyzer {
    pub fn stemming() -> Self {
        Self { stem: true, stopwords: None }
    }

    pub fn standard() -> Self {
        Self { stem: false, stopwords: None }
    }

    /// Replace the built-in English stopword list.
    pub fn with_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stopwords = Some(words.into_iter().map(|w| w.as_ref().to_lowercase()).collect());
        self
    }

    fn is_stopword(&self, token: &str) -> bool {
        match &self.stopwords {
            Some(custom) => custom.contains(token),
            None => STOPWORDS.contains(token),
        }
    }
}

impl Analyzer for FilteringAnalyzer {
    fn analyze(&self, text: &str) -> Vec<(String, usize)> {
        let mut tokens = Vec::new();
        for (pos, token) in words(text) {
            if token.chars().count() < MIN_TOKEN_LEN || self.is_stopword(token) {
                continue;
            }
            let term = if self.stem { STEMMER.stem(token).to_string() } else { token.to_string() };
            tokens.push((term, pos));
        }
        tokens
    }
}

fn words(text: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    RE.find_iter(text).enumerate().map(|(pos, m)| (pos, m.as_str()))
}

/// Tokenize text into (term, position) using NFKC normalization, lowercase, stopword removal, and stemming.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    FilteringAnalyzer::stemming().analyze(&fold(text))
}

fn fold(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

/// Persisted description of the analyzer an index was built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalyzerConfig {
    Stemming {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stopwords: Option<Vec<String>>,
    },
    Standard,
    Lowercase,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig::Stemming { stopwords: None }
    }
}

impl AnalyzerConfig {
    pub fn build(&self) -> Box<dyn Analyzer> {
        match self {
            AnalyzerConfig::Stemming { stopwords: None } => Box::new(Folding(FilteringAnalyzer::stemming())),
            AnalyzerConfig::Stemming { stopwords: Some(words) } => {
                Box::new(Folding(FilteringAnalyzer::stemming().with_stopwords(words)))
            }
            AnalyzerConfig::Standard => Box::new(Folding(FilteringAnalyzer::standard())),
            AnalyzerConfig::Lowercase => Box::new(Folding(LowercaseAnalyzer)),
        }
    }
}

/// Applies NFKC + lowercase before delegating.
struct Folding<A>(A);

impl<A: Analyzer> Analyzer for Folding<A> {
    fn analyze(&self, text: &str) -> Vec<(String, usize)> {
        self.0.analyze(&fold(text))
    }
}
