//! Query composition with randomized disambiguation tokens.

use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;

use super::SamplerError;

const BUILTIN_STOPWORDS: &str = include_str!("../../data/stopwords.txt");

/// A non-empty list of common words used as disambiguation tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stopwords {
    words: Vec<String>,
}

impl Stopwords {
    /// The bundled English stopword list
    pub fn builtin() -> Self {
        Self {
            words: parse_words(BUILTIN_STOPWORDS),
        }
    }

    /// Build from an explicit list; blank entries are dropped
    pub fn new<I, S>(words: I) -> Result<Self, SamplerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return Err(SamplerError::Config("stopword list is empty".to_string()));
        }
        Ok(Self { words })
    }

    /// Load a flat list, one word per line; `#` starts a comment line
    pub fn load(path: &Path) -> Result<Self, SamplerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SamplerError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::new(parse_words(&content))
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        // never empty, see constructors
        self.words.choose(rng).map(String::as_str).unwrap_or("the")
    }
}

impl Default for Stopwords {
    fn default() -> Self {
        Self::builtin()
    }
}

fn parse_words(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Builds query strings, perturbing them with random tokens so repeated
/// calls surface different records.
#[derive(Debug, Clone, Default)]
pub struct QueryComposer {
    stopwords: Stopwords,
}

impl QueryComposer {
    pub fn new(stopwords: Stopwords) -> Self {
        Self { stopwords }
    }

    pub fn stopwords(&self) -> &Stopwords {
        &self.stopwords
    }

    /// Compose a query.
    ///
    /// Without a base query the result is a quoted random stopword. With one,
    /// a quoted random stopword (`add_word`) or a quoted two-digit number in
    /// `01..=99` (`add_number`) is appended; the word wins if both are set.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        base: Option<&str>,
        add_word: bool,
        add_number: bool,
    ) -> String {
        let base = base.map(str::trim).filter(|b| !b.is_empty());
        match base {
            None => format!("\"{}\"", self.stopwords.choose(rng)),
            Some(base) if add_word => format!("{} \"{}\"", base, self.stopwords.choose(rng)),
            Some(base) if add_number => format!("{} \"{:02}\"", base, rng.gen_range(1..100)),
            Some(base) => base.to_string(),
        }
    }
}
