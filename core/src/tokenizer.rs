use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*|\p{N}+").expect("valid regex");
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

/// Turns raw text into index terms.
///
/// Text is NFKC-normalized and lowercased before words are extracted, so
/// `Café` and `café` become the same term. Stemming and stopword removal are
/// opt-in; the same settings must be used for indexing and querying, which
/// is why [`crate::Index`] owns its tokenizer and the query evaluator
/// tokenizes query words with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tokenizer {
    pub stem: bool,
    pub remove_stopwords: bool,
}

impl Tokenizer {
    pub fn new() -> Self { Self::default() }

    pub fn with_stemming(mut self, stem: bool) -> Self {
        self.stem = stem;
        self
    }

    pub fn with_stopwords_removed(mut self, remove: bool) -> Self {
        self.remove_stopwords = remove;
        self
    }

    /// Tokenize text into terms, in document order.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        RE.find_iter(&normalized)
            .filter_map(|mat| self.finish(mat.as_str()))
            .collect()
    }

    /// Normalize a word that should name exactly one index term.
    ///
    /// Returns `None` when the word produces no term (a stopword, or
    /// punctuation only) or splits into several, as `foo-bar` does.
    pub fn normalize_term(&self, word: &str) -> Option<String> {
        let mut terms = self.tokenize(word).into_iter();
        match (terms.next(), terms.next()) {
            (Some(term), None) => Some(term),
            _ => None,
        }
    }

    fn finish(&self, token: &str) -> Option<String> {
        if self.remove_stopwords && is_stopword(token) {
            return None;
        }
        if self.stem {
            Some(STEMMER.stem(token).into_owned())
        } else {
            Some(token.to_string())
        }
    }
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }
