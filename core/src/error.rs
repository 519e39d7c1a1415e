use crate::lexer::Token;
use crate::DocId;
use std::path::PathBuf;

/// A boolean query that could not be parsed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("empty query")]
    EmptyQuery,
    #[error("unexpected right parenthesis")]
    UnexpectedRightParen,
    #[error("expected right parenthesis")]
    MissingRightParen,
    #[error("expected a term after operator {0}")]
    DanglingOperator(Token),
    #[error("unexpected token {0}")]
    UnexpectedToken(Token),
    #[error("unexpected end of query")]
    UnexpectedEnd,
    #[error("query nests deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// IDF is undefined for a term that occurs in no document.
    #[error("term {0:?} does not occur in any document")]
    UnseenTerm(String),
    #[error("no document length cached for document {0}")]
    MissingLength(DocId),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShingleError {
    #[error("sketch size {len} is not divisible by group size {k}")]
    SizeMismatch { len: usize, k: usize },
    #[error("shingle width must be at least 1")]
    ZeroWidth,
    #[error("super-shingle group size must be at least 1")]
    ZeroGroup,
}

#[derive(thiserror::Error, Debug)]
pub enum CorpusError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed document in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("walking {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("{0} is neither a .json/.jsonl file nor a directory")]
    UnsupportedInput(PathBuf),
}
