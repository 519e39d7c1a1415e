//! Boolean retrieval over an in-memory inverted index.
//!
//! Documents are identified by URL and assigned dense ids by the
//! [`Vocabulary`]. The [`PostingsStore`] keeps raw term frequencies and
//! derives TF-IDF scores, document lengths and champion lists from them.
//! Queries such as `(rust AND search) OR NOT java` are evaluated by
//! [`query::evaluate`] into a set of matching document ids.

pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod lexer;
pub mod postings;
pub mod query;
pub mod shingles;
pub mod tokenizer;
pub mod vocabulary;

pub type DocId = u32;

pub use error::{CorpusError, QueryError, ScoringError, ShingleError};
pub use index::Index;
pub use postings::{Posting, PostingsStore, Weighting};
pub use tokenizer::Tokenizer;
pub use vocabulary::Vocabulary;
