use crate::postings::{Posting, PostingsStore, Weighting};
use crate::tokenizer::Tokenizer;
use crate::vocabulary::Vocabulary;
use crate::DocId;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// A document vocabulary and the postings built over it.
///
/// Building is a single-writer batch step ([`Index::index_corpus`]); once it
/// returns, the index can be shared read-only between any number of query
/// evaluations.
#[derive(Debug, Default, Clone)]
pub struct Index {
    vocabulary: Vocabulary,
    postings: PostingsStore,
    tokenizer: Tokenizer,
}

impl Index {
    pub fn new() -> Self { Self::default() }

    pub fn with_options(tokenizer: Tokenizer, weighting: Weighting) -> Self {
        Self { vocabulary: Vocabulary::new(), postings: PostingsStore::new(weighting), tokenizer }
    }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }

    pub fn postings(&self) -> &PostingsStore { &self.postings }

    pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }

    /// Index a corpus of `(url, text)` pairs, replacing any previous postings.
    ///
    /// Document ids are handed out in iteration order, so a corpus without a
    /// stable order gives consistent but not reproducible ids. URLs seen by an
    /// earlier build keep their ids and still count towards N for IDF. A URL
    /// listed twice keeps its first id and its last text.
    /// Champion lists are left untouched and marked stale.
    pub fn index_corpus<I, U, T>(&mut self, corpus: I)
    where
        I: IntoIterator<Item = (U, T)>,
        U: AsRef<str>,
        T: AsRef<str>,
    {
        let mut documents: Vec<(DocId, Vec<String>)> = Vec::new();
        let mut slots: HashMap<DocId, usize> = HashMap::new();
        for (url, text) in corpus {
            let doc_id = self.vocabulary.add(url.as_ref());
            let tokens = self.tokenizer.tokenize(text.as_ref());
            match slots.entry(doc_id) {
                Entry::Occupied(slot) => documents[*slot.get()].1 = tokens,
                Entry::Vacant(slot) => {
                    slot.insert(documents.len());
                    documents.push((doc_id, tokens));
                }
            }
        }

        let mut pairs: Vec<(&str, DocId)> = documents
            .iter()
            .flat_map(|(doc_id, tokens)| tokens.iter().map(move |t| (t.as_str(), *doc_id)))
            .collect();
        pairs.sort();

        // Pairs are sorted by (term, doc), so each term is one run and each
        // repeated (term, doc) pair sits right after the previous one.
        let mut term_postings: HashMap<String, Vec<Posting>> = HashMap::new();
        for run in pairs.chunk_by(|a, b| a.0 == b.0) {
            let mut list: Vec<Posting> = Vec::new();
            for &(_, doc_id) in run {
                match list.last_mut() {
                    Some(last) if last.doc_id == doc_id => last.frequency += 1,
                    _ => list.push(Posting { doc_id, frequency: 1 }),
                }
            }
            term_postings.insert(run[0].0.to_string(), list);
        }
        let num_terms = term_postings.len();
        self.postings.replace_postings(term_postings, self.vocabulary.len());

        // Lengths read the final postings, so they have to come last.
        let mut lengths: HashMap<DocId, f64> = HashMap::with_capacity(documents.len());
        for (doc_id, tokens) in &documents {
            let mut terms: Vec<&str> = tokens.iter().map(String::as_str).collect();
            terms.sort_unstable();
            terms.dedup();
            let squared: f64 = terms.iter().map(|t| self.postings.get_tf_idf(t, *doc_id).powi(2)).sum();
            lengths.insert(*doc_id, squared.sqrt());
        }
        self.postings.set_document_lengths(lengths);

        tracing::info!(num_docs = documents.len(), num_terms, "index build complete");
    }

    /// Rebuild champion lists with the top `r` documents per term.
    pub fn update_champions(&mut self, r: usize) {
        self.postings.update_champions(r);
    }
}
