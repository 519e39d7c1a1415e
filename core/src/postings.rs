use crate::error::ScoringError;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    /// Raw occurrence count, always at least 1.
    pub frequency: u32,
}

/// How a term frequency and an inverse document frequency combine into a
/// single TF-IDF weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weighting {
    /// `tf * idf`.
    #[default]
    Product,
    /// `tf + idf`. A term that occurs in every document still contributes
    /// its raw frequency.
    Sum,
}

impl Weighting {
    fn combine(self, tf: u32, idf: f64) -> f64 {
        match self {
            Weighting::Product => tf as f64 * idf,
            Weighting::Sum => tf as f64 + idf,
        }
    }
}

/// Inverted index from term to postings, plus the caches derived from it.
///
/// Postings lists are sorted by ascending document id. Document lengths are
/// filled in by the index builder once postings are final. Champion lists
/// are only rebuilt by [`PostingsStore::update_champions`]; replacing the
/// postings marks them stale but keeps serving the old lists.
#[derive(Debug, Default, Clone)]
pub struct PostingsStore {
    postings: HashMap<String, Vec<Posting>>,
    document_count: usize,
    lengths: HashMap<DocId, f64>,
    champions: HashMap<String, Vec<DocId>>,
    champions_stale: bool,
    weighting: Weighting,
}

impl PostingsStore {
    pub fn new(weighting: Weighting) -> Self {
        Self { weighting, ..Self::default() }
    }

    pub fn weighting(&self) -> Weighting { self.weighting }

    /// Replace every postings list and forget cached document lengths.
    ///
    /// `document_count` is the N used by IDF.
    pub(crate) fn replace_postings(&mut self, postings: HashMap<String, Vec<Posting>>, document_count: usize) {
        debug_assert!(postings.values().all(|list| {
            list.windows(2).all(|w| w[0].doc_id < w[1].doc_id) && list.iter().all(|p| p.frequency > 0)
        }));
        self.postings = postings;
        self.document_count = document_count;
        self.lengths.clear();
        self.champions_stale = true;
    }

    pub(crate) fn set_document_lengths(&mut self, lengths: HashMap<DocId, f64>) {
        self.lengths = lengths;
    }

    pub fn contains(&self, term: &str) -> bool { self.postings.contains_key(term) }

    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.postings.get(term).map(Vec::as_slice)
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn document_count(&self) -> usize { self.document_count }

    /// Raw frequency of `term` in `doc`; 0 when the term never occurs there.
    pub fn get_tf(&self, term: &str, doc: DocId) -> u32 {
        self.postings
            .get(term)
            .and_then(|list| list.binary_search_by_key(&doc, |p| p.doc_id).ok().map(|i| list[i].frequency))
            .unwrap_or(0)
    }

    /// Log-dampened frequency, `1 + log10(tf)`, or 0 when the term is absent.
    pub fn get_log_tf(&self, term: &str, doc: DocId) -> f64 {
        match self.get_tf(term, doc) {
            0 => 0.0,
            tf => 1.0 + (tf as f64).log10(),
        }
    }

    pub fn get_document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, Vec::len)
    }

    /// `log10(N / df)`. Undefined, and rejected, for terms no document contains.
    pub fn get_idf(&self, term: &str) -> Result<f64, ScoringError> {
        match self.get_document_frequency(term) {
            0 => Err(ScoringError::UnseenTerm(term.to_string())),
            df => Ok(self.idf_for(df)),
        }
    }

    fn idf_for(&self, df: usize) -> f64 {
        (self.document_count as f64 / df as f64).log10()
    }

    /// TF-IDF weight of `term` in `doc`, 0 when the term does not occur in it.
    pub fn get_tf_idf(&self, term: &str, doc: DocId) -> f64 {
        let Some(list) = self.postings.get(term) else { return 0.0 };
        match list.binary_search_by_key(&doc, |p| p.doc_id) {
            Ok(i) => self.weighting.combine(list[i].frequency, self.idf_for(list.len())),
            Err(_) => 0.0,
        }
    }

    pub fn get_document_length(&self, doc: DocId) -> Result<f64, ScoringError> {
        self.lengths.get(&doc).copied().ok_or(ScoringError::MissingLength(doc))
    }

    /// Ids of all documents containing `term`. Empty for unseen terms.
    pub fn get_documents_with_term(&self, term: &str) -> BTreeSet<DocId> {
        self.postings
            .get(term)
            .map(|list| list.iter().map(|p| p.doc_id).collect())
            .unwrap_or_default()
    }

    /// Rebuild every champion list: the `r` documents with the highest TF-IDF
    /// weight for each term, best first, ties broken by ascending doc id.
    pub fn update_champions(&mut self, r: usize) {
        let mut champions = HashMap::with_capacity(self.postings.len());
        for (term, list) in &self.postings {
            let idf = self.idf_for(list.len());
            let mut weighted: Vec<(DocId, f64)> = list
                .iter()
                .map(|p| (p.doc_id, self.weighting.combine(p.frequency, idf)))
                .collect();
            weighted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            weighted.truncate(r);
            champions.insert(term.clone(), weighted.into_iter().map(|(doc, _)| doc).collect());
        }
        self.champions = champions;
        self.champions_stale = false;
        tracing::debug!(r, terms = self.champions.len(), "champion lists rebuilt");
    }

    pub fn champions(&self, term: &str) -> Option<&[DocId]> {
        self.champions.get(term).map(Vec::as_slice)
    }

    /// True when postings changed after the last champion rebuild.
    pub fn champions_stale(&self) -> bool { self.champions_stale }
}
