use crate::DocId;
use std::collections::{BTreeSet, HashMap};

/// Assigns dense document ids to URLs.
///
/// Ids start at 0 and follow first-sighting order. They are never reused or
/// renumbered, and adding a URL that is already known returns its id.
///
/// At most `DocId::MAX + 1` URLs fit; see [`Vocabulary::add`].
#[derive(Debug, Default, Clone)]
pub struct Vocabulary {
    urls: Vec<String>,
    ids: HashMap<String, DocId>,
}

impl Vocabulary {
    pub fn new() -> Self { Self::default() }

    /// # Panics
    ///
    /// Panics when every [`DocId`] is already taken, rather than handing out
    /// an id twice.
    pub fn add(&mut self, url: &str) -> DocId {
        if let Some(&id) = self.ids.get(url) {
            return id;
        }
        let id = id_at(self.urls.len());
        self.urls.push(url.to_string());
        self.ids.insert(url.to_string(), id);
        id
    }

    pub fn get(&self, id: DocId) -> Option<&str> {
        self.urls.get(id as usize).map(String::as_str)
    }

    pub fn get_id(&self, url: &str) -> Option<DocId> {
        self.ids.get(url).copied()
    }

    /// All assigned ids. Used as the universe when a query negates a term.
    pub fn get_document_ids(&self) -> BTreeSet<DocId> {
        (0..self.urls.len()).map(id_at).collect()
    }

    pub fn len(&self) -> usize { self.urls.len() }

    pub fn is_empty(&self) -> bool { self.urls.is_empty() }
}

fn id_at(position: usize) -> DocId {
    match DocId::try_from(position) {
        Ok(id) => id,
        Err(_) => panic!("vocabulary is full: {position} exceeds the largest document id {}", DocId::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_insertion_order() {
        let mut v = Vocabulary::new();
        assert_eq!(v.add("http://a"), 0);
        assert_eq!(v.add("http://b"), 1);
        assert_eq!(v.add("http://a"), 0);
        assert_eq!(v.len(), 2);
        assert_eq!(v.get(1), Some("http://b"));
        assert_eq!(v.get(2), None);
        assert_eq!(v.get_id("http://b"), Some(1));
    }

    #[test]
    fn document_ids_cover_every_assignment() {
        let mut v = Vocabulary::new();
        assert!(v.get_document_ids().is_empty());
        v.add("x");
        v.add("y");
        v.add("x");
        assert_eq!(v.get_document_ids().into_iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn last_id_is_the_largest_doc_id() {
        assert_eq!(id_at(DocId::MAX as usize), DocId::MAX);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "vocabulary is full")]
    fn ids_are_never_truncated() {
        id_at(DocId::MAX as usize + 1);
    }
}
