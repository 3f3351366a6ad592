//! Tokenized word -> Id-Set index over indexable text/text-document members.

use crate::idset::IdSet;
use dashmap::DashMap;

/// A simple AND/OR search criterion over indexed words.
pub enum Criteria {
    /// Documents containing this exact word.
    Word(String),
    /// Both sub-criteria must hold.
    And(Box<Criteria>, Box<Criteria>),
    /// Either sub-criterion may hold.
    Or(Box<Criteria>, Box<Criteria>),
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Inverted word index over tokenized text.
#[derive(Default)]
pub struct TextIndex {
    words: DashMap<String, IdSet>,
}

impl TextIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize `text` and add `doc_id` to every distinct word's set.
    pub fn insert(&self, doc_id: u32, text: &str) {
        for word in tokenize(text) {
            self.words.entry(word).or_insert_with(IdSet::new).insert(doc_id);
        }
    }

    /// Remove `doc_id` from every word's set it was indexed under in `text`.
    pub fn delete(&self, doc_id: u32, text: &str) {
        for word in tokenize(text) {
            let emptied = {
                let Some(mut set) = self.words.get_mut(&word) else { continue };
                set.remove(doc_id).ok();
                set.count() == 0
            };
            if emptied {
                self.words.remove(&word);
            }
        }
    }

    /// The Id-Set of documents containing `word`.
    pub fn lookup(&self, word: &str) -> IdSet {
        self.words.get(&word.to_lowercase()).map(|v| v.clone()).unwrap_or_default()
    }

    /// Evaluate a criteria tree into the matching document set.
    pub fn eval(&self, criteria: &Criteria) -> IdSet {
        match criteria {
            Criteria::Word(w) => self.lookup(w),
            Criteria::And(a, b) => self.eval(a).intersect(&self.eval(b)),
            Criteria::Or(a, b) => self.eval(a).union(&self.eval(b)),
        }
    }

    /// Number of distinct words indexed.
    pub fn size(&self) -> usize {
        self.words.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_and_indexes_words() {
        let idx = TextIndex::new();
        idx.insert(1, "The quick brown fox");
        idx.insert(2, "quick silver");
        assert_eq!(idx.lookup("quick").count(), 2);
        assert_eq!(idx.lookup("fox").count(), 1);
    }

    #[test]
    fn eval_and_or_combine_sets() {
        let idx = TextIndex::new();
        idx.insert(1, "rust database engine");
        idx.insert(2, "rust parser");
        idx.insert(3, "python database");

        let and = idx.eval(&Criteria::And(Box::new(Criteria::Word("rust".to_string())), Box::new(Criteria::Word("database".to_string()))));
        assert_eq!(and.members(), vec![1]);

        let or = idx.eval(&Criteria::Or(Box::new(Criteria::Word("parser".to_string())), Box::new(Criteria::Word("python".to_string()))));
        assert_eq!(or.members(), vec![2, 3]);
    }

    #[test]
    fn delete_removes_doc_from_its_words() {
        let idx = TextIndex::new();
        idx.insert(1, "alpha beta");
        idx.delete(1, "alpha beta");
        assert_eq!(idx.size(), 0);
    }
}
