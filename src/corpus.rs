//! Bag-of-words documents.
//!
//! The sampler only needs to know which terms occur in a document and how
//! often. Anything that can list its `(term, count)` pairs can be used as a
//! document through the [`Document`] trait.

use std::collections::BTreeMap;

/// A document as a sparse vector of term counts.
pub trait Document {
    /// The `(term id, count)` pairs of the document.
    ///
    /// The order of the pairs fixes the order of the token slots: a pair
    /// `(v, c)` contributes `c` consecutive tokens of term `v`.
    fn term_counts(&self) -> impl Iterator<Item = (usize, usize)> + '_;

    /// Total number of tokens in the document.
    fn num_tokens(&self) -> usize {
        self.term_counts().map(|(_, count)| count).sum()
    }
}

impl<D: Document + ?Sized> Document for &D {
    fn term_counts(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (**self).term_counts()
    }

    fn num_tokens(&self) -> usize {
        (**self).num_tokens()
    }
}

impl Document for [(usize, usize)] {
    fn term_counts(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.iter().copied()
    }
}

impl Document for Vec<(usize, usize)> {
    fn term_counts(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.iter().copied()
    }
}

/// An owned document with distinct term ids in increasing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseDocument {
    terms: Vec<(usize, usize)>,
    num_tokens: usize,
}

impl SparseDocument {
    /// Build a document from `(term, count)` pairs.
    ///
    /// Repeated term ids are merged and zero counts are dropped.
    pub fn new(pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut merged = BTreeMap::new();
        for (term, count) in pairs {
            *merged.entry(term).or_insert(0usize) += count;
        }
        let terms: Vec<_> = merged.into_iter().filter(|&(_, count)| count > 0).collect();
        let num_tokens = terms.iter().map(|&(_, count)| count).sum();
        Self { terms, num_tokens }
    }

    /// Build a document from a sequence of term ids, one per token.
    pub fn from_tokens(tokens: impl IntoIterator<Item = usize>) -> Self {
        Self::new(tokens.into_iter().map(|term| (term, 1)))
    }

    pub fn terms(&self) -> &[(usize, usize)] {
        &self.terms
    }

    pub fn num_distinct(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_tokens == 0
    }
}

impl Document for SparseDocument {
    fn term_counts(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.terms.iter().copied()
    }

    fn num_tokens(&self) -> usize {
        self.num_tokens
    }
}

impl FromIterator<(usize, usize)> for SparseDocument {
    fn from_iter<T: IntoIterator<Item = (usize, usize)>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Vocabulary size implied by a corpus: one more than the largest term id
/// with a non-zero count, or zero if the corpus contains no tokens.
pub fn num_terms<D: Document>(docs: &[D]) -> usize {
    docs.iter()
        .flat_map(|doc| doc.term_counts())
        .filter(|&(_, count)| count > 0)
        .map(|(term, _)| term + 1)
        .max()
        .unwrap_or(0)
}

/// Total number of tokens in a corpus.
pub fn total_tokens<D: Document>(docs: &[D]) -> usize {
    docs.iter().map(|doc| doc.num_tokens()).sum()
}
