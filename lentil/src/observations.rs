//! Sparse `(document, word, weight)` observations.
//!
//! The triples are validated once and never modified afterwards.
//! Grouping indices by document and by word are built up front so
//! the M-step can sum posterior mass row by row into dense arrays.

use crate::error::{PlsaError, Result};

/// `(document, word, weight)` with 0-based indices
pub type Triplet = (usize, usize, f64);

/// Members of each group laid out contiguously (CSR-style offsets)
#[derive(Debug, Clone)]
struct Grouping {
    offsets: Vec<usize>,
    members: Vec<usize>,
}

impl Grouping {
    /// Stable counting sort of observation positions by `keys`
    fn build(keys: &[usize], num_groups: usize) -> Self {
        let mut offsets = vec![0_usize; num_groups + 1];
        for &g in keys {
            offsets[g + 1] += 1;
        }
        for g in 0..num_groups {
            offsets[g + 1] += offsets[g];
        }

        let mut next = offsets[..num_groups].to_vec();
        let mut members = vec![0_usize; keys.len()];
        for (i, &g) in keys.iter().enumerate() {
            members[next[g]] = i;
            next[g] += 1;
        }

        Grouping { offsets, members }
    }

    fn members(&self, g: usize) -> &[usize] {
        &self.members[self.offsets[g]..self.offsets[g + 1]]
    }
}

/// Read-only corpus of aggregated `(document, word, weight)` triples
/// together with the declared `num_documents x num_words` bounds.
#[derive(Debug, Clone)]
pub struct SparseObservations {
    num_documents: usize,
    num_words: usize,
    documents: Vec<usize>,
    words: Vec<usize>,
    weights: Vec<f64>,
    by_document: Grouping,
    by_word: Grouping,
    total_weight: f64,
}

impl SparseObservations {
    /// Build the corpus from already aggregated triples.
    ///
    /// * `num_documents` - number of documents (rows of `DocTopic`)
    /// * `num_words` - vocabulary size (columns of `TopicWord`)
    /// * `triplets` - `(document, word, weight)`; each pair at most once
    ///
    /// Fails with `InvalidObservation` if an index is out of bounds, a
    /// weight is not a positive finite number, or a pair is repeated.
    pub fn new(num_documents: usize, num_words: usize, triplets: Vec<Triplet>) -> Result<Self> {
        check_bounds_declared(num_documents, num_words)?;
        for (i, triplet) in triplets.iter().enumerate() {
            check_triplet(i, triplet, num_documents, num_words)?;
        }

        let n = triplets.len();
        let mut documents = Vec::with_capacity(n);
        let mut words = Vec::with_capacity(n);
        let mut weights = Vec::with_capacity(n);
        for (d, w, x) in triplets {
            documents.push(d);
            words.push(w);
            weights.push(x);
        }

        let by_document = Grouping::build(&documents, num_documents);
        let by_word = Grouping::build(&words, num_words);

        // each document's words must be distinct
        let mut seen = vec![usize::MAX; num_words];
        for d in 0..num_documents {
            for &i in by_document.members(d) {
                let w = words[i];
                if seen[w] == d {
                    return Err(PlsaError::observation(
                        i,
                        format!("pair (document {}, word {}) appears more than once", d, w),
                    ));
                }
                seen[w] = d;
            }
        }

        let total_weight = weights.iter().sum();

        Ok(SparseObservations {
            num_documents,
            num_words,
            documents,
            words,
            weights,
            by_document,
            by_word,
            total_weight,
        })
    }

    /// Same as `new`, but repeated `(document, word)` pairs are first
    /// merged by summing their weights. Each raw triple is checked
    /// before merging, so `index` in an error refers to the input.
    pub fn from_unaggregated(
        num_documents: usize,
        num_words: usize,
        mut triplets: Vec<Triplet>,
    ) -> Result<Self> {
        check_bounds_declared(num_documents, num_words)?;
        for (i, triplet) in triplets.iter().enumerate() {
            check_triplet(i, triplet, num_documents, num_words)?;
        }

        triplets.sort_by_key(|&(d, w, _)| (d, w));

        let mut merged: Vec<Triplet> = Vec::with_capacity(triplets.len());
        for (d, w, x) in triplets {
            match merged.last_mut() {
                Some(last) if last.0 == d && last.1 == w => last.2 += x,
                _ => merged.push((d, w, x)),
            }
        }

        Self::new(num_documents, num_words, merged)
    }

    pub fn num_documents(&self) -> usize {
        self.num_documents
    }

    pub fn num_words(&self) -> usize {
        self.num_words
    }

    /// Number of triples
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Sum of the weights observed in document `d`
    pub fn document_weight(&self, d: usize) -> f64 {
        self.by_document
            .members(d)
            .iter()
            .map(|&i| self.weights[i])
            .sum()
    }

    /// The largest word index referenced, if any
    pub fn max_word_id(&self) -> Option<usize> {
        self.words.iter().copied().max()
    }

    #[inline]
    pub fn document(&self, i: usize) -> usize {
        self.documents[i]
    }

    #[inline]
    pub fn word(&self, i: usize) -> usize {
        self.words[i]
    }

    #[inline]
    pub fn weight(&self, i: usize) -> f64 {
        self.weights[i]
    }

    /// Triples in input order
    pub fn triplets(&self) -> impl Iterator<Item = Triplet> + '_ {
        (0..self.len()).map(move |i| (self.documents[i], self.words[i], self.weights[i]))
    }

    /// Positions of the observations that belong to document `d`
    pub(crate) fn document_members(&self, d: usize) -> &[usize] {
        self.by_document.members(d)
    }

    /// Positions of the observations of word `w`
    pub(crate) fn word_members(&self, w: usize) -> &[usize] {
        self.by_word.members(w)
    }
}

fn check_bounds_declared(num_documents: usize, num_words: usize) -> Result<()> {
    if num_documents == 0 {
        return Err(PlsaError::configuration(
            "num_documents",
            num_documents,
            "need at least one document",
        ));
    }
    if num_words == 0 {
        return Err(PlsaError::configuration(
            "num_words",
            num_words,
            "need at least one word",
        ));
    }
    Ok(())
}

fn check_triplet(
    i: usize,
    &(d, w, x): &Triplet,
    num_documents: usize,
    num_words: usize,
) -> Result<()> {
    if d >= num_documents {
        return Err(PlsaError::observation(
            i,
            format!("document {} >= num_documents {}", d, num_documents),
        ));
    }
    if w >= num_words {
        return Err(PlsaError::observation(
            i,
            format!("word {} >= num_words {}", w, num_words),
        ));
    }
    if !(x.is_finite() && x > 0.0) {
        return Err(PlsaError::observation(
            i,
            format!("weight {} is not a positive number", x),
        ));
    }
    Ok(())
}
