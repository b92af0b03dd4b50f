//! The two probability tables of the model.
//!
//! * `DocTopic[d][z] = P(z|d)`, `num_documents x num_topics`
//! * `TopicWord[z][w] = P(w|z)`, `num_topics x num_words`
//!
//! Every row of either table is a distribution. Counts are clamped
//! below at a small smoothing floor before a row is normalized, so no
//! entry is ever exactly zero.

use crate::error::{PlsaError, Result};
use log::debug;
use matrix_util::traits::StochasticOps;
use ndarray::prelude::*;
use rand::Rng;

/// Lower clamp of the counts before row normalization
pub const DEFAULT_SMOOTHING_FLOOR: f64 = 1e-12;

/// How far a row total may drift from one
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// A row that lost all of its mass and was reset to uniform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegenerateRow {
    pub row: usize,
}

/// Divide each row by its total after flooring its entries.
///
/// A row summing to zero is a `DegenerateRow`: it is replaced by the
/// uniform distribution (the floor everywhere, renormalized) and
/// reported back instead of failing.
pub fn normalize_rows(matrix: &mut Array2<f64>, floor: f64) -> Vec<DegenerateRow> {
    matrix
        .normalize_rows_inplace(floor)
        .into_iter()
        .map(|row| DegenerateRow { row })
        .collect()
}

/// Check that `matrix` is a usable row-stochastic table
pub(crate) fn check_row_stochastic(name: &str, matrix: ArrayView2<f64>) -> Result<()> {
    if matrix.nrows() == 0 || matrix.ncols() == 0 {
        return Err(PlsaError::configuration(
            name,
            format!("{} x {}", matrix.nrows(), matrix.ncols()),
            "needs at least one row and one column",
        ));
    }

    for (r, row) in matrix.rows().into_iter().enumerate() {
        if row.iter().any(|&x| !x.is_finite() || x < 0.0) {
            return Err(PlsaError::configuration(
                format!("{}[{}]", name, r),
                "negative or non-finite entry",
                "entries must be finite and non-negative",
            ));
        }
        let total = row.sum();
        if (total - 1.0).abs() > ROW_SUM_TOLERANCE {
            return Err(PlsaError::configuration(
                format!("{}[{}]", name, r),
                total,
                "rows must sum to one",
            ));
        }
    }
    Ok(())
}

/// `DocTopic` and `TopicWord`, owned together while training
#[derive(Debug, Clone, PartialEq)]
pub struct TopicTables {
    doc_topic: Array2<f64>,
    topic_word: Array2<f64>,
}

impl TopicTables {
    /// Random tables; every row is a draw from the flat Dirichlet
    ///
    /// * `num_documents` - rows of `DocTopic`
    /// * `num_words` - columns of `TopicWord`
    /// * `num_topics` - number of latent topics
    /// * `rng` - generator owned by the calling routine
    pub fn initialize<R: Rng>(
        num_documents: usize,
        num_words: usize,
        num_topics: usize,
        rng: &mut R,
    ) -> Self {
        let doc_topic = Array2::<f64>::sample_stochastic_rows(num_documents, num_topics, rng);
        let topic_word = Array2::<f64>::sample_stochastic_rows(num_topics, num_words, rng);

        debug!(
            "initialized tables: {} x {} and {} x {}",
            num_documents, num_topics, num_topics, num_words
        );

        TopicTables {
            doc_topic,
            topic_word,
        }
    }

    /// Caller-supplied starting point; shapes must agree and rows
    /// must be distributions
    pub fn from_parts(doc_topic: Array2<f64>, topic_word: Array2<f64>) -> Result<Self> {
        check_row_stochastic("doc_topic", doc_topic.view())?;
        check_row_stochastic("topic_word", topic_word.view())?;

        if doc_topic.ncols() != topic_word.nrows() {
            return Err(PlsaError::configuration(
                "doc_topic",
                format!("{} topics", doc_topic.ncols()),
                format!("topic_word has {} topics", topic_word.nrows()),
            ));
        }

        Ok(TopicTables {
            doc_topic,
            topic_word,
        })
    }

    pub fn num_documents(&self) -> usize {
        self.doc_topic.nrows()
    }

    pub fn num_topics(&self) -> usize {
        self.doc_topic.ncols()
    }

    pub fn num_words(&self) -> usize {
        self.topic_word.ncols()
    }

    pub fn doc_topic(&self) -> &Array2<f64> {
        &self.doc_topic
    }

    pub fn topic_word(&self) -> &Array2<f64> {
        &self.topic_word
    }

    /// Both tables stay row-stochastic within `tol`
    pub fn is_row_stochastic(&self, tol: f64) -> bool {
        self.doc_topic.is_row_stochastic(tol) && self.topic_word.is_row_stochastic(tol)
    }

    pub(crate) fn split_mut(&mut self) -> (&mut Array2<f64>, &mut Array2<f64>) {
        (&mut self.doc_topic, &mut self.topic_word)
    }

    /// `(DocTopic, TopicWord)`
    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>) {
        (self.doc_topic, self.topic_word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn initialized_tables_are_stochastic() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let tables = TopicTables::initialize(6, 11, 3, &mut rng);

        assert_eq!(tables.doc_topic().dim(), (6, 3));
        assert_eq!(tables.topic_word().dim(), (3, 11));
        assert!(tables.is_row_stochastic(1e-12));
        assert!(tables.doc_topic().iter().all(|&x| x > 0.0));
    }

    #[test]
    fn same_seed_same_tables() {
        let aa = TopicTables::initialize(4, 9, 3, &mut rand::rngs::StdRng::seed_from_u64(1));
        let bb = TopicTables::initialize(4, 9, 3, &mut rand::rngs::StdRng::seed_from_u64(1));
        let cc = TopicTables::initialize(4, 9, 3, &mut rand::rngs::StdRng::seed_from_u64(2));
        assert_eq!(aa, bb);
        assert_ne!(aa, cc);
    }

    #[test]
    fn degenerate_rows_are_reported() {
        let mut mat = array![[2.0, 2.0], [0.0, 0.0], [1.0, 0.0]];
        let fixed = normalize_rows(&mut mat, DEFAULT_SMOOTHING_FLOOR);
        assert_eq!(fixed, vec![DegenerateRow { row: 1 }]);
        assert_eq!(mat.row(1), array![0.5, 0.5]);
        assert!(mat[[2, 1]] > 0.0);
    }

    #[test]
    fn supplied_tables_are_checked() {
        let dt = array![[0.5, 0.5], [1.0, 0.0]];
        let tw = array![[0.2, 0.8, 0.0], [0.3, 0.3, 0.4]];
        assert!(TopicTables::from_parts(dt.clone(), tw.clone()).is_ok());

        let not_stochastic = array![[0.2, 0.7, 0.0], [0.3, 0.3, 0.4]];
        assert!(matches!(
            TopicTables::from_parts(dt.clone(), not_stochastic),
            Err(PlsaError::InvalidConfiguration { .. })
        ));

        let three_topics = array![[0.2, 0.8], [0.5, 0.5], [1.0, 0.0]];
        assert!(TopicTables::from_parts(dt, three_topics).is_err());
    }
}
