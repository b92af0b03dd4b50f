//! M-step: re-estimate the tables from posterior-weighted counts.
//!
//! ```text
//! DocTopic[d][z]  ∝ Σ_{(d,w)} weight * q_{dw}[z]
//! TopicWord[z][w] ∝ Σ_{(d,w)} weight * q_{dw}[z]
//! ```
//!
//! The accumulators are the tables themselves: rows of `DocTopic`
//! are filled from the observations of each document, columns of
//! `TopicWord` from the observations of each word. Every cell is
//! summed in observation order, so results do not depend on how
//! rayon splits the work.

use crate::observations::SparseObservations;
use crate::tables::{normalize_rows, DegenerateRow};
use ndarray::prelude::*;
use rayon::prelude::*;

/// Overwrite `doc_topic` with the new `P(z|d)` estimate
///
/// * `post` - posterior buffer filled by `e_step`
/// * `floor` - smoothing floor of the normalization
pub fn update_doc_topic(
    observations: &SparseObservations,
    post: &[f64],
    doc_topic: &mut Array2<f64>,
    floor: f64,
) -> Vec<DegenerateRow> {
    let kk = doc_topic.ncols();

    doc_topic
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(d, mut stat_d)| {
            stat_d.fill(0.0);
            for &i in observations.document_members(d) {
                let x = observations.weight(i);
                let q = &post[(i * kk)..((i + 1) * kk)];
                stat_d
                    .iter_mut()
                    .zip(q)
                    .for_each(|(s, &q_z)| *s += x * q_z);
            }
        });

    normalize_rows(doc_topic, floor)
}

/// Overwrite `topic_word` with the new `P(w|z)` estimate
///
/// * `post` - posterior buffer filled by `e_step`
/// * `floor` - smoothing floor of the normalization
pub fn update_topic_word(
    observations: &SparseObservations,
    post: &[f64],
    topic_word: &mut Array2<f64>,
    floor: f64,
) -> Vec<DegenerateRow> {
    let kk = topic_word.nrows();

    topic_word
        .axis_iter_mut(Axis(1))
        .into_par_iter()
        .enumerate()
        .for_each(|(w, mut stat_w)| {
            stat_w.fill(0.0);
            for &i in observations.word_members(w) {
                let x = observations.weight(i);
                let q = &post[(i * kk)..((i + 1) * kk)];
                stat_w
                    .iter_mut()
                    .zip(q)
                    .for_each(|(s, &q_z)| *s += x * q_z);
            }
        });

    normalize_rows(topic_word, floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posterior::e_step;
    use crate::tables::DEFAULT_SMOOTHING_FLOOR;
    use approx::assert_abs_diff_eq;

    fn toy() -> SparseObservations {
        SparseObservations::new(2, 3, vec![(0, 0, 2.0), (0, 2, 1.0), (1, 1, 4.0)]).unwrap()
    }

    #[test]
    fn counts_are_split_by_posterior() {
        let obs = toy();
        // observation 0 all topic 0, observation 1 half/half, observation 2 all topic 1
        let post = vec![1.0, 0.0, 0.5, 0.5, 0.0, 1.0];

        let mut dt = Array2::zeros((2, 2));
        let fixed = update_doc_topic(&obs, &post, &mut dt, DEFAULT_SMOOTHING_FLOOR);
        assert!(fixed.is_empty());
        assert_abs_diff_eq!(dt[[0, 0]], 2.5 / 3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(dt[[0, 1]], 0.5 / 3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(dt[[1, 1]], 1.0, epsilon = 1e-10);

        let mut tw = Array2::zeros((2, 3));
        let fixed = update_topic_word(&obs, &post, &mut tw, DEFAULT_SMOOTHING_FLOOR);
        assert!(fixed.is_empty());
        assert_abs_diff_eq!(tw[[0, 0]], 2.0 / 2.5, epsilon = 1e-10);
        assert_abs_diff_eq!(tw[[0, 2]], 0.5 / 2.5, epsilon = 1e-10);
        assert_abs_diff_eq!(tw[[1, 1]], 4.0 / 4.5, epsilon = 1e-10);
        assert_abs_diff_eq!(tw[[1, 2]], 0.5 / 4.5, epsilon = 1e-10);
        assert!(tw.iter().all(|&x| x > 0.0));
    }

    #[test]
    fn topic_without_mass_becomes_uniform() {
        let obs = toy();
        let post = vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0];

        let mut tw = Array2::zeros((2, 3));
        let fixed = update_topic_word(&obs, &post, &mut tw, DEFAULT_SMOOTHING_FLOOR);

        assert_eq!(fixed, vec![DegenerateRow { row: 1 }]);
        for &x in tw.row(1).iter() {
            assert_abs_diff_eq!(x, 1.0 / 3.0);
        }
    }

    #[test]
    fn document_without_observations_becomes_uniform() {
        let obs = SparseObservations::new(3, 2, vec![(0, 0, 1.0), (2, 1, 1.0)]).unwrap();
        let dt0 = array![[0.5, 0.5], [0.9, 0.1], [0.2, 0.8]];
        let tw0 = array![[0.4, 0.6], [0.7, 0.3]];
        let mut post = vec![0.0; obs.len() * 2];
        e_step(&obs, dt0.view(), tw0.view(), &mut post);

        let mut dt = dt0.clone();
        let fixed = update_doc_topic(&obs, &post, &mut dt, DEFAULT_SMOOTHING_FLOOR);
        assert_eq!(fixed, vec![DegenerateRow { row: 1 }]);
        assert_eq!(dt.row(1), array![0.5, 0.5]);
    }
}
