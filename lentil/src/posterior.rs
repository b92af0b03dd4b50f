//! E-step: the posterior over topics of every observation,
//! `q[z] ∝ DocTopic[d][z] * TopicWord[z][w]`.

use crate::observations::SparseObservations;
use ndarray::prelude::*;
use rayon::prelude::*;

/// Observations handed to one rayon task at least
const MIN_CHUNK_OBS: usize = 256;

/// Mixture probability `p(w|d) = Σ_z DocTopic[d][z] TopicWord[z][w]`
#[inline]
pub fn mixture_probability(
    doc_topic_row: ArrayView1<f64>,
    topic_word: ArrayView2<f64>,
    word: usize,
) -> f64 {
    doc_topic_row
        .iter()
        .zip(topic_word.column(word).iter())
        .map(|(&theta, &beta)| theta * beta)
        .sum()
}

/// Posterior `q` over topics for one observation of `word` in a
/// document with topic proportions `doc_topic_row`.
///
/// Returns the mixture probability `p(w|d)`. If every product
/// underflows to zero, `q` is set to the uniform distribution.
pub fn posterior(
    doc_topic_row: ArrayView1<f64>,
    topic_word: ArrayView2<f64>,
    word: usize,
    q: &mut [f64],
) -> f64 {
    let mut total = 0.0;
    for ((q_z, &theta), &beta) in q
        .iter_mut()
        .zip(doc_topic_row.iter())
        .zip(topic_word.column(word).iter())
    {
        *q_z = theta * beta;
        total += *q_z;
    }

    if total > 0.0 && total.is_finite() {
        q.iter_mut().for_each(|q_z| *q_z /= total);
    } else {
        let uniform = 1.0 / q.len() as f64;
        q.iter_mut().for_each(|q_z| *q_z = uniform);
    }
    total
}

/// Fill `post` (`num_observations x num_topics`, row-major) with the
/// posterior of each observation under the current tables. Tasks
/// only read the tables and each writes its own rows of `post`.
pub fn e_step(
    observations: &SparseObservations,
    doc_topic: ArrayView2<f64>,
    topic_word: ArrayView2<f64>,
    post: &mut [f64],
) {
    let kk = doc_topic.ncols();
    debug_assert_eq!(post.len(), observations.len() * kk);

    post.par_chunks_mut(kk)
        .with_min_len(MIN_CHUNK_OBS)
        .enumerate()
        .for_each(|(i, q)| {
            let d = observations.document(i);
            let w = observations.word(i);
            posterior(doc_topic.row(d), topic_word, w, q);
        });
}
