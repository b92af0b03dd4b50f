//! Synthetic corpora for testing and benchmarking.
//!
//! ```text
//! θ(d) ~ Dirichlet(α_doc),  β(z) ~ Dirichlet(α_word)
//! z ~ Categorical(θ(d)),    w ~ Categorical(β(z))
//! ```
//!
//! `depth` tokens are drawn per document and then aggregated into
//! `(document, word, count)` triples.

use crate::error::{PlsaError, Result};
use crate::observations::{SparseObservations, Triplet};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressDrawTarget};
use log::{info, log_enabled, Level};
use matrix_util::traits::StochasticOps;
use ndarray::prelude::*;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Gamma};
use rayon::prelude::*;

pub struct SimArgs {
    pub num_documents: usize,
    pub num_words: usize,
    pub num_topics: usize,
    /// tokens per document
    pub depth: usize,
    /// Dirichlet concentration of the topic proportions
    pub doc_concentration: f64,
    /// Dirichlet concentration of the topic dictionaries
    pub word_concentration: f64,
    pub rseed: u64,
}

impl Default for SimArgs {
    fn default() -> Self {
        SimArgs {
            num_documents: 100,
            num_words: 500,
            num_topics: 5,
            depth: 200,
            doc_concentration: 1.0,
            word_concentration: 0.1,
            rseed: 42,
        }
    }
}

pub struct SimOut {
    /// true `P(z|d)`
    pub doc_topic: Array2<f64>,
    /// true `P(w|z)`
    pub topic_word: Array2<f64>,
    pub observations: SparseObservations,
}

fn sample_dirichlet_rows(
    nrow: usize,
    ncol: usize,
    concentration: f64,
    rng: &mut StdRng,
) -> Result<Array2<f64>> {
    let gamma = Gamma::new(concentration, 1.0).map_err(|_| {
        PlsaError::configuration("concentration", concentration, "must be positive")
    })?;
    let mut mat = Array2::from_shape_simple_fn((nrow, ncol), || gamma.sample(rng));
    mat.normalize_rows_inplace(0.0);
    Ok(mat)
}

fn categorical(probs: ArrayView1<f64>) -> Result<WeightedIndex<f64>> {
    WeightedIndex::new(probs.iter().copied())
        .map_err(|e| PlsaError::configuration("probabilities", e, "need a positive total"))
}

/// Generator seed of document `d`; streams of nearby `rseed` values
/// do not line up
fn document_seed(rseed: u64, d: usize) -> u64 {
    rseed ^ (d as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Sample a corpus with known tables
pub fn simulate_corpus(args: &SimArgs) -> Result<SimOut> {
    for (name, n) in [
        ("num_documents", args.num_documents),
        ("num_words", args.num_words),
        ("num_topics", args.num_topics),
        ("depth", args.depth),
    ] {
        if n == 0 {
            return Err(PlsaError::configuration(name, n, "must be at least 1"));
        }
    }

    let mut rng = StdRng::seed_from_u64(args.rseed);

    let doc_topic = sample_dirichlet_rows(
        args.num_documents,
        args.num_topics,
        args.doc_concentration,
        &mut rng,
    )?;
    let topic_word = sample_dirichlet_rows(
        args.num_topics,
        args.num_words,
        args.word_concentration,
        &mut rng,
    )?;

    let word_given_topic = topic_word
        .rows()
        .into_iter()
        .map(categorical)
        .collect::<Result<Vec<_>>>()?;

    let pb = ProgressBar::new(args.num_documents as u64);
    if !log_enabled!(Level::Info) {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    let per_document = (0..args.num_documents)
        .into_par_iter()
        .progress_with(pb)
        .map(|d| -> Result<Vec<Triplet>> {
            let mut rng = StdRng::seed_from_u64(document_seed(args.rseed, d));
            let topic_given_doc = categorical(doc_topic.row(d))?;

            let mut counts = vec![0_usize; args.num_words];
            for _ in 0..args.depth {
                let z = topic_given_doc.sample(&mut rng);
                let w = word_given_topic[z].sample(&mut rng);
                counts[w] += 1;
            }

            Ok(counts
                .into_iter()
                .enumerate()
                .filter(|&(_, c)| c > 0)
                .map(|(w, c)| (d, w, c as f64))
                .collect())
        })
        .collect::<Result<Vec<_>>>()?;

    let triplets: Vec<Triplet> = per_document.into_iter().flatten().collect();

    info!(
        "simulated {} documents x {} words with {} non-zero elements",
        args.num_documents,
        args.num_words,
        triplets.len()
    );

    let observations = SparseObservations::new(args.num_documents, args.num_words, triplets)?;

    Ok(SimOut {
        doc_topic,
        topic_word,
        observations,
    })
}

/// `n` uniformly random `(document, word)` draws with weights in
/// `[lo, hi]`; repeated pairs are merged.
pub fn random_observations<R: Rng>(
    num_documents: usize,
    num_words: usize,
    n: usize,
    (lo, hi): (f64, f64),
    rng: &mut R,
) -> Result<SparseObservations> {
    if !(lo > 0.0 && lo <= hi) {
        return Err(PlsaError::configuration(
            "weight range",
            format!("[{}, {}]", lo, hi),
            "need 0 < lo <= hi",
        ));
    }

    if num_documents == 0 || num_words == 0 {
        return SparseObservations::from_unaggregated(num_documents, num_words, vec![]);
    }

    let triplets = (0..n)
        .map(|_| {
            let d = rng.random_range(0..num_documents);
            let w = rng.random_range(0..num_words);
            let x = rng.random_range(lo..=hi);
            (d, w, x)
        })
        .collect();

    SparseObservations::from_unaggregated(num_documents, num_words, triplets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn corpus_mass_matches_depth() {
        let args = SimArgs {
            num_documents: 12,
            num_words: 30,
            num_topics: 3,
            depth: 50,
            ..Default::default()
        };
        let sim = simulate_corpus(&args).unwrap();

        assert_eq!(sim.doc_topic.dim(), (12, 3));
        assert_eq!(sim.topic_word.dim(), (3, 30));
        assert!(sim.topic_word.is_row_stochastic(1e-9));
        for d in 0..12 {
            assert_abs_diff_eq!(sim.observations.document_weight(d), 50.0);
        }
    }

    #[test]
    fn same_seed_same_corpus() {
        let args = SimArgs {
            num_documents: 5,
            num_words: 8,
            depth: 20,
            ..Default::default()
        };
        let aa: Vec<_> = simulate_corpus(&args).unwrap().observations.triplets().collect();
        let bb: Vec<_> = simulate_corpus(&args).unwrap().observations.triplets().collect();
        assert_eq!(aa, bb);
    }

    #[test]
    fn document_streams_differ_across_seeds() {
        assert_ne!(document_seed(0, 1), document_seed(1, 0));
        assert_ne!(document_seed(7, 0), document_seed(7, 1));
    }

    #[test]
    fn random_observations_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(0);
        let obs = random_observations(4, 9, 500, (1.0, 4.0), &mut rng).unwrap();
        assert!(obs.len() <= 36);
        assert!(obs.triplets().all(|(d, w, x)| d < 4 && w < 9 && x >= 1.0));
        assert!(obs.total_weight() >= 500.0 && obs.total_weight() <= 2000.0);
    }
}
