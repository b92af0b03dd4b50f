//! EM for PLSA: learning both tables (training) and learning only
//! `DocTopic` against a fixed `TopicWord` (folding-in new documents).
//!
//! Each iteration runs the E-step over all observations, then the
//! M-step, then the likelihood. Each stage finishes before the next
//! one starts, so no worker ever reads a half-updated table. A stop
//! request is only looked at between iterations.

use crate::convergence::{log_likelihood, ConvergenceMonitor, IterationRecord, Status};
use crate::error::{PlsaError, Result};
use crate::observations::SparseObservations;
use crate::posterior::e_step;
use crate::sufficient_stats::{update_doc_topic, update_topic_word};
use crate::tables::{check_row_stochastic, TopicTables, DEFAULT_SMOOTHING_FLOOR};
use indicatif::{ProgressBar, ProgressDrawTarget};
use log::{debug, info, log_enabled, warn, Level};
use matrix_util::traits::StochasticOps;
use ndarray::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Options for PLSA estimation.
#[derive(Debug, Clone)]
pub struct PlsaOptions {
    /// Number of latent topics (ignored by `retrain`, which takes it
    /// from the topic-word table). Default: 10
    pub num_topics: usize,
    /// Tolerance on the change of the mean log-likelihood. Default: 1e-3
    pub tol: f64,
    /// Maximum number of EM iterations. Default: 1000
    pub max_iter: usize,
    /// Random seed for the initial tables. Default: 42
    pub seed: u64,
    /// Lower clamp of the unnormalized counts before each row is
    /// divided by its total. Default: 1e-12
    pub smoothing_floor: f64,
}

impl Default for PlsaOptions {
    fn default() -> Self {
        PlsaOptions {
            num_topics: 10,
            tol: 1e-3,
            max_iter: 1000,
            seed: 42,
            smoothing_floor: DEFAULT_SMOOTHING_FLOOR,
        }
    }
}

impl PlsaOptions {
    fn check_common(&self) -> Result<()> {
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(PlsaError::configuration("tol", self.tol, "must be positive"));
        }
        if self.max_iter < 1 {
            return Err(PlsaError::configuration(
                "max_iter",
                self.max_iter,
                "must be at least 1",
            ));
        }
        if !(self.smoothing_floor > 0.0 && self.smoothing_floor < 1e-3) {
            return Err(PlsaError::configuration(
                "smoothing_floor",
                self.smoothing_floor,
                "must lie in (0, 1e-3)",
            ));
        }
        Ok(())
    }

    /// Check everything `train` needs
    pub fn validate(&self) -> Result<()> {
        if self.num_topics < 1 {
            return Err(PlsaError::configuration(
                "num_topics",
                self.num_topics,
                "must be at least 1",
            ));
        }
        self.check_common()
    }
}

/// How the iterations ended. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The objective changed by less than `tol`
    Converged,
    /// `max_iter` iterations ran without meeting `tol`
    MaxIterReached,
    /// The stop signal was raised between two iterations
    Interrupted,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Converged => "converged",
            Termination::MaxIterReached => "max_iter_reached",
            Termination::Interrupted => "interrupted",
        }
    }
}

/// Result of `Plsa::train`
#[derive(Debug, Clone)]
pub struct PlsaFit {
    pub tables: TopicTables,
    pub trace: Vec<IterationRecord>,
    pub termination: Termination,
    /// Iterations in which the objective fell beyond rounding noise
    pub num_decreases: usize,
    /// Rows reset to uniform over the whole run
    pub degenerate_rows: usize,
}

/// Result of `Plsa::retrain`
#[derive(Debug, Clone)]
pub struct RetrainFit {
    pub doc_topic: Array2<f64>,
    pub trace: Vec<IterationRecord>,
    pub termination: Termination,
    pub num_decreases: usize,
    pub degenerate_rows: usize,
}

macro_rules! fit_accessors {
    ($fit:ty) => {
        impl $fit {
            /// Number of completed iterations
            pub fn iterations(&self) -> usize {
                self.trace.len()
            }

            /// Objective after the last completed iteration
            pub fn log_likelihood(&self) -> Option<f64> {
                self.trace.last().map(|r| r.log_likelihood)
            }
        }
    };
}

fit_accessors!(PlsaFit);
fit_accessors!(RetrainFit);

/// `TopicWord` is learned in training and only read when folding in
enum TopicWordRole<'a> {
    Learned(&'a mut Array2<f64>),
    Fixed(ArrayView2<'a, f64>),
}

impl TopicWordRole<'_> {
    fn view(&self) -> ArrayView2<'_, f64> {
        match self {
            TopicWordRole::Learned(tw) => tw.view(),
            TopicWordRole::Fixed(tw) => tw.view(),
        }
    }
}

struct LoopOutcome {
    trace: Vec<IterationRecord>,
    termination: Termination,
    num_decreases: usize,
    degenerate_rows: usize,
}

/// PLSA estimation by Expectation-Maximization.
///
/// ```
/// use lentil::{Plsa, PlsaOptions, SparseObservations};
///
/// let obs = SparseObservations::new(2, 3, vec![(0, 0, 2.0), (0, 1, 1.0), (1, 2, 3.0)]).unwrap();
/// let options = PlsaOptions { num_topics: 2, ..Default::default() };
/// let fit = Plsa::new(options).train(&obs).unwrap();
/// assert_eq!(fit.tables.doc_topic().dim(), (2, 2));
/// ```
pub struct Plsa {
    options: PlsaOptions,
    stop: Option<Arc<AtomicBool>>,
}

impl Plsa {
    pub fn new(options: PlsaOptions) -> Self {
        Plsa {
            options,
            stop: None,
        }
    }

    /// Finish early, at the next iteration boundary, once `flag` is set
    pub fn with_stop_signal(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    pub fn options(&self) -> &PlsaOptions {
        &self.options
    }

    /// Learn both tables from random starting values
    pub fn train(&self, observations: &SparseObservations) -> Result<PlsaFit> {
        self.options.validate()?;

        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let init = TopicTables::initialize(
            observations.num_documents(),
            observations.num_words(),
            self.options.num_topics,
            &mut rng,
        );

        self.train_from(observations, init)
    }

    /// Learn both tables starting from `init`
    pub fn train_from(
        &self,
        observations: &SparseObservations,
        mut init: TopicTables,
    ) -> Result<PlsaFit> {
        self.options.check_common()?;

        if init.num_topics() < 1 {
            return Err(PlsaError::configuration(
                "initial tables",
                format!("{} topics", init.num_topics()),
                "need at least one topic",
            ));
        }

        if init.num_documents() != observations.num_documents()
            || init.num_words() != observations.num_words()
        {
            return Err(PlsaError::configuration(
                "initial tables",
                format!("{} documents x {} words", init.num_documents(), init.num_words()),
                format!(
                    "observations declare {} documents x {} words",
                    observations.num_documents(),
                    observations.num_words()
                ),
            ));
        }

        info!(
            "PLSA training: D={}, W={}, K={}, N={}, tol={}, max_iter={}",
            observations.num_documents(),
            observations.num_words(),
            init.num_topics(),
            observations.len(),
            self.options.tol,
            self.options.max_iter
        );

        let (doc_topic, topic_word) = init.split_mut();
        let outcome = self.run_em(observations, doc_topic, TopicWordRole::Learned(topic_word));

        Ok(PlsaFit {
            tables: init,
            trace: outcome.trace,
            termination: outcome.termination,
            num_decreases: outcome.num_decreases,
            degenerate_rows: outcome.degenerate_rows,
        })
    }

    /// Fold new documents into an existing topic space: learn
    /// `DocTopic` while `topic_word` stays as given.
    ///
    /// * `topic_word` - `num_topics x vocabulary` row-stochastic table
    ///
    /// Every word index of `observations` must be a column of
    /// `topic_word`; otherwise `InvalidObservation` before any work.
    pub fn retrain(
        &self,
        observations: &SparseObservations,
        topic_word: &Array2<f64>,
    ) -> Result<RetrainFit> {
        self.options.check_common()?;
        check_row_stochastic("topic_word", topic_word.view())?;

        let vocab = topic_word.ncols();
        if let Some(i) = (0..observations.len()).find(|&i| observations.word(i) >= vocab) {
            return Err(PlsaError::observation(
                i,
                format!(
                    "word {} is not in the {}-word topic vocabulary",
                    observations.word(i),
                    vocab
                ),
            ));
        }

        let num_topics = topic_word.nrows();

        info!(
            "PLSA folding-in: D={}, W={}, K={}, N={}, tol={}, max_iter={}",
            observations.num_documents(),
            vocab,
            num_topics,
            observations.len(),
            self.options.tol,
            self.options.max_iter
        );

        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let mut doc_topic =
            Array2::<f64>::sample_stochastic_rows(observations.num_documents(), num_topics, &mut rng);

        let outcome = self.run_em(
            observations,
            &mut doc_topic,
            TopicWordRole::Fixed(topic_word.view()),
        );

        Ok(RetrainFit {
            doc_topic,
            trace: outcome.trace,
            termination: outcome.termination,
            num_decreases: outcome.num_decreases,
            degenerate_rows: outcome.degenerate_rows,
        })
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    fn run_em(
        &self,
        observations: &SparseObservations,
        doc_topic: &mut Array2<f64>,
        mut topic_word: TopicWordRole<'_>,
    ) -> LoopOutcome {
        let opts = &self.options;
        let floor = opts.smoothing_floor;
        let kk = doc_topic.ncols();

        let mut post = vec![0.0; observations.len() * kk];

        let initial = log_likelihood(observations, doc_topic.view(), topic_word.view(), floor);
        let mut monitor = ConvergenceMonitor::new(
            opts.tol,
            opts.max_iter,
            observations.total_weight(),
            initial,
        );
        debug!("initial llik = {}", initial);

        let pb = ProgressBar::new(opts.max_iter as u64);
        if !log_enabled!(Level::Info) {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }

        let mut degenerate_rows = 0;

        let termination = loop {
            if self.stop_requested() {
                info!("stop requested after {} iterations", monitor.iterations());
                break Termination::Interrupted;
            }

            // E-step against the tables of the previous iteration
            e_step(observations, doc_topic.view(), topic_word.view(), &mut post);

            // M-step
            let mut fixed = update_doc_topic(observations, &post, doc_topic, floor);
            if let TopicWordRole::Learned(tw) = &mut topic_word {
                fixed.extend(update_topic_word(observations, &post, tw, floor));
            }
            if !fixed.is_empty() {
                debug!("reset {} rows with no mass to uniform", fixed.len());
                degenerate_rows += fixed.len();
            }

            let llik = log_likelihood(observations, doc_topic.view(), topic_word.view(), floor);
            let status = monitor.observe(llik);
            pb.inc(1);

            debug!(
                "iteration {}: llik = {}, mean llik = {}",
                monitor.iterations(),
                llik,
                monitor.trace()[monitor.iterations() - 1].mean_log_likelihood
            );

            match status {
                Status::Continue => {}
                Status::Converged => break Termination::Converged,
                Status::MaxIterReached => break Termination::MaxIterReached,
            }
        };
        pb.finish_and_clear();

        match termination {
            Termination::Converged => info!("converged after {} iterations", monitor.iterations()),
            Termination::MaxIterReached => warn!(
                "reached max_iter = {} without meeting tol = {}",
                opts.max_iter, opts.tol
            ),
            Termination::Interrupted => {}
        }

        let num_decreases = monitor.num_decreases();
        LoopOutcome {
            trace: monitor.into_trace(),
            termination,
            num_decreases,
            degenerate_rows,
        }
    }
}

/// Train with random initialization from the default seed.
///
/// Returns `(DocTopic, TopicWord)`, of shapes `num_documents x
/// num_topics` and `num_topics x num_words`.
pub fn train(
    observations: &SparseObservations,
    num_words: usize,
    num_documents: usize,
    num_topics: usize,
    tol: f64,
    max_iter: usize,
) -> Result<(Array2<f64>, Array2<f64>)> {
    check_declared_bounds(observations, Some(num_words), num_documents)?;

    let options = PlsaOptions {
        num_topics,
        tol,
        max_iter,
        ..Default::default()
    };

    Ok(Plsa::new(options).train(observations)?.tables.into_parts())
}

/// Fold `observations` into the topic space of `topic_word`.
///
/// Returns `DocTopic`, of shape `num_documents x topic_word.nrows()`.
/// `topic_word` is only borrowed and comes back untouched.
pub fn retrain(
    observations: &SparseObservations,
    num_documents: usize,
    topic_word: &Array2<f64>,
    tol: f64,
    max_iter: usize,
) -> Result<Array2<f64>> {
    check_declared_bounds(observations, None, num_documents)?;

    let options = PlsaOptions {
        num_topics: topic_word.nrows(),
        tol,
        max_iter,
        ..Default::default()
    };

    Ok(Plsa::new(options)
        .retrain(observations, topic_word)?
        .doc_topic)
}

fn check_declared_bounds(
    observations: &SparseObservations,
    num_words: Option<usize>,
    num_documents: usize,
) -> Result<()> {
    if observations.num_documents() != num_documents {
        return Err(PlsaError::configuration(
            "num_documents",
            num_documents,
            format!("observations declare {}", observations.num_documents()),
        ));
    }
    if let Some(num_words) = num_words {
        if observations.num_words() != num_words {
            return Err(PlsaError::configuration(
                "num_words",
                num_words,
                format!("observations declare {}", observations.num_words()),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn two_blocks() -> SparseObservations {
        // documents 0,1 use words 0..3; documents 2,3 use words 3..6
        let mut triplets = vec![];
        for d in 0..4 {
            let words = if d < 2 { 0..3 } else { 3..6 };
            for w in words {
                triplets.push((d, w, 1.0 + (d + w) as f64 % 3.0));
            }
        }
        SparseObservations::new(4, 6, triplets).unwrap()
    }

    #[test]
    fn bad_options_fail_before_iterating() {
        let obs = two_blocks();
        for options in [
            PlsaOptions {
                num_topics: 0,
                ..Default::default()
            },
            PlsaOptions {
                tol: 0.0,
                ..Default::default()
            },
            PlsaOptions {
                tol: f64::NAN,
                ..Default::default()
            },
            PlsaOptions {
                max_iter: 0,
                ..Default::default()
            },
        ] {
            let err = Plsa::new(options).train(&obs).unwrap_err();
            assert!(matches!(err, PlsaError::InvalidConfiguration { .. }));
        }
    }

    #[test]
    fn separates_disjoint_vocabularies() {
        let obs = two_blocks();
        let options = PlsaOptions {
            num_topics: 2,
            tol: 1e-8,
            max_iter: 500,
            seed: 3,
            ..Default::default()
        };
        let fit = Plsa::new(options).train(&obs).unwrap();
        let dt = fit.tables.doc_topic();

        assert!(fit.tables.is_row_stochastic(1e-6));
        // documents of the same block end up on the same dominant topic
        let top = |d: usize| if dt[[d, 0]] > dt[[d, 1]] { 0 } else { 1 };
        assert_eq!(top(0), top(1));
        assert_eq!(top(2), top(3));
        assert_ne!(top(0), top(2));
    }

    #[test]
    fn stop_signal_is_honoured_between_iterations() {
        let obs = two_blocks();
        let flag = Arc::new(AtomicBool::new(true));
        let fit = Plsa::new(PlsaOptions {
            num_topics: 2,
            ..Default::default()
        })
        .with_stop_signal(flag)
        .train(&obs)
        .unwrap();

        assert_eq!(fit.termination, Termination::Interrupted);
        assert_eq!(fit.iterations(), 0);
        assert!(fit.tables.is_row_stochastic(1e-9));
    }

    #[test]
    fn cap_is_a_normal_ending() {
        let obs = two_blocks();
        let fit = Plsa::new(PlsaOptions {
            num_topics: 3,
            tol: 1e-300,
            max_iter: 4,
            ..Default::default()
        })
        .train(&obs)
        .unwrap();

        assert_eq!(fit.termination, Termination::MaxIterReached);
        assert_eq!(fit.iterations(), 4);
        assert!(fit.log_likelihood().is_some());
    }

    #[test]
    fn train_from_keeps_a_supplied_start() {
        let obs = SparseObservations::new(1, 1, vec![(0, 0, 5.0)]).unwrap();
        let init = TopicTables::from_parts(array![[1.0]], array![[1.0]]).unwrap();
        let fit = Plsa::new(PlsaOptions {
            num_topics: 1,
            ..Default::default()
        })
        .train_from(&obs, init)
        .unwrap();
        assert_eq!(fit.termination, Termination::Converged);
        assert_abs_diff_eq!(fit.tables.doc_topic()[[0, 0]], 1.0);
    }

    #[test]
    fn zero_topic_start_is_rejected() {
        let obs = two_blocks();
        let mut rng = StdRng::seed_from_u64(0);
        let init = TopicTables::initialize(4, 6, 0, &mut rng);

        let err = Plsa::new(PlsaOptions::default())
            .train_from(&obs, init)
            .unwrap_err();
        assert!(matches!(err, PlsaError::InvalidConfiguration { .. }));
    }

    #[test]
    fn mismatched_start_is_rejected() {
        let obs = two_blocks();
        let init = TopicTables::from_parts(array![[1.0]], array![[1.0]]).unwrap();
        assert!(Plsa::new(PlsaOptions::default())
            .train_from(&obs, init)
            .is_err());
    }

    #[test]
    fn declared_bounds_must_match() {
        let obs = two_blocks();
        assert!(train(&obs, 7, 4, 2, 1e-3, 10).is_err());
        assert!(train(&obs, 6, 5, 2, 1e-3, 10).is_err());
        assert!(train(&obs, 6, 4, 2, 1e-3, 10).is_ok());
    }

    #[test]
    fn retrain_rejects_a_bad_topic_table() {
        let obs = two_blocks();
        let tw = array![[0.5, 0.5, 0.0, 0.0, 0.0, 0.1]];
        let err = retrain(&obs, 4, &tw, 1e-3, 10).unwrap_err();
        assert!(matches!(err, PlsaError::InvalidConfiguration { .. }));
    }
}
