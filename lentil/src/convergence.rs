//! Stopping rule of the EM iterations.
//!
//! The objective is the weighted log-likelihood
//! `Σ weight * ln Σ_z DocTopic[d][z] TopicWord[z][w]`. We stop once
//! the per-unit-weight log-likelihood moves by less than `tol`, or
//! after `max_iter` iterations. EM only guarantees non-decreasing
//! likelihood in exact arithmetic; small drops are counted, not
//! treated as errors.

use crate::observations::SparseObservations;
use crate::posterior::mixture_probability;
use ndarray::prelude::*;
use rayon::prelude::*;

/// Drops smaller than this (per unit weight) are rounding noise
pub const DECREASE_SLACK: f64 = 1e-9;

/// Weighted log-likelihood of all observations under the tables.
///
/// An observation with zero mixture probability contributes
/// `weight * ln(floor)` to keep the total finite. Terms are summed
/// in observation order.
pub fn log_likelihood(
    observations: &SparseObservations,
    doc_topic: ArrayView2<f64>,
    topic_word: ArrayView2<f64>,
    floor: f64,
) -> f64 {
    let ln_floor = floor.ln();

    let terms: Vec<f64> = (0..observations.len())
        .into_par_iter()
        .with_min_len(256)
        .map(|i| {
            let d = observations.document(i);
            let w = observations.word(i);
            let p = mixture_probability(doc_topic.row(d), topic_word, w);
            let ln_p = if p > 0.0 { p.ln() } else { ln_floor };
            observations.weight(i) * ln_p
        })
        .collect();

    terms.iter().sum()
}

/// Log-likelihood after one completed iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    pub iteration: usize,
    pub log_likelihood: f64,
    /// `log_likelihood / total_weight`
    pub mean_log_likelihood: f64,
}

/// What to do after an iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Continue,
    Converged,
    MaxIterReached,
}

pub struct ConvergenceMonitor {
    tol: f64,
    max_iter: usize,
    total_weight: f64,
    previous: f64,
    trace: Vec<IterationRecord>,
    num_decreases: usize,
}

impl ConvergenceMonitor {
    /// * `tol` - tolerance on the change of the mean log-likelihood
    /// * `max_iter` - iteration cap
    /// * `total_weight` - sum of observation weights
    /// * `initial_log_likelihood` - objective of the starting tables
    pub fn new(tol: f64, max_iter: usize, total_weight: f64, initial_log_likelihood: f64) -> Self {
        let mut monitor = ConvergenceMonitor {
            tol,
            max_iter,
            total_weight,
            previous: 0.0,
            trace: Vec::with_capacity(max_iter.min(1024)),
            num_decreases: 0,
        };
        monitor.previous = monitor.per_weight(initial_log_likelihood);
        monitor
    }

    fn per_weight(&self, log_likelihood: f64) -> f64 {
        if self.total_weight > 0.0 {
            log_likelihood / self.total_weight
        } else {
            0.0
        }
    }

    /// Record the objective of the iteration just completed
    pub fn observe(&mut self, log_likelihood: f64) -> Status {
        let mean = self.per_weight(log_likelihood);
        let iteration = self.trace.len() + 1;

        self.trace.push(IterationRecord {
            iteration,
            log_likelihood,
            mean_log_likelihood: mean,
        });

        if mean < self.previous - DECREASE_SLACK {
            self.num_decreases += 1;
        }

        let delta = (mean - self.previous).abs();
        self.previous = mean;

        if delta < self.tol {
            Status::Converged
        } else if iteration >= self.max_iter {
            Status::MaxIterReached
        } else {
            Status::Continue
        }
    }

    pub fn iterations(&self) -> usize {
        self.trace.len()
    }

    /// Iterations whose objective fell by more than `DECREASE_SLACK`
    pub fn num_decreases(&self) -> usize {
        self.num_decreases
    }

    pub fn trace(&self) -> &[IterationRecord] {
        &self.trace
    }

    pub fn into_trace(self) -> Vec<IterationRecord> {
        self.trace
    }
}
