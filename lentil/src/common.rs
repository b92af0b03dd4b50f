use std::io::Write;

pub use clap::{Args, Parser, Subcommand};
pub use log::info;

pub use lentil::convergence::IterationRecord;
pub use lentil::{Plsa, PlsaOptions, SparseObservations};

pub use matrix_util::common_io::{open_buf_writer, write_lines};
pub use matrix_util::mtx_io::{read_mtx_triplets, write_mtx_triplets};
pub use matrix_util::traits::IoOps;

pub const DEFAULT_TOL: f64 = 1e-3;
pub const DEFAULT_MAX_ITER: usize = 1000;

/// Read a MatrixMarket file of word (row) x document (column)
/// counts. Explicit zeros are dropped; repeated entries are summed.
pub fn read_corpus_mtx(mtx_file: &str) -> anyhow::Result<SparseObservations> {
    let mtx = read_mtx_triplets(mtx_file)?;
    let num_words = mtx.nrow;
    let num_documents = mtx.ncol;

    let nnz = mtx.triplets.len();
    let triplets: Vec<(usize, usize, f64)> = mtx
        .triplets
        .into_iter()
        .filter(|&(_, _, x)| x != 0.0)
        .map(|(w, d, x)| (d, w, x))
        .collect();

    if triplets.len() < nnz {
        info!("dropped {} explicit zeros", nnz - triplets.len());
    }

    let obs = SparseObservations::from_unaggregated(num_documents, num_words, triplets)?;

    info!(
        "read {} documents x {} words, {} observations, total weight {}",
        obs.num_documents(),
        obs.num_words(),
        obs.len(),
        obs.total_weight()
    );
    Ok(obs)
}

/// Configure the global rayon pool
pub fn set_num_threads(threads: Option<usize>) -> anyhow::Result<()> {
    let num_threads = threads.unwrap_or_else(num_cpus::get).max(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;
    info!("using {} threads", num_threads);
    Ok(())
}

/// `iteration  llik  mean_llik` lines
pub fn write_trace(trace: &[IterationRecord], file: &str) -> anyhow::Result<()> {
    let mut lines: Vec<Box<str>> = vec!["#iteration\tllik\tmean_llik".into()];
    lines.extend(trace.iter().map(|r| {
        format!(
            "{}\t{}\t{}",
            r.iteration, r.log_likelihood, r.mean_log_likelihood
        )
        .into_boxed_str()
    }));
    write_lines(&lines, file)
}

/// Summary of a run in JSON
pub fn write_summary(summary: &serde_json::Value, file: &str) -> anyhow::Result<()> {
    let mut buf = open_buf_writer(file)?;
    serde_json::to_writer_pretty(&mut buf, summary)?;
    writeln!(buf)?;
    buf.flush()?;
    Ok(())
}
