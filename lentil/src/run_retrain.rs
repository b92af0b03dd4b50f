use crate::common::*;
use ndarray::Array2;

#[derive(Args, Debug)]
pub struct RetrainArgs {
    #[arg(
        required = true,
        help = "Data file (.mtx or .mtx.gz) of new documents",
        long_help = "MatrixMarket coordinate file of counts.\n\
		     Rows are words of the training vocabulary,\n\
		     columns are the new documents."
    )]
    data_file: Box<str>,

    #[arg(
        long,
        short = 't',
        required = true,
        help = "Topic-word table",
        long_help = "Topic (row) x word (column) probabilities,\n\
		     e.g., {out}.topic_word.tsv.gz of `lentil train`."
    )]
    topic_word: Box<str>,

    #[arg(
        long,
        short,
        required = true,
        help = "Output header",
        long_help = "Output header for results:\n\
		     - {out}.doc_topic.tsv.gz\n\
		     - {out}.llik.tsv.gz\n\
		     - {out}.summary.json\n"
    )]
    out: Box<str>,

    #[arg(long, default_value_t = DEFAULT_TOL, help = "Convergence tolerance")]
    tol: f64,

    #[arg(
        long,
        default_value_t = DEFAULT_MAX_ITER,
        help = "Maximum number of EM iterations"
    )]
    max_iter: usize,

    #[arg(long, default_value_t = 42, help = "Random seed")]
    seed: u64,

    #[arg(long, help = "Number of threads")]
    threads: Option<usize>,
}

pub fn fold_in_plsa(args: &RetrainArgs) -> anyhow::Result<()> {
    set_num_threads(args.threads)?;

    let topic_word = Array2::<f64>::from_tsv(&args.topic_word, None)?;
    info!(
        "read {} topics x {} words from {}",
        topic_word.nrows(),
        topic_word.ncols(),
        args.topic_word
    );

    let obs = read_corpus_mtx(&args.data_file)?;

    let options = PlsaOptions {
        num_topics: topic_word.nrows(),
        tol: args.tol,
        max_iter: args.max_iter,
        seed: args.seed,
        ..Default::default()
    };

    let fit = Plsa::new(options).retrain(&obs, &topic_word)?;

    let out = &args.out;
    let doc_topic_file = format!("{}.doc_topic.tsv.gz", out);
    let llik_file = format!("{}.llik.tsv.gz", out);
    let summary_file = format!("{}.summary.json", out);

    fit.doc_topic.to_tsv(&doc_topic_file)?;
    write_trace(&fit.trace, &llik_file)?;

    let summary = serde_json::json!({
        "data_file": args.data_file.as_ref(),
        "topic_word": args.topic_word.as_ref(),
        "num_documents": obs.num_documents(),
        "num_observations": obs.len(),
        "num_topics": topic_word.nrows(),
        "tol": args.tol,
        "max_iter": args.max_iter,
        "seed": args.seed,
        "iterations": fit.iterations(),
        "termination": fit.termination.as_str(),
        "log_likelihood": fit.log_likelihood(),
        "num_decreases": fit.num_decreases,
        "degenerate_rows": fit.degenerate_rows,
    });
    write_summary(&summary, &summary_file)?;

    info!("wrote {}, {}, {}", doc_topic_file, llik_file, summary_file);
    Ok(())
}
