use crate::common::*;

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[arg(
        required = true,
        help = "Data file (.mtx or .mtx.gz)",
        long_help = "MatrixMarket coordinate file of counts.\n\
		     Rows are words (features), columns are documents."
    )]
    data_file: Box<str>,

    #[arg(
        long,
        short,
        required = true,
        help = "Output header",
        long_help = "Output header for results:\n\
		     - {out}.doc_topic.tsv.gz\n\
		     - {out}.topic_word.tsv.gz\n\
		     - {out}.llik.tsv.gz\n\
		     - {out}.summary.json\n"
    )]
    out: Box<str>,

    #[arg(
        long,
        short = 'k',
        default_value_t = 10,
        help = "Number of topics"
    )]
    num_topics: usize,

    #[arg(
        long,
        default_value_t = DEFAULT_TOL,
        help = "Convergence tolerance",
        long_help = "Stop once the mean log-likelihood per unit weight\n\
		     changes by less than this between two iterations."
    )]
    tol: f64,

    #[arg(
        long,
        default_value_t = DEFAULT_MAX_ITER,
        help = "Maximum number of EM iterations"
    )]
    max_iter: usize,

    #[arg(long, default_value_t = 42, help = "Random seed")]
    seed: u64,

    #[arg(
        long,
        help = "Number of threads",
        long_help = "Number of rayon threads.\n\
		     Defaults to the number of logical CPUs."
    )]
    threads: Option<usize>,
}

pub fn fit_plsa(args: &TrainArgs) -> anyhow::Result<()> {
    set_num_threads(args.threads)?;

    let obs = read_corpus_mtx(&args.data_file)?;

    let options = PlsaOptions {
        num_topics: args.num_topics,
        tol: args.tol,
        max_iter: args.max_iter,
        seed: args.seed,
        ..Default::default()
    };

    let fit = Plsa::new(options).train(&obs)?;

    let out = &args.out;
    let doc_topic_file = format!("{}.doc_topic.tsv.gz", out);
    let topic_word_file = format!("{}.topic_word.tsv.gz", out);
    let llik_file = format!("{}.llik.tsv.gz", out);
    let summary_file = format!("{}.summary.json", out);

    fit.tables.doc_topic().to_tsv(&doc_topic_file)?;
    fit.tables.topic_word().to_tsv(&topic_word_file)?;
    write_trace(&fit.trace, &llik_file)?;

    let summary = serde_json::json!({
        "data_file": args.data_file.as_ref(),
        "num_documents": obs.num_documents(),
        "num_words": obs.num_words(),
        "num_observations": obs.len(),
        "num_topics": args.num_topics,
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

    info!(
        "wrote {}, {}, {}, {}",
        doc_topic_file, topic_word_file, llik_file, summary_file
    );
    Ok(())
}
