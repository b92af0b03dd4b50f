use crate::common::*;
use lentil::simulate::{simulate_corpus, SimArgs};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[arg(
        long,
        short,
        required = true,
        help = "Output header",
        long_help = "Output header for results:\n\
		     - {out}.mtx.gz (words x documents)\n\
		     - {out}.doc_topic.tsv.gz (true proportions)\n\
		     - {out}.topic_word.tsv.gz (true dictionaries)\n"
    )]
    out: Box<str>,

    #[arg(long, short = 'n', default_value_t = 100, help = "Number of documents")]
    documents: usize,

    #[arg(long, short = 'w', default_value_t = 500, help = "Vocabulary size")]
    words: usize,

    #[arg(long, short = 'k', default_value_t = 5, help = "Number of topics")]
    num_topics: usize,

    #[arg(long, default_value_t = 200, help = "Tokens per document")]
    depth: usize,

    #[arg(
        long,
        default_value_t = 1.0,
        help = "Dirichlet concentration of topic proportions"
    )]
    doc_concentration: f64,

    #[arg(
        long,
        default_value_t = 0.1,
        help = "Dirichlet concentration of topic dictionaries"
    )]
    word_concentration: f64,

    #[arg(long, default_value_t = 42, help = "Random seed")]
    rseed: u64,
}

pub fn simulate_plsa(args: &SimulateArgs) -> anyhow::Result<()> {
    let sim = simulate_corpus(&SimArgs {
        num_documents: args.documents,
        num_words: args.words,
        num_topics: args.num_topics,
        depth: args.depth,
        doc_concentration: args.doc_concentration,
        word_concentration: args.word_concentration,
        rseed: args.rseed,
    })?;

    let out = &args.out;
    let mtx_file = format!("{}.mtx.gz", out);
    let doc_topic_file = format!("{}.doc_topic.tsv.gz", out);
    let topic_word_file = format!("{}.topic_word.tsv.gz", out);

    // words in rows, documents in columns
    let mut triplets: Vec<(usize, usize, f64)> = sim
        .observations
        .triplets()
        .map(|(d, w, x)| (w, d, x))
        .collect();
    triplets.sort_by_key(|&(w, d, _)| (d, w));

    write_mtx_triplets(&triplets, args.words, args.documents, &mtx_file)?;
    sim.doc_topic.to_tsv(&doc_topic_file)?;
    sim.topic_word.to_tsv(&topic_word_file)?;

    info!("wrote {}, {}, {}", mtx_file, doc_topic_file, topic_word_file);
    Ok(())
}
