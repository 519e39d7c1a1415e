use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ir_core::config::DEFAULT_CHAMPION_R;
use ir_core::corpus::load_corpus;
use ir_core::query::evaluate;
use ir_core::{Index, Tokenizer, Weighting};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a TF-IDF inverted index over a corpus and run boolean queries against it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexArgs {
    /// Corpus path: a .json/.jsonl file or a directory of them
    #[arg(long)]
    input: String,
    /// Combine tf and idf as tf + idf instead of tf * idf
    #[arg(long, default_value_t = false)]
    additive: bool,
    /// Stem terms with the English Snowball stemmer
    #[arg(long, default_value_t = false)]
    stem: bool,
    /// Drop English stopwords
    #[arg(long, default_value_t = false)]
    stopwords: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print document, term and length statistics
    Stats {
        #[command(flatten)]
        index: IndexArgs,
        /// Emit JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Evaluate a boolean query, e.g. "(rust AND index) OR NOT java"
    Query {
        #[command(flatten)]
        index: IndexArgs,
        #[arg(long, short)]
        query: String,
    },
    /// Print the champion list of a term
    Champions {
        #[command(flatten)]
        index: IndexArgs,
        #[arg(long)]
        term: String,
        #[arg(long, default_value_t = DEFAULT_CHAMPION_R)]
        r: usize,
    },
}

#[derive(Serialize)]
struct Stats {
    num_docs: usize,
    num_terms: usize,
    weighting: Weighting,
    mean_length: f64,
    built_at: String,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { index, json } => stats(&build(&index)?, json),
        Commands::Query { index, query } => run_query(&build(&index)?, &query),
        Commands::Champions { index, term, r } => champions(build(&index)?, &term, r),
    }
}

fn build(args: &IndexArgs) -> Result<Index> {
    let docs = load_corpus(&args.input).with_context(|| format!("loading corpus from {}", args.input))?;
    let tokenizer = Tokenizer::new().with_stemming(args.stem).with_stopwords_removed(args.stopwords);
    let weighting = if args.additive { Weighting::Sum } else { Weighting::Product };
    let mut index = Index::with_options(tokenizer, weighting);
    index.index_corpus(docs.iter().map(|d| (d.url.as_str(), d.text.as_str())));
    Ok(index)
}

fn stats(index: &Index, json: bool) -> Result<()> {
    let postings = index.postings();
    let ids = index.vocabulary().get_document_ids();
    let lengths: Vec<f64> = ids.iter().filter_map(|&id| postings.get_document_length(id).ok()).collect();
    let mean_length = if lengths.is_empty() { 0.0 } else { lengths.iter().sum::<f64>() / lengths.len() as f64 };
    let stats = Stats {
        num_docs: index.vocabulary().len(),
        num_terms: postings.num_terms(),
        weighting: postings.weighting(),
        mean_length,
        built_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!(
            "docs={} terms={} weighting={:?} mean_length={:.4}",
            stats.num_docs, stats.num_terms, stats.weighting, stats.mean_length
        );
    }
    Ok(())
}

fn run_query(index: &Index, query: &str) -> Result<()> {
    let matches = evaluate(index, query).with_context(|| format!("query {query:?}"))?;
    tracing::info!(query, total_hits = matches.len(), "query evaluated");
    for id in matches {
        println!("{id}\t{}", index.vocabulary().get(id).unwrap_or("?"));
    }
    Ok(())
}

fn champions(mut index: Index, term: &str, r: usize) -> Result<()> {
    index.update_champions(r);
    let Some(normalized) = index.tokenizer().normalize_term(term) else {
        anyhow::bail!("{term:?} does not produce an index term");
    };
    let postings = index.postings();
    let Some(list) = postings.champions(&normalized) else {
        anyhow::bail!("term {normalized:?} does not occur in the corpus");
    };
    for &id in list {
        println!(
            "{id}\t{:.4}\t{}",
            postings.get_tf_idf(&normalized, id),
            index.vocabulary().get(id).unwrap_or("?")
        );
    }
    Ok(())
}
