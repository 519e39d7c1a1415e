use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use ir_core::corpus::load_corpus;
use ir_core::{Index, Tokenizer, Weighting};
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus to index at startup (.json/.jsonl file or directory); starts empty when omitted
    #[arg(long)]
    corpus: Option<String>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Combine tf and idf as tf + idf instead of tf * idf
    #[arg(long, default_value_t = false)]
    additive: bool,
    /// Stem terms with the English Snowball stemmer
    #[arg(long, default_value_t = false)]
    stem: bool,
    /// Drop English stopwords
    #[arg(long, default_value_t = false)]
    stopwords: bool,
    /// Build champion lists of this size after the startup index
    #[arg(long)]
    champions: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let tokenizer = Tokenizer::new().with_stemming(args.stem).with_stopwords_removed(args.stopwords);
    let weighting = if args.additive { Weighting::Sum } else { Weighting::Product };
    let mut index = Index::with_options(tokenizer, weighting);
    if let Some(path) = &args.corpus {
        let docs = load_corpus(path).with_context(|| format!("loading corpus from {path}"))?;
        index.index_corpus(docs.iter().map(|d| (d.url.as_str(), d.text.as_str())));
    }
    if let Some(r) = args.champions {
        index.update_champions(r);
    }

    let app: Router = build_app(index, ServerConfig::from_env());
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
