use criterion::{criterion_group, criterion_main, Criterion};
use ir_core::query::evaluate;
use ir_core::{Index, Tokenizer};

const WORDS: &[&str] = &[
    "rust", "index", "query", "search", "engine", "posting", "term", "document", "crawler", "champion",
    "boolean", "score", "vector", "length", "shingle", "host", "delay", "token", "parser", "lexer",
];

fn corpus(docs: usize) -> Vec<(String, String)> {
    (0..docs)
        .map(|i| {
            let text: Vec<&str> = (0..80).map(|j| WORDS[(i * 7 + j * j) % WORDS.len()]).collect();
            (format!("http://bench.local/{i}"), text.join(" "))
        })
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    let text = corpus(1).remove(0).1;
    let tokenizer = Tokenizer::new().with_stemming(true);
    c.bench_function("tokenize_doc", |b| b.iter(|| tokenizer.tokenize(&text)));
}

fn bench_build(c: &mut Criterion) {
    let docs = corpus(500);
    c.bench_function("index_500_docs", |b| {
        b.iter(|| {
            let mut index = Index::new();
            index.index_corpus(docs.iter().map(|(u, t)| (u.as_str(), t.as_str())));
            index.update_champions(20);
            index
        })
    });
}

fn bench_query(c: &mut Criterion) {
    let mut index = Index::new();
    index.index_corpus(corpus(500));
    c.bench_function("boolean_query", |b| {
        b.iter(|| evaluate(&index, "(rust AND search) OR NOT (crawler OR host) AND engine"))
    });
}

criterion_group!(benches, bench_tokenize, bench_build, bench_query);
criterion_main!(benches);
