use anyhow::{anyhow, Result};
use clap::Parser;
use crawler::dedup::NearDuplicateFilter;
use crawler::politeness::BackHeap;
use parking_lot::Mutex;
use reqwest::{header, Client, Url};
use scraper::{Html, Selector};
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tokio::time::sleep;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Crawl the web politely into a JSONL corpus, skipping near-duplicate pages")]
struct Cli {
    /// Path to a file with seed URLs (one per line)
    #[arg(long)]
    seeds: String,
    /// Output JSONL file path
    #[arg(long, default_value = "./sample_data/crawl.jsonl")]
    output: String,
    /// Maximum number of documents to emit
    #[arg(long, default_value_t = 1_000)]
    max_docs: usize,
    /// Maximum pages to crawl per host
    #[arg(long, default_value_t = 10)]
    max_per_host: usize,
    /// Number of workers
    #[arg(long, default_value_t = 16)]
    concurrency: usize,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// Milliseconds to wait between two requests to the same host
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,
    /// Shared super-shingles that make a page a near-duplicate
    #[arg(long, default_value_t = 2)]
    dup_threshold: usize,
    /// User-Agent string to use for crawling
    #[arg(long, default_value = "ir-crawler/0.1 (+https://example.com/bot)")]
    user_agent: String,
    /// If true, only follow links that remain on the same host as the page
    #[arg(long, default_value_t = true)]
    same_host_only: bool,
}

#[derive(Serialize)]
struct OutDoc<'a> {
    id: String,
    title: &'a str,
    body: &'a str,
    url: &'a str,
    timestamp: String,
}

/// URLs waiting per host. A host is `busy` while it sits in the back heap or
/// a worker is fetching from it; only idle hosts get pushed on enqueue.
#[derive(Default)]
struct Frontier {
    queues: HashMap<String, VecDeque<Url>>,
    busy: HashSet<String>,
    visited_hosts: HashSet<String>,
    seen: HashSet<String>,
    per_host: HashMap<String, usize>,
}

struct Crawl {
    args: Cli,
    client: Client,
    heap: BackHeap,
    frontier: Mutex<Frontier>,
    dedup: Mutex<NearDuplicateFilter>,
    out: Mutex<BufWriter<File>>,
    emitted: AtomicUsize,
    active: AtomicUsize,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();
    if let Some(dir) = std::path::Path::new(&args.output).parent() {
        fs::create_dir_all(dir).ok();
    }

    let client = Client::builder()
        .user_agent(args.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;

    let crawl = Arc::new(Crawl {
        client,
        heap: BackHeap::new(Duration::from_millis(args.delay_ms)),
        frontier: Mutex::new(Frontier::default()),
        dedup: Mutex::new(NearDuplicateFilter::new(args.dup_threshold)),
        out: Mutex::new(BufWriter::new(File::create(&args.output)?)),
        emitted: AtomicUsize::new(0),
        active: AtomicUsize::new(0),
        args,
    });

    let mut seeds = 0usize;
    for line in BufReader::new(File::open(&crawl.args.seeds)?).lines() {
        let s = line?.trim().to_string();
        if s.is_empty() || s.starts_with('#') { continue; }
        let u = Url::parse(&s).or_else(|_| Url::parse(&format!("https://{}", s)));
        if let Ok(u) = u {
            crawl.enqueue(u);
            seeds += 1;
        }
    }
    if seeds == 0 { return Err(anyhow!("no valid seeds")); }
    tracing::info!(
        seeds,
        max_docs = crawl.args.max_docs,
        concurrency = crawl.args.concurrency,
        output = %crawl.args.output,
        "crawl started"
    );

    let workers: Vec<_> = (0..crawl.args.concurrency.max(1)).map(|_| tokio::spawn(worker(crawl.clone()))).collect();
    for w in workers {
        w.await?;
    }
    crawl.out.lock().flush()?;

    let frontier = crawl.frontier.lock();
    tracing::info!(
        emitted = crawl.emitted.load(Ordering::SeqCst),
        visited = frontier.seen.len(),
        hosts = frontier.visited_hosts.len(),
        output = %crawl.args.output,
        "crawl done"
    );
    Ok(())
}

async fn worker(crawl: Arc<Crawl>) {
    while crawl.emitted.load(Ordering::SeqCst) < crawl.args.max_docs {
        crawl.active.fetch_add(1, Ordering::SeqCst);
        let Some((wait, host)) = crawl.heap.pop_host() else {
            // Nothing scheduled; stop once no other worker can add more.
            if crawl.active.fetch_sub(1, Ordering::SeqCst) == 1 {
                break;
            }
            sleep(Duration::from_millis(50)).await;
            continue;
        };
        sleep(wait).await;

        let next = crawl.frontier.lock().queues.get_mut(&host).and_then(VecDeque::pop_front);
        if let Some(url) = next {
            crawl.visit(url).await;
        }
        crawl.release(&host);
        crawl.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Crawl {
    fn enqueue(&self, url: Url) {
        let Some(host) = url.host_str().map(str::to_string) else { return };
        let mut frontier = self.frontier.lock();
        if !frontier.seen.insert(norm(&url)) { return; }
        let count = frontier.per_host.entry(host.clone()).or_insert(0);
        if *count >= self.args.max_per_host { return; }
        *count += 1;

        frontier.queues.entry(host.clone()).or_default().push_back(url);
        if frontier.busy.insert(host.clone()) {
            let delay = frontier.visited_hosts.contains(&host);
            self.heap.push_host(&host, delay);
        }
    }

    /// Reschedule `host` after a fetch if it still has work, else mark it idle.
    fn release(&self, host: &str) {
        let mut frontier = self.frontier.lock();
        frontier.visited_hosts.insert(host.to_string());
        if frontier.queues.get(host).map_or(false, |q| !q.is_empty()) {
            self.heap.push_host(host, true);
        } else {
            frontier.busy.remove(host);
        }
    }

    async fn visit(&self, url: Url) {
        let Some(page) = self.fetch(&url).await else { return };

        match self.dedup.lock().check_and_insert(&page.body) {
            Ok(true) => {
                tracing::debug!(%url, "near-duplicate skipped");
                return;
            }
            Ok(false) => {}
            Err(e) => tracing::warn!(%url, error = %e, "fingerprinting failed"),
        }

        for link in page.links {
            if self.args.same_host_only && link.host_str() != url.host_str() { continue; }
            self.enqueue(link);
        }

        let u = norm(&url);
        let mut hasher = Sha1::new();
        hasher.update(u.as_bytes());
        let id = format!("{:x}", hasher.finalize());
        let ts = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
        let rec = OutDoc { id, title: &page.title, body: &page.body, url: &u, timestamp: ts };
        let written = {
            let mut out = self.out.lock();
            serde_json::to_writer(&mut *out, &rec)
                .map_err(std::io::Error::from)
                .and_then(|()| out.write_all(b"\n"))
        };
        if let Err(e) = written {
            tracing::warn!(%url, error = %e, "failed to write document");
            return;
        }
        let emitted = self.emitted.fetch_add(1, Ordering::SeqCst) + 1;
        if emitted % 100 == 0 {
            tracing::info!(emitted, hosts = self.heap.len(), "progress");
        }
    }

    async fn fetch(&self, url: &Url) -> Option<Page> {
        let resp = match self.client.get(url.clone()).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(%url, error = %e, "fetch failed");
                return None;
            }
        };
        if !resp.status().is_success() { return None; }
        if let Some(ct) = resp.headers().get(header::CONTENT_TYPE) {
            if let Ok(v) = ct.to_str() { if !v.starts_with("text/html") { return None; } }
        }
        let bytes = resp.bytes().await.ok()?;
        if bytes.len() > 2 * 1024 * 1024 { return None; }
        Some(extract(&String::from_utf8_lossy(&bytes), url))
    }
}

struct Page {
    title: String,
    body: String,
    links: Vec<Url>,
}

fn extract(html: &str, url: &Url) -> Page {
    let sel_title = Selector::parse("title").expect("valid selector");
    let sel_body = Selector::parse("body").expect("valid selector");
    let sel_a = Selector::parse("a").expect("valid selector");

    let doc = Html::parse_document(html);
    let title = doc.select(&sel_title).next().map(|n| n.text().collect::<String>()).unwrap_or_default();
    let body = doc
        .select(&sel_body)
        .next()
        .map(|n| n.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    let mut links = Vec::new();
    for a in doc.select(&sel_a) {
        if let Some(h) = a.value().attr("href") {
            if let Ok(u) = Url::parse(h).or_else(|_| url.join(h)) {
                if u.scheme().starts_with("http") { links.push(u); }
            }
        }
    }
    Page { title: title.trim().to_string(), body, links }
}

fn norm(u: &Url) -> String { let mut s = u.clone(); s.set_fragment(None); s.to_string() }
