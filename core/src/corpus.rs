use crate::error::CorpusError;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use walkdir::WalkDir;

/// One document of a corpus: its URL and already markup-free text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CorpusDoc {
    pub url: String,
    /// Crawler output calls this field `body`.
    #[serde(alias = "body")]
    pub text: String,
}

/// Load a corpus from a `.jsonl` file, a `.json` file (one object or an
/// array) or a directory of such files.
///
/// Directory entries are visited in file-name order so the same input
/// always yields the same document ids.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<CorpusDoc>, CorpusError> {
    let path = path.as_ref();
    let mut docs = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|source| CorpusError::Walk { path: path.to_path_buf(), source })?;
            let p = entry.path();
            if p.is_file() && corpus_extension(p).is_some() {
                load_file(p, &mut docs)?;
            }
        }
    } else if path.is_file() && corpus_extension(path).is_some() {
        load_file(path, &mut docs)?;
    } else {
        return Err(CorpusError::UnsupportedInput(path.to_path_buf()));
    }
    tracing::debug!(path = %path.display(), docs = docs.len(), "corpus loaded");
    Ok(docs)
}

fn corpus_extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str()).filter(|ext| matches!(*ext, "json" | "jsonl"))
}

fn load_file(path: &Path, docs: &mut Vec<CorpusDoc>) -> Result<(), CorpusError> {
    let io_err = |source| CorpusError::Io { path: path.to_path_buf(), source };
    let json_err = |source| CorpusError::Json { path: path.to_path_buf(), source };
    let reader = BufReader::new(File::open(path).map_err(io_err)?);

    if corpus_extension(path) == Some("jsonl") {
        for line in reader.lines() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() { continue; }
            docs.push(serde_json::from_str(&line).map_err(json_err)?);
        }
        return Ok(());
    }

    match serde_json::from_reader(reader).map_err(json_err)? {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v).map_err(json_err)?);
            }
        }
        v @ serde_json::Value::Object(_) => docs.push(serde_json::from_value(v).map_err(json_err)?),
        _ => {}
    }
    Ok(())
}
