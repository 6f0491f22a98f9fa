//! Translation-table ETL.
//!
//! At startup the service refreshes the Chinese-English dictionary used
//! by the frontend: download the default table, merge it with an
//! optional operator-maintained custom table, dedupe case-insensitively
//! on the English key, and write a trimmed table holding only the
//! `{en, zhCN}` pairs the frontend needs. Every step degrades
//! gracefully; a missing or stale table never blocks the API.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::config::ApiConfig;

/// Default translation table, as downloaded.
pub const WORDS_FILE: &str = "words.json";

/// Operator-maintained additions, merged after the default table.
pub const CUSTOM_WORDS_FILE: &str = "custom-words.json";

/// Trimmed table served to the frontend.
pub const FRONTEND_WORDS_FILE: &str = "words-frontend.json";

/// Download timeout for the dictionary source.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// One trimmed dictionary row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrontendWord {
    pub en: String,
    #[serde(rename = "zhCN")]
    pub zh_cn: String,
}

/// Refresh both translation tables. Failures are logged and non-fatal.
pub async fn refresh_translation_tables(client: &reqwest::Client, config: &ApiConfig) {
    if update_translation_table(client, &config.words_url, &config.static_dir).await {
        match build_frontend_table(&config.static_dir) {
            Ok(count) => tracing::info!(count, "Frontend translation table written"),
            Err(e) => tracing::warn!(error = %e, "Failed to build frontend translation table"),
        }
    } else {
        tracing::warn!("No translation table available, frontend table not built");
    }
}

/// Download the default translation table into the static directory.
///
/// Returns whether a usable table is present afterwards: a failed
/// download still counts when a previously downloaded copy exists.
async fn update_translation_table(
    client: &reqwest::Client,
    words_url: &str,
    static_dir: &Path,
) -> bool {
    let path = static_dir.join(WORDS_FILE);

    match download_words(client, words_url).await {
        Ok(words) => match write_table(&path, &words) {
            Ok(()) => {
                tracing::info!(count = words.len(), "Translation table updated");
                return true;
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Failed to write translation table");
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, url = words_url, "Translation table download failed");
        }
    }

    if path.exists() {
        tracing::info!(path = %path.display(), "Using existing local translation table");
        true
    } else {
        false
    }
}

async fn download_words(
    client: &reqwest::Client,
    words_url: &str,
) -> Result<Vec<Value>, reqwest::Error> {
    client
        .get(words_url)
        .timeout(DOWNLOAD_TIMEOUT)
        .header("Accept", "application/json")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

fn write_table<T: Serialize>(path: &Path, table: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let serialized = serde_json::to_string_pretty(table)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, serialized)
}

/// Merge the default and custom tables into the trimmed frontend table.
pub fn build_frontend_table(static_dir: &Path) -> std::io::Result<usize> {
    let default_words = read_table(&static_dir.join(WORDS_FILE))?;

    let custom_path = static_dir.join(CUSTOM_WORDS_FILE);
    let custom_words = if custom_path.exists() {
        let words = read_table(&custom_path)?;
        tracing::info!(count = words.len(), "Custom translation table loaded");
        words
    } else {
        Vec::new()
    };

    let merged = merge_words(&default_words, &custom_words);
    write_table(&static_dir.join(FRONTEND_WORDS_FILE), &merged)?;
    Ok(merged.len())
}

fn read_table(path: &Path) -> std::io::Result<Vec<Value>> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Trim and dedupe dictionary rows.
///
/// Keeps only rows with both an `en` and a `zhCN` string; strips stray
/// quotes some upstream rows carry around the English key; dedupes
/// case-insensitively on `en`, first occurrence wins (so custom rows
/// never override default rows).
pub fn merge_words(default_words: &[Value], custom_words: &[Value]) -> Vec<FrontendWord> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for word in default_words.iter().chain(custom_words.iter()) {
        let Some(en) = word.get("en").and_then(Value::as_str) else {
            continue;
        };
        let en = en.trim_matches('"');
        let Some(zh_cn) = word.get("zhCN").and_then(Value::as_str) else {
            continue;
        };
        if en.is_empty() || zh_cn.is_empty() {
            continue;
        }
        if seen.insert(en.to_lowercase()) {
            merged.push(FrontendWord {
                en: en.to_string(),
                zh_cn: zh_cn.to_string(),
            });
        }
    }

    merged
}
