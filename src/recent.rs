use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Number of recent searches kept.
pub const MAX_RECENT: usize = 5;

/// Most-recent-first list of previous queries, persisted as a JSON array.
#[derive(Debug, Clone)]
pub struct RecentSearches {
    entries: Vec<String>,
    persist_path: PathBuf,
}

impl RecentSearches {
    /// Load from `path`. A missing or unreadable file starts an empty list.
    pub fn open(path: &Path) -> Self {
        let entries = if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(data) => serde_json::from_str::<Vec<String>>(&data).unwrap_or_else(|e| {
                    tracing::warn!("Ignoring corrupt recent searches at {}: {e}", path.display());
                    Vec::new()
                }),
                Err(e) => {
                    tracing::warn!("Failed to read recent searches at {}: {e}", path.display());
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Self {
            entries: normalize(entries),
            persist_path: path.to_path_buf(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Move `query` to the front (inserting it if new) and drop anything past the cap.
    pub fn record(&mut self, query: &str) -> Result<()> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }
        self.entries.retain(|q| q != query);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(MAX_RECENT);
        self.persist()
    }

    /// Persist to disk (atomic write via temp file + rename).
    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.persist_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let data = serde_json::to_string(&self.entries)?;
        let tmp_path = self.persist_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.persist_path)
            .with_context(|| format!("Failed to replace {}", self.persist_path.display()))?;
        Ok(())
    }
}

/// Enforce the list invariants on data read from disk.
fn normalize(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(MAX_RECENT);
    for q in raw {
        let q = q.trim();
        if q.is_empty() || out.iter().any(|existing| existing == q) {
            continue;
        }
        out.push(q.to_string());
        if out.len() == MAX_RECENT {
            break;
        }
    }
    out
}
