use cairn_models::Network;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Transactions the interpreters cannot handle, kept across restarts so the
/// mempool does not parse them again
#[derive(Debug)]
pub struct NotSupportedTransactionsCache {
    path: PathBuf,
    order: Vec<String>,
    hashes: HashSet<String>,
}

impl NotSupportedTransactionsCache {
    /// Cache backed by `<cache_dir>/not_supported_tx_cache.<network>.txt`, restored from it
    pub fn new(cache_dir: &Path, network: Network) -> Result<Self, std::io::Error> {
        let mut cache = NotSupportedTransactionsCache {
            path: cache_dir.join(format!("not_supported_tx_cache.{}.txt", network)),
            order: Vec::new(),
            hashes: HashSet::new(),
        };
        cache.restore()?;
        Ok(cache)
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records `tx_hash`. Known hashes keep their position.
    pub fn add(&mut self, tx_hash: &str) {
        if self.hashes.insert(tx_hash.to_string()) {
            self.order.push(tx_hash.to_string());
        }
    }

    /// Whether `tx_hash` was recorded
    pub fn is_not_supported(&self, tx_hash: &str) -> bool {
        self.hashes.contains(tx_hash)
    }

    /// Writes one hash per line, in insertion order
    pub fn backup(&self) -> Result<(), std::io::Error> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut content = self.order.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(&self.path, content)?;
        debug!(
            "{} not supported transactions saved to {}",
            self.order.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Loads the backing file. A missing file leaves the cache empty.
    pub fn restore(&mut self) -> Result<(), std::io::Error> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };
        for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
            self.add(line);
        }
        debug!(
            "{} not supported transactions restored from {}",
            self.order.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Empties the cache and deletes the backing file
    pub fn clear(&mut self) {
        self.order.clear();
        self.hashes.clear();
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                warn!("cannot remove {}: {}", self.path.display(), err);
            }
        }
    }

    /// Number of recorded hashes
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is recorded
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
