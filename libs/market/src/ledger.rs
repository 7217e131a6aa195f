use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::model::PublishedChart;

pub const DEFAULT_PATH: &str = "latest_chart_urls.txt";

/// Flat `LABEL: URL` file holding the latest published chart per asset.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn line(entry: &PublishedChart) -> String {
        format!("{}: {}\n", entry.label, entry.url)
    }

    /// Truncate the file, creating it if needed.
    pub fn reset(&self) -> Result<()> {
        fs::write(&self.path, "").with_context(|| format!("resetting {}", self.path.display()))
    }

    pub fn append(&self, entry: &PublishedChart) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;

        file.write_all(Self::line(entry).as_bytes())
            .with_context(|| format!("appending to {}", self.path.display()))?;

        debug!(label = %entry.label, path = %self.path.display(), "appended ledger line");
        Ok(())
    }

    /// Replace the whole file with one line per entry, in order.
    pub fn write_all(&self, entries: &[PublishedChart]) -> Result<()> {
        let contents: String = entries.iter().map(Self::line).collect();
        fs::write(&self.path, contents).with_context(|| format!("writing {}", self.path.display()))
    }

    /// Entries currently on disk. A missing file reads as empty.
    pub fn read(&self) -> Result<Vec<PublishedChart>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("reading {}", self.path.display())),
        };

        Ok(contents.lines().filter_map(parse_line).collect())
    }
}

fn parse_line(line: &str) -> Option<PublishedChart> {
    let (label, url) = line.split_once(": ")?;
    let (label, url) = (label.trim(), url.trim());

    if label.is_empty() || url.is_empty() {
        return None;
    }

    Some(PublishedChart {
        label: label.to_string(),
        url: url.to_string(),
        delete_hash: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_ledger() -> (TempDir, Ledger) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join(DEFAULT_PATH));
        (dir, ledger)
    }

    fn entry(label: &str, url: &str) -> PublishedChart {
        PublishedChart {
            label: label.to_string(),
            url: url.to_string(),
            delete_hash: Some("hash".to_string()),
        }
    }

    #[test]
    fn write_all_overwrites_previous_content() {
        let (_dir, ledger) = temp_ledger();
        ledger
            .write_all(&[entry("ETH", "https://a"), entry("XLM", "https://b")])
            .unwrap();
        ledger.write_all(&[entry("AVAX", "https://c")]).unwrap();

        assert_eq!(fs::read_to_string(ledger.path()).unwrap(), "AVAX: https://c\n");
    }

    #[test]
    fn append_accumulates_after_reset() {
        let (_dir, ledger) = temp_ledger();
        fs::write(ledger.path(), "OLD: https://old\n").unwrap();

        ledger.reset().unwrap();
        ledger.append(&entry("ETH", "https://a")).unwrap();
        ledger.append(&entry("ONDO", "https://d")).unwrap();

        assert_eq!(
            fs::read_to_string(ledger.path()).unwrap(),
            "ETH: https://a\nONDO: https://d\n"
        );
    }

    #[test]
    fn read_parses_lines_and_skips_junk() {
        let (_dir, ledger) = temp_ledger();
        fs::write(ledger.path(), "ETH: https://i.imgur.com/a.png\n\nnot a line\n: https://x\n").unwrap();

        let entries = ledger.read().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "ETH");
        assert_eq!(entries[0].url, "https://i.imgur.com/a.png");
    }

    #[test]
    fn missing_file_reads_empty() {
        let (_dir, ledger) = temp_ledger();
        assert!(ledger.read().unwrap().is_empty());
    }
}
