// src/store/jsonl.rs
// =============================================================================
// A JSON Lines page store.
//
// Each accepted page becomes one line: {"url":..,"title":..,"text":..,"links":[..]}
// The URL acts as a unique index. Existing lines are indexed when the file
// is opened, so a second run over the same file reports duplicates instead
// of writing them again.
//
// A line cut short (failed write, or a crash in an earlier run) is closed
// off with a newline before the next append, so it never swallows the
// following page.
// =============================================================================

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader, SeekFrom};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{PageSink, StoreOutcome};
use crate::error::StoreError;
use crate::page::Page;

#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    file: File,
    urls: HashSet<String>,
    // The last line in the file has no terminating newline.
    torn_tail: bool,
}

impl JsonlSink {
    /// Opens (or creates) `path` for appending and indexes the URLs already in it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let urls = index_existing(&path).await?;
        let torn_tail = ends_mid_line(&path).await?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        debug!(path = %path.display(), existing = urls.len(), torn_tail, "opened page store");

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                file,
                urls,
                torn_tail,
            }),
        })
    }

    /// Number of distinct pages in the file.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.urls.len()
    }
}

#[async_trait]
impl PageSink for JsonlSink {
    async fn ping(&self) -> Result<(), StoreError> {
        // The file may have been removed or made read-only since open.
        OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", self.path.display(), e)))
    }

    async fn store(&self, page: &Page) -> Result<StoreOutcome, StoreError> {
        let mut line = serde_json::to_string(page)?;
        line.push('\n');

        let mut inner = self.inner.lock().await;
        if inner.urls.contains(&page.url) {
            return Ok(StoreOutcome::DuplicateKey);
        }

        if inner.torn_tail {
            warn!(path = %self.path.display(), "terminating a partial line before appending");
            line.insert(0, '\n');
        }

        if let Err(e) = write_line(&mut inner.file, &line).await {
            inner.torn_tail = true;
            return Err(e.into());
        }
        inner.torn_tail = false;
        inner.urls.insert(page.url.clone());

        Ok(StoreOutcome::Inserted)
    }
}

async fn write_line(file: &mut File, line: &str) -> std::io::Result<()> {
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

async fn ends_mid_line(path: &Path) -> Result<bool, StoreError> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    if file.metadata().await?.len() == 0 {
        return Ok(false);
    }

    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] != b'\n')
}

async fn index_existing(path: &Path) -> Result<HashSet<String>, StoreError> {
    let mut urls = HashSet::new();

    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(urls),
        Err(e) => return Err(e.into()),
    };

    let mut lines = BufReader::new(file).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Page>(&line) {
            Ok(page) => {
                urls.insert(page.url);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable stored page"),
        }
    }

    Ok(urls)
}
