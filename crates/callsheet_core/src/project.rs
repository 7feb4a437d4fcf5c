use crate::autosave::SaveSink;
use crate::error::{CoreError, Result};
use crate::recalc::recalculate;
use crate::types::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const FILE_EXTENSION: &str = "callsheet";

/// Call time used for a fresh document.
pub const DEFAULT_CALL_TIME: ClockTime = ClockTime::hm(7, 0);

impl Header {
    pub fn new(title: impl Into<String>, call_time: ClockTime) -> Self {
        Self {
            call_time,
            title: title.into(),
            shoot_date: String::new(),
            director: String::new(),
            producer: String::new(),
            location: String::new(),
            notes: String::new(),
        }
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new("Untitled", DEFAULT_CALL_TIME)
    }
}

/// Totals shown alongside the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySummary {
    pub call_time: ClockTime,
    pub wrap_time: ClockTime,
    /// Sum of all durations. Wider than a single duration so long items
    /// cannot overflow it.
    pub total_minutes: u64,
    pub shots: usize,
    pub breaks: usize,
}

impl Document {
    /// Create an empty day anchored at `call_time`.
    pub fn new(title: impl Into<String>, call_time: ClockTime) -> Self {
        Self {
            header: Header::new(title, call_time),
            items: vec![],
            assets: Default::default(),
        }
    }

    /// Re-lay every item from the call time.
    pub fn recalculate(&mut self) {
        recalculate(&mut self.items, self.header.call_time);
    }

    /// Where the next appended item starts.
    pub fn tail_time(&self) -> ClockTime {
        self.items
            .last()
            .map(TimelineItem::end)
            .unwrap_or(self.header.call_time)
    }

    pub fn index_of(&self, item_id: Uuid) -> Option<usize> {
        self.items.iter().position(|i| i.id() == item_id)
    }

    pub fn item(&self, item_id: Uuid) -> Option<&TimelineItem> {
        self.items.iter().find(|i| i.id() == item_id)
    }

    pub fn summary(&self) -> DaySummary {
        let shots = self
            .items
            .iter()
            .filter(|i| i.kind() == ItemKind::Shot)
            .count();
        DaySummary {
            call_time: self.header.call_time,
            wrap_time: self.tail_time(),
            total_minutes: self
                .items
                .iter()
                .map(|i| u64::from(i.duration_minutes()))
                .sum(),
            shots,
            breaks: self.items.len() - shots,
        }
    }

    /// Restore the timeline and asset invariants on a document that came from
    /// outside the editor. Returns the number of orphaned images dropped.
    pub fn normalize(&mut self) -> usize {
        self.recalculate();
        let live: HashSet<Uuid> = self.items.iter().map(TimelineItem::id).collect();
        self.assets.prune_orphans(&live)
    }

    /// Save to a file as pretty-printed JSON.
    /// Appends the `.callsheet` extension if not present.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = ensure_extension(path.as_ref());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        tracing::debug!(path = %path.display(), items = self.items.len(), "document written");
        Ok(path)
    }

    /// Load a document and normalize it.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref()).map_err(CoreError::Io)?;
        let mut document: Document = serde_json::from_str(&data)?;
        let pruned = document.normalize();
        if pruned > 0 {
            tracing::warn!(pruned, "dropped images with no matching item");
        }
        Ok(document)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self {
            header: Header::default(),
            items: vec![],
            assets: Default::default(),
        }
    }
}

/// Save collaborator that writes the document to a file on the blocking pool.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: ensure_extension(&path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveSink for FileSink {
    async fn save(&self, snapshot: Document) -> anyhow::Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || snapshot.save_to_file(path)).await??;
        Ok(())
    }
}

pub fn ensure_extension(path: &Path) -> PathBuf {
    if path.extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION) {
        path.to_path_buf()
    } else {
        let mut p = path.to_path_buf();
        let mut name = p.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(FILE_EXTENSION);
        p.set_file_name(name);
        p
    }
}
