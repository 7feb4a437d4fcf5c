//! Editor session: the single owner of a document.
//!
//! Every mutation goes through here so that history and autosave see the same
//! stream of accepted changes. The autosave task shares the document behind a
//! mutex and only ever reads it.

use crate::assets::{prepare_image, AssetWarning, ImageCodec};
use crate::autosave::{AutosaveHandle, AutosaveStatus, SaveSink};
use crate::config::{AutosaveConfig, EditorConfig};
use crate::editing::{HeaderEdit, ItemEdit};
use crate::error::{CoreError, Result};
use crate::history::*;
use crate::import::ShotSource;
use crate::project::DaySummary;
use crate::recalc::is_consistent;
use crate::types::*;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use uuid::Uuid;

pub struct EditorSession {
    document: Arc<Mutex<Document>>,
    history: History,
    config: EditorConfig,
    autosave: Option<AutosaveHandle>,
}

impl EditorSession {
    /// Take ownership of `document`, normalizing it first.
    pub fn new(mut document: Document, config: EditorConfig) -> Self {
        let pruned = document.normalize();
        if pruned > 0 {
            tracing::warn!(pruned, "dropped images with no matching item");
        }
        Self {
            document: Arc::new(Mutex::new(document)),
            history: History::new(config.history_depth),
            config,
            autosave: None,
        }
    }

    /// Attach an autosave task writing to `sink`. Must be called from within
    /// a tokio runtime.
    pub fn with_autosave<S: SaveSink>(mut self, config: AutosaveConfig, sink: S) -> Self {
        self.autosave = Some(AutosaveHandle::spawn(config, self.document.clone(), sink));
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn document(&self) -> MutexGuard<'_, Document> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&mut self, cmd: Box<dyn Command>) -> Result<bool> {
        let changed = {
            let mut document = self.document.lock().unwrap_or_else(PoisonError::into_inner);
            let changed = self.history.execute(cmd, &mut document)?;
            debug_assert!(is_consistent(&document.items, document.header.call_time));
            changed
        };
        if changed {
            self.mark_changed();
        }
        Ok(changed)
    }

    fn mark_changed(&self) {
        if let Some(autosave) = &self.autosave {
            autosave.notify_changed();
        }
    }

    fn last_item_id(&self) -> Result<Uuid> {
        self.document()
            .items
            .last()
            .map(TimelineItem::id)
            .ok_or_else(|| CoreError::InvalidOperation("timeline is empty".into()))
    }

    // ---- Items ----

    /// Append a shot; `None` uses the configured default duration.
    pub fn add_shot(&mut self, details: ShotDetails, duration_minutes: Option<u32>) -> Result<Uuid> {
        let minutes = duration_minutes.unwrap_or(self.config.shot_minutes);
        self.apply(Box::new(AddItemCommand::shot(details, minutes)))?;
        self.last_item_id()
    }

    /// Append a break; `None` uses the configured default duration.
    pub fn add_break(
        &mut self,
        description: impl Into<String>,
        duration_minutes: Option<u32>,
    ) -> Result<Uuid> {
        let minutes = duration_minutes.unwrap_or(self.config.break_minutes);
        self.apply(Box::new(AddItemCommand::break_(description, minutes)))?;
        self.last_item_id()
    }

    pub fn edit_item(&mut self, item_id: Uuid, edit: ItemEdit) -> Result<bool> {
        self.apply(Box::new(EditItemCommand::new(item_id, edit)))
    }

    pub fn edit_header(&mut self, edit: HeaderEdit) -> Result<bool> {
        self.apply(Box::new(EditHeaderCommand::new(edit)))
    }

    pub fn remove_item(&mut self, item_id: Uuid) -> Result<()> {
        self.apply(Box::new(RemoveItemCommand::new(item_id)))?;
        Ok(())
    }

    /// Commit a drag from `from` to `to`. Returns false for a drop in place
    /// or outside the list.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<bool> {
        self.apply(Box::new(ReorderCommand::new(from, to)))
    }

    /// Import the selected shot-list records. Returns the new item ids in
    /// timeline order.
    pub fn import(
        &mut self,
        source: &dyn ShotSource,
        selected: &[Uuid],
        duration_minutes: Option<u32>,
    ) -> Result<Vec<Uuid>> {
        let minutes = duration_minutes.unwrap_or(self.config.import_minutes);
        let cmd = ImportCommand::new(source, selected, minutes)?;
        let before = self.document().items.len();
        if !self.apply(Box::new(cmd))? {
            return Ok(vec![]);
        }
        Ok(self.document().items[before..].iter().map(TimelineItem::id).collect())
    }

    // ---- Images ----

    /// Compress `raw` off the async runtime and attach it to `item_id`.
    ///
    /// The item is checked again after compression; if it was removed in the
    /// meantime the result is discarded with `ItemNotFound`.
    pub async fn attach_image(
        &mut self,
        item_id: Uuid,
        codec: Arc<dyn ImageCodec>,
        raw: Vec<u8>,
    ) -> Result<Option<AssetWarning>> {
        if self.document().index_of(item_id).is_none() {
            return Err(CoreError::ItemNotFound(item_id));
        }
        let settings = self.config.compression;
        let (asset, warning) =
            tokio::task::spawn_blocking(move || prepare_image(codec.as_ref(), &raw, &settings))
                .await
                .map_err(|e| CoreError::InvalidOperation(format!("image task failed: {e}")))??;
        tracing::info!(%item_id, bytes = asset.size(), compressed = asset.compressed, "image attached");
        self.apply(Box::new(AttachImageCommand::new(item_id, asset)))?;
        Ok(warning)
    }

    pub fn detach_image(&mut self, item_id: Uuid) -> Result<bool> {
        self.apply(Box::new(DetachImageCommand::new(item_id)))
    }

    // ---- History ----

    pub fn undo(&mut self) -> Result<()> {
        {
            let mut document = self.document.lock().unwrap_or_else(PoisonError::into_inner);
            self.history.undo(&mut document)?;
        }
        self.mark_changed();
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        {
            let mut document = self.document.lock().unwrap_or_else(PoisonError::into_inner);
            self.history.redo(&mut document)?;
        }
        self.mark_changed();
        Ok(())
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    // ---- Queries ----

    pub fn snapshot(&self) -> Document {
        self.document().clone()
    }

    /// Run `f` against the current document without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.document())
    }

    pub fn summary(&self) -> DaySummary {
        self.document().summary()
    }

    pub fn autosave_status(&self) -> Option<AutosaveStatus> {
        self.autosave.as_ref().map(AutosaveHandle::status)
    }

    pub fn subscribe_autosave(&self) -> Option<watch::Receiver<AutosaveStatus>> {
        self.autosave.as_ref().map(AutosaveHandle::subscribe)
    }

    // ---- Lifecycle ----

    /// Persist pending changes now. A session without autosave has nothing
    /// to flush.
    pub async fn flush(&self) -> Result<()> {
        match &self.autosave {
            Some(autosave) => autosave.flush().await,
            None => Ok(()),
        }
    }

    /// Flush and stop the autosave task. Returns the final document.
    pub async fn close(self) -> Result<Document> {
        if let Some(autosave) = self.autosave {
            autosave.shutdown().await?;
        }
        let document = match Arc::try_unwrap(self.document) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => shared.lock().unwrap_or_else(PoisonError::into_inner).clone(),
        };
        Ok(document)
    }
}
