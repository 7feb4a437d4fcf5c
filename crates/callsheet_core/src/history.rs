use crate::assets::{AssetStore, ImageAsset};
use crate::editing::{HeaderEdit, ItemEdit};
use crate::error::{CoreError, Result};
use crate::import::ShotSource;
use crate::types::*;
use uuid::Uuid;

/// A document mutation that can be recorded in the history.
pub trait Command: std::fmt::Debug + Send {
    /// Apply the mutation. Returns whether the document changed; an error
    /// must leave the document as it was.
    fn execute(&self, document: &mut Document) -> Result<bool>;
    fn description(&self) -> &str;
}

#[derive(Debug)]
struct Entry {
    command: Box<dyn Command>,
    /// The document on the other side of this entry: the state before the
    /// command while on the undo stack, after it while on the redo stack.
    snapshot: Document,
}

/// Undo/redo history.
///
/// Undo restores whole-document snapshots, so the item list, header and
/// images always come back together.
pub struct History {
    undo_stack: Vec<Entry>,
    redo_stack: Vec<Entry>,
    max_size: usize,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Execute a command and record it when it changed the document. Clears
    /// the redo stack in that case.
    pub fn execute(&mut self, cmd: Box<dyn Command>, document: &mut Document) -> Result<bool> {
        let before = document.clone();
        let changed = match cmd.execute(document) {
            Ok(changed) => changed,
            Err(e) => {
                *document = before;
                return Err(e);
            }
        };
        if !changed {
            return Ok(false);
        }
        tracing::debug!(action = cmd.description(), "recorded");
        self.redo_stack.clear();
        self.undo_stack.push(Entry {
            command: cmd,
            snapshot: before,
        });
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
        Ok(true)
    }

    /// Undo the last command.
    pub fn undo(&mut self, document: &mut Document) -> Result<()> {
        let mut entry = self.undo_stack.pop().ok_or(CoreError::NothingToUndo)?;
        std::mem::swap(document, &mut entry.snapshot);
        self.redo_stack.push(entry);
        Ok(())
    }

    /// Redo the last undone command.
    pub fn redo(&mut self, document: &mut Document) -> Result<()> {
        let mut entry = self.redo_stack.pop().ok_or(CoreError::NothingToRedo)?;
        std::mem::swap(document, &mut entry.snapshot);
        self.undo_stack.push(entry);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.command.description())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.command.description())
    }
}

// ---------------------------------------------------------------------------
// AddItemCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AddItemCommand {
    details: ItemDetails,
    duration_minutes: u32,
}

impl AddItemCommand {
    pub fn shot(details: ShotDetails, duration_minutes: u32) -> Self {
        Self::new(ItemDetails::Shot(details), duration_minutes)
    }

    pub fn break_(description: impl Into<String>, duration_minutes: u32) -> Self {
        Self::new(
            ItemDetails::Break(BreakDetails {
                description: description.into(),
            }),
            duration_minutes,
        )
    }

    fn new(details: ItemDetails, duration_minutes: u32) -> Self {
        Self {
            details,
            duration_minutes,
        }
    }
}

impl Command for AddItemCommand {
    fn execute(&self, document: &mut Document) -> Result<bool> {
        match &self.details {
            ItemDetails::Shot(shot) => document.add_shot(shot.clone(), self.duration_minutes),
            ItemDetails::Break(brk) => {
                document.add_break(brk.description.clone(), self.duration_minutes)
            }
        };
        Ok(true)
    }

    fn description(&self) -> &str {
        match self.details {
            ItemDetails::Shot(_) => "Add shot",
            ItemDetails::Break(_) => "Add break",
        }
    }
}

// ---------------------------------------------------------------------------
// EditItemCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct EditItemCommand {
    item_id: Uuid,
    edit: ItemEdit,
}

impl EditItemCommand {
    pub fn new(item_id: Uuid, edit: ItemEdit) -> Self {
        Self { item_id, edit }
    }
}

impl Command for EditItemCommand {
    fn execute(&self, document: &mut Document) -> Result<bool> {
        document.edit_item(self.item_id, self.edit.clone())
    }

    fn description(&self) -> &str {
        if self.edit.affects_timing() {
            "Change timing"
        } else {
            "Edit item"
        }
    }
}

// ---------------------------------------------------------------------------
// EditHeaderCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct EditHeaderCommand {
    edit: HeaderEdit,
}

impl EditHeaderCommand {
    pub fn new(edit: HeaderEdit) -> Self {
        Self { edit }
    }
}

impl Command for EditHeaderCommand {
    fn execute(&self, document: &mut Document) -> Result<bool> {
        Ok(document.edit_header(self.edit.clone()))
    }

    fn description(&self) -> &str {
        match self.edit {
            HeaderEdit::CallTime(_) => "Change call time",
            _ => "Edit header",
        }
    }
}

// ---------------------------------------------------------------------------
// RemoveItemCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RemoveItemCommand {
    item_id: Uuid,
}

impl RemoveItemCommand {
    pub fn new(item_id: Uuid) -> Self {
        Self { item_id }
    }
}

impl Command for RemoveItemCommand {
    fn execute(&self, document: &mut Document) -> Result<bool> {
        document.remove_item(self.item_id).map(|_| true)
    }

    fn description(&self) -> &str {
        "Remove item"
    }
}

// ---------------------------------------------------------------------------
// ReorderCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ReorderCommand {
    from: usize,
    to: usize,
}

impl ReorderCommand {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

impl Command for ReorderCommand {
    fn execute(&self, document: &mut Document) -> Result<bool> {
        Ok(document.reorder(self.from, self.to))
    }

    fn description(&self) -> &str {
        "Reorder"
    }
}

// ---------------------------------------------------------------------------
// ImportCommand
// ---------------------------------------------------------------------------

/// Import from a shot list. The selected records and their images are
/// captured up front so the command does not hold on to the source.
#[derive(Debug)]
pub struct ImportCommand {
    selection: ShotList,
    duration_minutes: u32,
}

impl ImportCommand {
    pub fn new(source: &dyn ShotSource, selected: &[Uuid], duration_minutes: u32) -> Result<Self> {
        let shots: Vec<SourceShot> = source
            .shots()
            .map_err(|e| CoreError::ShotSource(e.to_string()))?
            .into_iter()
            .filter(|s| selected.contains(&s.id))
            .collect();
        let mut images = AssetStore::new();
        for shot in &shots {
            if let Some(image) = source.image(shot.id) {
                images.insert(shot.id, image);
            }
        }
        Ok(Self {
            selection: ShotList { shots, images },
            duration_minutes,
        })
    }
}

impl Command for ImportCommand {
    fn execute(&self, document: &mut Document) -> Result<bool> {
        let selected: Vec<Uuid> = self.selection.shots.iter().map(|s| s.id).collect();
        let ids = document.import_shots(&self.selection, &selected, self.duration_minutes)?;
        Ok(!ids.is_empty())
    }

    fn description(&self) -> &str {
        "Import shots"
    }
}

// ---------------------------------------------------------------------------
// AttachImageCommand / DetachImageCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AttachImageCommand {
    item_id: Uuid,
    asset: ImageAsset,
}

impl AttachImageCommand {
    pub fn new(item_id: Uuid, asset: ImageAsset) -> Self {
        Self { item_id, asset }
    }
}

impl Command for AttachImageCommand {
    fn execute(&self, document: &mut Document) -> Result<bool> {
        document.attach_image(self.item_id, self.asset.clone())?;
        Ok(true)
    }

    fn description(&self) -> &str {
        "Attach image"
    }
}

#[derive(Debug)]
pub struct DetachImageCommand {
    item_id: Uuid,
}

impl DetachImageCommand {
    pub fn new(item_id: Uuid) -> Self {
        Self { item_id }
    }
}

impl Command for DetachImageCommand {
    fn execute(&self, document: &mut Document) -> Result<bool> {
        Ok(document.detach_image(self.item_id).is_some())
    }

    fn description(&self) -> &str {
        "Remove image"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::tests::sample_asset;

    fn make_test_document() -> Document {
        Document::new("Day 1", ClockTime::hm(6, 0))
    }

    fn add_shot(history: &mut History, doc: &mut Document, minutes: u32) -> Uuid {
        let cmd = AddItemCommand::shot(ShotDetails::default(), minutes);
        history.execute(Box::new(cmd), doc).unwrap();
        doc.items.last().unwrap().id()
    }

    // -----------------------------------------------------------------------
    // AddItemCommand + undo/redo
    // -----------------------------------------------------------------------

    #[test]
    fn add_undo_redo() {
        let mut doc = make_test_document();
        let mut history = History::new(100);

        let id = add_shot(&mut history, &mut doc, 10);
        assert_eq!(doc.items.len(), 1);

        history.undo(&mut doc).unwrap();
        assert!(doc.items.is_empty());

        // Redo brings back the very same item, id included.
        history.redo(&mut doc).unwrap();
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].id(), id);
    }

    #[test]
    fn new_action_clears_redo() {
        let mut doc = make_test_document();
        let mut history = History::new(100);

        add_shot(&mut history, &mut doc, 10);
        history.undo(&mut doc).unwrap();
        assert!(history.can_redo());

        add_shot(&mut history, &mut doc, 20);
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_empty_history_errors() {
        let mut doc = make_test_document();
        let mut history = History::new(100);
        let result = history.undo(&mut doc);
        assert!(matches!(result.unwrap_err(), CoreError::NothingToUndo));
    }

    #[test]
    fn redo_empty_stack_errors() {
        let mut doc = make_test_document();
        let mut history = History::new(100);
        let result = history.redo(&mut doc);
        assert!(matches!(result.unwrap_err(), CoreError::NothingToRedo));
    }

    // -----------------------------------------------------------------------
    // no-ops and failures are not recorded
    // -----------------------------------------------------------------------

    #[test]
    fn noop_is_not_recorded() {
        let mut doc = make_test_document();
        let mut history = History::new(100);
        add_shot(&mut history, &mut doc, 10);

        let changed = history
            .execute(Box::new(ReorderCommand::new(0, 0)), &mut doc)
            .unwrap();
        assert!(!changed);
        assert_eq!(history.undo_description(), Some("Add shot"));
    }

    #[test]
    fn call_time_edit_undoes() {
        let mut doc = make_test_document();
        let mut history = History::new(100);
        let id = add_shot(&mut history, &mut doc, 10);
        let before = doc.clone();

        let changed = history
            .execute(
                Box::new(EditItemCommand::new(id, ItemEdit::Start(ClockTime::hm(5, 0)))),
                &mut doc,
            )
            .unwrap();
        assert!(changed);
        assert_eq!(doc.header.call_time, ClockTime::hm(5, 0));

        history.undo(&mut doc).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn failed_command_leaves_document_and_history() {
        let mut doc = make_test_document();
        let mut history = History::new(100);
        add_shot(&mut history, &mut doc, 10);
        let before = doc.clone();

        let missing = history.execute(Box::new(RemoveItemCommand::new(Uuid::new_v4())), &mut doc);
        assert!(matches!(missing, Err(CoreError::ItemNotFound(_))));
        assert_eq!(doc, before);
        assert_eq!(history.undo_description(), Some("Add shot"));
    }

    // -----------------------------------------------------------------------
    // Timing edits undo through the whole chain
    // -----------------------------------------------------------------------

    #[test]
    fn duration_undo_restores_downstream_times() {
        let mut doc = make_test_document();
        let mut history = History::new(100);
        let a = add_shot(&mut history, &mut doc, 10);
        add_shot(&mut history, &mut doc, 20);

        history
            .execute(
                Box::new(EditItemCommand::new(a, ItemEdit::Duration(40))),
                &mut doc,
            )
            .unwrap();
        assert_eq!(doc.items[1].start(), ClockTime::hm(6, 40));
        assert_eq!(history.undo_description(), Some("Change timing"));

        history.undo(&mut doc).unwrap();
        assert_eq!(doc.items[1].start(), ClockTime::hm(6, 10));
        assert_eq!(doc.items[1].end(), ClockTime::hm(6, 30));
    }

    // -----------------------------------------------------------------------
    // RemoveItemCommand restores the image with the item
    // -----------------------------------------------------------------------

    #[test]
    fn remove_undo_restores_item_and_image() {
        let mut doc = make_test_document();
        let mut history = History::new(100);
        let id = add_shot(&mut history, &mut doc, 10);
        history
            .execute(Box::new(AttachImageCommand::new(id, sample_asset(4))), &mut doc)
            .unwrap();

        history
            .execute(Box::new(RemoveItemCommand::new(id)), &mut doc)
            .unwrap();
        assert!(doc.items.is_empty());
        assert!(doc.assets.is_empty());

        history.undo(&mut doc).unwrap();
        assert_eq!(doc.items[0].id(), id);
        assert_eq!(doc.assets.get(id), Some(&sample_asset(4)));

        history.redo(&mut doc).unwrap();
        assert!(doc.items.is_empty());
        assert!(doc.assets.is_empty());
    }

    #[test]
    fn snapshots_share_image_payloads() {
        let mut doc = make_test_document();
        let mut history = History::new(100);
        let id = add_shot(&mut history, &mut doc, 10);
        history
            .execute(Box::new(AttachImageCommand::new(id, sample_asset(5))), &mut doc)
            .unwrap();

        for text in ["Wide", "Close", "Insert"] {
            history
                .execute(
                    Box::new(EditItemCommand::new(id, ItemEdit::Description(text.into()))),
                    &mut doc,
                )
                .unwrap();
        }

        let live = &doc.assets.get(id).unwrap().bytes;
        let recorded = history
            .undo_stack
            .iter()
            .filter_map(|entry| entry.snapshot.assets.get(id))
            .collect::<Vec<_>>();
        assert_eq!(recorded.len(), 3);
        assert!(recorded
            .iter()
            .all(|asset| std::sync::Arc::ptr_eq(&asset.bytes, live)));
    }

    #[test]
    fn detach_without_image_is_noop() {
        let mut doc = make_test_document();
        let mut history = History::new(100);
        let id = add_shot(&mut history, &mut doc, 10);
        let changed = history
            .execute(Box::new(DetachImageCommand::new(id)), &mut doc)
            .unwrap();
        assert!(!changed);
    }

    // -----------------------------------------------------------------------
    // ImportCommand
    // -----------------------------------------------------------------------

    #[test]
    fn import_undo_removes_all_imported() {
        let source = ShotList {
            shots: vec![
                SourceShot {
                    id: Uuid::new_v4(),
                    description: "Insert: keys".into(),
                    ..Default::default()
                },
                SourceShot {
                    id: Uuid::new_v4(),
                    description: "Close up".into(),
                    ..Default::default()
                },
            ],
            images: AssetStore::new(),
        };
        let selected: Vec<Uuid> = source.shots.iter().map(|s| s.id).collect();

        let mut doc = make_test_document();
        let mut history = History::new(100);
        let cmd = ImportCommand::new(&source, &selected, 15).unwrap();
        history.execute(Box::new(cmd), &mut doc).unwrap();
        assert_eq!(doc.items.len(), 2);

        history.undo(&mut doc).unwrap();
        assert!(doc.items.is_empty());
    }

    // -----------------------------------------------------------------------
    // max_size limits undo stack
    // -----------------------------------------------------------------------

    #[test]
    fn max_size_limits_undo_stack() {
        let mut doc = make_test_document();
        let mut history = History::new(3);

        for i in 0..5 {
            add_shot(&mut history, &mut doc, i * 5);
        }
        assert_eq!(doc.items.len(), 5);

        assert!(history.undo(&mut doc).is_ok());
        assert!(history.undo(&mut doc).is_ok());
        assert!(history.undo(&mut doc).is_ok());
        assert!(history.undo(&mut doc).is_err());
        assert_eq!(doc.items.len(), 2);
    }

    // -----------------------------------------------------------------------
    // can_undo / can_redo flags and descriptions
    // -----------------------------------------------------------------------

    #[test]
    fn can_undo_can_redo_flags() {
        let mut doc = make_test_document();
        let mut history = History::new(100);

        assert!(!history.can_undo());
        assert!(!history.can_redo());

        add_shot(&mut history, &mut doc, 10);
        assert!(history.can_undo());
        assert!(!history.can_redo());

        history.undo(&mut doc).unwrap();
        assert!(!history.can_undo());
        assert!(history.can_redo());

        history.redo(&mut doc).unwrap();
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn description_methods() {
        let mut doc = make_test_document();
        let mut history = History::new(100);

        assert_eq!(history.undo_description(), None);
        assert_eq!(history.redo_description(), None);

        history
            .execute(Box::new(AddItemCommand::break_("Lunch", 30)), &mut doc)
            .unwrap();
        assert_eq!(history.undo_description(), Some("Add break"));

        history.undo(&mut doc).unwrap();
        assert_eq!(history.redo_description(), Some("Add break"));
        assert_eq!(history.undo_description(), None);
    }
}
