use crate::types::Document;

/// Stable array move: take the element at `from` and insert it at `to`,
/// keeping the relative order of everything else. Returns false (and leaves
/// `items` alone) when the indices are equal or out of bounds.
pub fn move_index<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from == to || from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

impl Document {
    /// Apply a drop from the drag gesture. This is the only way item order
    /// changes.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if !move_index(&mut self.items, from, to) {
            tracing::debug!(from, to, len = self.items.len(), "reorder ignored");
            return false;
        }
        self.recalculate();
        true
    }
}
