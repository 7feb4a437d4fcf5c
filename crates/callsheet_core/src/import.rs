use crate::assets::{AssetStore, ImageAsset};
use crate::error::{CoreError, Result};
use crate::types::*;
use std::collections::HashSet;
use uuid::Uuid;

/// Read-only access to an external shot list.
pub trait ShotSource {
    /// Candidate records in the list's own order.
    fn shots(&self) -> anyhow::Result<Vec<SourceShot>>;

    /// Reference image stored for a record, if any.
    fn image(&self, source_id: Uuid) -> Option<ImageAsset>;
}

impl ShotSource for ShotList {
    fn shots(&self) -> anyhow::Result<Vec<SourceShot>> {
        Ok(self.shots.clone())
    }

    fn image(&self, source_id: Uuid) -> Option<ImageAsset> {
        self.images.get(source_id).cloned()
    }
}

/// Copy a source record into shot details. Operational fields the shot list
/// does not carry keep their defaults.
pub fn shot_from_source(record: &SourceShot) -> ShotDetails {
    ShotDetails {
        scene_number: record.scene_number.clone(),
        shot_number: record.shot_number.clone(),
        location: record.location.clone(),
        shot_size: record.shot_size.clone(),
        angle: record.angle.clone(),
        movement: record.movement.clone(),
        lens: record.lens.clone(),
        description: record.description.clone(),
        cast: record.cast.clone(),
        props: record.props.clone(),
        costume: record.costume.clone(),
        notes: record.notes.clone(),
        linked_source_id: (!record.id.is_nil()).then_some(record.id),
        ..ShotDetails::default()
    }
}

impl Document {
    /// Append a fresh shot for every selected record of `source`, in the
    /// source's order, bringing their reference images along under the new
    /// ids. Returns the new item ids.
    pub fn import_shots(
        &mut self,
        source: &dyn ShotSource,
        selected: &[Uuid],
        duration_minutes: u32,
    ) -> Result<Vec<Uuid>> {
        let wanted: HashSet<Uuid> = selected.iter().copied().collect();
        let records = source
            .shots()
            .map_err(|e| CoreError::ShotSource(e.to_string()))?;

        let mut staged_items = Vec::new();
        let mut staged_assets = AssetStore::new();
        let mut cursor = self.tail_time();

        for record in records.iter().filter(|r| wanted.contains(&r.id)) {
            let item = TimelineItem::new(
                ItemDetails::Shot(shot_from_source(record)),
                duration_minutes,
                cursor,
            );
            cursor = item.end();
            if let Some(image) = source.image(record.id) {
                staged_assets.insert(item.id(), image);
            }
            staged_items.push(item);
        }

        let ids: Vec<Uuid> = staged_items.iter().map(TimelineItem::id).collect();
        tracing::info!(
            imported = ids.len(),
            images = staged_assets.len(),
            "imported shots from shot list"
        );
        if ids.is_empty() {
            return Ok(ids);
        }

        self.items.extend(staged_items);
        self.assets.merge(staged_assets);
        self.recalculate();
        Ok(ids)
    }
}
