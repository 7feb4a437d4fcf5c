use crate::assets::ImageAsset;
use crate::clock::{clamp_duration, diff_minutes};
use crate::error::{CoreError, Result};
use crate::types::*;
use uuid::Uuid;

/// A single field change on one timeline item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEdit {
    /// Minutes; negative values clamp to zero.
    Duration(i64),
    /// New end; an end before the item's start snaps to the start.
    End(ClockTime),
    /// Only honored on the first item, where it moves the call time.
    Start(ClockTime),
    Description(String),
    SceneNumber(String),
    ShotNumber(String),
    IntExt(IntExt),
    DayNight(DayNight),
    Location(String),
    ShotSize(String),
    Angle(String),
    Movement(String),
    Lens(String),
    Cast(Vec<String>),
    Props(String),
    Costume(String),
    Notes(String),
}

impl ItemEdit {
    pub fn field_name(&self) -> &'static str {
        match self {
            ItemEdit::Duration(_) => "duration",
            ItemEdit::End(_) => "end",
            ItemEdit::Start(_) => "start",
            ItemEdit::Description(_) => "description",
            ItemEdit::SceneNumber(_) => "scene number",
            ItemEdit::ShotNumber(_) => "shot number",
            ItemEdit::IntExt(_) => "int/ext",
            ItemEdit::DayNight(_) => "day/night",
            ItemEdit::Location(_) => "location",
            ItemEdit::ShotSize(_) => "shot size",
            ItemEdit::Angle(_) => "angle",
            ItemEdit::Movement(_) => "movement",
            ItemEdit::Lens(_) => "lens",
            ItemEdit::Cast(_) => "cast",
            ItemEdit::Props(_) => "props",
            ItemEdit::Costume(_) => "costume",
            ItemEdit::Notes(_) => "notes",
        }
    }

    pub fn affects_timing(&self) -> bool {
        matches!(
            self,
            ItemEdit::Duration(_) | ItemEdit::End(_) | ItemEdit::Start(_)
        )
    }
}

/// A change to the document header.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderEdit {
    CallTime(ClockTime),
    Title(String),
    ShootDate(String),
    Director(String),
    Producer(String),
    Location(String),
    Notes(String),
}

impl Document {
    /// Append a shot. Returns the new item's id.
    pub fn add_shot(&mut self, details: ShotDetails, duration_minutes: u32) -> Uuid {
        self.append(ItemDetails::Shot(details), duration_minutes)
    }

    /// Append a break. Returns the new item's id.
    pub fn add_break(&mut self, description: impl Into<String>, duration_minutes: u32) -> Uuid {
        self.append(
            ItemDetails::Break(BreakDetails {
                description: description.into(),
            }),
            duration_minutes,
        )
    }

    fn append(&mut self, details: ItemDetails, duration_minutes: u32) -> Uuid {
        let item = TimelineItem::new(details, duration_minutes, self.tail_time());
        let id = item.id();
        self.items.push(item);
        self.recalculate();
        id
    }

    /// Apply one field edit. Returns whether anything changed.
    pub fn edit_item(&mut self, item_id: Uuid, edit: ItemEdit) -> Result<bool> {
        let index = self
            .index_of(item_id)
            .ok_or(CoreError::ItemNotFound(item_id))?;

        match edit {
            ItemEdit::Start(time) => {
                if index != 0 {
                    tracing::debug!(%item_id, "start is only editable on the first item");
                    return Ok(false);
                }
                Ok(self.set_call_time(time))
            }
            ItemEdit::Duration(minutes) => Ok(self.set_duration(index, clamp_duration(minutes))),
            ItemEdit::End(end) => {
                let minutes = diff_minutes(self.items[index].start(), end);
                Ok(self.set_duration(index, minutes))
            }
            edit => apply_field(self.items[index].details_mut(), edit),
        }
    }

    fn set_duration(&mut self, index: usize, minutes: u32) -> bool {
        let item = &mut self.items[index];
        if item.duration_minutes() == minutes {
            return false;
        }
        item.set_duration_minutes(minutes);
        self.recalculate();
        true
    }

    /// Move the anchor of the whole day.
    pub fn set_call_time(&mut self, call_time: ClockTime) -> bool {
        if self.header.call_time == call_time {
            return false;
        }
        self.header.call_time = call_time;
        self.recalculate();
        true
    }

    pub fn edit_header(&mut self, edit: HeaderEdit) -> bool {
        match edit {
            HeaderEdit::CallTime(time) => self.set_call_time(time),
            HeaderEdit::Title(v) => replace(&mut self.header.title, v),
            HeaderEdit::ShootDate(v) => replace(&mut self.header.shoot_date, v),
            HeaderEdit::Director(v) => replace(&mut self.header.director, v),
            HeaderEdit::Producer(v) => replace(&mut self.header.producer, v),
            HeaderEdit::Location(v) => replace(&mut self.header.location, v),
            HeaderEdit::Notes(v) => replace(&mut self.header.notes, v),
        }
    }

    /// Remove an item and its reference image. Returns the removed item.
    pub fn remove_item(&mut self, item_id: Uuid) -> Result<TimelineItem> {
        let index = self
            .index_of(item_id)
            .ok_or(CoreError::ItemNotFound(item_id))?;
        let removed = self.items.remove(index);
        if self.assets.detach(item_id).is_some() {
            tracing::debug!(%item_id, "pruned reference image");
        }
        self.recalculate();
        Ok(removed)
    }

    /// Store an already prepared image for an existing item, replacing any
    /// previous one.
    pub fn attach_image(&mut self, item_id: Uuid, asset: ImageAsset) -> Result<()> {
        if self.index_of(item_id).is_none() {
            return Err(CoreError::ItemNotFound(item_id));
        }
        self.assets.insert(item_id, asset);
        Ok(())
    }

    pub fn detach_image(&mut self, item_id: Uuid) -> Option<ImageAsset> {
        self.assets.detach(item_id)
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Non-timing edits. Shot-only fields are rejected on breaks.
fn apply_field(details: &mut ItemDetails, edit: ItemEdit) -> Result<bool> {
    let shot = match details {
        ItemDetails::Break(brk) => {
            return match edit {
                ItemEdit::Description(v) => Ok(replace(&mut brk.description, v)),
                other => Err(CoreError::InvalidOperation(format!(
                    "{} does not apply to a break",
                    other.field_name()
                ))),
            };
        }
        ItemDetails::Shot(shot) => shot,
    };

    let changed = match edit {
        ItemEdit::Description(v) => replace(&mut shot.description, v),
        ItemEdit::SceneNumber(v) => replace(&mut shot.scene_number, v),
        ItemEdit::ShotNumber(v) => replace(&mut shot.shot_number, v),
        ItemEdit::IntExt(v) => replace(&mut shot.int_ext, v),
        ItemEdit::DayNight(v) => replace(&mut shot.day_night, v),
        ItemEdit::Location(v) => replace(&mut shot.location, v),
        ItemEdit::ShotSize(v) => replace(&mut shot.shot_size, v),
        ItemEdit::Angle(v) => replace(&mut shot.angle, v),
        ItemEdit::Movement(v) => replace(&mut shot.movement, v),
        ItemEdit::Lens(v) => replace(&mut shot.lens, v),
        ItemEdit::Cast(v) => replace(&mut shot.cast, v),
        ItemEdit::Props(v) => replace(&mut shot.props, v),
        ItemEdit::Costume(v) => replace(&mut shot.costume, v),
        ItemEdit::Notes(v) => replace(&mut shot.notes, v),
        ItemEdit::Duration(_) | ItemEdit::End(_) | ItemEdit::Start(_) => {
            return Err(CoreError::InvalidOperation(
                "timing edits must go through edit_item".into(),
            ))
        }
    };
    Ok(changed)
}
