use crate::assets::AssetStore;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const MINUTES_PER_DAY: u32 = 1440;

// ---------------------------------------------------------------------------
// ClockTime
// ---------------------------------------------------------------------------

/// Time of day at minute precision, stored as minutes since midnight.
///
/// Serialized in its `HH:MM` text form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: Self = Self(0);

    /// Build from minutes since midnight, wrapping at 24:00.
    pub const fn from_minutes(minutes: u32) -> Self {
        Self((minutes % MINUTES_PER_DAY) as u16)
    }

    pub const fn hm(hour: u32, minute: u32) -> Self {
        Self::from_minutes(hour * 60 + minute)
    }

    pub const fn minutes_of_day(&self) -> u32 {
        self.0 as u32
    }

    pub const fn hour(&self) -> u32 {
        self.0 as u32 / 60
    }

    pub const fn minute(&self) -> u32 {
        self.0 as u32 % 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if m.len() != 2 || h.is_empty() || h.len() > 2 {
            return Err(invalid());
        }
        let hour: u32 = h.parse().map_err(|_| invalid())?;
        let minute: u32 = m.parse().map_err(|_| invalid())?;
        if hour >= 24 || minute >= 60 {
            return Err(invalid());
        }
        Ok(Self::hm(hour, minute))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = CoreError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Shot metadata enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum IntExt {
    #[default]
    Int,
    Ext,
    IntExt,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DayNight {
    #[default]
    Day,
    Night,
    Dawn,
    Dusk,
}

// ---------------------------------------------------------------------------
// ItemDetails
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShotDetails {
    pub scene_number: String,
    pub shot_number: String,
    pub int_ext: IntExt,
    pub day_night: DayNight,
    pub location: String,
    pub shot_size: String,
    pub angle: String,
    pub movement: String,
    pub lens: String,
    pub description: String,
    pub cast: Vec<String>,
    pub props: String,
    pub costume: String,
    pub notes: String,
    /// Shot-list entry this shot was imported from.
    pub linked_source_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BreakDetails {
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ItemKind {
    Shot,
    Break,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum ItemDetails {
    Shot(ShotDetails),
    Break(BreakDetails),
}

// ---------------------------------------------------------------------------
// TimelineItem
// ---------------------------------------------------------------------------

/// One scheduled activity. `start` and `end` are only ever written by the
/// recalculation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineItem {
    id: Uuid,
    start: ClockTime,
    duration_minutes: u32,
    end: ClockTime,
    #[serde(flatten)]
    details: ItemDetails,
}

impl TimelineItem {
    pub(crate) fn new(details: ItemDetails, duration_minutes: u32, start: ClockTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            duration_minutes,
            end: crate::clock::add_minutes(start, duration_minutes),
            details,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ItemKind {
        match self.details {
            ItemDetails::Shot(_) => ItemKind::Shot,
            ItemDetails::Break(_) => ItemKind::Break,
        }
    }

    pub fn start(&self) -> ClockTime {
        self.start
    }

    pub fn end(&self) -> ClockTime {
        self.end
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn details(&self) -> &ItemDetails {
        &self.details
    }

    pub fn shot(&self) -> Option<&ShotDetails> {
        match &self.details {
            ItemDetails::Shot(shot) => Some(shot),
            ItemDetails::Break(_) => None,
        }
    }

    pub fn description(&self) -> &str {
        match &self.details {
            ItemDetails::Shot(shot) => &shot.description,
            ItemDetails::Break(brk) => &brk.description,
        }
    }

    pub(crate) fn details_mut(&mut self) -> &mut ItemDetails {
        &mut self.details
    }

    pub(crate) fn set_duration_minutes(&mut self, minutes: u32) {
        self.duration_minutes = minutes;
    }

    pub(crate) fn place(&mut self, start: ClockTime) -> ClockTime {
        self.start = start;
        self.end = crate::clock::add_minutes(start, self.duration_minutes);
        self.end
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Header {
    /// Anchor for the whole day: the first item always starts here.
    pub call_time: ClockTime,
    pub title: String,
    pub shoot_date: String,
    pub director: String,
    pub producer: String,
    pub location: String,
    pub notes: String,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The persisted shape of one production day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub header: Header,
    pub items: Vec<TimelineItem>,
    #[serde(default)]
    pub assets: AssetStore,
}

// ---------------------------------------------------------------------------
// SourceShot
// ---------------------------------------------------------------------------

/// A record from an external shot list, read during import. Every field is
/// optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceShot {
    pub id: Uuid,
    pub scene_number: String,
    pub shot_number: String,
    pub location: String,
    pub shot_size: String,
    pub angle: String,
    pub movement: String,
    pub lens: String,
    pub description: String,
    pub cast: Vec<String>,
    pub props: String,
    pub costume: String,
    pub notes: String,
}

/// An external shot list together with the reference images of its entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShotList {
    pub shots: Vec<SourceShot>,
    pub images: AssetStore,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_display() {
        assert_eq!(ClockTime::hm(6, 0).to_string(), "06:00");
        assert_eq!(ClockTime::hm(23, 59).to_string(), "23:59");
        assert_eq!(ClockTime::MIDNIGHT.to_string(), "00:00");
    }

    #[test]
    fn clock_time_wraps_at_midnight() {
        assert_eq!(ClockTime::hm(24, 30), ClockTime::hm(0, 30));
        assert_eq!(ClockTime::from_minutes(1440 + 61), ClockTime::hm(1, 1));
    }

    #[test]
    fn clock_time_parse() {
        assert_eq!("06:00".parse::<ClockTime>().unwrap(), ClockTime::hm(6, 0));
        assert_eq!("7:05".parse::<ClockTime>().unwrap(), ClockTime::hm(7, 5));
        assert_eq!(" 18:30 ".parse::<ClockTime>().unwrap(), ClockTime::hm(18, 30));
    }

    #[test]
    fn clock_time_parse_rejects_garbage() {
        for bad in ["", "6", "24:00", "12:60", "ab:cd", "12:5", "123:00", "-1:00"] {
            let result = bad.parse::<ClockTime>();
            assert!(
                matches!(result, Err(CoreError::InvalidTime(_))),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn clock_time_serializes_as_text() {
        let json = serde_json::to_string(&ClockTime::hm(6, 40)).unwrap();
        assert_eq!(json, "\"06:40\"");
        let back: ClockTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ClockTime::hm(6, 40));
        assert!(serde_json::from_str::<ClockTime>("\"25:00\"").is_err());
    }

    #[test]
    fn item_accessors() {
        let item = TimelineItem::new(
            ItemDetails::Break(BreakDetails {
                description: "Lunch".into(),
            }),
            30,
            ClockTime::hm(12, 0),
        );
        assert_eq!(item.kind(), ItemKind::Break);
        assert_eq!(item.start(), ClockTime::hm(12, 0));
        assert_eq!(item.end(), ClockTime::hm(12, 30));
        assert_eq!(item.duration_minutes(), 30);
        assert_eq!(item.description(), "Lunch");
        assert!(item.shot().is_none());
    }

    #[test]
    fn item_json_is_tagged_by_kind() {
        let item = TimelineItem::new(
            ItemDetails::Shot(ShotDetails {
                scene_number: "12".into(),
                ..Default::default()
            }),
            10,
            ClockTime::hm(6, 0),
        );
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["kind"], "Shot");
        assert_eq!(value["start"], "06:00");
        assert_eq!(value["end"], "06:10");
        assert_eq!(value["scene_number"], "12");

        let back: TimelineItem = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn source_shot_tolerates_missing_fields() {
        let shot: SourceShot = serde_json::from_str(r#"{"scene_number": "4A"}"#).unwrap();
        assert_eq!(shot.scene_number, "4A");
        assert!(shot.description.is_empty());
        assert!(shot.cast.is_empty());
        assert!(shot.id.is_nil());
    }
}
