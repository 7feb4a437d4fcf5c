use crate::clock::add_minutes;
use crate::types::{ClockTime, TimelineItem};

/// Lay the items end to end starting at `anchor`.
///
/// Single left-to-right pass: each item starts where the previous one ended.
/// This is the only place item start/end times are written.
pub fn recalculate(items: &mut [TimelineItem], anchor: ClockTime) {
    let mut cursor = anchor;
    for item in items.iter_mut() {
        cursor = item.place(cursor);
    }
}

/// True when the chain is contiguous from `anchor` and every end matches its
/// start plus duration.
pub fn is_consistent(items: &[TimelineItem], anchor: ClockTime) -> bool {
    let mut cursor = anchor;
    for item in items {
        if item.start() != cursor || item.end() != add_minutes(item.start(), item.duration_minutes())
        {
            return false;
        }
        cursor = item.end();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::diff_minutes;
    use crate::types::{BreakDetails, ItemDetails, ShotDetails};
    use proptest::prelude::*;

    fn shot(minutes: u32) -> TimelineItem {
        TimelineItem::new(ItemDetails::Shot(ShotDetails::default()), minutes, ClockTime::MIDNIGHT)
    }

    fn brk(minutes: u32) -> TimelineItem {
        TimelineItem::new(
            ItemDetails::Break(BreakDetails::default()),
            minutes,
            ClockTime::MIDNIGHT,
        )
    }

    fn starts(items: &[TimelineItem]) -> Vec<String> {
        items.iter().map(|i| i.start().to_string()).collect()
    }

    fn ends(items: &[TimelineItem]) -> Vec<String> {
        items.iter().map(|i| i.end().to_string()).collect()
    }

    #[test]
    fn chains_items_from_anchor() {
        let mut items = vec![shot(10), brk(30), shot(20)];
        recalculate(&mut items, ClockTime::hm(6, 0));
        assert_eq!(starts(&items), ["06:00", "06:10", "06:40"]);
        assert_eq!(ends(&items), ["06:10", "06:40", "07:00"]);
        assert!(is_consistent(&items, ClockTime::hm(6, 0)));
    }

    #[test]
    fn empty_sequence_is_noop() {
        let mut items: Vec<TimelineItem> = vec![];
        recalculate(&mut items, ClockTime::hm(6, 0));
        assert!(items.is_empty());
        assert!(is_consistent(&items, ClockTime::hm(6, 0)));
    }

    #[test]
    fn single_item_starts_at_anchor() {
        let mut items = vec![shot(15)];
        recalculate(&mut items, ClockTime::hm(9, 30));
        assert_eq!(items[0].start(), ClockTime::hm(9, 30));
        assert_eq!(items[0].end(), ClockTime::hm(9, 45));
    }

    #[test]
    fn zero_duration_items_share_a_boundary() {
        let mut items = vec![shot(0), shot(0), shot(5)];
        recalculate(&mut items, ClockTime::hm(8, 0));
        assert_eq!(starts(&items), ["08:00", "08:00", "08:00"]);
        assert_eq!(ends(&items), ["08:00", "08:00", "08:05"]);
    }

    #[test]
    fn chain_wraps_past_midnight() {
        let mut items = vec![shot(30), shot(30)];
        recalculate(&mut items, ClockTime::hm(23, 45));
        assert_eq!(starts(&items), ["23:45", "00:15"]);
        assert_eq!(ends(&items), ["00:15", "00:45"]);
        assert!(is_consistent(&items, ClockTime::hm(23, 45)));
    }

    #[test]
    fn inconsistency_is_detected() {
        let mut items = vec![shot(10), shot(10)];
        recalculate(&mut items, ClockTime::hm(6, 0));
        assert!(!is_consistent(&items, ClockTime::hm(6, 5)));
        items.swap(0, 1);
        items[0].set_duration_minutes(20);
        assert!(!is_consistent(&items, ClockTime::hm(6, 0)));
    }

    proptest! {
        #[test]
        fn recalculate_is_idempotent(
            durations in prop::collection::vec(0u32..600, 0..40),
            anchor in 0u32..1440,
        ) {
            let anchor = ClockTime::from_minutes(anchor);
            let mut once: Vec<TimelineItem> = durations.iter().map(|&d| shot(d)).collect();
            recalculate(&mut once, anchor);
            let mut twice = once.clone();
            recalculate(&mut twice, anchor);
            prop_assert_eq!(&once, &twice);
            prop_assert!(is_consistent(&once, anchor));
        }

        #[test]
        fn duration_matches_clock_difference_within_a_day(
            durations in prop::collection::vec(0u32..60, 0..20),
            anchor in 0u32..(1440 - 60 * 20),
        ) {
            let anchor = ClockTime::from_minutes(anchor);
            let mut items: Vec<TimelineItem> = durations.iter().map(|&d| brk(d)).collect();
            recalculate(&mut items, anchor);
            for item in &items {
                prop_assert_eq!(item.duration_minutes(), diff_minutes(item.start(), item.end()));
            }
        }
    }
}
