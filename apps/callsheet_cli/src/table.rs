use callsheet_core::autosave::AutosaveStatus;
use callsheet_core::types::{DayNight, Document, IntExt, ItemDetails};
use std::fmt::Write;

fn int_ext(v: IntExt) -> &'static str {
    match v {
        IntExt::Int => "INT",
        IntExt::Ext => "EXT",
        IntExt::IntExt => "I/E",
    }
}

fn day_night(v: DayNight) -> &'static str {
    match v {
        DayNight::Day => "DAY",
        DayNight::Night => "NIGHT",
        DayNight::Dawn => "DAWN",
        DayNight::Dusk => "DUSK",
    }
}

/// Plain-text call sheet: header, one row per item, totals.
pub fn render(document: &Document) -> String {
    let mut out = String::new();
    let header = &document.header;
    let _ = writeln!(out, "{}  (call {})", header.title, header.call_time);
    if !header.shoot_date.is_empty() {
        let _ = writeln!(out, "Date: {}", header.shoot_date);
    }
    if !header.location.is_empty() {
        let _ = writeln!(out, "Location: {}", header.location);
    }
    let _ = writeln!(out);

    for (n, item) in document.items.iter().enumerate() {
        let image = if document.assets.contains(item.id()) { "*" } else { " " };
        let label = match item.details() {
            ItemDetails::Shot(shot) => format!(
                "{:<6} {:<3} {:<5} {}",
                format!("{}{}", shot.scene_number, shot.shot_number),
                int_ext(shot.int_ext),
                day_night(shot.day_night),
                shot.description
            ),
            ItemDetails::Break(brk) => format!("-- {} --", brk.description),
        };
        let _ = writeln!(
            out,
            "{:>3}{image} {}-{} {:>4}m  {}",
            n + 1,
            item.start(),
            item.end(),
            item.duration_minutes(),
            label.trim_end()
        );
    }

    let summary = document.summary();
    let _ = writeln!(out);
    let _ = write!(
        out,
        "{} shots, {} breaks, {} min; wrap {}",
        summary.shots, summary.breaks, summary.total_minutes, summary.wrap_time
    );
    out
}

pub fn autosave_line(status: &AutosaveStatus) -> String {
    match &status.last_error {
        Some(e) => format!("autosave: {:?} ({} saved, last error: {e})", status.state, status.saves),
        None => format!("autosave: {:?} ({} saved)", status.state, status.saves),
    }
}
