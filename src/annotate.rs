//! Merges holidays, notes and the selected day into per-date annotations.

use crate::api::{HolidayEvent, Note};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const SELECTED_COLOR: &str = "#ffa500";

/// Marker state for one calendar day
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub marked: bool,
    pub dot_color: Option<String>,
    pub selected: bool,
    pub selected_color: Option<String>,
}

pub type AnnotationMap = BTreeMap<NaiveDate, Annotation>;

/// Build the annotation map for one render.
///
/// Holidays are applied first and replace whatever a date had; notes are
/// layered on top so a note's dot color wins over a holiday's. Selection is
/// applied last and never clears a content marker.
pub fn merge(holidays: &[HolidayEvent], notes: &[Note], selected: Option<NaiveDate>) -> AnnotationMap {
    let mut map = AnnotationMap::new();

    for holiday in holidays {
        map.insert(
            holiday.date,
            Annotation {
                marked: true,
                dot_color: Some(holiday.color().to_string()),
                ..Annotation::default()
            },
        );
    }

    for note in notes {
        let entry = map.entry(note.date).or_default();
        entry.marked = true;
        entry.dot_color = Some(note.color().to_string());
    }

    if let Some(date) = selected {
        let entry = map.entry(date).or_default();
        entry.selected = true;
        entry.selected_color = Some(SELECTED_COLOR.to_string());
    }

    map
}
