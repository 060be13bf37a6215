use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

pub const GAZETTED_COLOR: &str = "#1e90ff";
pub const RESTRICTED_COLOR: &str = "#ff4040";
pub const NOTE_COLOR: &str = "#32CD32";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolidayCategory {
    Gazetted,
    Restricted,
}

impl HolidayCategory {
    pub fn color(self) -> &'static str {
        match self {
            HolidayCategory::Gazetted => GAZETTED_COLOR,
            HolidayCategory::Restricted => RESTRICTED_COLOR,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HolidayCategory::Gazetted => "Gazetted",
            HolidayCategory::Restricted => "Restricted",
        }
    }
}

/// A named holiday, tagged with the list it came from
#[derive(Debug, Clone, PartialEq)]
pub struct HolidayEvent {
    pub title: String,
    pub date: NaiveDate,
    pub category: HolidayCategory,
}

impl HolidayEvent {
    pub fn color(&self) -> &'static str {
        self.category.color()
    }
}

/// Wire shape of a single holiday
#[derive(Debug, Clone, Deserialize)]
pub struct RawHoliday {
    pub title: String,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct HolidayLists {
    #[serde(default)]
    pub gazetted: Vec<RawHoliday>,
    #[serde(default)]
    pub restricted: Vec<RawHoliday>,
}

/// Response from `GET /holidays/{region}`
#[derive(Debug, Deserialize)]
pub struct HolidaysResponse {
    pub holidays: HolidayLists,
}

impl HolidaysResponse {
    /// Flatten into one list: gazetted first, then restricted
    pub fn into_events(self) -> Vec<HolidayEvent> {
        let tag = |category: HolidayCategory| {
            move |h: RawHoliday| HolidayEvent {
                title: h.title,
                date: h.date,
                category,
            }
        };

        self.holidays
            .gazetted
            .into_iter()
            .map(tag(HolidayCategory::Gazetted))
            .chain(self.holidays.restricted.into_iter().map(tag(HolidayCategory::Restricted)))
            .collect()
    }
}

/// A user-authored note as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "id_from_any")]
    pub id: Option<String>,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub color: String,
}

/// Backends key notes by either a string or an integer id
fn id_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    }))
}

impl Note {
    /// Display color, falling back to the default note color
    pub fn color(&self) -> &str {
        if self.color.is_empty() {
            NOTE_COLOR
        } else {
            &self.color
        }
    }
}

/// Body of `POST /notes`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewNote {
    pub title: String,
    pub date: NaiveDate,
    pub color: String,
}
