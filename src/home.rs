//! State behind the home screen: region, holidays, notes and the note input.
//!
//! Nothing here performs IO. Methods that need the network return a request
//! description; the caller runs it and feeds the outcome back in. Every
//! request carries a generation so only the newest response is applied.

use crate::annotate::{self, AnnotationMap};
use crate::api::{HolidayEvent, NOTE_COLOR, NewNote, Note};
use crate::config::Region;
use crate::error::Result;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct HolidayRequest {
    pub region: String,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotesRequest {
    pub user_id: String,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteWrite {
    pub user_id: String,
    pub note: NewNote,
}

pub struct HomeState {
    pub regions: Vec<Region>,
    region: String,
    holidays: Vec<HolidayEvent>,
    notes: Vec<Note>,
    user_id: Option<String>,
    pub selected_date: Option<NaiveDate>,
    pub note_text: String,
    holiday_generation: u64,
    notes_generation: u64,
    pub holidays_loading: bool,
    pub notes_loading: bool,
    pub saving: usize,
    pub write_error: Option<String>,
}

impl HomeState {
    pub fn new(regions: Vec<Region>) -> Self {
        Self {
            regions,
            region: String::new(),
            holidays: Vec::new(),
            notes: Vec::new(),
            user_id: None,
            selected_date: None,
            note_text: String::new(),
            holiday_generation: 0,
            notes_generation: 0,
            holidays_loading: false,
            notes_loading: false,
            saving: 0,
            write_error: None,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn holidays(&self) -> &[HolidayEvent] {
        &self.holidays
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn is_loading(&self) -> bool {
        self.holidays_loading || self.notes_loading || self.saving > 0
    }

    /// Change the region; returns the read to issue, if any.
    ///
    /// Re-selecting the current region does nothing. An empty region issues
    /// no read but still invalidates any read in flight.
    pub fn select_region(&mut self, region: &str) -> Option<HolidayRequest> {
        if region == self.region {
            return None;
        }
        self.region = region.to_string();
        self.holiday_generation += 1;

        if self.region.is_empty() {
            self.holidays_loading = false;
            return None;
        }
        self.holidays_loading = true;
        Some(HolidayRequest {
            region: self.region.clone(),
            generation: self.holiday_generation,
        })
    }

    /// Select the region at `index` of the configured list
    pub fn select_region_index(&mut self, index: usize) -> Option<HolidayRequest> {
        let code = self.regions.get(index)?.code.clone();
        self.select_region(&code)
    }

    /// Move to the next configured region, wrapping around
    pub fn cycle_region(&mut self) -> Option<HolidayRequest> {
        if self.regions.is_empty() {
            return None;
        }
        let next = self
            .regions
            .iter()
            .position(|r| r.code == self.region)
            .map(|i| (i + 1) % self.regions.len())
            .unwrap_or(0);
        self.select_region_index(next)
    }

    pub fn region_index(&self) -> Option<usize> {
        self.regions.iter().position(|r| r.code == self.region())
    }

    /// Apply a holiday read. Stale responses are dropped; failures keep the
    /// previous holidays. Returns whether the response was current.
    pub fn apply_holidays(&mut self, generation: u64, result: Result<Vec<HolidayEvent>>) -> bool {
        if generation != self.holiday_generation {
            debug!(generation, current = self.holiday_generation, "discarding stale holidays");
            return false;
        }
        self.holidays_loading = false;

        match result {
            Ok(holidays) => {
                info!(region = %self.region, count = holidays.len(), "holidays loaded");
                self.holidays = holidays;
            }
            Err(e) => warn!(region = %self.region, error = %e, "failed to load holidays"),
        }
        true
    }

    /// Set (or clear) the signed-in user; returns the notes read to issue.
    ///
    /// Clearing the user resets the screen to its initial state, keeping only
    /// the region list, and drops any holiday read in flight.
    pub fn set_user(&mut self, user_id: Option<&str>) -> Option<NotesRequest> {
        let user_id = user_id.filter(|id| !id.is_empty()).map(str::to_string);
        if user_id == self.user_id {
            return None;
        }
        self.user_id = user_id;
        self.notes_generation += 1;
        self.notes.clear();
        self.note_text.clear();
        self.write_error = None;

        let user_id = match &self.user_id {
            Some(id) => id.clone(),
            None => {
                self.notes_loading = false;
                self.reset_view();
                return None;
            }
        };
        self.notes_loading = true;
        Some(NotesRequest {
            user_id,
            generation: self.notes_generation,
        })
    }

    fn reset_view(&mut self) {
        self.region.clear();
        self.holidays.clear();
        self.holiday_generation += 1;
        self.holidays_loading = false;
        self.selected_date = None;
    }

    pub fn apply_notes(&mut self, generation: u64, result: Result<Vec<Note>>) -> bool {
        if generation != self.notes_generation {
            debug!(generation, current = self.notes_generation, "discarding stale notes");
            return false;
        }
        self.notes_loading = false;

        match result {
            Ok(notes) => {
                info!(count = notes.len(), "notes loaded");
                self.notes = notes;
            }
            Err(e) => warn!(error = %e, "failed to load notes"),
        }
        true
    }

    /// Issue fresh reads for the current region and user
    pub fn refresh(&mut self) -> (Option<HolidayRequest>, Option<NotesRequest>) {
        let holidays = (!self.region.is_empty()).then(|| {
            self.holiday_generation += 1;
            self.holidays_loading = true;
            HolidayRequest {
                region: self.region.clone(),
                generation: self.holiday_generation,
            }
        });

        let notes = self.user_id.clone().map(|user_id| {
            self.notes_generation += 1;
            self.notes_loading = true;
            NotesRequest {
                user_id,
                generation: self.notes_generation,
            }
        });

        (holidays, notes)
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = Some(date);
    }

    /// The add control is only enabled once a day is selected
    pub fn can_add_note(&self) -> bool {
        self.selected_date.is_some() && self.user_id.is_some()
    }

    /// Validate the input and describe the write to issue.
    ///
    /// Nothing is appended until the server answers.
    pub fn begin_add_note(&mut self) -> Option<NoteWrite> {
        let title = self.note_text.trim();
        if title.is_empty() {
            return None;
        }
        let date = self.selected_date?;
        let user_id = self.user_id.clone()?;

        self.saving += 1;
        self.write_error = None;
        Some(NoteWrite {
            user_id,
            note: NewNote {
                title: title.to_string(),
                date,
                color: NOTE_COLOR.to_string(),
            },
        })
    }

    /// Apply the outcome of a note write
    pub fn finish_add_note(&mut self, write: &NoteWrite, result: Result<Note>) {
        self.saving = self.saving.saturating_sub(1);

        // A write for a user who has since signed out is dropped
        if self.user_id.as_deref() != Some(write.user_id.as_str()) {
            debug!("discarding note saved for a previous user");
            return;
        }

        match result {
            Ok(note) => {
                info!(date = %note.date, "note saved");
                self.notes.push(note);
                // Keep anything typed while the request was in flight
                if self.note_text.trim() == write.note.title {
                    self.note_text.clear();
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to save note");
                self.write_error = Some(e.to_string());
            }
        }
    }

    pub fn notes_for_selected(&self) -> impl Iterator<Item = &Note> {
        let selected = self.selected_date;
        self.notes().iter().filter(move |n| Some(n.date) == selected)
    }

    pub fn holidays_on(&self, date: NaiveDate) -> impl Iterator<Item = &HolidayEvent> {
        self.holidays().iter().filter(move |h| h.date == date)
    }

    pub fn annotations(&self) -> AnnotationMap {
        annotate::merge(&self.holidays, &self.notes, self.selected_date)
    }
}
