use crate::annotate::{Annotation, AnnotationMap};
use crate::api::{GAZETTED_COLOR, NOTE_COLOR, RESTRICTED_COLOR};
use crate::app::{App, InputMode, Screen};
use crate::auth::LoginFlow;
use crate::get_recent_logs;
use crate::utils::{color_or, days_in_month, first_of_month, truncate_str};
use chrono::{Datelike, Local, NaiveDate};
use crossterm::{
    cursor, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use std::io::{self, Write};

const CALENDAR_WIDTH: u16 = 30;
const MIN_PANEL_WIDTH: u16 = 25;
const GRID_TOP: u16 = 2;

pub fn render(out: &mut impl Write, app: &App) -> io::Result<()> {
    let (term_width, term_height) = terminal::size().unwrap_or((80, 24));

    queue!(out, Clear(ClearType::All), cursor::Hide)?;

    match app.screen() {
        Screen::Loading => render_loading(out)?,
        Screen::Login => render_login(out, &app.login, term_width)?,
        Screen::Home => render_home(out, app, term_width, term_height)?,
    }

    if app.show_logs {
        let right_panel_width = term_width.saturating_sub(CALENDAR_WIDTH + 1);
        if right_panel_width >= MIN_PANEL_WIDTH {
            render_log_panel(out, CALENDAR_WIDTH + 1, 0, right_panel_width, term_height.saturating_sub(3))?;
        }
    }

    render_status(out, app, term_width, term_height)?;

    if app.screen() == Screen::Home && app.input_mode == InputMode::EditingNote {
        let col = input_cursor_col(&app.home.note_text, term_width);
        queue!(out, cursor::MoveTo(col, term_height.saturating_sub(3)), cursor::Show)?;
    }

    out.flush()
}

/// Column just past the typed text, clamped to the last terminal column
fn input_cursor_col(text: &str, width: u16) -> u16 {
    u16::try_from(text.chars().count())
        .unwrap_or(u16::MAX)
        .saturating_add(3)
        .min(width.saturating_sub(1))
}

fn render_loading(out: &mut impl Write) -> io::Result<()> {
    queue!(
        out,
        cursor::MoveTo(0, 0),
        SetForegroundColor(Color::Cyan),
        Print(" Loading..."),
        ResetColor
    )
}

fn render_login(out: &mut impl Write, login: &LoginFlow, width: u16) -> io::Result<()> {
    queue!(
        out,
        cursor::MoveTo(0, 0),
        SetForegroundColor(Color::Cyan),
        SetAttribute(Attribute::Bold),
        Print(" CALNOTES"),
        ResetColor,
        SetAttribute(Attribute::Reset),
        cursor::MoveTo(0, 2)
    )?;

    let max = width.saturating_sub(2) as usize;
    match login {
        LoginFlow::Pending {
            user_code,
            verification_url,
            ..
        } => {
            queue!(
                out,
                Print(" Visit: "),
                SetForegroundColor(Color::Blue),
                Print(truncate_str(verification_url, max.saturating_sub(8))),
                ResetColor,
                cursor::MoveTo(0, 3),
                Print(" Code:  "),
                SetForegroundColor(Color::Yellow),
                SetAttribute(Attribute::Bold),
                Print(user_code),
                ResetColor,
                SetAttribute(Attribute::Reset),
                cursor::MoveTo(0, 5),
                SetForegroundColor(Color::DarkGrey),
                Print(" Waiting for approval..."),
                ResetColor
            )
        }
        LoginFlow::Error(_) | LoginFlow::NotConfigured => queue!(
            out,
            SetForegroundColor(Color::Red),
            Print(format!(" {}", truncate_str(&login.status_message(), max))),
            ResetColor
        ),
        _ => queue!(
            out,
            SetForegroundColor(Color::Yellow),
            Print(format!(" {}", truncate_str(&login.status_message(), max))),
            ResetColor
        ),
    }
}

fn render_home(out: &mut impl Write, app: &App, width: u16, height: u16) -> io::Result<()> {
    let annotations = app.home.annotations();
    let today = Local::now().date_naive();

    render_calendar(out, app.current_date, app.cursor_date, today, &annotations, app.home.is_loading())?;
    let mut row = GRID_TOP + 7;

    row = render_regions(out, app, row, width)?;
    render_legend(out, row)?;
    row += 2;

    render_day_details(out, app, row, width, height.saturating_sub(4))?;
    render_note_input(out, app, height.saturating_sub(3), width)
}

fn render_calendar(
    out: &mut impl Write,
    current_date: NaiveDate,
    cursor_date: NaiveDate,
    today: NaiveDate,
    annotations: &AnnotationMap,
    is_loading: bool,
) -> io::Result<()> {
    let first_day = first_of_month(current_date);
    let loading_indicator = if is_loading { " *" } else { "" };
    let header = format!(
        " {} {}{}",
        current_date.format("%B").to_string().to_uppercase(),
        current_date.year(),
        loading_indicator
    );

    queue!(
        out,
        cursor::MoveTo(0, 0),
        SetForegroundColor(Color::Cyan),
        SetAttribute(Attribute::Bold),
        Print(truncate_str(&header, CALENDAR_WIDTH as usize)),
        ResetColor,
        SetAttribute(Attribute::Reset),
        cursor::MoveTo(0, 1),
        SetForegroundColor(Color::DarkGrey),
        Print(" Mo Tu We Th Fr Sa Su"),
        ResetColor
    )?;

    let start_weekday = first_day.weekday().num_days_from_monday();
    let days = days_in_month(current_date);
    let empty = Annotation::default();

    for row in 0..6u32 {
        queue!(out, cursor::MoveTo(0, GRID_TOP + row as u16), Print(" "))?;

        for col in 0..7u32 {
            let cell = row * 7 + col;
            if cell < start_weekday || cell >= start_weekday + days {
                queue!(out, Print("   "))?;
                continue;
            }

            let day = cell - start_weekday + 1;
            let Some(date) = first_day.with_day(day) else {
                continue;
            };
            let annotation = annotations.get(&date).unwrap_or(&empty);
            render_day(out, day, annotation, date == cursor_date, date == today, col >= 5)?;
        }
    }

    Ok(())
}

fn render_day(
    out: &mut impl Write,
    day: u32,
    annotation: &Annotation,
    is_cursor: bool,
    is_today: bool,
    is_weekend: bool,
) -> io::Result<()> {
    // Selection styling wins over content coloring
    if annotation.selected {
        let background = color_or(annotation.selected_color.as_deref(), Color::DarkYellow);
        queue!(out, SetBackgroundColor(background), SetForegroundColor(Color::Black))?;
    } else if is_today {
        queue!(out, SetForegroundColor(Color::Green), SetAttribute(Attribute::Bold))?;
    } else if is_weekend {
        queue!(out, SetForegroundColor(Color::DarkGrey))?;
    }
    if is_cursor {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }

    queue!(out, Print(format!("{:2}", day)))?;

    if annotation.marked {
        let dot = color_or(annotation.dot_color.as_deref(), Color::Green);
        queue!(out, SetForegroundColor(dot), Print("\u{2022}"))?;
    } else {
        queue!(out, Print(" "))?;
    }

    queue!(out, ResetColor, SetAttribute(Attribute::Reset))
}

/// Region selector; wraps onto extra lines when the terminal is narrow
fn render_regions(out: &mut impl Write, app: &App, mut row: u16, width: u16) -> io::Result<u16> {
    let selected = app.home.region_index();
    let mut col: u16 = 1;
    queue!(out, cursor::MoveTo(col, row))?;

    for (i, region) in app.home.regions.iter().enumerate() {
        let label = format!("{} {}", i, region.label);
        let label_width = label.chars().count() as u16 + 2;
        if col + label_width > width && col > 1 {
            row += 1;
            col = 1;
            queue!(out, cursor::MoveTo(col, row))?;
        }

        if selected == Some(i) {
            queue!(out, SetAttribute(Attribute::Reverse))?;
        } else {
            queue!(out, SetForegroundColor(Color::DarkGrey))?;
        }
        queue!(out, Print(&label), ResetColor, SetAttribute(Attribute::Reset), Print("  "))?;
        col += label_width;
    }

    Ok(row + 1)
}

fn render_legend(out: &mut impl Write, row: u16) -> io::Result<()> {
    queue!(out, cursor::MoveTo(1, row))?;
    for (label, hex) in [("Gazetted", GAZETTED_COLOR), ("Restricted", RESTRICTED_COLOR), ("Notes", NOTE_COLOR)] {
        queue!(
            out,
            SetForegroundColor(color_or(Some(hex), Color::White)),
            Print(format!("\u{25CF} {}  ", label)),
            ResetColor
        )?;
    }
    Ok(())
}

fn render_day_details(out: &mut impl Write, app: &App, top: u16, width: u16, bottom: u16) -> io::Result<()> {
    let max = (width.min(CALENDAR_WIDTH * 2)).saturating_sub(4) as usize;

    let Some(selected) = app.home.selected_date else {
        return queue!(
            out,
            cursor::MoveTo(1, top),
            SetForegroundColor(Color::DarkGrey),
            Print("No date selected (Enter)"),
            ResetColor
        );
    };

    queue!(
        out,
        cursor::MoveTo(1, top),
        SetForegroundColor(Color::Yellow),
        Print(selected.format("%a %b %d, %Y")),
        ResetColor
    )?;

    let mut row = top + 1;
    for holiday in app.home.holidays_on(selected) {
        if row >= bottom {
            return Ok(());
        }
        queue!(
            out,
            cursor::MoveTo(1, row),
            SetForegroundColor(color_or(Some(holiday.color()), Color::Blue)),
            Print(format!("\u{2022} {}", truncate_str(&holiday.title, max))),
            SetForegroundColor(Color::DarkGrey),
            Print(format!(" ({})", holiday.category.label())),
            ResetColor
        )?;
        row += 1;
    }

    for note in app.home.notes_for_selected() {
        if row >= bottom {
            return Ok(());
        }
        queue!(
            out,
            cursor::MoveTo(1, row),
            SetForegroundColor(color_or(Some(note.color()), Color::Green)),
            Print(format!("\u{2022} {}", truncate_str(&note.title, max))),
            ResetColor
        )?;
        row += 1;
    }

    Ok(())
}

fn render_note_input(out: &mut impl Write, app: &App, row: u16, width: u16) -> io::Result<()> {
    let max = width.saturating_sub(4) as usize;
    queue!(out, cursor::MoveTo(0, row))?;

    let editing = app.input_mode == InputMode::EditingNote;
    if app.home.note_text.is_empty() && !editing {
        let date = app
            .home
            .selected_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "...".to_string());
        let color = if app.home.can_add_note() { Color::DarkGrey } else { Color::DarkRed };
        return queue!(
            out,
            SetForegroundColor(color),
            Print(truncate_str(&format!(" > Add note for {} (a)", date), max)),
            ResetColor
        );
    }

    let prompt_color = if editing { Color::Cyan } else { Color::DarkGrey };
    queue!(
        out,
        SetForegroundColor(prompt_color),
        Print(" > "),
        ResetColor,
        Print(truncate_str(&app.home.note_text, max))
    )?;

    if app.home.saving > 0 {
        queue!(out, SetForegroundColor(Color::DarkGrey), Print("  saving..."), ResetColor)?;
    } else if app.home.write_error.is_some() {
        queue!(out, SetForegroundColor(Color::Red), Print("  failed, Enter to retry"), ResetColor)?;
    }
    Ok(())
}

fn render_status(out: &mut impl Write, app: &App, width: u16, height: u16) -> io::Result<()> {
    let status_row = height.saturating_sub(2);
    if let Some(msg) = &app.status_message {
        queue!(
            out,
            cursor::MoveTo(0, status_row),
            SetForegroundColor(Color::Yellow),
            Print(format!(" {}", truncate_str(msg, (width as usize).saturating_sub(2)))),
            ResetColor
        )?;
    }

    let controls = match (app.screen(), app.input_mode) {
        (Screen::Loading, _) => " q:quit".to_string(),
        (Screen::Login, _) => " Enter:sign in L:logs q:quit".to_string(),
        (Screen::Home, InputMode::EditingNote) => " Enter:save Esc:done".to_string(),
        (Screen::Home, InputMode::Normal) => {
            let user = app
                .auth
                .current_user()
                .map(|u| u.display_name().to_string())
                .unwrap_or_default();
            format!(
                " hjkl:nav []:month Enter:select 0-9/s:state a:note r:refresh o:sign out ({}) q:quit",
                user
            )
        }
    };

    queue!(
        out,
        cursor::MoveTo(0, height.saturating_sub(1)),
        SetForegroundColor(Color::DarkGrey),
        Print(truncate_str(&controls, width as usize)),
        ResetColor
    )
}

fn render_log_panel(out: &mut impl Write, x: u16, y: u16, width: u16, height: u16) -> io::Result<()> {
    queue!(
        out,
        cursor::MoveTo(x, y),
        SetForegroundColor(Color::Magenta),
        SetAttribute(Attribute::Bold),
        Print("HTTP log"),
        ResetColor,
        SetAttribute(Attribute::Reset),
        cursor::MoveTo(x, y + 1),
        SetForegroundColor(Color::DarkGrey),
        Print("\u{2500}".repeat(width.min(40) as usize)),
        ResetColor
    )?;

    let max_lines = height.saturating_sub(2) as usize;
    for (i, line) in get_recent_logs(max_lines).iter().enumerate() {
        queue!(
            out,
            cursor::MoveTo(x, y + 2 + i as u16),
            Print(truncate_str(line, width as usize))
        )?;
    }
    Ok(())
}
