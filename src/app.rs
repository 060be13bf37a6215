use crate::api::{HolidayEvent, Note};
use crate::auth::{AuthSession, LoginFlow, SessionState};
use crate::config::Config;
use crate::error::Result;
use crate::home::{HolidayRequest, HomeState, NoteWrite, NotesRequest};
use crate::identity::{DeviceCodeResponse, Session};
use crate::utils::{first_of_month, next_month_start, prev_month_start};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

/// Which screen the router shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen {
    Loading,
    Login,
    Home,
}

impl Screen {
    pub fn route(state: &SessionState) -> Self {
        match state {
            SessionState::Loading => Screen::Loading,
            SessionState::SignedOut => Screen::Login,
            SessionState::SignedIn(_) => Screen::Home,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    EditingNote,
}

/// Results reported back by background tasks
#[derive(Debug)]
pub enum AppEvent {
    SessionRestored(Option<Session>),
    HolidaysLoaded {
        generation: u64,
        result: Result<Vec<HolidayEvent>>,
    },
    NotesLoaded {
        generation: u64,
        result: Result<Vec<Note>>,
    },
    NoteSaved {
        write: NoteWrite,
        result: Result<Note>,
    },
    DeviceCode(Result<DeviceCodeResponse>),
    LoginFinished(Result<Session>),
}

/// Work the event loop has to perform on the app's behalf
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchHolidays(HolidayRequest),
    FetchNotes(NotesRequest),
    SaveNote(NoteWrite),
    RequestDeviceCode,
    PollLogin {
        device_code: String,
        interval_secs: u64,
        expires_at: DateTime<Utc>,
    },
    PersistSession(Session),
    ForgetSession,
    Quit,
}

/// Application state
pub struct App {
    pub current_date: NaiveDate,
    pub cursor_date: NaiveDate,
    pub show_logs: bool,
    pub status_message: Option<String>,
    pub status_message_time: Option<std::time::Instant>,
    pub config: Config,
    pub auth: AuthSession,
    pub login: LoginFlow,
    pub home: HomeState,
    pub input_mode: InputMode,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self::with_today(config, Local::now().date_naive())
    }

    pub fn with_today(config: Config, today: NaiveDate) -> Self {
        let login = LoginFlow::new(config.login_configured());
        let home = HomeState::new(config.regions.clone());
        Self {
            current_date: first_of_month(today),
            cursor_date: today,
            show_logs: false,
            status_message: None,
            status_message_time: None,
            config,
            auth: AuthSession::new(),
            login,
            home,
            input_mode: InputMode::Normal,
        }
    }

    pub fn screen(&self) -> Screen {
        Screen::route(&self.auth.state())
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(std::time::Instant::now());
    }

    pub fn clear_expired_status(&mut self) {
        if let Some(time) = self.status_message_time
            && time.elapsed() > std::time::Duration::from_secs(3)
        {
            self.status_message = None;
            self.status_message_time = None;
        }
    }

    /// React to a session notification: (re)load notes for the new user
    pub fn on_session_changed(&mut self) -> Vec<Command> {
        let user = self.auth.current_user();
        if user.is_none() {
            self.input_mode = InputMode::Normal;
        }
        self.home
            .set_user(user.as_ref().map(|u| u.notes_id()))
            .map(Command::FetchNotes)
            .into_iter()
            .collect()
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Vec<Command> {
        match event {
            AppEvent::SessionRestored(Some(session)) => {
                info!("session restored");
                self.auth.establish(session);
            }
            AppEvent::SessionRestored(None) => {
                self.auth.mark_signed_out();
            }
            AppEvent::HolidaysLoaded { generation, result } => {
                self.home.apply_holidays(generation, result);
            }
            AppEvent::NotesLoaded { generation, result } => {
                self.home.apply_notes(generation, result);
            }
            AppEvent::NoteSaved { write, result } => {
                let failed = result.is_err();
                self.home.finish_add_note(&write, result);
                if failed {
                    self.set_status("Saving note failed. Press Enter in the note box to retry");
                }
            }
            AppEvent::DeviceCode(Ok(code)) => {
                self.login.device_code_received(code);
                if let LoginFlow::Pending {
                    device_code,
                    interval_secs,
                    expires_at,
                    ..
                } = &self.login
                {
                    return vec![Command::PollLogin {
                        device_code: device_code.clone(),
                        interval_secs: *interval_secs,
                        expires_at: *expires_at,
                    }];
                }
            }
            AppEvent::DeviceCode(Err(e)) => {
                warn!(error = %e, "device code request failed");
                self.login.fail(e.to_string());
            }
            AppEvent::LoginFinished(Ok(session)) => {
                info!(user = %session.user.display_name(), "signed in");
                self.login.succeed();
                self.auth.establish(session.clone());
                return vec![Command::PersistSession(session)];
            }
            AppEvent::LoginFinished(Err(e)) => {
                warn!(error = %e, "sign-in failed");
                self.login.fail(e.to_string());
            }
        }
        Vec::new()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return vec![Command::Quit];
        }

        match self.screen() {
            Screen::Loading => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => vec![Command::Quit],
                _ => Vec::new(),
            },
            Screen::Login => self.handle_login_key(key),
            Screen::Home => match self.input_mode {
                InputMode::Normal => self.handle_home_key(key),
                InputMode::EditingNote => self.handle_editing_key(key),
            },
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.login.start() {
                    vec![Command::RequestDeviceCode]
                } else {
                    Vec::new()
                }
            }
            KeyCode::Char('L') => {
                self.show_logs = !self.show_logs;
                Vec::new()
            }
            KeyCode::Char('q') | KeyCode::Esc => vec![Command::Quit],
            _ => Vec::new(),
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let mut commands = Vec::new();
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => self.move_cursor(-1),
            KeyCode::Char('l') | KeyCode::Right => self.move_cursor(1),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(7),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-7),
            KeyCode::Char(']') => self.next_month(),
            KeyCode::Char('[') => self.prev_month(),
            KeyCode::Char('t') => self.goto_today(),
            KeyCode::Enter | KeyCode::Char(' ') => self.home.select_date(self.cursor_date),
            KeyCode::Char('a') | KeyCode::Char('i') => {
                if self.home.can_add_note() {
                    self.input_mode = InputMode::EditingNote;
                } else {
                    self.set_status("Select a date first (Enter)");
                }
            }
            KeyCode::Char(c @ '0'..='9') => {
                let index = c as usize - '0' as usize;
                commands.extend(self.home.select_region_index(index).map(Command::FetchHolidays));
            }
            KeyCode::Char('s') => {
                commands.extend(self.home.cycle_region().map(Command::FetchHolidays));
            }
            KeyCode::Char('r') => {
                let (holidays, notes) = self.home.refresh();
                commands.extend(holidays.map(Command::FetchHolidays));
                commands.extend(notes.map(Command::FetchNotes));
                self.set_status("Refreshing...");
            }
            KeyCode::Char('L') => self.show_logs = !self.show_logs,
            KeyCode::Char('o') => commands.extend(self.sign_out()),
            KeyCode::Char('q') | KeyCode::Esc => commands.push(Command::Quit),
            _ => {}
        }
        commands
    }

    fn handle_editing_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Enter => {
                if let Some(write) = self.home.begin_add_note() {
                    return vec![Command::SaveNote(write)];
                }
            }
            KeyCode::Backspace => {
                self.home.note_text.pop();
            }
            KeyCode::Char(c) => self.home.note_text.push(c),
            _ => {}
        }
        Vec::new()
    }

    pub fn sign_out(&mut self) -> Vec<Command> {
        self.auth.sign_out();
        self.login.reset();
        self.input_mode = InputMode::Normal;
        vec![Command::ForgetSession]
    }

    pub fn move_cursor(&mut self, days: i64) {
        self.cursor_date += Duration::days(days);
        self.sync_month_if_needed();
    }

    fn sync_month_if_needed(&mut self) {
        if self.cursor_date.month() != self.current_date.month()
            || self.cursor_date.year() != self.current_date.year()
        {
            self.current_date = first_of_month(self.cursor_date);
        }
    }

    pub fn goto_today(&mut self) {
        let today = Local::now().date_naive();
        self.cursor_date = today;
        self.current_date = first_of_month(today);
    }

    pub fn next_month(&mut self) {
        self.current_date = next_month_start(self.current_date);
        self.cursor_date = self.current_date;
    }

    pub fn prev_month(&mut self) {
        self.current_date = prev_month_start(self.current_date);
        self.cursor_date = self.current_date;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalnotesError;
    use crate::identity::User;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn session(email: &str) -> Session {
        Session {
            user: User {
                uid: "uid".to_string(),
                email: Some(email.to_string()),
            },
            id_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    fn configured() -> Config {
        let mut config = Config::default();
        config.google = Some(crate::config::GoogleConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        });
        config.firebase_api_key = Some("key".to_string());
        config
    }

    fn signed_in_app() -> App {
        let mut app = App::with_today(configured(), date(2024, 1, 15));
        app.handle_event(AppEvent::SessionRestored(Some(session("asha@example.com"))));
        let commands = app.on_session_changed();
        assert!(matches!(&commands[..], [Command::FetchNotes(r)] if r.user_id == "asha@example.com"));
        app
    }

    #[test]
    fn test_router_follows_session() {
        let mut app = App::with_today(configured(), date(2024, 1, 15));
        assert_eq!(app.screen(), Screen::Loading);

        app.handle_event(AppEvent::SessionRestored(None));
        assert_eq!(app.screen(), Screen::Login);

        app.handle_event(AppEvent::LoginFinished(Ok(session("asha@example.com"))));
        assert_eq!(app.screen(), Screen::Home);
        assert!(matches!(app.login, LoginFlow::Success));
    }

    #[test]
    fn test_login_requires_user_action() {
        let mut app = App::with_today(configured(), date(2024, 1, 15));
        app.handle_event(AppEvent::SessionRestored(None));
        assert!(matches!(app.login, LoginFlow::Idle));

        assert_eq!(app.handle_key(key(KeyCode::Enter)), vec![Command::RequestDeviceCode]);
        assert!(app.handle_key(key(KeyCode::Enter)).is_empty());

        app.handle_event(AppEvent::DeviceCode(Err(CalnotesError::Auth("boom".to_string()))));
        assert!(matches!(app.login, LoginFlow::Error(_)));
        assert_eq!(app.handle_key(key(KeyCode::Enter)), vec![Command::RequestDeviceCode]);
    }

    #[test]
    fn test_device_code_starts_polling() {
        let mut app = App::with_today(configured(), date(2024, 1, 15));
        app.handle_event(AppEvent::SessionRestored(None));
        app.handle_key(key(KeyCode::Enter));

        let commands = app.handle_event(AppEvent::DeviceCode(Ok(DeviceCodeResponse {
            device_code: "device-1".to_string(),
            user_code: "ABCD".to_string(),
            verification_url: "https://www.google.com/device".to_string(),
            expires_in: 600,
            interval: 5,
        })));
        assert!(matches!(&commands[..], [Command::PollLogin { device_code, interval_secs: 5, .. }] if device_code == "device-1"));
    }

    #[test]
    fn test_login_success_persists_session() {
        let mut app = App::with_today(configured(), date(2024, 1, 15));
        app.handle_event(AppEvent::SessionRestored(None));
        let commands = app.handle_event(AppEvent::LoginFinished(Ok(session("asha@example.com"))));
        assert!(matches!(&commands[..], [Command::PersistSession(s)] if s.user.notes_id() == "asha@example.com"));
    }

    #[test]
    fn test_sign_out_returns_to_login() {
        let mut app = signed_in_app();
        let commands = app.handle_key(key(KeyCode::Char('o')));
        assert_eq!(commands, vec![Command::ForgetSession]);
        assert_eq!(app.screen(), Screen::Login);
        assert!(matches!(app.login, LoginFlow::Idle));
        assert!(app.on_session_changed().is_empty());
    }

    #[test]
    fn test_next_user_starts_from_a_clean_screen() {
        let mut app = signed_in_app();
        app.handle_key(key(KeyCode::Char('1')));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.home.region(), "br");
        assert_eq!(app.home.selected_date, Some(date(2024, 1, 15)));

        app.handle_key(key(KeyCode::Char('o')));
        app.on_session_changed();
        app.handle_event(AppEvent::LoginFinished(Ok(session("ravi@example.com"))));
        let commands = app.on_session_changed();

        assert!(matches!(&commands[..], [Command::FetchNotes(r)] if r.user_id == "ravi@example.com"));
        assert_eq!(app.screen(), Screen::Home);
        assert_eq!(app.home.region(), "");
        assert!(app.home.holidays().is_empty());
        assert_eq!(app.home.selected_date, None);
    }

    #[test]
    fn test_region_keys() {
        let mut app = signed_in_app();
        let commands = app.handle_key(key(KeyCode::Char('1')));
        assert!(matches!(&commands[..], [Command::FetchHolidays(r)] if r.region == "br"));
        assert!(app.handle_key(key(KeyCode::Char('1'))).is_empty());
        assert!(app.handle_key(key(KeyCode::Char('0'))).is_empty());
        assert!(app.handle_key(key(KeyCode::Char('9'))).is_empty());
    }

    #[test]
    fn test_note_entry_flow() {
        let mut app = signed_in_app();

        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.status_message.is_some());

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.home.selected_date, Some(date(2024, 1, 15)));
        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.input_mode, InputMode::EditingNote);

        for c in "Hi!".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.home.note_text, "Hi");

        let commands = app.handle_key(key(KeyCode::Enter));
        let write = match &commands[..] {
            [Command::SaveNote(write)] => write.clone(),
            other => panic!("unexpected commands: {:?}", other),
        };
        assert_eq!(write.note.title, "Hi");

        app.handle_event(AppEvent::NoteSaved {
            write: write.clone(),
            result: Err(CalnotesError::Api("500".to_string())),
        });
        assert_eq!(app.home.note_text, "Hi");
        assert!(app.home.notes().is_empty());

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_cursor_navigation_crosses_months() {
        let mut app = App::with_today(configured(), date(2024, 1, 31));
        app.move_cursor(1);
        assert_eq!(app.cursor_date, date(2024, 2, 1));
        assert_eq!(app.current_date, date(2024, 2, 1));

        app.move_cursor(-7);
        assert_eq!(app.current_date, date(2024, 1, 1));

        app.prev_month();
        assert_eq!(app.current_date, date(2023, 12, 1));
        app.next_month();
        app.next_month();
        assert_eq!(app.cursor_date, date(2024, 2, 1));
    }

    #[test]
    fn test_loading_screen_only_quits() {
        let mut app = App::with_today(Config::default(), date(2024, 1, 15));
        assert!(app.handle_key(key(KeyCode::Enter)).is_empty());
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), vec![Command::Quit]);
    }
}
