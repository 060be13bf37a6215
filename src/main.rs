mod annotate;
mod api;
mod app;
mod auth;
mod config;
mod error;
mod home;
mod identity;
mod logging;
mod ui;
mod utils;

use api::ApiClient;
use app::{App, AppEvent, Command};
use config::Config;
use crossterm::{
    cursor, execute,
    event::{self, Event, KeyEventKind},
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use error::{CalnotesError, Result};
use identity::{GoogleAuth, IdentityToolkit, PollResult, Session};
use logging::{get_recent_logs, log_request, log_response};
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tracing::{error, info, warn};

const TICK: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<()> {
    Config::ensure_config_dir()?;
    logging::init_tracing(&Config::log_path())?;

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", Config::config_path().display(), e);
            return Err(CalnotesError::Config(e.to_string()));
        }
    };
    info!(api_url = %config.api_url, "starting");

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    let result = run(App::new(config)).await;

    // Cleanup: restore cursor, leave alternate screen, disable raw mode
    disable_raw_mode()?;
    execute!(stdout(), cursor::Show, Clear(ClearType::All), LeaveAlternateScreen)?;

    if let Err(ref e) = result {
        error!(error = %e, "exiting with error");
    }
    result
}

async fn run(mut app: App) -> Result<()> {
    let (tx, mut rx) = unbounded_channel::<AppEvent>();
    let runner = CommandRunner::new(&app.config, tx.clone());
    let mut session_rx = app.auth.subscribe();

    spawn_session_restore(app.config.firebase_api_key.clone(), tx);

    let mut out = stdout();
    loop {
        app.clear_expired_status();
        ui::render(&mut out, &app)?;

        let mut commands = Vec::new();

        if event::poll(TICK)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            commands.extend(app.handle_key(key));
        }

        while let Ok(event) = rx.try_recv() {
            commands.extend(app.handle_event(event));
        }

        // Route on every session notification, whatever caused it
        if session_rx.has_changed().unwrap_or(false) {
            session_rx.mark_unchanged();
            commands.extend(app.on_session_changed());
        }

        for command in commands {
            if command == Command::Quit {
                return Ok(());
            }
            runner.run(command);
        }
    }
}

/// Spawns the background work requested by the app
struct CommandRunner {
    api: ApiClient,
    google: Option<config::GoogleConfig>,
    firebase_api_key: Option<String>,
    tx: UnboundedSender<AppEvent>,
}

impl CommandRunner {
    fn new(config: &Config, tx: UnboundedSender<AppEvent>) -> Self {
        Self {
            api: ApiClient::new(config.api_url.clone()),
            google: config.google.clone(),
            firebase_api_key: config.firebase_api_key.clone(),
            tx,
        }
    }

    fn run(&self, command: Command) {
        match command {
            Command::FetchHolidays(request) => {
                let api = self.api.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = api.fetch_holidays(&request.region).await;
                    let _ = tx.send(AppEvent::HolidaysLoaded {
                        generation: request.generation,
                        result,
                    });
                });
            }
            Command::FetchNotes(request) => {
                let api = self.api.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = api.fetch_notes(&request.user_id).await;
                    let _ = tx.send(AppEvent::NotesLoaded {
                        generation: request.generation,
                        result,
                    });
                });
            }
            Command::SaveNote(write) => {
                let api = self.api.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = api.create_note(&write.user_id, &write.note).await;
                    let _ = tx.send(AppEvent::NoteSaved { write, result });
                });
            }
            Command::RequestDeviceCode => {
                let Some(google) = self.google.clone() else {
                    let _ = self.tx.send(AppEvent::DeviceCode(Err(CalnotesError::Config(
                        "Google client not configured".to_string(),
                    ))));
                    return;
                };
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = GoogleAuth::new(google).request_device_code().await;
                    let _ = tx.send(AppEvent::DeviceCode(result));
                });
            }
            Command::PollLogin {
                device_code,
                interval_secs,
                expires_at,
            } => {
                let (Some(google), Some(api_key)) = (self.google.clone(), self.firebase_api_key.clone()) else {
                    let _ = self.tx.send(AppEvent::LoginFinished(Err(CalnotesError::NotAuthenticated)));
                    return;
                };
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = complete_login(google, api_key, device_code, interval_secs, expires_at).await;
                    let _ = tx.send(AppEvent::LoginFinished(result));
                });
            }
            Command::PersistSession(session) => {
                if let Err(e) = config::save_session(&session) {
                    warn!(error = %e, "failed to persist session");
                }
            }
            Command::ForgetSession => {
                if let Err(e) = config::clear_session() {
                    warn!(error = %e, "failed to remove stored session");
                }
            }
            Command::Quit => {}
        }
    }
}

/// Poll the device flow until approved, then exchange the identity token
async fn complete_login(
    google: config::GoogleConfig,
    api_key: String,
    device_code: String,
    interval_secs: u64,
    expires_at: chrono::DateTime<chrono::Utc>,
) -> Result<Session> {
    let auth = GoogleAuth::new(google);
    let mut interval = Duration::from_secs(interval_secs.max(1));

    let id_token = loop {
        if chrono::Utc::now() >= expires_at {
            return Err(CalnotesError::Auth("Code expired".to_string()));
        }
        tokio::time::sleep(interval).await;

        match auth.poll_for_token(&device_code).await? {
            PollResult::Success { id_token } => break id_token,
            PollResult::Pending => {}
            PollResult::SlowDown => interval += Duration::from_secs(5),
            PollResult::Denied => return Err(CalnotesError::Auth("Access denied".to_string())),
            PollResult::Expired => return Err(CalnotesError::Auth("Code expired".to_string())),
        }
    };

    IdentityToolkit::new(api_key).sign_in_with_google(&id_token).await
}

/// Produce the first session notification from the stored credential
fn spawn_session_restore(api_key: Option<String>, tx: UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let stored = match config::load_session() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable stored session");
                None
            }
        };

        let session = match (stored, api_key) {
            (Some(session), _) if !session.is_expired() => Some(session),
            (Some(session), Some(key)) => match IdentityToolkit::new(key).refresh(session).await {
                Ok(session) => {
                    if let Err(e) = config::save_session(&session) {
                        warn!(error = %e, "failed to persist refreshed session");
                    }
                    Some(session)
                }
                Err(e) => {
                    warn!(error = %e, "session refresh failed");
                    None
                }
            },
            _ => None,
        };

        let _ = tx.send(AppEvent::SessionRestored(session));
    });
}
