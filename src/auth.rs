use crate::identity::{DeviceCodeResponse, Session, User};
use chrono::{DateTime, Utc};
use tokio::sync::watch;

/// What the session provider last told us
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No notification has arrived yet
    Loading,
    SignedIn(User),
    SignedOut,
}

/// Session holder that broadcasts every change to its subscribers
pub struct AuthSession {
    tx: watch::Sender<SessionState>,
}

impl AuthSession {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::Loading);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    #[allow(dead_code)]
    pub fn is_loading(&self) -> bool {
        matches!(*self.tx.borrow(), SessionState::Loading)
    }

    pub fn current_user(&self) -> Option<User> {
        match &*self.tx.borrow() {
            SessionState::SignedIn(user) => Some(user.clone()),
            _ => None,
        }
    }

    /// Install a session credential and notify subscribers
    pub fn establish(&mut self, session: Session) {
        self.tx.send_replace(SessionState::SignedIn(session.user));
    }

    /// Report that no session exists (first notification on a cold start)
    pub fn mark_signed_out(&mut self) {
        self.tx.send_replace(SessionState::SignedOut);
    }

    /// Invalidate the current session
    pub fn sign_out(&mut self) {
        tracing::info!("signing out");
        self.mark_signed_out();
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Interactive sign-in, started explicitly by the user
#[derive(Debug, Clone)]
pub enum LoginFlow {
    NotConfigured,
    Idle,
    Pending {
        user_code: String,
        verification_url: String,
        device_code: String,
        interval_secs: u64,
        expires_at: DateTime<Utc>,
    },
    /// Waiting for the device code or for the token exchange
    Requesting,
    Success,
    Error(String),
}

impl LoginFlow {
    pub fn new(configured: bool) -> Self {
        if configured {
            LoginFlow::Idle
        } else {
            LoginFlow::NotConfigured
        }
    }

    /// Whether a user action may start (or restart) the flow
    pub fn can_start(&self) -> bool {
        matches!(self, LoginFlow::Idle | LoginFlow::Error(_))
    }

    pub fn start(&mut self) -> bool {
        if !self.can_start() {
            return false;
        }
        *self = LoginFlow::Requesting;
        true
    }

    pub fn device_code_received(&mut self, code: DeviceCodeResponse) {
        *self = LoginFlow::Pending {
            user_code: code.user_code,
            verification_url: code.verification_url,
            device_code: code.device_code,
            interval_secs: code.interval,
            expires_at: Utc::now() + chrono::Duration::seconds(code.expires_in as i64),
        };
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        *self = LoginFlow::Error(message.into());
    }

    pub fn succeed(&mut self) {
        *self = LoginFlow::Success;
    }

    /// Back to idle after sign-out so the next sign-in is user-initiated again
    pub fn reset(&mut self) {
        if !matches!(self, LoginFlow::NotConfigured) {
            *self = LoginFlow::Idle;
        }
    }

    pub fn status_message(&self) -> String {
        match self {
            LoginFlow::NotConfigured => {
                "Sign-in not configured. Add google and firebase_api_key to config.json".to_string()
            }
            LoginFlow::Idle => "Press Enter to sign in with Google".to_string(),
            LoginFlow::Requesting => "Contacting Google...".to_string(),
            LoginFlow::Pending {
                user_code,
                verification_url,
                ..
            } => format!("Visit {} and enter code {}", verification_url, user_code),
            LoginFlow::Success => "Signed in".to_string(),
            LoginFlow::Error(msg) => format!("Sign-in failed: {} (Enter to retry)", msg),
        }
    }
}
