use crate::error::Result;
use crate::identity::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const API_URL_ENV: &str = "CALNOTES_API_URL";

/// OAuth client used for the Google device flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
}

/// A selectable holiday region; an empty code means "no region"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub label: String,
    pub code: String,
}

impl Region {
    fn new(label: &str, code: &str) -> Self {
        Self {
            label: label.to_string(),
            code: code.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub google: Option<GoogleConfig>,
    #[serde(default)]
    pub firebase_api_key: Option<String>,
    #[serde(default = "default_regions")]
    pub regions: Vec<Region>,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_regions() -> Vec<Region> {
    vec![
        Region::new("Select State", ""),
        Region::new("Bihar", "br"),
        Region::new("Andhra Pradesh", "ap"),
        Region::new("West Bengal", "wb"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            google: None,
            firebase_api_key: None,
            regions: default_regions(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoredSession {
    pub session: Session,
    pub stored_at: DateTime<Utc>,
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calnotes")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    pub fn session_path() -> PathBuf {
        Self::config_dir().join("session.json")
    }

    pub fn log_path() -> PathBuf {
        Self::config_dir().join("calnotes.log")
    }

    /// Load the config file (defaults when absent), then apply the environment
    pub fn load() -> Result<Config> {
        let path = Self::config_path();
        let config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        Ok(config.with_api_url_override(std::env::var(API_URL_ENV).ok()))
    }

    pub fn with_api_url_override(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        self.api_url = self.api_url.trim_end_matches('/').to_string();
        self
    }

    /// Login needs both the OAuth client and the identity toolkit key
    pub fn login_configured(&self) -> bool {
        self.google.is_some() && self.firebase_api_key.is_some()
    }

    pub fn ensure_config_dir() -> Result<()> {
        let dir = Self::config_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

pub fn save_session(session: &Session) -> Result<()> {
    Config::ensure_config_dir()?;
    let path = Config::session_path();

    let stored = StoredSession {
        session: session.clone(),
        stored_at: Utc::now(),
    };

    let json = serde_json::to_string_pretty(&stored)?;
    write_private(&path, json.as_bytes())
}

/// Write a credential file readable only by the owner (on Unix)
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    // The mode only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents)?;
    Ok(())
}

pub fn load_session() -> Result<Option<Session>> {
    let path = Config::session_path();
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let stored: StoredSession = serde_json::from_str(&content)?;
    Ok(Some(stored.session))
}

pub fn clear_session() -> Result<()> {
    let path = Config::session_path();
    if path.exists() {
        fs::remove_file(&path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert!(config.google.is_none());
        assert!(!config.login_configured());
        assert_eq!(config.regions.len(), 4);
        assert_eq!(config.regions[0].code, "");
        assert_eq!(config.regions[1], Region::new("Bihar", "br"));
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "api_url": "https://holidays.example.com",
            "google": {"client_id": "id", "client_secret": "secret"},
            "firebase_api_key": "key",
            "regions": [{"label": "Kerala", "code": "kl"}]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.login_configured());
        assert_eq!(config.regions, vec![Region::new("Kerala", "kl")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_credential_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let path = std::env::temp_dir().join(format!("calnotes-session-{}.json", std::process::id()));
        let _ = fs::remove_file(&path);

        write_private(&path, b"{\"token\": 1}").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        write_private(&path, b"{}").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_api_url_override() {
        let config = Config::default().with_api_url_override(Some("https://api.example.com/".to_string()));
        assert_eq!(config.api_url, "https://api.example.com");

        let config = Config::default().with_api_url_override(Some("  ".to_string()));
        assert_eq!(config.api_url, "http://localhost:8000");

        let config = Config::default().with_api_url_override(None);
        assert_eq!(config.api_url, "http://localhost:8000");
    }
}
