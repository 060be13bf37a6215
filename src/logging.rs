use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const MAX_HTTP_LOGS: usize = 100;

/// Global log storage for HTTP requests
static HTTP_LOGS: Mutex<Vec<String>> = Mutex::new(Vec::new());

fn push_log(line: String) {
    if let Ok(mut logs) = HTTP_LOGS.lock() {
        logs.push(line);
        if logs.len() > MAX_HTTP_LOGS {
            logs.remove(0);
        }
    }
}

/// Log an HTTP request
pub fn log_request(method: &str, url: &str) {
    let timestamp = chrono::Local::now().format("%H:%M:%S");
    tracing::debug!(%method, %url, "http request");
    push_log(format!("[{}] {} {}", timestamp, method, url));
}

/// Log an HTTP response
pub fn log_response(status: u16, url: &str) {
    let timestamp = chrono::Local::now().format("%H:%M:%S");
    tracing::debug!(status, %url, "http response");
    push_log(format!("[{}] <- {} {}", timestamp, status, url));
}

/// Get recent logs for display, newest first
pub fn get_recent_logs(count: usize) -> Vec<String> {
    if let Ok(logs) = HTTP_LOGS.lock() {
        logs.iter().rev().take(count).cloned().collect()
    } else {
        Vec::new()
    }
}

/// Route `tracing` output to a file; the terminal belongs to the UI.
///
/// The filter is read from `CALNOTES_LOG` and defaults to `info`.
pub fn init_tracing(log_path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;
    let filter = EnvFilter::try_from_env("CALNOTES_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed (tests, repeated init); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();

    Ok(())
}
