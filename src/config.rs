//! Process configuration read from the environment

use crate::settings::Theme;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "http://localhost:5001";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Base URL of the preprocess/generate/export service
    pub api_base: String,
    pub store_path: String,
    pub port: u16,
    /// Transport timeout for remote calls; none when unset
    pub request_timeout: Option<Duration>,
    /// Pause before a reject or inform message is shown
    pub display_delay: Duration,
    /// Pause between an inform message and the generate call
    pub generate_delay: Duration,
    /// Theme used when nothing is stored yet
    pub preferred_theme: Theme,
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let store_path = lookup("ECO_STORE_PATH").unwrap_or_else(|| {
            let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
            format!("{home}/.eco-chat/store.db")
        });

        let millis = |key: &str, default: u64| {
            Duration::from_millis(
                lookup(key)
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(default),
            )
        };

        Self {
            api_base: lookup("ECO_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            store_path,
            port: lookup("ECO_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            request_timeout: lookup("ECO_REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            display_delay: millis("ECO_DISPLAY_DELAY_MS", DEFAULT_DELAY_MS),
            generate_delay: millis("ECO_GENERATE_DELAY_MS", DEFAULT_DELAY_MS),
            preferred_theme: lookup("ECO_THEME")
                .and_then(|t| Theme::parse(&t))
                .unwrap_or_default(),
        }
    }
}
