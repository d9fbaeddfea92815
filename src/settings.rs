//! Settings store: theme and interface language

mod i18n;

pub use i18n::{Language, UnknownLanguage};

use crate::chat::ChatEvent;
use crate::kv::{KvError, KvStore};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};

pub const THEME_KEY: &str = "theme";
pub const LANGUAGE_KEY: &str = "language";

/// Color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parse a preference string such as `ECO_THEME`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Settings {
    theme: Theme,
    language: Language,
}

/// Shared handle to the settings store
#[derive(Clone)]
pub struct SettingsStore {
    kv: KvStore,
    state: Arc<Mutex<Settings>>,
    /// Dark-mode flag consumed by rendering
    theme_tx: Arc<watch::Sender<Theme>>,
    events: Option<broadcast::Sender<ChatEvent>>,
}

impl SettingsStore {
    /// Load settings, using `preferred_theme` when no theme has been stored
    pub fn load(kv: KvStore, preferred_theme: Theme) -> Result<Self, KvError> {
        let theme = kv.get::<Theme>(THEME_KEY)?.unwrap_or(preferred_theme);
        let language = kv.get::<Language>(LANGUAGE_KEY)?.unwrap_or_default();
        tracing::info!(theme = theme.as_str(), language = %language, "Loaded settings");

        let (theme_tx, _) = watch::channel(theme);
        let store = Self {
            kv,
            state: Arc::new(Mutex::new(Settings { theme, language })),
            theme_tx: Arc::new(theme_tx),
            events: None,
        };
        store.persist(Settings { theme, language })?;
        Ok(store)
    }

    /// Also publish changes on the chat event channel
    pub fn with_events(mut self, events: broadcast::Sender<ChatEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Settings> {
        // Settings is Copy and always left consistent, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, settings: Settings) -> Result<(), KvError> {
        self.kv.set(THEME_KEY, &settings.theme)?;
        self.kv.set(LANGUAGE_KEY, &settings.language)?;
        Ok(())
    }

    fn notify(&self, settings: Settings) {
        if let Some(events) = &self.events {
            let _ = events.send(ChatEvent::SettingsChanged {
                theme: settings.theme.as_str().to_string(),
                language: settings.language.code().to_string(),
            });
        }
    }

    pub fn theme(&self) -> Theme {
        self.lock().theme
    }

    pub fn language(&self) -> Language {
        self.lock().language
    }

    pub fn dark_mode(&self) -> bool {
        self.theme() == Theme::Dark
    }

    /// Watch the active theme
    pub fn subscribe_theme(&self) -> watch::Receiver<Theme> {
        self.theme_tx.subscribe()
    }

    /// Flip between light and dark, returning the new theme
    pub fn toggle_theme(&self) -> Result<Theme, KvError> {
        let settings = {
            let mut state = self.lock();
            state.theme = state.theme.toggled();
            *state
        };
        self.theme_tx.send_replace(settings.theme);
        self.notify(settings);
        self.kv.set(THEME_KEY, &settings.theme)?;
        tracing::debug!(theme = settings.theme.as_str(), "Theme toggled");
        Ok(settings.theme)
    }

    pub fn set_language(&self, language: Language) -> Result<(), KvError> {
        let settings = {
            let mut state = self.lock();
            state.language = language;
            *state
        };
        self.notify(settings);
        self.kv.set(LANGUAGE_KEY, &language)?;
        tracing::debug!(language = %language, "Language changed");
        Ok(())
    }

    /// Localized string for `key`, or `key` itself when the active
    /// language has no entry for it
    pub fn translate(&self, key: &str) -> String {
        self.language()
            .lookup(key)
            .map_or_else(|| key.to_string(), str::to_string)
    }
}
