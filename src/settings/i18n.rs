//! Interface string tables

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Supported interface languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
    Es,
    De,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::Fr, Language::Es, Language::De];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::Es => "es",
            Language::De => "de",
        }
    }

    fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Language::En => EN,
            Language::Fr => FR,
            Language::Es => ES,
            Language::De => DE,
        }
    }

    /// Localized string for `key`, if this language has one
    pub fn lookup(self, key: &str) -> Option<&'static str> {
        self.table()
            .iter()
            .find_map(|(k, v)| (*k == key).then_some(*v))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error)]
#[error("Unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

const EN: &[(&str, &str)] = &[
    ("welcome", "Welcome to OnePoint GenAI Eco"),
    (
        "startConversation",
        "Start a conversation by typing a message below. I'm here to help with any questions you might have.",
    ),
    ("newChat", "New Chat"),
    ("searchConversations", "Search conversations..."),
    ("online", "Online"),
    ("typeMessage", "Type a message..."),
    ("settings", "Settings"),
    ("darkMode", "Dark Mode"),
    ("language", "Language"),
    ("cancel", "Cancel"),
    ("saveChanges", "Save Changes"),
    ("noConversations", "No conversations found"),
    ("freePlan", "Free Plan"),
    ("howDoesThisWork", "How does this work?"),
    ("whatCanYouHelp", "What can you help me with?"),
    ("tellJoke", "Tell me a joke"),
    ("weatherToday", "What's the weather today?"),
];

const FR: &[(&str, &str)] = &[
    ("welcome", "Bienvenue à OnePoint GenAI Eco"),
    (
        "startConversation",
        "Commencez une conversation en tapant un message ci-dessous. Je suis là pour vous aider avec vos questions.",
    ),
    ("newChat", "Nouvelle Conversation"),
    ("searchConversations", "Rechercher des conversations..."),
    ("online", "En ligne"),
    ("typeMessage", "Tapez un message..."),
    ("settings", "Paramètres"),
    ("darkMode", "Mode sombre"),
    ("language", "Langue"),
    ("cancel", "Annuler"),
    ("saveChanges", "Enregistrer les modifications"),
    ("noConversations", "Aucune conversation trouvée"),
    ("freePlan", "Plan gratuit"),
    ("howDoesThisWork", "Comment ça marche?"),
    ("whatCanYouHelp", "Comment pouvez-vous m'aider?"),
    ("tellJoke", "Racontez-moi une blague"),
    ("weatherToday", "Quel temps fait-il aujourd'hui?"),
];

const ES: &[(&str, &str)] = &[
    ("welcome", "Bienvenido a OnePoint GenAI Eco"),
    (
        "startConversation",
        "Inicia una conversación escribiendo un mensaje a continuación. Estoy aquí para ayudarte con cualquier pregunta que puedas tener.",
    ),
    ("newChat", "Nueva Conversación"),
    ("searchConversations", "Buscar conversaciones..."),
    ("online", "En línea"),
    ("typeMessage", "Escribe un mensaje..."),
    ("settings", "Configuración"),
    ("darkMode", "Modo oscuro"),
    ("language", "Idioma"),
    ("cancel", "Cancelar"),
    ("saveChanges", "Guardar cambios"),
    ("noConversations", "No se encontraron conversaciones"),
    ("freePlan", "Plan gratuito"),
    ("howDoesThisWork", "¿Cómo funciona esto?"),
    ("whatCanYouHelp", "¿En qué puedes ayudarme?"),
    ("tellJoke", "Cuéntame un chiste"),
    ("weatherToday", "¿Qué tiempo hace hoy?"),
];

const DE: &[(&str, &str)] = &[
    ("welcome", "Willkommen bei OnePoint GenAI Eco"),
    (
        "startConversation",
        "Beginnen Sie ein Gespräch, indem Sie unten eine Nachricht eingeben. Ich bin hier, um Ihnen bei Fragen zu helfen.",
    ),
    ("newChat", "Neuer Chat"),
    ("searchConversations", "Unterhaltungen suchen..."),
    ("online", "Online"),
    ("typeMessage", "Nachricht eingeben..."),
    ("settings", "Einstellungen"),
    ("darkMode", "Dunkelmodus"),
    ("language", "Sprache"),
    ("cancel", "Abbrechen"),
    ("saveChanges", "Änderungen speichern"),
    ("noConversations", "Keine Gespräche gefunden"),
    ("freePlan", "Kostenloser Plan"),
    ("howDoesThisWork", "Wie funktioniert das?"),
    ("whatCanYouHelp", "Womit kannst du mir helfen?"),
    ("tellJoke", "Erzähl mir einen Witz"),
    ("weatherToday", "Wie ist das Wetter heute?"),
];
