//! Keyword classification for inbound messages.
//!
//! Three fixed vocabularies drive the flow: greetings open a session,
//! reset words abort one, and affirmative words answer the scheduling
//! question (anything else counts as a no). All patterns are compiled
//! once at startup.

use regex::Regex;

/// The compiled keyword vocabularies.
pub struct KeywordSet {
    greeting: Regex,
    reset: Regex,
    affirmative: Regex,
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordSet {
    pub fn new() -> Self {
        // Greetings may appear anywhere in the message; reset and yes/no
        // answers must be the whole (trimmed) message so that e.g. a reason
        // text containing "sair" does not abort the session.
        let greeting = Regex::new(
            r"(?i)\b(oi|ol[áa]|bom dia|boa tarde|boa noite|tarde|dia|noite|opa|tudo bem|bot|ajuda)\b",
        )
        .expect("Invalid greeting regex");

        let reset = Regex::new(r"(?i)^\s*(cancelar|sair|reset|in[íi]cio|recome[çc]ar)\s*[!.]?\s*$")
            .expect("Invalid reset regex");

        let affirmative = Regex::new(
            r"(?i)^\s*(sim|s|claro|pode( sim)?|quero( sim)?|ok|okay|com certeza|por favor|isso|positivo)\s*[!.]?\s*$",
        )
        .expect("Invalid affirmative regex");

        Self {
            greeting,
            reset,
            affirmative,
        }
    }

    /// Whether the message contains a greeting word.
    pub fn is_greeting(&self, text: &str) -> bool {
        self.greeting.is_match(text)
    }

    /// Whether the whole message is a reset keyword.
    pub fn is_reset(&self, text: &str) -> bool {
        self.reset.is_match(text)
    }

    /// Whether the whole message is an affirmative answer. The scheduling
    /// question treats everything else as a no.
    pub fn is_affirmative(&self, text: &str) -> bool {
        self.affirmative.is_match(text)
    }
}
