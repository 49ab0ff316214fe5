//! Localized default subjects

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";
const FALLBACK_SUBJECT: &str = "Contact request";

/// Subject phrases keyed by short language code
#[derive(Debug, Clone)]
pub struct LocaleTable {
    default_lang: String,
    subjects: HashMap<String, String>,
}

impl LocaleTable {
    pub fn new(default_lang: impl Into<String>, subjects: HashMap<String, String>) -> Self {
        Self {
            default_lang: default_lang.into(),
            subjects,
        }
    }

    /// English and German subjects, English as default
    pub fn builtin() -> Self {
        Self::new(DEFAULT_LANG, builtin_subjects())
    }

    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    /// Subject for `lang`; unknown codes fall back to the default language
    pub fn subject(&self, lang: &str) -> &str {
        self.subjects
            .get(lang)
            .or_else(|| self.subjects.get(&self.default_lang))
            .map(String::as_str)
            .unwrap_or(FALLBACK_SUBJECT)
    }

    pub fn contains(&self, lang: &str) -> bool {
        self.subjects.contains_key(lang)
    }
}

impl Default for LocaleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn builtin_subjects() -> HashMap<String, String> {
    HashMap::from([
        ("en".to_string(), "Contact request".to_string()),
        ("de".to_string(), "Kontaktanfrage".to_string()),
    ])
}
