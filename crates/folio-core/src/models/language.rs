use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Content languages the site is published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Uz,
    Ru,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Uz, Language::Ru];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Uz => "uz",
            Language::Ru => "ru",
        }
    }

    /// Pick the text for this language, falling back to English when the
    /// translation is missing.
    pub fn pick<'a>(&self, en: &'a str, uz: &'a str, ru: &'a str) -> &'a str {
        let text = match self {
            Language::En => en,
            Language::Uz => uz,
            Language::Ru => ru,
        };
        if text.trim().is_empty() {
            en
        } else {
            text
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "uz" | "uzbek" => Ok(Language::Uz),
            "ru" | "russian" => Ok(Language::Ru),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}
