use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_blank, Language};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub id: String,
    pub name: String,
    /// Proficiency, 0 to 100.
    pub level: u8,
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Skill {
    pub fn level_display(&self) -> String {
        format!("{}%", self.level.min(100))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub id: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub demo_url: String,
    #[serde(default)]
    pub github_url: String,
    pub title_en: String,
    #[serde(default)]
    pub title_uz: String,
    #[serde(default)]
    pub title_ru: String,
    #[serde(default)]
    pub description_en: String,
    #[serde(default)]
    pub description_uz: String,
    #[serde(default)]
    pub description_ru: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn title(&self, lang: Language) -> &str {
        lang.pick(&self.title_en, &self.title_uz, &self.title_ru)
    }

    pub fn description(&self, lang: Language) -> &str {
        lang.pick(&self.description_en, &self.description_uz, &self.description_ru)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub id: String,
    /// Stable identifier used to look up translated copy.
    pub key: String,
    pub icon: String,
    #[serde(default)]
    pub color: String,
    pub title_en: String,
    #[serde(default)]
    pub title_uz: String,
    #[serde(default)]
    pub title_ru: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Service {
    pub fn title(&self, lang: Language) -> &str {
        lang.pick(&self.title_en, &self.title_uz, &self.title_ru)
    }
}
