//! Single-row profile resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_blank, Language};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub id: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub github_url: String,
    #[serde(default)]
    pub telegram_url: String,
    #[serde(default)]
    pub linkedin_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ContactInfo {
    /// Social links with the site's placeholders for missing ones.
    pub fn social_links(&self) -> [(&'static str, &str); 3] {
        fn or_default<'a>(url: &'a str, default: &'static str) -> &'a str {
            if url.is_empty() {
                default
            } else {
                url
            }
        }
        [
            ("GitHub", or_default(&self.github_url, "https://github.com")),
            ("Telegram", or_default(&self.telegram_url, "https://telegram.org")),
            ("LinkedIn", or_default(&self.linkedin_url, "https://linkedin.com")),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvInfo {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub projects_count: String,
    #[serde(default)]
    pub skills_count: String,
    #[serde(default)]
    pub cv_file_url: String,
    #[serde(default)]
    pub key_skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CvInfo {
    pub fn has_file(&self) -> bool {
        !self.cv_file_url.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AboutSection {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub id: String,
    #[serde(default)]
    pub title_en: String,
    #[serde(default)]
    pub title_uz: String,
    #[serde(default)]
    pub title_ru: String,
    #[serde(default)]
    pub content_en: String,
    #[serde(default)]
    pub content_uz: String,
    #[serde(default)]
    pub content_ru: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects_completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AboutSection {
    pub fn title(&self, lang: Language) -> &str {
        lang.pick(&self.title_en, &self.title_uz, &self.title_ru)
    }

    pub fn content(&self, lang: Language) -> &str {
        lang.pick(&self.content_en, &self.content_uz, &self.content_ru)
    }
}
