//! Plain-text and JSON rendering of portfolio sections.

use folio_core::models::{AboutSection, ContactInfo, CvInfo, Language, Project, Service, Skill};
use folio_core::utils::{format_date, truncate_string};
use folio_core::{Portfolio, ResourceKey};
use serde::Serialize;

/// Descriptions longer than this are cut in list views.
const DESCRIPTION_WIDTH: usize = 72;

fn to_json<T: Serialize>(data: &T) -> serde_json::Value {
    serde_json::to_value(data).unwrap_or(serde_json::Value::Null)
}

/// Current data of one section as JSON.
pub fn section_json(portfolio: &Portfolio, key: ResourceKey) -> serde_json::Value {
    match key {
        ResourceKey::Skills => to_json(portfolio.skills.data()),
        ResourceKey::Projects => to_json(portfolio.projects.data()),
        ResourceKey::Services => to_json(portfolio.services.data()),
        ResourceKey::ContactInfo => to_json(portfolio.contact_info.data()),
        ResourceKey::CvInfo => to_json(portfolio.cv_info.data()),
        ResourceKey::AboutSection => to_json(portfolio.about.data()),
    }
}

/// Current data of one section as display text.
pub fn section_text(portfolio: &Portfolio, key: ResourceKey, lang: Language) -> String {
    match key {
        ResourceKey::Skills => render_skills(portfolio.skills.data()),
        ResourceKey::Projects => render_projects(portfolio.projects.data(), lang),
        ResourceKey::Services => render_services(portfolio.services.data(), lang),
        ResourceKey::ContactInfo => render_contact(portfolio.contact_info.data().as_ref()),
        ResourceKey::CvInfo => render_cv(portfolio.cv_info.data().as_ref()),
        ResourceKey::AboutSection => render_about(portfolio.about.data().as_ref(), lang),
    }
}

pub fn title(key: ResourceKey) -> &'static str {
    match key {
        ResourceKey::Skills => "Skills",
        ResourceKey::Projects => "Projects",
        ResourceKey::Services => "Services",
        ResourceKey::ContactInfo => "Contact",
        ResourceKey::CvInfo => "CV",
        ResourceKey::AboutSection => "About",
    }
}

pub fn render_skills(skills: &[Skill]) -> String {
    if skills.is_empty() {
        return "  (none)\n".to_string();
    }
    let width = skills.iter().map(|s| s.name.chars().count()).max().unwrap_or(0);
    skills
        .iter()
        .map(|s| format!("  {:<width$}  {:>4}  {}\n", s.name, s.level_display(), s.icon, width = width))
        .collect()
}

pub fn render_projects(projects: &[Project], lang: Language) -> String {
    if projects.is_empty() {
        return "  (none)\n".to_string();
    }
    let mut out = String::new();
    for project in projects {
        out.push_str(&format!(
            "  {} ({})\n",
            project.title(lang),
            format_date(project.created_at.as_ref())
        ));
        let description = project.description(lang);
        if !description.is_empty() {
            out.push_str(&format!("    {}\n", truncate_string(description, DESCRIPTION_WIDTH)));
        }
        for (label, url) in [("demo", &project.demo_url), ("code", &project.github_url)] {
            if !url.is_empty() {
                out.push_str(&format!("    {}: {}\n", label, url));
            }
        }
    }
    out
}

pub fn render_services(services: &[Service], lang: Language) -> String {
    if services.is_empty() {
        return "  (none)\n".to_string();
    }
    services
        .iter()
        .map(|s| format!("  {} [{}]\n", s.title(lang), s.key))
        .collect()
}

pub fn render_contact(info: Option<&ContactInfo>) -> String {
    let Some(info) = info else {
        return "  (not set)\n".to_string();
    };
    let mut out = String::new();
    if !info.email.is_empty() {
        out.push_str(&format!("  Email:    {}\n", info.email));
    }
    if !info.phone.is_empty() {
        out.push_str(&format!("  Phone:    {}\n", info.phone));
    }
    for (name, url) in info.social_links() {
        out.push_str(&format!("  {:<9} {}\n", format!("{}:", name), url));
    }
    out
}

pub fn render_cv(cv: Option<&CvInfo>) -> String {
    let Some(cv) = cv else {
        return "  (not set)\n".to_string();
    };
    let mut out = format!("  {} - {}\n", cv.name, cv.title);
    if !cv.experience.is_empty() {
        out.push_str(&format!("  Experience: {}\n", cv.experience));
    }
    out.push_str(&format!(
        "  Projects: {}  Skills: {}\n",
        cv.projects_count, cv.skills_count
    ));
    if !cv.key_skills.is_empty() {
        out.push_str(&format!("  Key skills: {}\n", cv.key_skills.join(", ")));
    }
    if cv.has_file() {
        out.push_str(&format!("  Download: {}\n", cv.cv_file_url));
    }
    out
}

pub fn render_about(about: Option<&AboutSection>, lang: Language) -> String {
    let Some(about) = about else {
        return "  (not set)\n".to_string();
    };
    let mut out = format!("  {}\n", about.title(lang));
    for line in about.content(lang).lines() {
        out.push_str(&format!("  {}\n", line));
    }
    if let Some(years) = about.experience_years.as_deref() {
        out.push_str(&format!("  Experience: {} years\n", years));
    }
    if let Some(done) = about.projects_completed.as_deref() {
        out.push_str(&format!("  Projects completed: {}\n", done));
    }
    out
}
