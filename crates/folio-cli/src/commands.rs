//! Command handlers.

use std::path::Path;

use anyhow::{bail, Context, Result};
use folio_core::admin::submit_contact_message;
use folio_core::models::{ContactMessage, Language, Project, Service, Skill};
use folio_core::{AdminService, Portfolio, ResourceKey};
use serde::de::DeserializeOwned;

use crate::app::App;
use crate::cli::{AdminCommands, CacheCommands, RowInput};
use crate::output;

/// Global output options.
#[derive(Clone, Copy)]
pub struct Output {
    pub lang: Language,
    pub json: bool,
}

fn selected(resource: Option<ResourceKey>) -> Vec<ResourceKey> {
    match resource {
        Some(key) => vec![key],
        None => ResourceKey::ALL.to_vec(),
    }
}

fn print_section(app: &App, portfolio: &Portfolio, key: ResourceKey, out: Output, note: Option<&str>) {
    if out.json {
        let value = output::section_json(portfolio, key);
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        return;
    }

    let age = app
        .store
        .entry_age(key.as_str())
        .map(|age| format!("cached {}", age))
        .unwrap_or_else(|| "not cached".to_string());
    match note {
        Some(note) => println!("{} ({}, {})", output::title(key), note, age),
        None => println!("{} ({})", output::title(key), age),
    }
    print!("{}", output::section_text(portfolio, key, out.lang));
    println!();
}

fn report_failures(portfolio: &Portfolio, keys: &[ResourceKey]) -> bool {
    let failed: Vec<_> = portfolio
        .failed()
        .into_iter()
        .filter(|(key, _)| keys.contains(key))
        .collect();
    for (key, reason) in &failed {
        eprintln!("Failed to load {}: {}", key, reason);
    }
    !failed.is_empty()
}

/// Print content straight away, then print again any section whose
/// background refresh brought different data.
pub async fn show(app: &App, resource: Option<ResourceKey>, out: Output) -> Result<()> {
    let keys = selected(resource);
    let mut portfolio = app.portfolio()?;
    match resource {
        Some(key) => portfolio.load(key).await,
        None => portfolio.load_all().await,
    }

    for &key in &keys {
        print_section(app, &portfolio, key, out, None);
    }
    let failed = report_failures(&portfolio, &keys);

    let before: Vec<_> = keys
        .iter()
        .map(|&key| output::section_json(&portfolio, key))
        .collect();
    portfolio.settle_all().await;
    for (&key, old) in keys.iter().zip(before) {
        if output::section_json(&portfolio, key) != old {
            print_section(app, &portfolio, key, out, Some("updated"));
        }
    }

    if failed {
        bail!("Some content could not be loaded");
    }
    Ok(())
}

pub async fn refresh(app: &App, resource: Option<ResourceKey>, out: Output) -> Result<()> {
    let keys = selected(resource);
    let mut portfolio = app.portfolio()?;
    match resource {
        Some(key) => portfolio.refetch(key).await,
        None => portfolio.refetch_all().await,
    }

    if report_failures(&portfolio, &keys) {
        bail!("Refresh failed");
    }
    if out.json {
        for &key in &keys {
            print_section(app, &portfolio, key, out, None);
        }
    } else {
        let names: Vec<_> = keys.iter().map(|k| k.as_str()).collect();
        println!("Refreshed {}", names.join(", "));
    }
    Ok(())
}

pub fn status(app: &App) {
    println!("Backend:  {}", app.config.backend_url.as_deref().unwrap_or("-"));
    println!("Cache:    {}", app.cache_dir.display());
    println!("Language: {}", app.config.language);
    match app.session.data.as_ref() {
        Some(data) if !data.is_expired() => println!(
            "Session:  {} ({} min left)",
            data.email,
            data.minutes_until_expiry()
        ),
        _ => println!("Session:  signed out"),
    }
    println!();
    for key in ResourceKey::ALL {
        let age = app
            .store
            .entry_age(key.as_str())
            .unwrap_or_else(|| "not cached".to_string());
        println!("  {:<14} {}", key.as_str(), age);
    }
}

pub fn cache(app: &App, command: CacheCommands) {
    match command {
        CacheCommands::Clear { resource } => {
            app.store.clear(resource.map(|k| k.as_str()));
            match resource {
                Some(key) => println!("Cleared cached {}", key),
                None => println!("Cleared all cached content"),
            }
        }
    }
}

pub async fn contact(app: &App, name: &str, email: &str, message: &str) -> Result<()> {
    let message = ContactMessage::new(name, email, message);
    submit_contact_message(app.api()?, &message).await?;
    println!("Message sent. Thank you!");
    Ok(())
}

// ============================================================================
// Admin
// ============================================================================

fn read_row<T: DeserializeOwned>(input: &RowInput) -> Result<T> {
    let contents = match (&input.data, &input.file) {
        (Some(data), _) => data.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => bail!("Provide the row with --data or --file"),
    };
    serde_json::from_str(&contents).context("Row is not valid JSON for this resource")
}

fn read_upload(path: &Path) -> Result<(String, Vec<u8>)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))?
        .to_string();
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((name, bytes))
}

async fn create(admin: &AdminService, resource: ResourceKey, input: &RowInput) -> Result<()> {
    match resource {
        ResourceKey::Skills => admin.create_skill(read_row::<Skill>(input)?).await?,
        ResourceKey::Projects => admin.create_project(read_row::<Project>(input)?).await?,
        ResourceKey::Services => admin.create_service(read_row::<Service>(input)?).await?,
        key => bail!("{} holds a single row; use `folio admin save {}`", key, key),
    }
    Ok(())
}

async fn update(admin: &AdminService, resource: ResourceKey, id: &str, input: &RowInput) -> Result<()> {
    match resource {
        ResourceKey::Skills => admin.update_skill(id, read_row::<Skill>(input)?).await?,
        ResourceKey::Projects => admin.update_project(id, read_row::<Project>(input)?).await?,
        ResourceKey::Services => admin.update_service(id, read_row::<Service>(input)?).await?,
        key => bail!("{} holds a single row; use `folio admin save {}`", key, key),
    }
    Ok(())
}

async fn save(app: &App, admin: &AdminService, resource: ResourceKey, input: &RowInput) -> Result<()> {
    let mut portfolio = app.portfolio()?;
    match resource {
        ResourceKey::ContactInfo => {
            admin.replace_contact_info(&mut portfolio, read_row(input)?).await?;
        }
        ResourceKey::CvInfo => {
            admin.replace_cv_info(&mut portfolio, read_row(input)?).await?;
        }
        ResourceKey::AboutSection => {
            admin.replace_about(&mut portfolio, read_row(input)?).await?;
        }
        key => bail!("{} is a list; use create or update", key),
    }
    Ok(())
}

pub async fn admin(app: &mut App, command: AdminCommands) -> Result<()> {
    let admin = app.admin().await?;

    match command {
        AdminCommands::Create { resource, input } => {
            create(&admin, resource, &input).await?;
            println!("Created {} row", resource);
        }
        AdminCommands::Update { resource, id, input } => {
            update(&admin, resource, &id, &input).await?;
            println!("Updated {} row {}", resource, id);
        }
        AdminCommands::Delete { resource, id } => {
            admin.delete(resource, &id).await?;
            println!("Deleted {} row {}", resource, id);
        }
        AdminCommands::Save { resource, input } => {
            save(app, &admin, resource, &input).await?;
            println!("Saved {}", resource);
        }
        AdminCommands::UploadImage { file, folder } => {
            let (name, bytes) = read_upload(&file)?;
            let url = admin.upload_image(&folder, &name, bytes).await?;
            println!("{}", url);
        }
        AdminCommands::UploadCv { file } => {
            let (name, bytes) = read_upload(&file)?;
            let mut portfolio = app.portfolio()?;
            let cv = admin.publish_cv(&mut portfolio, &name, bytes).await?;
            println!("CV uploaded: {}", cv.cv_file_url);
        }
    }
    Ok(())
}
