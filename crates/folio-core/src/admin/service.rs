use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::uploads::{validate_cv_file, validate_image_file};
use crate::api::{ApiClient, CONTENT_BUCKET};
use crate::cache::{CacheStore, FetchError};
use crate::models::{AboutSection, ContactInfo, ContactMessage, CvInfo, Project, Service, Skill};
use crate::resources::{load_row, Portfolio, ResourceKey};
use crate::utils::{color_for_icon, content_type_for, unique_file_name};

/// Table visitor messages are written to. Never cached.
const CONTACT_MESSAGES_TABLE: &str = "contact_messages";

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("{0} holds a single row; use save instead")]
    SingleRow(ResourceKey),

    #[error("Failed to load {0}: {1}")]
    Load(ResourceKey, FetchError),

    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

/// A write against one table.
pub enum Write {
    Insert(serde_json::Value),
    Update { id: String, row: serde_json::Value },
    Delete { id: String },
}

impl Write {
    fn name(&self) -> &'static str {
        match self {
            Write::Insert(_) => "insert",
            Write::Update { .. } => "update",
            Write::Delete { .. } => "delete",
        }
    }

    /// Insert when the row has no id yet, update otherwise.
    fn upsert<T: Serialize>(id: &str, row: &T) -> Result<Self, AdminError> {
        let row = to_row(row)?;
        if id.is_empty() {
            Ok(Write::Insert(row))
        } else {
            Ok(Write::Update {
                id: id.to_string(),
                row,
            })
        }
    }
}

fn to_row<T: Serialize>(row: &T) -> Result<serde_json::Value, AdminError> {
    serde_json::to_value(row).map_err(|e| AdminError::Invalid(e.to_string()))
}

fn require_id(id: &str) -> Result<(), AdminError> {
    if id.trim().is_empty() {
        return Err(AdminError::Invalid("id is required".to_string()));
    }
    Ok(())
}

/// Fill derived fields and check what the skill form requires.
pub(crate) fn prepare_skill(mut skill: Skill) -> Result<Skill, AdminError> {
    skill.name = skill.name.trim().to_string();
    skill.icon = skill.icon.trim().to_string();
    if skill.name.is_empty() || skill.icon.is_empty() {
        return Err(AdminError::Invalid("skill name and icon are required".to_string()));
    }
    if skill.level > 100 {
        return Err(AdminError::Invalid(format!(
            "skill level must be between 0 and 100, got {}",
            skill.level
        )));
    }
    skill.color = color_for_icon(&skill.icon).to_string();
    Ok(skill)
}

/// Icon used for services saved without one.
const DEFAULT_SERVICE_ICON: &str = "Code";

pub(crate) fn prepare_service(mut service: Service) -> Result<Service, AdminError> {
    if service.key.trim().is_empty() || service.title_en.trim().is_empty() {
        return Err(AdminError::Invalid("service key and English title are required".to_string()));
    }
    service.icon = service.icon.trim().to_string();
    if service.icon.is_empty() {
        service.icon = DEFAULT_SERVICE_ICON.to_string();
    }
    service.color = color_for_icon(&service.icon).to_string();
    Ok(service)
}

/// A single-row save without an id targets the row that already exists.
fn keep_current_id(current: Option<&str>, id: &mut String) {
    if id.is_empty() {
        if let Some(current) = current {
            *id = current.to_string();
        }
    }
}

pub(crate) fn prepare_project(project: Project) -> Result<Project, AdminError> {
    if project.title_en.trim().is_empty() {
        return Err(AdminError::Invalid("project English title is required".to_string()));
    }
    Ok(project)
}

/// Content writes on behalf of the signed-in owner.
pub struct AdminService {
    api: ApiClient,
    store: Arc<CacheStore>,
}

impl AdminService {
    /// `api` must carry the owner's access token.
    pub fn new(api: ApiClient, store: Arc<CacheStore>) -> Result<Self, AdminError> {
        if !api.is_authenticated() {
            return Err(AdminError::NotSignedIn);
        }
        Ok(Self { api, store })
    }

    /// Apply `write` to the table behind `key`, then invalidate that
    /// resource's cache entry. Nothing is invalidated if the write fails.
    pub async fn commit(&self, key: ResourceKey, write: Write) -> Result<(), AdminError> {
        let table = key.as_str();
        let op = write.name();
        let result = match &write {
            Write::Insert(row) => self.api.insert(table, row).await,
            Write::Update { id, row } => self.api.update(table, id, row).await,
            Write::Delete { id } => self.api.delete(table, id).await,
        };

        match result {
            Ok(()) => {
                self.store.clear(Some(table));
                info!(resource = table, op = op, "Write committed, cache cleared");
                Ok(())
            }
            Err(e) => {
                warn!(resource = table, op = op, error = %e, "Write failed, cache left as is");
                Err(AdminError::Remote(e))
            }
        }
    }

    // ===== List resources =====

    pub async fn create_skill(&self, skill: Skill) -> Result<(), AdminError> {
        let skill = prepare_skill(skill)?;
        self.commit(ResourceKey::Skills, Write::Insert(to_row(&skill)?)).await
    }

    pub async fn update_skill(&self, id: &str, skill: Skill) -> Result<(), AdminError> {
        require_id(id)?;
        let skill = prepare_skill(skill)?;
        let row = to_row(&skill)?;
        self.commit(ResourceKey::Skills, Write::Update { id: id.to_string(), row }).await
    }

    pub async fn create_project(&self, project: Project) -> Result<(), AdminError> {
        let project = prepare_project(project)?;
        self.commit(ResourceKey::Projects, Write::Insert(to_row(&project)?)).await
    }

    pub async fn update_project(&self, id: &str, project: Project) -> Result<(), AdminError> {
        require_id(id)?;
        let project = prepare_project(project)?;
        let row = to_row(&project)?;
        self.commit(ResourceKey::Projects, Write::Update { id: id.to_string(), row }).await
    }

    pub async fn create_service(&self, service: Service) -> Result<(), AdminError> {
        let service = prepare_service(service)?;
        self.commit(ResourceKey::Services, Write::Insert(to_row(&service)?)).await
    }

    pub async fn update_service(&self, id: &str, service: Service) -> Result<(), AdminError> {
        require_id(id)?;
        let service = prepare_service(service)?;
        let row = to_row(&service)?;
        self.commit(ResourceKey::Services, Write::Update { id: id.to_string(), row }).await
    }

    /// Delete a row from a list resource.
    pub async fn delete(&self, key: ResourceKey, id: &str) -> Result<(), AdminError> {
        if key.is_singleton() {
            return Err(AdminError::SingleRow(key));
        }
        require_id(id)?;
        self.commit(key, Write::Delete { id: id.to_string() }).await
    }

    // ===== Single-row resources =====

    pub async fn save_contact_info(&self, info: &ContactInfo) -> Result<(), AdminError> {
        self.commit(ResourceKey::ContactInfo, Write::upsert(&info.id, info)?).await
    }

    pub async fn save_cv_info(&self, cv: &CvInfo) -> Result<(), AdminError> {
        self.commit(ResourceKey::CvInfo, Write::upsert(&cv.id, cv)?).await
    }

    pub async fn save_about(&self, about: &AboutSection) -> Result<(), AdminError> {
        self.commit(ResourceKey::AboutSection, Write::upsert(&about.id, about)?).await
    }

    /// Save contact info over the existing row, inserting one if the
    /// table is empty.
    pub async fn replace_contact_info(
        &self,
        portfolio: &mut Portfolio,
        mut info: ContactInfo,
    ) -> Result<ContactInfo, AdminError> {
        let current = load_row(&mut portfolio.contact_info)
            .await
            .map_err(|e| AdminError::Load(ResourceKey::ContactInfo, e))?;
        keep_current_id(current.as_ref().map(|c| c.id.as_str()), &mut info.id);
        self.save_contact_info(&info).await?;
        Ok(info)
    }

    pub async fn replace_cv_info(
        &self,
        portfolio: &mut Portfolio,
        mut cv: CvInfo,
    ) -> Result<CvInfo, AdminError> {
        let current = load_row(&mut portfolio.cv_info)
            .await
            .map_err(|e| AdminError::Load(ResourceKey::CvInfo, e))?;
        keep_current_id(current.as_ref().map(|c| c.id.as_str()), &mut cv.id);
        self.save_cv_info(&cv).await?;
        Ok(cv)
    }

    pub async fn replace_about(
        &self,
        portfolio: &mut Portfolio,
        mut about: AboutSection,
    ) -> Result<AboutSection, AdminError> {
        let current = load_row(&mut portfolio.about)
            .await
            .map_err(|e| AdminError::Load(ResourceKey::AboutSection, e))?;
        keep_current_id(current.as_ref().map(|a| a.id.as_str()), &mut about.id);
        self.save_about(&about).await?;
        Ok(about)
    }

    // ===== Uploads =====

    /// Upload an image under `folder/` and return its public URL.
    pub async fn upload_image(
        &self,
        folder: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AdminError> {
        validate_image_file(file_name, &bytes)?;
        let name = unique_file_name("", file_name, Utc::now().timestamp_millis());
        let path = format!("{}/{}", folder.trim_matches('/'), name);
        let url = self
            .api
            .upload(CONTENT_BUCKET, &path, bytes, content_type_for(file_name), false)
            .await?;
        info!(path = %path, "Image uploaded");
        Ok(url)
    }

    /// Upload a CV using the current CV row and list sizes from `portfolio`.
    /// With no CV row yet, a new one is inserted.
    pub async fn publish_cv(
        &self,
        portfolio: &mut Portfolio,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<CvInfo, AdminError> {
        validate_cv_file(file_name, &bytes)?;

        let (current, _, _) = futures::join!(
            load_row(&mut portfolio.cv_info),
            portfolio.projects.fetch(),
            portfolio.skills.fetch(),
        );
        let current = current.map_err(|e| AdminError::Load(ResourceKey::CvInfo, e))?;
        if let Some(e) = portfolio.projects.error() {
            return Err(AdminError::Load(ResourceKey::Projects, e.clone()));
        }
        if let Some(e) = portfolio.skills.error() {
            return Err(AdminError::Load(ResourceKey::Skills, e.clone()));
        }

        let projects_count = portfolio.projects.data().len();
        let skills_count = portfolio.skills.data().len();
        self.upload_cv(file_name, bytes, current, projects_count, skills_count)
            .await
    }

    /// Upload a CV PDF and point the CV row at it, refreshing the
    /// project and skill counts shown next to it.
    pub async fn upload_cv(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        current: Option<CvInfo>,
        projects_count: usize,
        skills_count: usize,
    ) -> Result<CvInfo, AdminError> {
        validate_cv_file(file_name, &bytes)?;
        let name = unique_file_name("cv-", file_name, Utc::now().timestamp_millis());
        let path = format!("cv/{}", name);
        let url = self
            .api
            .upload(CONTENT_BUCKET, &path, bytes, content_type_for(file_name), true)
            .await?;

        let mut cv = current.unwrap_or_default();
        cv.cv_file_url = url;
        cv.projects_count = projects_count.to_string();
        cv.skills_count = skills_count.to_string();
        self.save_cv_info(&cv).await?;
        info!(path = %path, "CV uploaded");
        Ok(cv)
    }
}

/// Send a visitor's message through the public contact form.
pub async fn submit_contact_message(api: &ApiClient, message: &ContactMessage) -> Result<(), AdminError> {
    message.validate().map_err(AdminError::Invalid)?;
    api.insert(CONTACT_MESSAGES_TABLE, message).await?;
    info!("Contact message sent");
    Ok(())
}
