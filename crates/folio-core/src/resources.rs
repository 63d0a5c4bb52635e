//! Resource hooks: one cached resource per backend table.
//!
//! Each hook is a `CachedResource` wired to a fetcher that reads the whole
//! table through the `ApiClient`. List tables come back newest first;
//! single-row tables fail with not-found when empty, so an empty table is
//! never cached.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::api::ApiClient;
use crate::cache::{CacheStore, CachedResource, Fetch, FetchError};
use crate::models::{AboutSection, ContactInfo, CvInfo, Project, Service, Skill};

/// A named backend table. The name doubles as the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Skills,
    Projects,
    Services,
    ContactInfo,
    CvInfo,
    AboutSection,
}

impl ResourceKey {
    pub const ALL: [ResourceKey; 6] = [
        ResourceKey::Skills,
        ResourceKey::Projects,
        ResourceKey::Services,
        ResourceKey::ContactInfo,
        ResourceKey::CvInfo,
        ResourceKey::AboutSection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKey::Skills => "skills",
            ResourceKey::Projects => "projects",
            ResourceKey::Services => "services",
            ResourceKey::ContactInfo => "contact_info",
            ResourceKey::CvInfo => "cv_info",
            ResourceKey::AboutSection => "about_section",
        }
    }

    /// Single-row tables are edited with save instead of create/update/delete.
    pub fn is_singleton(&self) -> bool {
        matches!(
            self,
            ResourceKey::ContactInfo | ResourceKey::CvInfo | ResourceKey::AboutSection
        )
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "skills" => Ok(ResourceKey::Skills),
            "projects" => Ok(ResourceKey::Projects),
            "services" => Ok(ResourceKey::Services),
            "contact_info" | "contact" => Ok(ResourceKey::ContactInfo),
            "cv_info" | "cv" => Ok(ResourceKey::CvInfo),
            "about_section" | "about" => Ok(ResourceKey::AboutSection),
            other => Err(format!("unknown resource: {}", other)),
        }
    }
}

/// Reads every row of a list table.
pub struct TableFetcher<T> {
    api: ApiClient,
    key: ResourceKey,
    _rows: PhantomData<fn() -> T>,
}

impl<T> TableFetcher<T> {
    pub fn new(api: ApiClient, key: ResourceKey) -> Self {
        Self {
            api,
            key,
            _rows: PhantomData,
        }
    }
}

#[async_trait]
impl<T> Fetch for TableFetcher<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Output = Vec<T>;

    async fn fetch(&self) -> anyhow::Result<Vec<T>> {
        self.api.select_all(self.key.as_str()).await
    }
}

/// Reads the one row of a single-row table.
pub struct SingleRowFetcher<T> {
    api: ApiClient,
    key: ResourceKey,
    _row: PhantomData<fn() -> T>,
}

impl<T> SingleRowFetcher<T> {
    pub fn new(api: ApiClient, key: ResourceKey) -> Self {
        Self {
            api,
            key,
            _row: PhantomData,
        }
    }
}

#[async_trait]
impl<T> Fetch for SingleRowFetcher<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Output = Option<T>;

    async fn fetch(&self) -> anyhow::Result<Option<T>> {
        let row = self.api.select_single(self.key.as_str()).await?;
        Ok(Some(row))
    }
}

fn list_resource<T>(store: &Arc<CacheStore>, api: &ApiClient, key: ResourceKey) -> CachedResource<Vec<T>>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    let fetcher: Arc<dyn Fetch<Output = Vec<T>>> = Arc::new(TableFetcher::new(api.clone(), key));
    CachedResource::new(key.as_str(), Arc::clone(store), fetcher)
}

fn single_resource<T>(
    store: &Arc<CacheStore>,
    api: &ApiClient,
    key: ResourceKey,
) -> CachedResource<Option<T>>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    let fetcher: Arc<dyn Fetch<Output = Option<T>>> =
        Arc::new(SingleRowFetcher::new(api.clone(), key));
    CachedResource::new(key.as_str(), Arc::clone(store), fetcher)
}

/// Load a single-row resource through the cache. An empty table reads as
/// `None`; any other failure is returned.
pub async fn load_row<T>(resource: &mut CachedResource<Option<T>>) -> Result<Option<T>, FetchError>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    resource.fetch().await;
    match resource.error() {
        Some(e) if e.is_not_found() => Ok(None),
        Some(e) => Err(e.clone()),
        None => Ok(resource.data().clone()),
    }
}

/// All content shown on the public site, one hook per table.
pub struct Portfolio {
    pub skills: CachedResource<Vec<Skill>>,
    pub projects: CachedResource<Vec<Project>>,
    pub services: CachedResource<Vec<Service>>,
    pub contact_info: CachedResource<Option<ContactInfo>>,
    pub cv_info: CachedResource<Option<CvInfo>>,
    pub about: CachedResource<Option<AboutSection>>,
}

impl Portfolio {
    pub fn new(store: Arc<CacheStore>, api: &ApiClient) -> Self {
        Self {
            skills: list_resource(&store, api, ResourceKey::Skills),
            projects: list_resource(&store, api, ResourceKey::Projects),
            services: list_resource(&store, api, ResourceKey::Services),
            contact_info: single_resource(&store, api, ResourceKey::ContactInfo),
            cv_info: single_resource(&store, api, ResourceKey::CvInfo),
            about: single_resource(&store, api, ResourceKey::AboutSection),
        }
    }

    /// Load every resource concurrently. No ordering between resources.
    pub async fn load_all(&mut self) {
        futures::join!(
            self.skills.fetch(),
            self.projects.fetch(),
            self.services.fetch(),
            self.contact_info.fetch(),
            self.cv_info.fetch(),
            self.about.fetch(),
        );
        info!(failed = self.failed().len(), "Portfolio loaded");
    }

    /// Load one resource through the cache.
    pub async fn load(&mut self, key: ResourceKey) {
        match key {
            ResourceKey::Skills => self.skills.fetch().await,
            ResourceKey::Projects => self.projects.fetch().await,
            ResourceKey::Services => self.services.fetch().await,
            ResourceKey::ContactInfo => self.contact_info.fetch().await,
            ResourceKey::CvInfo => self.cv_info.fetch().await,
            ResourceKey::AboutSection => self.about.fetch().await,
        }
    }

    /// Bypass the cache for one resource.
    pub async fn refetch(&mut self, key: ResourceKey) {
        match key {
            ResourceKey::Skills => self.skills.refetch().await,
            ResourceKey::Projects => self.projects.refetch().await,
            ResourceKey::Services => self.services.refetch().await,
            ResourceKey::ContactInfo => self.contact_info.refetch().await,
            ResourceKey::CvInfo => self.cv_info.refetch().await,
            ResourceKey::AboutSection => self.about.refetch().await,
        }
    }

    /// Bypass the cache for every resource concurrently.
    pub async fn refetch_all(&mut self) {
        futures::join!(
            self.skills.refetch(),
            self.projects.refetch(),
            self.services.refetch(),
            self.contact_info.refetch(),
            self.cv_info.refetch(),
            self.about.refetch(),
        );
        info!(failed = self.failed().len(), "Portfolio refetched");
    }

    /// Wait for in-flight background refreshes and apply their results.
    pub async fn settle_all(&mut self) {
        futures::join!(
            self.skills.settle(),
            self.projects.settle(),
            self.services.settle(),
            self.contact_info.settle(),
            self.cv_info.settle(),
            self.about.settle(),
        );
    }

    /// Resources whose last foreground fetch failed, with the reason.
    pub fn failed(&self) -> Vec<(ResourceKey, String)> {
        let errors = [
            (ResourceKey::Skills, self.skills.error()),
            (ResourceKey::Projects, self.projects.error()),
            (ResourceKey::Services, self.services.error()),
            (ResourceKey::ContactInfo, self.contact_info.error()),
            (ResourceKey::CvInfo, self.cv_info.error()),
            (ResourceKey::AboutSection, self.about.error()),
        ];
        errors
            .into_iter()
            .filter_map(|(key, err)| err.map(|e| (key, e.message().to_string())))
            .collect()
    }
}
