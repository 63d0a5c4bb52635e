//! Application wiring: config, cache store, API client and owner session.

use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use folio_core::auth::{CredentialStore, Session};
use folio_core::cache::{FileStorage, KeyValueStorage, MemoryStorage};
use folio_core::models::Language;
use folio_core::config::ENV_PASSWORD;
use folio_core::{AdminService, ApiClient, CacheStore, Config, Portfolio};
use tracing::{debug, info, warn};

/// Subdirectory of the cache dir holding cached content.
const CONTENT_DIR: &str = "content";

pub struct App {
    pub config: Config,
    pub cache_dir: PathBuf,
    pub store: Arc<CacheStore>,
    /// `None` until a backend URL and anon key are configured.
    api: Option<ApiClient>,
    pub session: Session,
}

impl App {
    pub fn new(no_persist: bool) -> Result<Self> {
        let mut config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        config.apply_env();

        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let storage = Self::open_storage(&cache_dir, no_persist);
        let store = Arc::new(CacheStore::new(storage));

        let mut session = Session::new(cache_dir.clone());
        if let Err(e) = session.load() {
            warn!(error = %e, "Failed to load session");
        }

        let api = build_client(&config, &session)?;

        Ok(Self {
            config,
            cache_dir,
            store,
            api,
            session,
        })
    }

    /// File-backed storage, or memory when persistence is off or the
    /// cache directory cannot be created.
    fn open_storage(cache_dir: &Path, no_persist: bool) -> Arc<dyn KeyValueStorage> {
        if no_persist {
            return Arc::new(MemoryStorage::new());
        }
        match FileStorage::new(cache_dir.join(CONTENT_DIR)) {
            Ok(storage) => Arc::new(storage),
            Err(e) => {
                warn!(error = %e, "Cache directory unavailable, caching in memory only");
                Arc::new(MemoryStorage::new())
            }
        }
    }

    /// The backend client. Only commands that talk to the backend need it,
    /// so a missing backend config is reported here rather than at startup.
    pub fn api(&self) -> Result<&ApiClient> {
        match self.api.as_ref() {
            Some(api) => Ok(api),
            None => {
                self.config.backend()?;
                bail!("Backend client is not configured")
            }
        }
    }

    fn api_mut(&mut self) -> Result<&mut ApiClient> {
        self.api()?;
        self.api
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("Backend client is not configured"))
    }

    pub fn portfolio(&self) -> Result<Portfolio> {
        Ok(Portfolio::new(Arc::clone(&self.store), self.api()?))
    }

    pub fn language(&self, requested: Option<Language>) -> Language {
        requested.unwrap_or(self.config.language)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&mut self, email: Option<String>, remember: bool) -> Result<()> {
        let email = match email.or_else(|| self.config.last_email.clone()) {
            Some(email) => email,
            None => prompt_line("Email: ")?,
        };
        if email.is_empty() {
            bail!("Email is required");
        }

        let from_env = std::env::var(ENV_PASSWORD).ok().filter(|p| !p.is_empty());
        let password = match from_env {
            Some(password) => password,
            None if CredentialStore::has_credentials(&email)
                && confirm("Use stored password? [Y/n]: ")? =>
            {
                CredentialStore::get_password(&email)?
            }
            None => rpassword::prompt_password("Password: ")?,
        };

        let data = self.api()?.sign_in(&email, &password).await?;

        if remember {
            if let Err(e) = CredentialStore::store(&email, &password) {
                warn!(error = %e, "Failed to store credentials");
            }
        }

        self.config.last_email = Some(email.clone());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        self.api_mut()?.set_token(data.access_token.clone());
        self.session.update(data);
        self.session.save()?;
        info!(email = %email, "Login successful");
        Ok(())
    }

    pub async fn logout(&mut self, forget: bool) -> Result<()> {
        match self.api.as_ref() {
            Some(api) => {
                if let Err(e) = api.sign_out().await {
                    warn!(error = %e, "Server sign-out failed, clearing local session anyway");
                }
            }
            None => debug!("No backend configured, clearing local session only"),
        }
        let email = self
            .session
            .email()
            .map(str::to_string)
            .or_else(|| self.config.last_email.clone());
        self.session.clear()?;

        if forget {
            if let Some(email) = email {
                if let Err(e) = CredentialStore::delete(&email) {
                    warn!(error = %e, "Failed to delete stored credentials");
                }
            }
        }
        info!("Logged out");
        Ok(())
    }

    /// Make sure an unexpired owner session is loaded, signing in again
    /// with a stored password when the old one is about to run out.
    async fn ensure_session(&mut self) -> Result<()> {
        let needs_login = match self.session.data.as_ref() {
            Some(data) => data.needs_refresh(),
            None => true,
        };
        if !needs_login {
            return Ok(());
        }

        let email = self
            .session
            .email()
            .map(str::to_string)
            .or_else(|| self.config.last_email.clone());
        match email {
            Some(email) if CredentialStore::has_credentials(&email) => {
                debug!(email = %email, "Session expiring, signing in with stored password");
                let password = CredentialStore::get_password(&email)?;
                let data = self
                    .api()?
                    .sign_in(&email, &password)
                    .await
                    .context("Stored credentials were rejected. Run `folio login`")?;
                self.api_mut()?.set_token(data.access_token.clone());
                self.session.update(data);
                self.session.save()?;
                Ok(())
            }
            _ if self.session.is_valid() => Ok(()),
            _ => bail!("Not signed in. Run `folio login` first"),
        }
    }

    pub async fn admin(&mut self) -> Result<AdminService> {
        self.ensure_session().await?;
        let api = self.api()?.clone();
        Ok(AdminService::new(api, Arc::clone(&self.store))?)
    }
}

/// Backend client for the configured project, carrying the saved session
/// token. `None` when no backend is configured.
fn build_client(config: &Config, session: &Session) -> Result<Option<ApiClient>> {
    let (url, key) = match config.backend() {
        Ok(backend) => backend,
        Err(e) => {
            debug!(error = %e, "Backend not configured");
            return Ok(None);
        }
    };
    let mut api = ApiClient::new(url, key)?;
    if let Some(token) = session.token() {
        api.set_token(token.to_string());
        debug!("Token set on API client");
    }
    Ok(Some(api))
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn confirm(prompt: &str) -> Result<bool> {
    Ok(prompt_line(prompt)?.to_lowercase() != "n")
}
