//! API client for the hosted table store, object storage and auth endpoints.
//!
//! Table access follows PostgREST conventions (`/rest/v1/<table>` with
//! `select`, `order`, `limit` and `id=eq.<id>` query parameters).

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::{header, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::SessionData;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Storage bucket holding project images and the CV file.
pub const CONTENT_BUCKET: &str = "portfolio-images";

/// Client identification header sent with every request.
const CLIENT_INFO: &str = "portfolio-app";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Public object files are cached by the CDN for an hour.
const UPLOAD_CACHE_CONTROL: &str = "max-age=3600";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: i64,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

/// API client for the backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    anon_key: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the project at `base_url`
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            anon_key: self.anon_key.clone(),
            token: Some(token),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let bearer = self.token.as_deref().unwrap_or(&self.anon_key);
        let mut headers = header::HeaderMap::new();
        headers.insert("apikey", header::HeaderValue::from_str(&self.anon_key)?);
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", bearer))?,
        );
        headers.insert("x-client-info", header::HeaderValue::from_static(CLIENT_INFO));
        Ok(headers)
    }

    fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        Ok(self
            .client
            .request(method, url)
            .headers(self.auth_headers()?))
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .request(Method::GET, url)?
                .query(query)
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    // ===== Table Reads =====

    /// Fetch every row of `table`, newest first
    pub async fn select_all<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        let rows: Vec<T> = self
            .get(&self.rest_url(table), &[("select", "*"), ("order", "created_at.desc")])
            .await?;
        debug!(table = table, count = rows.len(), "Rows fetched");
        Ok(rows)
    }

    /// Fetch the first row of a single-row table
    pub async fn select_single<T: DeserializeOwned>(&self, table: &str) -> Result<T> {
        let rows: Vec<T> = self
            .get(&self.rest_url(table), &[("select", "*"), ("limit", "1")])
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("no rows in {}", table)).into())
    }

    // ===== Table Writes =====

    pub async fn insert<B: Serialize>(&self, table: &str, row: &B) -> Result<()> {
        let response = self
            .request(Method::POST, &self.rest_url(table))?
            .header("Prefer", "return=minimal")
            .json(&[row])
            .send()
            .await
            .with_context(|| format!("Failed to insert into {}", table))?;
        Self::check_response(response).await?;
        debug!(table = table, "Row inserted");
        Ok(())
    }

    pub async fn update<B: Serialize>(&self, table: &str, id: &str, row: &B) -> Result<()> {
        let filter = format!("eq.{}", id);
        let response = self
            .request(Method::PATCH, &self.rest_url(table))?
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await
            .with_context(|| format!("Failed to update {} row {}", table, id))?;
        Self::check_response(response).await?;
        debug!(table = table, id = id, "Row updated");
        Ok(())
    }

    pub async fn delete(&self, table: &str, id: &str) -> Result<()> {
        let filter = format!("eq.{}", id);
        let response = self
            .request(Method::DELETE, &self.rest_url(table))?
            .query(&[("id", filter.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to delete {} row {}", table, id))?;
        Self::check_response(response).await?;
        debug!(table = table, id = id, "Row deleted");
        Ok(())
    }

    // ===== Object Storage =====

    /// Upload `bytes` to `bucket/path` and return the object's public URL
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<String> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path);
        let size = bytes.len();
        let response = self
            .request(Method::POST, &url)?
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, UPLOAD_CACHE_CONTROL)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("Failed to upload {}", path))?;
        Self::check_response(response).await?;
        debug!(bucket = bucket, path = path, size = size, "File uploaded");
        Ok(self.public_url(bucket, path))
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }

    // ===== Auth =====

    /// Sign the owner in with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionData> {
        let url = format!("{}/auth/v1/token", self.base_url);

        let response = self
            .client
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .header("x-client-info", CLIENT_INFO)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .context("Failed to send sign-in request")?;

        let response = Self::check_response(response).await?;
        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse sign-in response")?;

        Ok(SessionData {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user_id: token.user.id,
            email: token.user.email.unwrap_or_else(|| email.to_string()),
            created_at: Utc::now(),
            expires_in: token.expires_in,
        })
    }

    /// Revoke the current session on the server
    pub async fn sign_out(&self) -> Result<()> {
        if self.token.is_none() {
            return Ok(());
        }
        let url = format!("{}/auth/v1/logout", self.base_url);
        let response = self
            .request(Method::POST, &url)?
            .send()
            .await
            .context("Failed to send sign-out request")?;
        Self::check_response(response).await?;
        Ok(())
    }
}
