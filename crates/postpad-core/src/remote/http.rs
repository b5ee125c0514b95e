//! HTTP adapter for the notes service.
//!
//! Endpoints (relative to the configured base URL):
//! - `POST auth/login/`, `POST auth/register/`, `GET auth/logout/`
//! - `GET post`, `POST post`, `PUT post/{id}`, `DELETE post/{id}`
//!
//! The server keeps its session in a cookie. Cookies live in a reqwest jar
//! and can be mirrored into a `SessionStorage` key so a restarted process
//! keeps talking to the same server session.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::{ErrorCode, LoginReply, Post, PostDraft, RemoteAccess, RemoteError};
use crate::session::Identity;
use crate::storage::SessionStorage;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    logged_in_user: Identity,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    user: Identity,
}

#[derive(Debug, Deserialize)]
struct PostsBody {
    #[serde(default)]
    posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct PostBody {
    post: Post,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatedPostBody {
    updated_post: Post,
}

/// Error payload; the service uses `message`, some gateways use `error`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

struct CookieMirror {
    storage: Arc<dyn SessionStorage>,
    key: String,
}

/// `RemoteAccess` over HTTP/JSON.
pub struct HttpRemote {
    base: Url,
    http: reqwest::Client,
    jar: Arc<Jar>,
    mirror: Option<CookieMirror>,
}

impl HttpRemote {
    /// Creates a client for `base_url` (e.g. `http://localhost:5000/api`).
    ///
    /// # Errors
    /// Returns an error if the URL is empty or invalid, or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            anyhow::bail!("Base URL must not be empty");
        }

        let mut base =
            Url::parse(trimmed).with_context(|| format!("Invalid base URL '{trimmed}'"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base,
            http,
            jar,
            mirror: None,
        })
    }

    /// Mirrors session cookies into `storage` under `key`, loading any
    /// previously saved cookies into the jar.
    #[must_use]
    pub fn with_cookie_storage(mut self, storage: Arc<dyn SessionStorage>, key: &str) -> Self {
        match storage.get(key) {
            Ok(Some(saved)) => {
                for cookie in saved.split(';').map(str::trim).filter(|c| !c.is_empty()) {
                    self.jar.add_cookie_str(cookie, &self.base);
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "failed to load saved cookies");
            }
        }

        self.mirror = Some(CookieMirror {
            storage,
            key: key.to_string(),
        });
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base
            .join(path)
            .map_err(|err| RemoteError::Transport(format!("invalid endpoint '{path}': {err}")))
    }

    /// URL of a single post. The id is one percent-encoded path segment.
    fn post_endpoint(&self, id: &str) -> Result<Url, RemoteError> {
        if matches!(id, "" | "." | "..") {
            return Err(RemoteError::InvalidPostId(id.to_string()));
        }
        let mut url = self.endpoint("post/")?;
        url.path_segments_mut()
            .map_err(|()| RemoteError::InvalidPostId(id.to_string()))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    fn save_cookies(&self) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        let Some(header) = self.jar.cookies(&self.base) else {
            return;
        };
        let Ok(value) = header.to_str() else {
            tracing::warn!("session cookie is not valid text; not saving it");
            return;
        };
        if let Err(err) = mirror.storage.set(&mirror.key, value) {
            tracing::warn!(error = %format!("{err:#}"), "failed to save cookies");
        }
    }

    fn forget_cookies(&self) {
        if let Some(mirror) = &self.mirror
            && let Err(err) = mirror.storage.remove(&mirror.key)
        {
            tracing::warn!(error = %format!("{err:#}"), "failed to remove saved cookies");
        }
    }

    /// Sends `request` and decodes the body when the status is in `accepted`.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        accepted: &[StatusCode],
    ) -> Result<T, RemoteError> {
        let response = Self::send_checked(request, accepted).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| RemoteError::Decode(err.to_string()))
    }

    async fn send_checked(
        request: RequestBuilder,
        accepted: &[StatusCode],
    ) -> Result<reqwest::Response, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|err| RemoteError::Transport(err.to_string()))?;

        let status = response.status();
        if accepted.contains(&status) {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let message = parsed.message.or(parsed.error);
        Err(RemoteError::Status {
            status: status.as_u16(),
            code: ErrorCode::classify(status.as_u16(), parsed.code.as_deref(), message.as_deref()),
            message,
        })
    }
}

impl RemoteAccess for HttpRemote {
    async fn login(&self, email: &str, password: &str) -> Result<LoginReply, RemoteError> {
        let request = self
            .http
            .post(self.endpoint("auth/login/")?)
            .json(&serde_json::json!({ "email": email, "password": password }));

        let body: LoginBody = self.send_json(request, &[StatusCode::OK]).await?;
        self.save_cookies();
        Ok(LoginReply {
            user: body.logged_in_user,
            message: body.message,
        })
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, RemoteError> {
        let request = self.http.post(self.endpoint("auth/register/")?).json(
            &serde_json::json!({ "name": name, "email": email, "password": password }),
        );

        let body: RegisterBody = self.send_json(request, &[StatusCode::CREATED]).await?;
        self.save_cookies();
        Ok(body.user)
    }

    async fn logout(&self) -> Result<(), RemoteError> {
        let url = self.endpoint("auth/logout/")?;
        let result = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| RemoteError::Transport(err.to_string()));
        self.forget_cookies();

        let status = result?.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RemoteError::Status {
                status: status.as_u16(),
                code: ErrorCode::classify(status.as_u16(), None, None),
                message: None,
            })
        }
    }

    async fn list_posts(&self) -> Result<Vec<Post>, RemoteError> {
        let request = self.http.get(self.endpoint("post")?);
        let body: PostsBody = self.send_json(request, &[StatusCode::OK]).await?;
        Ok(body.posts)
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<Post, RemoteError> {
        let request = self.http.post(self.endpoint("post")?).json(draft);
        let body: PostBody = self
            .send_json(request, &[StatusCode::OK, StatusCode::CREATED])
            .await?;
        Ok(body.post)
    }

    async fn update_post(&self, id: &str, draft: &PostDraft) -> Result<Post, RemoteError> {
        let request = self
            .http
            .put(self.post_endpoint(id)?)
            .json(draft);
        let body: UpdatedPostBody = self.send_json(request, &[StatusCode::OK]).await?;
        Ok(body.updated_post)
    }

    async fn delete_post(&self, id: &str) -> Result<(), RemoteError> {
        let request = self.http.delete(self.post_endpoint(id)?);
        Self::send_checked(request, &[StatusCode::OK]).await?;
        Ok(())
    }
}
