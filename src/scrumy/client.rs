//! Scrumy Client
//!
//! Main client for the Scrumy API, combining credentials, the HTTP fetcher
//! and the resource registry.

use super::auth::Credentials;
use super::http::{sanitize_for_log, Fetch, HttpFetcher};
use crate::error::{Result, ScrumyError};
use crate::resource::{dispatch, Entity, Fetched, Registry, Selector};
use serde_json::Value;
use std::sync::Arc;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://scrumy.com/api";

struct ClientInner {
    credentials: Credentials,
    base_url: String,
    fetcher: Arc<dyn Fetch>,
    registry: Registry,
}

/// Main Scrumy client
///
/// Cheap to clone; entities keep a clone to resolve their lazy fields.
#[derive(Clone)]
pub struct ScrumyClient {
    inner: Arc<ClientInner>,
}

impl ScrumyClient {
    /// Create a new client talking to scrumy.com over HTTPS
    pub fn new(project: &str, password: &str) -> Result<Self> {
        Self::builder(project, password).build()
    }

    /// Create a client with a custom transport
    pub fn with_fetcher(project: &str, password: &str, fetcher: Arc<dyn Fetch>) -> Result<Self> {
        Self::builder(project, password).fetcher(fetcher).build()
    }

    pub fn builder(project: &str, password: &str) -> ScrumyClientBuilder {
        ScrumyClientBuilder {
            credentials: Credentials::new(project, password),
            base_url: DEFAULT_BASE_URL.to_string(),
            fetcher: None,
            registry: None,
        }
    }

    pub fn project(&self) -> &str {
        &self.inner.credentials.project
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Absolute URL for a resolved template path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// GET a URL and parse the JSON body.
    ///
    /// Only status 200 counts as success; every failure keeps the URL.
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let response = self
            .inner
            .fetcher
            .fetch(url, &self.inner.credentials)
            .await
            .map_err(|source| {
                tracing::error!("Problem fetching {}: {}", url, source);
                ScrumyError::Transport {
                    url: url.to_string(),
                    source,
                }
            })?;

        if !response.is_ok() {
            // Security: Only log sanitized/truncated error body
            tracing::error!(
                "API error: {} - {}",
                response.status,
                sanitize_for_log(&String::from_utf8_lossy(&response.body))
            );
            return Err(ScrumyError::Fetch {
                url: url.to_string(),
                status: response.status,
            });
        }

        serde_json::from_slice(&response.body).map_err(|source| ScrumyError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch any registered resource by (plural or singular) name
    pub async fn dispatch(&self, resource: &str, selector: &Selector) -> Result<Fetched> {
        dispatch::dispatch(self, resource, selector).await
    }

    // =========================================================================
    // Resource helpers
    // =========================================================================

    /// The project itself
    pub async fn project_info(&self) -> Result<Option<Entity>> {
        let fetched = self.dispatch("scrumy", &Selector::All).await?;
        Ok(fetched.into_one())
    }

    pub async fn sprints(&self) -> Result<Vec<Entity>> {
        let fetched = self.dispatch("sprints", &Selector::All).await?;
        Ok(fetched.into_many())
    }

    pub async fn sprint(&self, selector: &Selector) -> Result<Option<Entity>> {
        Ok(self.dispatch("sprint", selector).await?.into_one())
    }

    /// The active sprint, with stories, tasks and scrumers nested
    pub async fn current_sprint(&self) -> Result<Option<Entity>> {
        self.sprint(&Selector::Current).await
    }

    pub async fn stories(&self, sprint_id: &str) -> Result<Vec<Entity>> {
        let fetched = self.dispatch("stories", &sprint_id.into()).await?;
        Ok(fetched.into_many())
    }

    pub async fn tasks(&self, story_id: &str) -> Result<Vec<Entity>> {
        let fetched = self.dispatch("tasks", &story_id.into()).await?;
        Ok(fetched.into_many())
    }

    pub async fn scrumers(&self) -> Result<Vec<Entity>> {
        let fetched = self.dispatch("scrumers", &Selector::All).await?;
        Ok(fetched.into_many())
    }

    /// Scrumers are addressed by name
    pub async fn scrumer(&self, name: &str) -> Result<Option<Entity>> {
        Ok(self.dispatch("scrumer", &name.into()).await?.into_one())
    }

    /// Snapshots of a sprint; `All` and `Current` mean the current sprint
    pub async fn snapshots(&self, selector: &Selector) -> Result<Vec<Entity>> {
        let sprint_id = match selector {
            Selector::Id(id) => id.clone(),
            Selector::All | Selector::Current => {
                let current = self.current_sprint().await?;
                current
                    .and_then(|sprint| sprint.id())
                    .ok_or_else(|| ScrumyError::MissingIdentifier {
                        template: "sprint.snapshots".to_string(),
                    })?
            }
        };
        Ok(self.dispatch("snapshots", &sprint_id.into()).await?.into_many())
    }
}

/// Builder for [`ScrumyClient`]
pub struct ScrumyClientBuilder {
    credentials: Credentials,
    base_url: String,
    fetcher: Option<Arc<dyn Fetch>>,
    registry: Option<Registry>,
}

impl ScrumyClientBuilder {
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn Fetch>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<ScrumyClient> {
        let fetcher: Arc<dyn Fetch> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new().map_err(|e| ScrumyError::Transport {
                url: self.base_url.clone(),
                source: Box::new(e),
            })?),
        };
        let registry = match self.registry {
            Some(registry) => registry,
            None => Registry::builtin()?,
        };

        tracing::debug!(
            "Scrumy client for project {} at {}",
            self.credentials.project,
            self.base_url
        );

        Ok(ScrumyClient {
            inner: Arc::new(ClientInner {
                credentials: self.credentials,
                base_url: self.base_url,
                fetcher,
                registry,
            }),
        })
    }
}
