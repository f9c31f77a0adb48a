use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::CatalogItem;
use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// Read-only access to the canonical catalog served over HTTP.
///
/// Every call performs exactly one request. Non-2xx responses become
/// [`Error::Server`]; everything else that goes wrong (unreachable host,
/// timeout, unreadable or malformed body) becomes [`Error::Network`].
#[async_trait]
pub trait RemoteSource<T: CatalogItem>: Send + Sync {
    async fn get_all(&self) -> Result<Vec<T>>;

    async fn get_by_id(&self, id: &str) -> Result<T>;

    async fn search(&self, query: &str) -> Result<Vec<T>>;

    async fn get_by_category(&self, category: &str) -> Result<Vec<T>>;
}

#[derive(Debug, Clone)]
pub struct HttpRemoteSource<T> {
    client: Client,
    base_url: Url,
    user_agent: String,
    _item: PhantomData<fn() -> T>,
}

impl<T: CatalogItem> HttpRemoteSource<T> {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::from_config(&ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|_| Error::InvalidUrl(config.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(config.base_url.clone()));
        }

        // Clone is cheap: reqwest::Client shares its connection pool.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            user_agent: config.user_agent.clone(),
            _item: PhantomData,
        })
    }

    /// Build `{base}/{collection}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(T::COLLECTION)
            .extend(segments);
        Ok(url)
    }

    async fn fetch(&self, url: Url, what: &str) -> Result<Value> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!("Request to {} failed: {}", url, e);
                Error::Network(format!("Impossible de récupérer {}", what))
            })?;

        let response = Self::check_status(response)?;

        response.json::<Value>().await.map_err(|e| {
            warn!("Unreadable response from {}: {}", url, e);
            Error::Network(format!("Réponse invalide pour {}", what))
        })
    }

    fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(Error::Server {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown error").to_string(),
            })
        }
    }

    /// A list envelope without its field counts as an empty collection.
    fn unwrap_list(mut body: Value, what: &str) -> Result<Vec<T>> {
        match body.get_mut(T::LIST_FIELD).map(Value::take) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(items) => serde_json::from_value(items)
                .map_err(|e| Error::Network(format!("Réponse invalide pour {}: {}", what, e))),
        }
    }

    fn unwrap_item(mut body: Value, what: &str) -> Result<T> {
        match body.get_mut(T::ITEM_FIELD).map(Value::take) {
            None | Some(Value::Null) => Err(Error::Network(format!(
                "Réponse invalide pour {}: champ '{}' absent",
                what,
                T::ITEM_FIELD
            ))),
            Some(item) => serde_json::from_value(item)
                .map_err(|e| Error::Network(format!("Réponse invalide pour {}: {}", what, e))),
        }
    }
}

#[async_trait]
impl<T: CatalogItem> RemoteSource<T> for HttpRemoteSource<T> {
    async fn get_all(&self) -> Result<Vec<T>> {
        let what = format!("les {}", T::COLLECTION);
        let body = self.fetch(self.endpoint(&[])?, &what).await?;
        Self::unwrap_list(body, &what)
    }

    async fn get_by_id(&self, id: &str) -> Result<T> {
        let what = format!("l'élément {} ({})", id, T::COLLECTION);
        let body = self.fetch(self.endpoint(&[id])?, &what).await?;
        Self::unwrap_item(body, &what)
    }

    async fn search(&self, query: &str) -> Result<Vec<T>> {
        let what = format!("la recherche '{}'", query);
        let mut url = self.endpoint(&["search"])?;
        url.query_pairs_mut().append_pair("q", query);
        let body = self.fetch(url, &what).await?;
        Self::unwrap_list(body, &what)
    }

    async fn get_by_category(&self, category: &str) -> Result<Vec<T>> {
        let what = format!("la catégorie {}", category);
        let body = self.fetch(self.endpoint(&["category", category])?, &what).await?;
        Self::unwrap_list(body, &what)
    }
}
