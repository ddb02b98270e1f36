//! Client-side machinery for browsing remote paginated collections.
//!
//! [`HttpCatalogSource`] talks to a dummyjson-style JSON API (`limit`/`skip`
//! query parameters, item array nested under a resource-named key), and the
//! controllers in [`controller`] turn those fetches into the loading phases a
//! list or detail screen renders from.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{Post, Product, ResourceKind},
    error::FetchError,
    protocol::{PageQuery, PageRequest, PageResponse},
};
use tracing::debug;

pub mod controller;

pub use controller::{
    DetailController, DetailState, ListEvent, ListState, LoadPhase, PaginatedListController,
};

/// Remote collection a list screen pages through.
#[async_trait]
pub trait ListSource<T>: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResponse<T>, FetchError>;
}

/// Single-item lookup backing a detail screen.
#[async_trait]
pub trait DetailSource<T>: Send + Sync {
    async fn fetch_item(&self, id: i64) -> Result<T, FetchError>;
}

/// HTTP implementation of [`ListSource`] and [`DetailSource`] bound to one
/// resource of a catalog API.
///
/// Request timeouts are whatever the injected [`Client`] is configured with;
/// the source itself imposes none.
pub struct HttpCatalogSource<T> {
    http: Client,
    base_url: String,
    resource: ResourceKind,
    _marker: PhantomData<fn() -> T>,
}

impl HttpCatalogSource<Post> {
    pub fn posts(http: Client, base_url: impl Into<String>) -> Self {
        Self::bound(http, base_url, ResourceKind::Posts)
    }
}

impl HttpCatalogSource<Product> {
    pub fn products(http: Client, base_url: impl Into<String>) -> Self {
        Self::bound(http, base_url, ResourceKind::Products)
    }
}

impl<T> HttpCatalogSource<T> {
    fn bound(http: Client, base_url: impl Into<String>, resource: ResourceKind) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            resource,
            _marker: PhantomData,
        }
    }

    pub fn resource(&self) -> ResourceKind {
        self.resource
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, self.resource.collection_key())
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/{}/{id}", self.base_url, self.resource.collection_key())
    }
}

#[async_trait]
impl<T> ListSource<T> for HttpCatalogSource<T>
where
    T: DeserializeOwned + Send + Sync,
{
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResponse<T>, FetchError> {
        let url = self.collection_url();
        debug!(
            resource = self.resource.collection_key(),
            offset = request.offset,
            limit = request.page_size,
            "fetching page"
        );
        let response = self
            .http
            .get(&url)
            .query(&PageQuery::from(request))
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let response = check_status(&url, response)?;
        let body: Value = response
            .json()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))?;
        decode_page(self.resource, body)
    }
}

#[async_trait]
impl<T> DetailSource<T> for HttpCatalogSource<T>
where
    T: DeserializeOwned + Send + Sync,
{
    async fn fetch_item(&self, id: i64) -> Result<T, FetchError> {
        let url = self.item_url(id);
        debug!(%url, "fetching item");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let response = check_status(&url, response)?;
        response
            .json()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))
    }
}

fn check_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

/// Pull the item array out from under the resource-named key and pair it with
/// the reported collection total.
fn decode_page<T: DeserializeOwned>(
    resource: ResourceKind,
    body: Value,
) -> Result<PageResponse<T>, FetchError> {
    let key = resource.collection_key();
    let Value::Object(mut fields) = body else {
        return Err(FetchError::Decode(format!(
            "expected an object carrying `{key}` and `total`"
        )));
    };
    let total = fields
        .get("total")
        .and_then(Value::as_u64)
        .ok_or_else(|| FetchError::Decode("payload is missing integer `total`".to_string()))?;
    let items = fields
        .remove(key)
        .ok_or_else(|| FetchError::Decode(format!("payload is missing `{key}`")))?;
    let items: Vec<T> =
        serde_json::from_value(items).map_err(|err| FetchError::Decode(err.to_string()))?;
    Ok(PageResponse { items, total })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
