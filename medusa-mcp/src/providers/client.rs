//! Thin HTTP client for the Medusa REST API.

use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::{MedusaConfig, as_base_url};

/// Header carrying the store publishable key.
pub const PUBLISHABLE_KEY_HEADER: &str = "x-publishable-api-key";

/// A failed call to the commerce backend.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request could not be sent or the body could not be read.
    #[error("request to Medusa failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Medusa returned {status}: {body}")]
    Status {
        /// The HTTP status.
        status: StatusCode,
        /// The response body, possibly truncated.
        body: String,
    },

    /// The endpoint path did not form a valid URL.
    #[error("invalid Medusa URL: {0}")]
    Url(#[from] url::ParseError),
}

const MAX_ERROR_BODY: usize = 512;

/// Client bound to one Medusa backend.
#[derive(Debug, Clone)]
pub struct MedusaClient {
    http: reqwest::Client,
    base: Url,
    publishable_key: String,
}

impl MedusaClient {
    /// Build a client with the configured per-call timeout.
    pub fn new(config: &MedusaConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base: as_base_url(config.backend_url.clone()),
            publishable_key: config.publishable_key.clone(),
        })
    }

    /// The backend base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve `path` (e.g. `/store/products`) against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// Resolve one item of `collection`, percent-encoding `id` as a single
    /// path segment.
    pub fn resource(&self, collection: &str, id: &str) -> Result<Url, ClientError> {
        let mut url = self.endpoint(collection)?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// `GET` a store URL with the publishable key.
    pub async fn store_get(&self, url: Url, query: &[(&str, String)]) -> Result<Value, ClientError> {
        let mut request = self.http.get(url).query(query);
        if !self.publishable_key.is_empty() {
            request = request.header(PUBLISHABLE_KEY_HEADER, &self.publishable_key);
        }
        send(request).await
    }

    /// `GET` an admin URL with a bearer token.
    pub async fn admin_get(
        &self,
        url: Url,
        token: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ClientError> {
        let request = self.http.get(url).bearer_auth(token).query(query);
        send(request).await
    }

    /// `POST` a JSON body.
    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        send(self.http.post(self.endpoint(path)?).json(body)).await
    }
}

async fn send(request: RequestBuilder) -> Result<Value, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        return Err(ClientError::Status { status, body });
    }
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn client(base: &str) -> MedusaClient {
        let mut config = Config::from_lookup(|_| None).unwrap().medusa;
        config.backend_url = Url::parse(base).unwrap();
        MedusaClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let client = client("http://localhost:9000");
        assert_eq!(
            client.endpoint("/store/products").unwrap().as_str(),
            "http://localhost:9000/store/products"
        );
        assert_eq!(
            client.endpoint("store/products/prod_1").unwrap().as_str(),
            "http://localhost:9000/store/products/prod_1"
        );
    }

    #[test]
    fn test_resource_encodes_id() {
        let client = client("http://localhost:9000");
        assert_eq!(
            client.resource("/store/products", "prod_1").unwrap().as_str(),
            "http://localhost:9000/store/products/prod_1"
        );
        assert_eq!(
            client.resource("/store/products", "../admin").unwrap().as_str(),
            "http://localhost:9000/store/products/..%2Fadmin"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("https://shop.example.com/api/");
        assert_eq!(
            client.endpoint("/admin/orders").unwrap().as_str(),
            "https://shop.example.com/api/admin/orders"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_without_trailing_slash() {
        let client = client("https://shop.example.com/api");
        assert_eq!(client.base_url().as_str(), "https://shop.example.com/api/");
        assert_eq!(
            client.endpoint("/admin/orders").unwrap().as_str(),
            "https://shop.example.com/api/admin/orders"
        );
        assert_eq!(
            client.resource("/store/products", "prod_1").unwrap().as_str(),
            "https://shop.example.com/api/store/products/prod_1"
        );
    }
}
