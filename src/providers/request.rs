//! HTTP request construction for a backend.

use super::backend::{AuthPlacement, BackendSpec};
use super::response::Response;
use crate::core::config::DriverConfig;
use crate::core::error::RequestError;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, instrument};

/// Issues GET requests against one backend and decodes the JSON payload.
#[async_trait]
pub trait RequestSender: Send + Sync {
    async fn make_request(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Response, RequestError>;
}

pub struct HttpRequestSender {
    client: reqwest::Client,
    spec: &'static BackendSpec,
    config: DriverConfig,
}

impl HttpRequestSender {
    pub fn new(spec: &'static BackendSpec, config: DriverConfig) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("xrates/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            spec,
            config,
        })
    }

    /// Full request URL, with the api key appended when it travels as a
    /// query parameter.
    fn build_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, RequestError> {
        let base = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let mut params: Vec<(&str, &str)> = Vec::with_capacity(query.len() + 1);
        if let (AuthPlacement::QueryParam(name), Some(key)) = (self.spec.auth, &self.config.api_key)
        {
            params.push((name, key.as_str()));
        }
        params.extend(query.iter().map(|(name, value)| (*name, value.as_str())));

        Url::parse_with_params(&base, &params).map_err(|e| RequestError::InvalidUrl {
            url: base.clone(),
            message: e.to_string(),
        })
    }

    /// The URL as it may appear in logs and errors, without credentials.
    fn redacted(&self, url: &Url) -> String {
        match (self.spec.auth, &self.config.api_key) {
            (AuthPlacement::QueryParam(name), Some(_)) => {
                let mut redacted = url.clone();
                let pairs: Vec<(String, String)> = url
                    .query_pairs()
                    .map(|(k, v)| {
                        let v = if k == name { "***".into() } else { v };
                        (k.into_owned(), v.into_owned())
                    })
                    .collect();
                redacted.query_pairs_mut().clear().extend_pairs(pairs);
                redacted.to_string()
            }
            _ => url.to_string(),
        }
    }
}

#[async_trait]
impl RequestSender for HttpRequestSender {
    #[instrument(name = "ExchangeRateRequest", skip(self, query), fields(host = %self.spec.host))]
    async fn make_request(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Response, RequestError> {
        let url = self.build_url(path, query)?;
        let display_url = self.redacted(&url);
        debug!("Requesting exchange rates from {}", display_url);

        let mut request = self.client.get(url);
        if let (AuthPlacement::Header(name), Some(key)) = (self.spec.auth, &self.config.api_key) {
            request = request.header(name, key);
        }

        let response = request.send().await?;
        debug!(status = %response.status(), "Received exchange rate response");

        if !response.status().is_success() {
            return Err(RequestError::Status {
                status: response.status(),
                url: display_url,
            });
        }

        let text = response.text().await?;
        let raw: Value = serde_json::from_str(&text).map_err(|e| RequestError::Decode {
            url: display_url,
            message: e.to_string(),
        })?;

        Ok(Response::new(raw, self.spec.response))
    }
}
