//! Network access for cache misses and manifest population
//!
//! Provides a trait so the worker can be driven by a real HTTP agent in the
//! CLI and by canned responses in tests.

use crate::config::schema::NetworkConfig;
use crate::error::{StriderError, StriderResult};
use crate::http::{same_origin, Headers, Method, Request, RequestMode, Response, ResponseType};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Abstract network interface
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request. HTTP error statuses are responses, not errors;
    /// only transport failures (refused, DNS, timeout) return `Err`.
    async fn fetch(&self, request: &Request) -> StriderResult<Response>;
}

/// Classify a network response the way a browser would for this request
pub fn classify(app_origin: &Url, request: &Request) -> ResponseType {
    if same_origin(app_origin, &request.url) {
        ResponseType::Basic
    } else if request.mode == RequestMode::NoCors {
        ResponseType::Opaque
    } else {
        ResponseType::Cors
    }
}

/// Fetcher backed by a blocking `ureq` agent on tokio's blocking pool
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    origin: Url,
    user_agent: String,
}

impl HttpFetcher {
    /// Create a fetcher for an application origin
    pub fn new(origin: Url, config: &NetworkConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            origin,
            user_agent: config.user_agent.clone(),
        }
    }

    fn run_blocking(
        agent: &ureq::Agent,
        request: &Request,
        user_agent: &str,
    ) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        let url = request.url.as_str();
        match request.method {
            Method::Get => with_headers(agent.get(url), request, user_agent).call(),
            Method::Head => with_headers(agent.head(url), request, user_agent).call(),
            Method::Delete => with_headers(agent.delete(url), request, user_agent).call(),
            Method::Options => with_headers(agent.options(url), request, user_agent).call(),
            Method::Post => {
                with_headers(agent.post(url), request, user_agent).send(&request.body[..])
            }
            Method::Put => {
                with_headers(agent.put(url), request, user_agent).send(&request.body[..])
            }
            Method::Patch => {
                with_headers(agent.patch(url), request, user_agent).send(&request.body[..])
            }
        }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &Request,
    user_agent: &str,
) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.header("user-agent", user_agent)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> StriderResult<Response> {
        let response_type = classify(&self.origin, request);
        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();
        let owned = request.clone();
        let url = request.url.to_string();

        debug!("{} {}", request.method, url);

        let result = tokio::task::spawn_blocking(move || {
            let mut response = Self::run_blocking(&agent, &owned, &user_agent)?;
            let status = response.status().as_u16();
            let mut headers = Headers::new();
            for (name, value) in response.headers() {
                if let Ok(value) = value.to_str() {
                    headers.insert(name.as_str().to_string(), value.to_string());
                }
            }
            let body = response.body_mut().read_to_vec()?;
            Ok::<_, ureq::Error>((status, headers, body))
        })
        .await
        .map_err(|e| StriderError::Internal(format!("fetch task failed: {}", e)))?;

        let (status, headers, body) =
            result.map_err(|e| StriderError::network(url.clone(), e.to_string()))?;

        if response_type == ResponseType::Opaque {
            return Ok(Response {
                status: 0,
                status_text: String::new(),
                headers: Headers::new(),
                body: Vec::new(),
                response_type,
                url: Some(request.url.clone()),
            });
        }

        let mut response = Response::new(status, body, response_type);
        response.headers = headers;
        response.url = Some(request.url.clone());
        Ok(response)
    }
}

/// Fetcher that behaves as if the device has no connectivity
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn fetch(&self, request: &Request) -> StriderResult<Response> {
        Err(StriderError::network(
            request.url.as_str(),
            "network unreachable",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://localhost:3000").unwrap()
    }

    #[test]
    fn classify_same_origin_as_basic() {
        let req = Request::parse("http://localhost:3000/static/js/bundle.js").unwrap();
        assert_eq!(classify(&origin(), &req), ResponseType::Basic);
    }

    #[test]
    fn classify_cross_origin() {
        let mut req = Request::parse("https://fonts.googleapis.com/css2?family=Inter").unwrap();
        assert_eq!(classify(&origin(), &req), ResponseType::Cors);

        req.mode = RequestMode::NoCors;
        assert_eq!(classify(&origin(), &req), ResponseType::Opaque);
    }

    #[tokio::test]
    async fn offline_fetcher_always_fails() {
        let req = Request::parse("http://localhost:3000/").unwrap();
        let err = OfflineFetcher.fetch(&req).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("network unreachable"));
    }
}
