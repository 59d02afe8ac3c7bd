//! Request and response values exchanged between clients, the cache and the network

use crate::error::{StriderError, StriderResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Header map with lowercase names
pub type Headers = BTreeMap<String, String>;

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = StriderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(StriderError::MethodUnsupported(s.to_string())),
        }
    }
}

/// What the requested resource will be used as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Top-level HTML document
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    #[default]
    Empty,
}

/// Request mode as seen by the interceptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    #[default]
    Cors,
    NoCors,
}

/// An outgoing request from a client context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub destination: Destination,
    pub mode: RequestMode,
}

impl Request {
    /// Create a request with an empty body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            body: Vec::new(),
            destination: Destination::Empty,
            mode: RequestMode::Cors,
        }
    }

    /// Sub-resource GET request
    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    /// Top-level document navigation
    pub fn navigate(url: Url) -> Self {
        Self {
            destination: Destination::Document,
            mode: RequestMode::Navigate,
            ..Self::new(Method::Get, url)
        }
    }

    /// Parse a URL string into a GET request
    pub fn parse(url: &str) -> StriderResult<Self> {
        let parsed = Url::parse(url).map_err(|e| StriderError::url(url, e))?;
        Ok(Self::get(parsed))
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Whether this request loads a top-level document
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate || self.destination == Destination::Document
    }
}

/// How the platform classifies a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response
    Basic,
    /// Cross-origin response with readable body
    Cors,
    /// Cross-origin response with hidden body and status 0
    Opaque,
    /// Network error
    Error,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::Cors => "cors",
            Self::Opaque => "opaque",
            Self::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// A response returned to a client, stored in a cache, or synthesized offline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub body: Vec<u8>,
    pub response_type: ResponseType,
    /// Final URL after redirects, if known
    #[serde(default)]
    pub url: Option<Url>,
}

/// Body of the synthesized offline response
pub const OFFLINE_BODY: &str = "Offline";

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>, response_type: ResponseType) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            headers: Headers::new(),
            body: body.into(),
            response_type,
            url: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Placeholder served when the network is unreachable and nothing is cached
    pub fn offline() -> Self {
        Self::new(503, OFFLINE_BODY, ResponseType::Basic)
            .with_header("content-type", "text/plain")
    }

    pub fn network_error() -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            headers: Headers::new(),
            body: Vec::new(),
            response_type: ResponseType::Error,
            url: None,
        }
    }

    /// Status in the 200-299 range
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Copy that can be stored while the original goes back to the caller
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}

/// Scheme, host and port of a URL, compared the way browsers compare origins
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Post".parse::<Method>().unwrap(), Method::Post);
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn navigation_detection() {
        let url = Url::parse("http://localhost:3000/").unwrap();
        assert!(Request::navigate(url.clone()).is_navigation());
        assert!(!Request::get(url.clone()).is_navigation());
        assert!(Request::get(url)
            .with_destination(Destination::Document)
            .is_navigation());
    }

    #[test]
    fn offline_response_shape() {
        let response = Response::offline();
        assert_eq!(response.status, 503);
        assert_eq!(response.status_text, "Service Unavailable");
        assert_eq!(response.text(), "Offline");
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert!(!response.ok());
    }

    #[test]
    fn origin_comparison_includes_port() {
        let app = Url::parse("http://localhost:3000/").unwrap();
        let same = Url::parse("http://localhost:3000/static/js/bundle.js").unwrap();
        let other_port = Url::parse("http://localhost:8001/api/pois").unwrap();
        assert!(same_origin(&app, &same));
        assert!(!same_origin(&app, &other_port));
    }

    #[test]
    fn response_serializes_type_lowercase() {
        let json = serde_json::to_string(&Response::new(200, "x", ResponseType::Cors)).unwrap();
        assert!(json.contains("\"cors\""));
    }
}
