//! Request/response types and the HTTP client abstraction

use std::fmt;

use async_trait::async_trait;
use reqwest::Method;
use url::Url;

use crate::errors::TransportError;

/// One outgoing HTTP exchange, fully resolved (absolute URL, auth applied).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    /// `application/x-www-form-urlencoded` body pairs
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    /// URL path without the query string.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// First query value for `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        lookup(&self.query, key)
    }

    /// First form value for `key`.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        lookup(&self.form, key)
    }

    /// Header value for `key`, compared case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

/// Raw response: status code plus undecoded body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Where an adapter places its credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPlacement {
    /// `Authorization: Bearer <token>`
    BearerHeader,
    /// Query-string parameter with the given name (`apikey`, `access_token`, ...)
    QueryParam(&'static str),
}

/// Caller-supplied parameters merged into a request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub(crate) query: Vec<(String, String)>,
    pub(crate) form: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn form(mut self, key: &str, value: impl ToString) -> Self {
        self.form.push((key.to_string(), value.to_string()));
        self
    }
}

/// Abstract HTTP exchange used by [`super::Transport`].
///
/// The production implementation is [`super::ReqwestClient`]; tests swap in a
/// scripted client. Implementations perform exactly one round trip per call
/// and never retry.
#[async_trait]
pub trait HttpClient: Send + Sync + fmt::Debug {
    /// Sends the request and returns the status and body.
    ///
    /// # Errors
    ///
    /// - `TransportError::Network` - Connection failure or deadline elapsed
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
