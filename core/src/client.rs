//! Request builder, response decoder and transport driver.
//!
//! # Design
//! `Client` holds only read-only configuration (base URL, token, default
//! page) plus a [`Transport`]. Every call is split into `build_request`,
//! which produces an `HttpRequest` without I/O, and `decode`, which consumes
//! an `HttpResponse`. `send` glues the two around `Transport::execute`.
//! Because nothing is mutated after construction, a `Client` can be shared
//! by reference across independent callers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::services::{ComponentService, GroupService, IncidentService};
use crate::transport::{Transport, UreqTransport};

const API_VERSION: &str = "v1";

/// Status-page API client.
#[derive(Clone)]
pub struct Client<T = UreqTransport> {
    base_url: Url,
    token: String,
    default_page: String,
    transport: T,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("default_page", &self.default_page)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl Client<UreqTransport> {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_transport(config, UreqTransport::new())
    }

    /// Build a client from `STATUSPAGE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: Config, transport: T) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(&config.base_url)?,
            token: config.token,
            default_page: config.default_page,
            transport,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn default_page(&self) -> &str {
        &self.default_page
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn components(&self) -> ComponentService<'_, T> {
        ComponentService::new(self)
    }

    pub fn groups(&self) -> GroupService<'_, T> {
        GroupService::new(self)
    }

    pub fn incidents(&self) -> IncidentService<'_, T> {
        IncidentService::new(self)
    }

    /// Resolve `path` against the base URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("invalid request path `{path}`: {e}")))
    }

    /// URL `v1/pages/{page}/{segments...}`, substituting the default page for
    /// an empty `page_id`. Each segment is percent-encoded as a single path
    /// segment; empty, `.` and `..` segments are rejected.
    pub(crate) fn page_url(&self, page_id: &str, segments: &[&str]) -> Result<Url> {
        let page = if page_id.is_empty() {
            self.default_page.as_str()
        } else {
            page_id
        };
        if page.is_empty() {
            return Err(Error::Config(
                "no page id given and no default page configured".to_string(),
            ));
        }
        for segment in std::iter::once(&page).chain(segments) {
            check_segment(segment)?;
        }

        let mut url = self.base_url.clone();
        let base = &self.base_url;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("base URL `{base}` cannot carry a path")))?
            .pop_if_empty()
            .extend([API_VERSION, "pages", page])
            .extend(segments.iter().copied());
        Ok(url)
    }

    /// Build an authenticated request for `url`.
    ///
    /// Fails with [`Error::Encode`] if `body` cannot be serialized.
    pub fn build_request<B>(
        &self,
        method: HttpMethod,
        url: Url,
        body: Option<&B>,
    ) -> Result<HttpRequest>
    where
        B: Serialize + ?Sized,
    {
        let mut headers = vec![
            ("accept".to_string(), "application/json".to_string()),
            ("authorization".to_string(), format!("Bearer {}", self.token)),
        ];
        let body = match body {
            Some(body) => {
                let encoded = serde_json::to_string(body).map_err(Error::Encode)?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(encoded)
            }
            None => None,
        };

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }

    /// Decode a response into `R`, or into [`Error::Api`] for non-2xx statuses.
    pub fn decode<R: DeserializeOwned>(&self, response: &HttpResponse) -> Result<R> {
        check_status(response)?;
        serde_json::from_str(&response.body).map_err(|source| Error::Decode {
            status: response.status,
            source,
        })
    }

    /// Run one request/response exchange and decode the result.
    pub fn send<B, R>(&self, method: HttpMethod, url: Url, body: Option<&B>) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.execute(self.build_request(method, url, body)?)?;
        self.decode(&response)
    }

    /// Like [`send`](Self::send) but ignores the success body.
    pub fn send_unit(&self, method: HttpMethod, url: Url) -> Result<()> {
        let response = self.execute(self.build_request::<()>(method, url, None)?)?;
        check_status(&response)
    }

    pub(crate) fn get<R: DeserializeOwned>(&self, url: Url) -> Result<R> {
        self.send::<(), R>(HttpMethod::Get, url, None)
    }

    /// GET a JSON array, treating a `null` body as empty.
    pub(crate) fn get_list<R: DeserializeOwned>(&self, url: Url) -> Result<Vec<R>> {
        let items: Option<Vec<R>> = self.get(url)?;
        Ok(items.unwrap_or_default())
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = %request.method, url = %request.url, "sending statuspage request");
        let response = self.transport.execute(request)?;
        tracing::debug!(status = response.status, "received statuspage response");
        Ok(response)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    if raw.trim().is_empty() {
        return Err(Error::Config("base URL is not set".to_string()));
    }
    let mut url =
        Url::parse(raw).map_err(|e| Error::Config(format!("invalid base URL `{raw}`: {e}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!("base URL `{raw}` is not an http(s) URL")));
    }
    // Without the trailing slash `join` would replace the last path segment.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn check_segment(segment: &str) -> Result<()> {
    if matches!(segment, "" | "." | "..") {
        return Err(Error::Config(format!(
            "invalid id `{segment}` for a request path segment"
        )));
    }
    Ok(())
}

/// Map non-success statuses to [`Error::Api`] using the JSON error envelope.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(Error::Api {
        status: response.status,
        message: error_message(&response.body),
    })
}

/// Pull the message out of `{"error": ...}` or `{"message": ...}`; the error
/// field may be a string or a list of strings. Falls back to the raw body.
fn error_message(body: &str) -> String {
    let envelope = serde_json::from_str::<serde_json::Value>(body).ok();
    let field = envelope
        .as_ref()
        .and_then(|v| v.get("error").or_else(|| v.get("message")));
    match field {
        Some(serde_json::Value::String(message)) => message.clone(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        _ => body.trim().to_string(),
    }
}
