use anyhow::Context;
use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::{Url, form_urlencoded::byte_serialize};

use crate::error::LabError;

const USER_AGENT_VALUE: &str = "lab";
const AUTH_SCHEME: &str = "Bearer";

/// Blocking HTTP client bound to one API base URL and token.
pub struct HttpClient {
    reqwest_client: Client,
    base_url: Url,
}

impl HttpClient {
    pub fn new(base_url: &str, token: &str) -> anyhow::Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let mut headers = HeaderMap::new();

        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        if !token.is_empty() {
            let mut auth = HeaderValue::from_str(&format!("{AUTH_SCHEME} {token}"))
                .context("The token contains characters that can't be sent in a header")?;

            auth.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth);
        }

        let reqwest_client = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build the HTTP client")?;

        Ok(Self {
            reqwest_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);

        tracing::debug!(method = "GET", %url);

        self.reqwest_client.get(url)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);

        tracing::debug!(method = "POST", %url);

        self.reqwest_client.post(url)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);

        tracing::debug!(method = "PUT", %url);

        self.reqwest_client.put(url)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);

        tracing::debug!(method = "DELETE", %url);

        self.reqwest_client.delete(url)
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Sends a request and turns non-success statuses into [`LabError::Api`].
pub trait SendChecked {
    fn send_json<T: DeserializeOwned>(self) -> anyhow::Result<T>;

    fn send_text(self) -> anyhow::Result<String>;

    fn send_empty(self) -> anyhow::Result<()>;
}

impl SendChecked for RequestBuilder {
    fn send_json<T: DeserializeOwned>(self) -> anyhow::Result<T> {
        send_checked(self)?
            .json::<T>()
            .context("Failed to parse GitLab API response")
    }

    fn send_text(self) -> anyhow::Result<String> {
        send_checked(self)?
            .text()
            .context("Failed to read GitLab API response")
    }

    fn send_empty(self) -> anyhow::Result<()> {
        send_checked(self).map(|_| ())
    }
}

/// URL-encodes a path so it fits into one path segment, e.g. a project path
/// `group/project` becomes `group%2Fproject`.
pub fn encode_segment(value: &str) -> String {
    // Form encoding writes a space as `+`, which a path reads as a literal
    // plus. A literal plus is already `%2B` at this point.
    byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn parse_base_url(base_url: &str) -> anyhow::Result<Url> {
    let url =
        Url::parse(base_url).with_context(|| format!("Invalid GitLab API URL '{base_url}'"))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Invalid GitLab API URL '{base_url}'. Expected an http(s) URL");
    }

    Ok(url)
}

fn send_checked(request: RequestBuilder) -> anyhow::Result<Response> {
    let response = request.send().context("Failed to reach the GitLab API")?;
    let status = response.status();

    tracing::debug!(%status, url = %response.url(), "GitLab API response");

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();

    Err(LabError::Api {
        status,
        message: error_message(&body),
    }
    .into())
}

/// Extracts GitLab's error description. GitLab uses `message` (a string or a
/// map of field errors) or `error`.
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["message", "error"]
            .iter()
            .find_map(|key| value.get(key).cloned())
            .map(|message| match message {
                Value::String(s) => s,
                other => other.to_string(),
            })
    });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => "no details".to_string(),
        None => body.trim().to_string(),
    }
}
