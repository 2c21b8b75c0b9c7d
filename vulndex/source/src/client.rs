use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::cache::{content_key, json_key, MemoCache};

pub const DEFAULT_CONTENT_API: &str = "https://api.github.com";
pub const DEFAULT_ADVISORY_REPO: &str = "khulnasoft-lab/vuln-list";
pub const DEFAULT_MALICIOUS_REPO: &str = "khulnasoft-lab/malicious-packages";

const USER_AGENT: &str = concat!("vulndex/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("response error: {0} / {1}")]
    Response(StatusCode, String),
    #[error("expected file content at {0}")]
    ExpectedFile(String),
    #[error("content decode error: {0}")]
    Decode(String),
    #[error("invalid repository reference: {0}")]
    Repository(String),
}

/// Remote content API configuration.
#[derive(clap::Args, Debug, Clone)]
#[command(rename_all_env = "SCREAMING_SNAKE_CASE", next_help_heading = "Content API")]
pub struct ContentConfig {
    /// Base URL of the repository contents API
    #[arg(long, default_value = DEFAULT_CONTENT_API)]
    pub content_api: Url,

    /// Repository holding the advisory tree, as owner/name
    #[arg(long, default_value = DEFAULT_ADVISORY_REPO)]
    pub advisory_repo: String,

    /// Repository holding malicious package records, as owner/name
    #[arg(long, default_value = DEFAULT_MALICIOUS_REPO)]
    pub malicious_repo: String,

    /// Access token; raises content API rate limits when present
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

impl ContentConfig {
    pub fn advisory_client(&self, cache: Arc<MemoCache>) -> Result<ContentClient, Error> {
        ContentClient::new(
            self.content_api.clone(),
            &self.advisory_repo,
            self.github_token.clone(),
            cache,
        )
    }

    pub fn malicious_client(&self, cache: Arc<MemoCache>) -> Result<ContentClient, Error> {
        ContentClient::new(
            self.content_api.clone(),
            &self.malicious_repo,
            self.github_token.clone(),
            cache,
        )
    }
}

/// One entry of a directory listing as the contents API reports it.
#[derive(Clone, Debug, Deserialize)]
pub struct DirEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub path: String,
}

/// Read access to a remote source tree of advisory documents.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Directory listing at `path`. Empty when the path is absent or not a
    /// directory.
    async fn list(&self, path: &str) -> Result<Vec<DirEntry>, Error>;

    /// Decoded JSON body of the file at `path`, `None` when absent upstream.
    async fn fetch_json(&self, path: &str) -> Result<Option<Value>, Error>;
}

/// Client for a GitHub-style repository contents API. Listings and decoded
/// file bodies are memoized through the shared [`MemoCache`].
pub struct ContentClient {
    client: reqwest::Client,
    base: Url,
    owner: String,
    repo: String,
    token: Option<String>,
    cache: Arc<MemoCache>,
}

impl ContentClient {
    pub fn new(base: Url, repo: &str, token: Option<String>, cache: Arc<MemoCache>) -> Result<Self, Error> {
        let (owner, name) = repo
            .split_once('/')
            .ok_or_else(|| Error::Repository(repo.to_string()))?;
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base,
            owner: owner.to_string(),
            repo: name.to_string(),
            token,
            cache,
        })
    }

    fn contents_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self
            .base
            .join(&format!("repos/{}/{}/contents/{}", self.owner, self.repo, path))?)
    }

    /// Raw contents API response for `path`: a listing array for
    /// directories, a content envelope for files, `None` on 404.
    async fn get_content(&self, path: &str) -> Result<Option<Value>, Error> {
        let key = content_key(path);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Some(hit));
        }

        let mut request = self
            .client
            .get(self.contents_url(path)?)
            .header("accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        match or_status_error_opt(request.send().await?).await? {
            Some(response) => {
                let value: Value = response.json().await?;
                self.cache.insert(&key, value.clone());
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ContentSource for ContentClient {
    async fn list(&self, path: &str) -> Result<Vec<DirEntry>, Error> {
        match self.get_content(path).await? {
            Some(Value::Array(entries)) => Ok(entries
                .into_iter()
                .filter_map(|entry| serde_json::from_value(entry).ok())
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    async fn fetch_json(&self, path: &str) -> Result<Option<Value>, Error> {
        let key = json_key(path);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Some(hit));
        }

        let envelope = match self.get_content(path).await? {
            Some(envelope) => envelope,
            None => return Ok(None),
        };
        if envelope.is_array() {
            return Err(Error::ExpectedFile(path.to_string()));
        }

        let encoded = envelope.get("content").and_then(Value::as_str).unwrap_or("");
        let decoded = decode_body(encoded)?;
        self.cache.insert(&key, decoded.clone());
        Ok(Some(decoded))
    }
}

/// The contents API wraps file bodies in whitespace-broken base64.
fn decode_body(encoded: &str) -> Result<Value, Error> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| Error::Decode(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| Error::Decode(e.to_string()))
}

async fn or_status_error_opt(response: Response) -> Result<Option<Response>, Error> {
    match response.status() {
        StatusCode::OK => Ok(Some(response)),
        StatusCode::NOT_FOUND => Ok(None),
        _ => {
            let status = response.status();
            match response.text().await {
                Ok(body) => Err(Error::Response(status, body)),
                Err(e) => Err(Error::Request(e)),
            }
        }
    }
}
