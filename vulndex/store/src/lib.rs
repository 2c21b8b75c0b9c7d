//! Gateway to the hosted relational store.
//!
//! The store is an external managed service speaking a PostgREST-style
//! table API; this crate only wraps the two operations the application
//! needs, an id-keyed upsert and an ordered, limited read. Configuration
//! is optional by design: without it the gateways are absent and callers
//! degrade instead of failing.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;
use vulndex_model::{NewVulnerabilityRow, VulnerabilityRow};

const TABLE_PATH: &str = "/rest/v1/vulnerabilities";
const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=representation";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("response error: {0} / {1}")]
    Response(StatusCode, String),
    #[error("store returned no representation")]
    Empty,
}

/// Backing store configuration. All settings are optional: a missing URL or
/// credential produces an absent gateway, not a failure.
#[derive(clap::Args, Debug, Clone, Default)]
#[command(rename_all_env = "SCREAMING_SNAKE_CASE", next_help_heading = "Backing store")]
pub struct StoreConfig {
    /// Base URL of the hosted store
    #[arg(long, env = "STORE_URL")]
    pub store_url: Option<Url>,

    /// Service-role credential for privileged server-side calls
    #[arg(long, env = "STORE_SERVICE_KEY", hide_env_values = true)]
    pub store_service_key: Option<String>,

    /// Restricted credential for browser-tier access
    #[arg(long, env = "STORE_ANON_KEY", hide_env_values = true)]
    pub store_anon_key: Option<String>,
}

impl StoreConfig {
    /// Privileged gateway: service key, falling back to the anon key.
    pub fn server(&self) -> Option<Store> {
        let url = self.store_url.clone()?;
        let key = self
            .store_service_key
            .clone()
            .or_else(|| self.store_anon_key.clone())?;
        Some(Store::new(url, key))
    }

    /// Restricted gateway, anon key only.
    pub fn browser(&self) -> Option<Store> {
        let url = self.store_url.clone()?;
        let key = self.store_anon_key.clone()?;
        Some(Store::new(url, key))
    }
}

/// One configured credential tier against the vulnerabilities table.
pub struct Store {
    client: reqwest::Client,
    base: Url,
    key: String,
}

impl Store {
    pub fn new(base: Url, key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
            key,
        }
    }

    fn table_url(&self) -> Result<Url, Error> {
        Ok(self.base.join(TABLE_PATH)?)
    }

    /// Rows ordered by creation time descending, newest first.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<VulnerabilityRow>, Error> {
        let response = self
            .client
            .get(self.table_url()?)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .query(&[("limit", limit)])
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .send()
            .await?;

        json_body(response).await
    }

    /// Insert or overwrite one row, keyed on `id`. Repeating an id replaces
    /// the stored row with the new field values.
    pub async fn upsert(&self, row: &NewVulnerabilityRow) -> Result<VulnerabilityRow, Error> {
        let response = self
            .client
            .post(self.table_url()?)
            .query(&[("on_conflict", "id")])
            .header("apikey", &self.key)
            .header("prefer", UPSERT_PREFER)
            .bearer_auth(&self.key)
            .json(&[row])
            .send()
            .await?;

        let mut rows: Vec<VulnerabilityRow> = json_body(response).await?;
        rows.pop().ok_or(Error::Empty)
    }
}

async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
    if response.status().is_success() {
        Ok(response.json().await?)
    } else {
        let status = response.status();
        match response.text().await {
            Ok(body) => Err(Error::Response(status, body)),
            Err(e) => Err(Error::Request(e)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use vulndex_model::StoredSource;

    fn config(url: Option<&str>, service: Option<&str>, anon: Option<&str>) -> StoreConfig {
        StoreConfig {
            store_url: url.map(|u| Url::parse(u).unwrap()),
            store_service_key: service.map(str::to_string),
            store_anon_key: anon.map(str::to_string),
        }
    }

    #[test]
    fn gateways_absent_without_configuration() {
        let unconfigured = config(None, None, None);
        assert!(unconfigured.server().is_none());
        assert!(unconfigured.browser().is_none());

        let url_only = config(Some("http://store.example"), None, None);
        assert!(url_only.server().is_none());
        assert!(url_only.browser().is_none());
    }

    #[test]
    fn server_gateway_falls_back_to_anon_key() {
        let anon_only = config(Some("http://store.example"), None, Some("anon"));
        assert!(anon_only.server().is_some());

        let service_only = config(Some("http://store.example"), Some("service"), None);
        assert!(service_only.server().is_some());
        assert!(service_only.browser().is_none());
    }

    fn row_body(id: &str, title: &str) -> String {
        json!([{
            "id": id,
            "title": title,
            "severity": 8.8,
            "source": "NVD",
            "package_name": null,
            "created_at": "2023-08-08T18:17:02Z",
            "published_at": null
        }])
        .to_string()
    }

    #[tokio::test]
    async fn list_recent_orders_and_limits() -> Result<(), anyhow::Error> {
        let mut server = mockito::Server::new_async().await;
        let listing = server
            .mock("GET", "/rest/v1/vulnerabilities")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("order".into(), "created_at.desc".into()),
                mockito::Matcher::UrlEncoded("limit".into(), "5".into()),
            ]))
            .match_header("apikey", "service-key")
            .with_status(200)
            .with_body(row_body("CVE-2023-1234", "Heap overflow"))
            .create_async()
            .await;

        let store = Store::new(Url::parse(&server.url())?, "service-key".into());
        let rows = store.list_recent(5).await?;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "CVE-2023-1234");
        assert_eq!(rows[0].source, StoredSource::Nvd);
        listing.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn upsert_is_keyed_on_id() -> Result<(), anyhow::Error> {
        let mut server = mockito::Server::new_async().await;
        let upsert = server
            .mock("POST", "/rest/v1/vulnerabilities")
            .match_query(mockito::Matcher::UrlEncoded("on_conflict".into(), "id".into()))
            .match_header("prefer", UPSERT_PREFER)
            .with_status(201)
            .with_body(row_body("CVE-2023-1234", "Heap overflow"))
            .expect(2)
            .create_async()
            .await;

        let store = Store::new(Url::parse(&server.url())?, "service-key".into());
        let row = NewVulnerabilityRow {
            id: "CVE-2023-1234".into(),
            title: "Heap overflow".into(),
            severity: 8.8,
            source: StoredSource::Nvd,
            package_name: None,
            published_at: None,
        };

        // resubmission goes through the same conflict-merging upsert
        let first = store.upsert(&row).await?;
        let second = store.upsert(&row).await?;

        assert_eq!(first.id, second.id);
        upsert.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn failures_surface_status_and_body() -> Result<(), anyhow::Error> {
        let mut server = mockito::Server::new_async().await;
        let _failure = server
            .mock("GET", "/rest/v1/vulnerabilities")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("storage exploded")
            .create_async()
            .await;

        let store = Store::new(Url::parse(&server.url())?, "key".into());
        match store.list_recent(10).await {
            Err(Error::Response(status, body)) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "storage exploded");
            }
            other => panic!("expected response error, got {other:?}"),
        }
        Ok(())
    }
}
