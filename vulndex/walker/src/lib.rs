use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use vulndex_model::{NewVulnerabilityRow, SourceKey, StoredSource, Vulnerability};
use vulndex_source::cache::MemoCache;
use vulndex_source::time::parse_timestamp;
use vulndex_source::{AdvisoryService, ContentConfig};
use vulndex_store::StoreConfig;

#[derive(clap::Args, Debug)]
#[command(
    about = "Walk a remote advisory subtree and ingest it into the backing store",
    args_conflicts_with_subcommands = true
)]
pub struct Run {
    /// Advisory subtree to ingest: ghsa, nvd or osv
    #[arg(long, default_value = "ghsa", value_parser = parse_source)]
    pub source: SourceKey,

    /// Upper bound on the number of advisories to ingest
    #[arg(long, default_value_t = 50)]
    pub limit: usize,

    /// Page size used while walking
    #[arg(long = "per-page", default_value_t = 25)]
    pub per_page: usize,

    /// TTL of the remote content memo cache
    #[arg(long = "cache-ttl-seconds", default_value_t = 60)]
    pub cache_ttl_seconds: u64,

    #[command(flatten)]
    pub store: StoreConfig,

    #[command(flatten)]
    pub content: ContentConfig,
}

fn parse_source(value: &str) -> Result<SourceKey, String> {
    value.parse()
}

impl Run {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let store = self.store.server().context("backing store is not configured")?;
        let cache = Arc::new(MemoCache::new(Duration::from_secs(self.cache_ttl_seconds)));
        let advisories = AdvisoryService::new(Arc::new(self.content.advisory_client(cache)?));

        let mut ingested = 0usize;
        let mut failed = 0usize;
        let mut page = 1usize;

        while ingested + failed < self.limit {
            let batch = advisories.fetch_page(self.source, page, self.per_page).await?;
            if batch.is_empty() {
                break;
            }

            let remaining = self.limit - (ingested + failed);
            for vuln in batch.iter().take(remaining) {
                let row = to_row(vuln);
                log::info!("Ingesting {}", row.id);
                match store.upsert(&row).await {
                    Ok(_) => ingested += 1,
                    Err(e) => {
                        log::warn!("Failed to store {}: {e}", row.id);
                        failed += 1;
                    }
                }
            }

            if batch.len() < self.per_page {
                break;
            }
            page += 1;
        }

        log::info!("Ingested {ingested} advisories from {} ({failed} failed)", self.source);
        Ok(ExitCode::SUCCESS)
    }
}

fn to_row(vuln: &Vulnerability) -> NewVulnerabilityRow {
    NewVulnerabilityRow {
        id: vuln.id.clone(),
        title: vuln.title.clone(),
        severity: vuln.severity,
        source: StoredSource::from(vuln.source),
        package_name: vuln.affects.first().cloned(),
        published_at: parse_timestamp(&vuln.published).or_else(|| parse_timestamp(&vuln.updated)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;
    use url::Url;
    use vulndex_model::Reference;

    fn vuln(source: SourceKey) -> Vulnerability {
        Vulnerability {
            id: "GHSA-1234".into(),
            title: "Bad dependency".into(),
            description: String::new(),
            severity: 6.1,
            affects: vec!["left-pad".into(), "right-pad".into()],
            published: String::new(),
            updated: "2023-02-01T00:00:00Z".into(),
            references: vec![Reference {
                title: "advisory".into(),
                url: "https://example.com".into(),
            }],
            source,
            cve: None,
            cvss: None,
            cwe: None,
            path: None,
        }
    }

    #[test]
    fn rows_map_source_and_first_package() {
        let row = to_row(&vuln(SourceKey::Ghsa));

        assert_eq!(row.source, StoredSource::GitHub);
        assert_eq!(row.package_name.as_deref(), Some("left-pad"));
        // `published` is empty, so `updated` supplies the timestamp
        assert_eq!(
            row.published_at.map(|ts| ts.to_rfc3339()),
            Some("2023-02-01T00:00:00+00:00".to_string())
        );

        assert_eq!(to_row(&vuln(SourceKey::Nvd)).source, StoredSource::Nvd);
        assert_eq!(to_row(&vuln(SourceKey::Osv)).source, StoredSource::Osv);
        assert_eq!(to_row(&vuln(SourceKey::Unknown)).source, StoredSource::Manual);
    }

    #[tokio::test]
    async fn ingests_a_subtree_end_to_end() -> Result<(), anyhow::Error> {
        let mut content = mockito::Server::new_async().await;
        let _listing = content
            .mock("GET", "/repos/acme/vuln-list/contents/osv")
            .with_status(200)
            .with_body(
                json!([
                    { "type": "file", "name": "OSV-1.json", "path": "osv/OSV-1.json" },
                    { "type": "file", "name": "OSV-2.json", "path": "osv/OSV-2.json" }
                ])
                .to_string(),
            )
            .create_async()
            .await;
        let mut bodies = Vec::new();
        for i in 1..=2 {
            bodies.push(
                content
                    .mock(
                        "GET",
                        format!("/repos/acme/vuln-list/contents/osv/OSV-{i}.json").as_str(),
                    )
                    .with_status(200)
                    .with_body(
                        json!({
                            "type": "file",
                            "content": STANDARD.encode(json!({ "id": format!("OSV-{i}") }).to_string())
                        })
                        .to_string(),
                    )
                    .create_async()
                    .await,
            );
        }

        let mut store = mockito::Server::new_async().await;
        let upserts = store
            .mock("POST", "/rest/v1/vulnerabilities")
            .match_query(mockito::Matcher::UrlEncoded("on_conflict".into(), "id".into()))
            .with_status(201)
            .with_body(
                json!([{
                    "id": "OSV-1",
                    "title": "OSV-1",
                    "severity": 0.0,
                    "source": "OSV",
                    "package_name": null,
                    "created_at": "2023-08-08T18:17:02Z",
                    "published_at": null
                }])
                .to_string(),
            )
            .expect(2)
            .create_async()
            .await;

        let run = Run {
            source: SourceKey::Osv,
            limit: 10,
            per_page: 25,
            cache_ttl_seconds: 60,
            store: StoreConfig {
                store_url: Some(Url::parse(&store.url())?),
                store_service_key: Some("service-key".into()),
                store_anon_key: None,
            },
            content: ContentConfig {
                content_api: Url::parse(&content.url())?,
                advisory_repo: "acme/vuln-list".into(),
                malicious_repo: "acme/malicious-packages".into(),
                github_token: None,
            },
        };

        run.run().await?;
        upserts.assert_async().await;
        Ok(())
    }
}
