use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use vulndex_model::{SourceKey, Vulnerability};

use crate::client::{ContentSource, Error};
use crate::normalize::{normalize, SourceHint};
use crate::time::parse_timestamp;
use crate::walker::{list_json_files_under, DIR_FAN_OUT};

/// Largest page size a caller can request.
pub const MAX_PAGE_SIZE: usize = 50;

/// Paths probed for an advisory id, in order. The oval path is legacy and
/// only ever yields generically-tagged records.
fn candidate_paths(id: &str) -> [String; 4] {
    [
        format!("ghsa/{id}.json"),
        format!("nvd/{id}.json"),
        format!("osv/{id}.json"),
        format!("oval/debian/{id}.json"),
    ]
}

/// Paginated, normalized reads over the remote advisory tree.
pub struct AdvisoryService {
    source: Arc<dyn ContentSource>,
    fan_out: usize,
}

impl AdvisoryService {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            fan_out: DIR_FAN_OUT,
        }
    }

    /// One page of advisories for `source`, newest first.
    ///
    /// Every page re-derives all prior pages' worth of paths from the tree
    /// (or the cache): there is no persisted cursor.
    pub async fn fetch_page(
        &self,
        source: SourceKey,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<Vulnerability>, Error> {
        let page = page.max(1);
        let page_size = per_page.clamp(1, MAX_PAGE_SIZE);

        let files =
            list_json_files_under(self.source.as_ref(), source.base_path(), page * page_size, self.fan_out).await?;
        let window: Vec<&String> = files.iter().skip((page - 1) * page_size).take(page_size).collect();

        let bodies = join_all(window.iter().map(|path| self.source.fetch_json(path))).await;

        let mut vulns = Vec::new();
        for (path, body) in window.iter().zip(bodies) {
            if let Some(json) = body? {
                vulns.push(normalize(&json, path, SourceHint::Known(source)));
            }
        }

        vulns.sort_by(|a, b| sort_timestamp(b).cmp(&sort_timestamp(a)));
        Ok(vulns)
    }

    /// Probe all source subtrees for one advisory id.
    pub async fn fetch_by_id(&self, id: &str) -> Result<Option<Vulnerability>, Error> {
        for path in candidate_paths(id) {
            if let Some(json) = self.source.fetch_json(&path).await? {
                let hint = if path.starts_with("ghsa/") {
                    SourceHint::Known(SourceKey::Ghsa)
                } else if path.starts_with("nvd/") {
                    SourceHint::Known(SourceKey::Nvd)
                } else if path.starts_with("osv/") {
                    SourceHint::Known(SourceKey::Osv)
                } else {
                    SourceHint::InferFromPath
                };
                return Ok(Some(normalize(&json, &path, hint)));
            }
        }
        Ok(None)
    }
}

/// Sort key: `published`, falling back to `updated`; unparseable timestamps
/// sort as the epoch and end up at the tail of a newest-first page.
fn sort_timestamp(vuln: &Vulnerability) -> DateTime<Utc> {
    let raw = if vuln.published.is_empty() {
        &vuln.updated
    } else {
        &vuln.published
    };
    parse_timestamp(raw).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
