use std::sync::Arc;

use serde_json::Value;
use vulndex_model::malicious::{AffectedPackage, DatabaseSpecific, MaliciousPackage, PackageReference};

use crate::client::{ContentSource, Error};

const OSV_DIR: &str = "osv";
const UNKNOWN: &str = "Unknown";

/// Reads OSV-shaped malicious package records from their own remote tree.
/// Failures degrade to empty results, the record pages are advisory-only
/// content.
pub struct MaliciousService {
    source: Arc<dyn ContentSource>,
}

impl MaliciousService {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }

    /// The latest records, paginated in listing order.
    pub async fn fetch_page(&self, page: usize, per_page: usize) -> Vec<MaliciousPackage> {
        match self.try_fetch_page(page.max(1), per_page.max(1)).await {
            Ok(packages) => packages,
            Err(e) => {
                log::warn!("Unable to list malicious packages: {e}");
                Vec::new()
            }
        }
    }

    async fn try_fetch_page(&self, page: usize, per_page: usize) -> Result<Vec<MaliciousPackage>, Error> {
        let entries = self.source.list(OSV_DIR).await?;
        let window: Vec<_> = entries
            .iter()
            .filter(|entry| entry.kind == "file" && entry.name.ends_with(".json"))
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        let mut packages = Vec::new();
        for entry in window {
            if let Some(json) = self.source.fetch_json(&entry.path).await? {
                packages.push(package_from(&json));
            }
        }
        Ok(packages)
    }

    /// Find one record by scanning the listing for a matching file name.
    pub async fn fetch_by_id(&self, id: &str) -> Option<MaliciousPackage> {
        match self.try_fetch_by_id(id).await {
            Ok(found) => found,
            Err(e) => {
                log::warn!("Unable to fetch malicious package {id}: {e}");
                None
            }
        }
    }

    async fn try_fetch_by_id(&self, id: &str) -> Result<Option<MaliciousPackage>, Error> {
        let entries = self.source.list(OSV_DIR).await?;
        let found = entries
            .iter()
            .find(|entry| entry.kind == "file" && entry.name.ends_with(".json") && entry.name.contains(id));

        match found {
            Some(entry) => Ok(self.source.fetch_json(&entry.path).await?.map(|json| package_from(&json))),
            None => Ok(None),
        }
    }
}

fn package_from(json: &Value) -> MaliciousPackage {
    let affected: Vec<AffectedPackage> = json
        .get("affected")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();
    let first = affected.first();

    MaliciousPackage {
        id: string_at(json, "id"),
        name: first
            .map(|a| a.package.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        ecosystem: first
            .map(|a| a.package.ecosystem.clone())
            .filter(|ecosystem| !ecosystem.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        summary: string_at(json, "summary"),
        details: string_at(json, "details"),
        aliases: json
            .get("aliases")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default(),
        modified: string_at(json, "modified"),
        published: string_at(json, "published"),
        database_specific: json
            .get("database_specific")
            .cloned()
            .and_then(|value| serde_json::from_value::<DatabaseSpecific>(value).ok()),
        references: json
            .get("references")
            .cloned()
            .and_then(|value| serde_json::from_value::<Vec<PackageReference>>(value).ok())
            .unwrap_or_default(),
        affected,
    }
}

fn string_at(json: &Value, field: &str) -> String {
    json.get(field).and_then(Value::as_str).unwrap_or_default().to_string()
}
