use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod malicious;

/// One advisory record, normalized from whichever raw shape its source uses.
///
/// Every field is populated: extraction that fails to locate a value falls
/// back to a default instead of failing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct Vulnerability {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub severity: f64,
    #[serde(skip_serializing_if = "Vec::is_empty", default = "Vec::default")]
    pub affects: Vec<String>,
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub updated: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default = "Vec::default")]
    pub references: Vec<Reference>,
    pub source: SourceKey,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cve: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cvss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cwe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub path: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, ToSchema)]
pub struct Reference {
    pub title: String,
    pub url: String,
}

/// Origin of an advisory document.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Hash, Copy, Clone, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKey {
    Ghsa,
    Nvd,
    Osv,
    Unknown,
}

impl SourceKey {
    /// The subtree prefix advisories of this source live under.
    pub fn base_path(&self) -> &'static str {
        match self {
            SourceKey::Ghsa => "ghsa",
            SourceKey::Nvd => "nvd",
            SourceKey::Osv => "osv",
            SourceKey::Unknown => "unknown",
        }
    }
}

impl Display for SourceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.base_path())
    }
}

impl FromStr for SourceKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ghsa" => Ok(SourceKey::Ghsa),
            "nvd" => Ok(SourceKey::Nvd),
            "osv" => Ok(SourceKey::Osv),
            "unknown" => Ok(SourceKey::Unknown),
            other => Err(format!("unknown advisory source: {other}")),
        }
    }
}

/// Source tag of a stored vulnerability row.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Hash, Copy, Clone, ToSchema)]
pub enum StoredSource {
    #[serde(rename = "NVD")]
    Nvd,
    GitHub,
    #[serde(rename = "OSV")]
    Osv,
    Manual,
}

impl Display for StoredSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoredSource::Nvd => f.write_str("NVD"),
            StoredSource::GitHub => f.write_str("GitHub"),
            StoredSource::Osv => f.write_str("OSV"),
            StoredSource::Manual => f.write_str("Manual"),
        }
    }
}

impl From<SourceKey> for StoredSource {
    fn from(value: SourceKey) -> Self {
        match value {
            SourceKey::Ghsa => StoredSource::GitHub,
            SourceKey::Nvd => StoredSource::Nvd,
            SourceKey::Osv => StoredSource::Osv,
            SourceKey::Unknown => StoredSource::Manual,
        }
    }
}

/// A vulnerability row as the backing store returns it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct VulnerabilityRow {
    pub id: String,
    pub title: String,
    pub severity: f64,
    pub source: StoredSource,
    pub package_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// The client-supplied subset of a vulnerability row. Upserts are keyed on
/// `id`, so resubmitting the same identifier overwrites the stored row.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct NewVulnerabilityRow {
    pub id: String,
    pub title: String,
    pub severity: f64,
    pub source: StoredSource,
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorInformation {
    pub error: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub details: String,
}
