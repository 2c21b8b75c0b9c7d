use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An OSV-shaped record describing a malicious package. Fields the source
/// document omits default to empty rather than failing deserialization.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, ToSchema)]
pub struct MaliciousPackage {
    pub id: String,
    /// Name of the first affected package, `Unknown` when absent.
    pub name: String,
    /// Ecosystem of the first affected package, `Unknown` when absent.
    pub ecosystem: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub details: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default = "Vec::default")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub modified: String,
    #[serde(default)]
    pub published: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub database_specific: Option<DatabaseSpecific>,
    #[serde(skip_serializing_if = "Vec::is_empty", default = "Vec::default")]
    pub affected: Vec<AffectedPackage>,
    #[serde(skip_serializing_if = "Vec::is_empty", default = "Vec::default")]
    pub references: Vec<PackageReference>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, ToSchema)]
pub struct DatabaseSpecific {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub severity: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, ToSchema)]
pub struct AffectedPackage {
    #[serde(default)]
    pub package: PackageId,
    #[serde(skip_serializing_if = "Vec::is_empty", default = "Vec::default")]
    pub ranges: Vec<PackageRange>,
    #[serde(skip_serializing_if = "Vec::is_empty", default = "Vec::default")]
    pub versions: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, ToSchema)]
pub struct PackageId {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ecosystem: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, ToSchema)]
pub struct PackageRange {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default = "Vec::default")]
    pub events: Vec<RangeEvent>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, ToSchema)]
pub struct RangeEvent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub introduced: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fixed: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, ToSchema)]
pub struct PackageReference {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
}
