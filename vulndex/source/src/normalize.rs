//! Normalization of raw advisory documents into the canonical
//! [`Vulnerability`] shape.
//!
//! The source trees carry three loosely-structured families of documents
//! (GHSA-style, NVD-style, OSV-style) plus the occasional stray. Extraction
//! is best-effort by policy: every field is an ordered cascade of probes and
//! anything that cannot be located degrades to a default. Nothing here
//! returns an error.

use serde_json::Value;
use vulndex_model::{Reference, SourceKey, Vulnerability};

/// How a raw document should be routed to a source extractor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceHint {
    Known(SourceKey),
    InferFromPath,
}

pub fn normalize(json: &Value, path: &str, hint: SourceHint) -> Vulnerability {
    match hint {
        SourceHint::Known(SourceKey::Ghsa) => normalize_ghsa(json, path),
        SourceHint::Known(SourceKey::Nvd) => normalize_nvd(json, path),
        SourceHint::Known(SourceKey::Osv) => normalize_osv(json, path),
        // an `unknown` tag means the caller could not classify the document
        // either, so it gets the same path inference
        SourceHint::Known(SourceKey::Unknown) | SourceHint::InferFromPath => {
            let lower = path.to_ascii_lowercase();
            if lower.starts_with("ghsa/") {
                normalize_ghsa(json, path)
            } else if lower.starts_with("nvd/") {
                normalize_nvd(json, path)
            } else if lower.starts_with("osv/") {
                normalize_osv(json, path)
            } else {
                normalize_generic(json, path)
            }
        }
    }
}

fn normalize_ghsa(json: &Value, path: &str) -> Vulnerability {
    let id = first_string(&[json.get("id"), json.get("ghsa"), json.get("advisory_id")])
        .map(str::to_string)
        .unwrap_or_else(|| id_from_path(path, "ghsa/"));
    let severity = first_present([
        extract_cvss_score(json.get("cvss")),
        extract_cvss_score(json.get("cvss_v3")),
        extract_cvss_score(json.get("cvss_v2")),
        json.get("severity").and_then(Value::as_str).and_then(parse_number_from_text),
    ])
    .unwrap_or(0.0);

    Vulnerability {
        title: first_string(&[
            json.get("title"),
            json.get("summary"),
            json.get("advisorySummary"),
            json.get("shortDescription"),
        ])
        .unwrap_or("GitHub Security Advisory")
        .to_string(),
        description: first_string(&[json.get("description"), json.get("details"), json.get("overview")])
            .unwrap_or_default()
            .to_string(),
        severity,
        affects: normalize_affects(first_value(&[
            json.get("affected_packages"),
            json.get("affected"),
            json.get("packages"),
        ])),
        published: first_string(&[json.get("published"), json.get("published_at"), json.get("datePublished")])
            .unwrap_or_default()
            .to_string(),
        updated: first_string(&[json.get("updated"), json.get("updated_at"), json.get("last_modified")])
            .unwrap_or_default()
            .to_string(),
        references: normalize_references(first_value(&[
            json.get("references"),
            json.get("references_url"),
            json.get("urls"),
        ])),
        source: SourceKey::Ghsa,
        cve: non_empty(json.get("cve"))
            .map(str::to_string)
            .or_else(|| find_cve_alias(json.get("aliases"))),
        cvss: first_string(&[
            json.pointer("/cvss/vector"),
            json.pointer("/cvss_v3/vector"),
            json.pointer("/cvss_v2/vector"),
            json.pointer("/cvss/vectorString"),
            json.get("metrics"),
        ])
        .map(str::to_string),
        cwe: first_string(&[
            json.get("cwe"),
            json.pointer("/weaknesses/0/description"),
            json.pointer("/cwe_ids/0"),
        ])
        .map(str::to_string),
        path: Some(path.to_string()),
        id,
    }
}

fn normalize_nvd(json: &Value, path: &str) -> Vulnerability {
    let id = first_string(&[
        json.get("id"),
        json.pointer("/cve/id"),
        json.pointer("/cve/CVE_data_meta/ID"),
    ])
    .map(str::to_string)
    .unwrap_or_else(|| id_from_path(path, "nvd/"));

    // NVD reference lists carry `name` instead of `title`
    let refs_raw = first_value(&[
        json.get("references"),
        json.pointer("/cve/references/reference_data"),
        json.pointer("/cnaContainer/references"),
        json.get("references_data"),
    ]);
    let references = match refs_raw {
        Some(Value::Array(items)) => items.iter().filter_map(nvd_reference_from).collect(),
        other => normalize_references(other),
    };

    Vulnerability {
        title: first_string(&[
            json.get("title"),
            json.pointer("/cve/description"),
            json.pointer("/cve/description/description_data/0/value"),
        ])
        .map(str::to_string)
        .unwrap_or_else(|| id.clone()),
        description: first_string(&[
            json.get("description"),
            json.pointer("/cve/description/description_data/0/value"),
            json.pointer("/cnaContainer/descriptions/0/value"),
        ])
        .unwrap_or_default()
        .to_string(),
        severity: first_present([
            extract_cvss_score(json.get("cvss")),
            extract_cvss_score(json.pointer("/impact/baseMetricV3/cvssV3")),
            extract_cvss_score(json.pointer("/impact/baseMetricV2")),
        ])
        .unwrap_or(0.0),
        affects: normalize_affects(first_value(&[json.get("affected"), json.pointer("/cnaContainer/affected")])),
        published: first_string(&[json.get("published"), json.get("publishedDate"), json.get("published_at")])
            .unwrap_or_default()
            .to_string(),
        updated: first_string(&[json.get("lastModifiedDate"), json.get("updated"), json.get("last_modified")])
            .unwrap_or_default()
            .to_string(),
        references,
        source: SourceKey::Nvd,
        cve: first_string(&[json.pointer("/cve/CVE_data_meta/ID"), json.pointer("/cve/id")])
            .map(str::to_string)
            .or_else(|| Some(id.clone())),
        cvss: first_string(&[
            json.pointer("/metrics/cvssMetricV31/0/cvssData/vectorString"),
            json.pointer("/cvss/vectorString"),
        ])
        .map(str::to_string),
        cwe: first_string(&[
            json.get("cwe"),
            json.pointer("/problemtype/problemtype_data/0/description/0/value"),
        ])
        .map(str::to_string),
        path: Some(path.to_string()),
        id,
    }
}

fn normalize_osv(json: &Value, path: &str) -> Vulnerability {
    let id = non_empty(json.get("id"))
        .map(str::to_string)
        .unwrap_or_else(|| id_from_path(path, "osv/"));

    Vulnerability {
        title: first_string(&[json.get("summary"), json.get("title")])
            .map(str::to_string)
            .unwrap_or_else(|| id.clone()),
        description: first_string(&[json.get("details"), json.get("description")])
            .unwrap_or_default()
            .to_string(),
        severity: first_present([
            extract_cvss_score(json.get("cvss")),
            extract_cvss_score(json.pointer("/severity/0/score")),
        ])
        .unwrap_or(0.0),
        affects: json
            .get("affected")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|affected| affected.pointer("/package/name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        published: first_string(&[json.get("published"), json.get("published_at")])
            .unwrap_or_default()
            .to_string(),
        updated: first_string(&[json.get("modified"), json.get("updated")])
            .unwrap_or_default()
            .to_string(),
        references: normalize_references(json.get("references")),
        source: SourceKey::Osv,
        cve: find_cve_alias(json.get("aliases")),
        cvss: non_empty(json.get("cvss")).map(str::to_string),
        cwe: first_string(&[json.pointer("/database_specific/cwe_ids/0"), json.get("cwe")]).map(str::to_string),
        path: Some(path.to_string()),
        id,
    }
}

/// Last-resort mapping for documents no source extractor claims.
fn normalize_generic(json: &Value, path: &str) -> Vulnerability {
    Vulnerability {
        id: non_empty(json.get("id"))
            .map(str::to_string)
            .unwrap_or_else(|| strip_json_suffix(path).to_string()),
        title: first_string(&[json.get("title"), json.get("summary")])
            .unwrap_or("Vulnerability")
            .to_string(),
        description: first_string(&[json.get("description"), json.get("details")])
            .unwrap_or_default()
            .to_string(),
        severity: extract_cvss_score(json.get("cvss")).unwrap_or(0.0),
        affects: normalize_affects(json.get("affected")),
        published: first_string(&[json.get("published"), json.get("published_at")])
            .unwrap_or_default()
            .to_string(),
        updated: first_string(&[json.get("updated"), json.get("modified")])
            .unwrap_or_default()
            .to_string(),
        references: normalize_references(json.get("references")),
        source: SourceKey::Unknown,
        cve: non_empty(json.get("cve")).map(str::to_string),
        cvss: non_empty(json.get("cvss")).map(str::to_string),
        cwe: non_empty(json.get("cwe")).map(str::to_string),
        path: Some(path.to_string()),
    }
}

/// First probe that yields a value wins.
fn first_present<T>(probes: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    probes.into_iter().flatten().next()
}

fn non_empty(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

/// First candidate holding a non-empty string.
fn first_string<'a>(candidates: &[Option<&'a Value>]) -> Option<&'a str> {
    candidates.iter().find_map(|candidate| non_empty(*candidate))
}

/// First candidate that is present and non-empty, regardless of type.
fn first_value<'a>(candidates: &[Option<&'a Value>]) -> Option<&'a Value> {
    candidates.iter().flatten().copied().find(|value| match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

/// Leading decimal number anywhere in free text, e.g. `"7.5 HIGH"`.
fn parse_number_from_text(text: &str) -> Option<f64> {
    let pattern = regex::Regex::new(r"\d+(\.\d+)?").ok()?;
    pattern.find(text).and_then(|m| m.as_str().parse().ok())
}

/// CVSS score extraction cascade: bare number, nested `score`/`baseScore`,
/// a `baseSeverity` label midpoint, then a number buried in free text.
pub(crate) fn extract_cvss_score(value: Option<&Value>) -> Option<f64> {
    let value = value?;
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    if let Some(n) = value.get("score").and_then(Value::as_f64) {
        return Some(n);
    }
    if let Some(n) = value.get("baseScore").and_then(Value::as_f64) {
        return Some(n);
    }
    if let Some(label) = value.get("baseSeverity").and_then(Value::as_str) {
        return severity_midpoint(label);
    }
    if let Some(text) = value.as_str() {
        return parse_number_from_text(text);
    }
    None
}

fn severity_midpoint(label: &str) -> Option<f64> {
    match label.to_ascii_uppercase().as_str() {
        "LOW" => Some(2.5),
        "MEDIUM" => Some(5.0),
        "HIGH" => Some(7.5),
        "CRITICAL" => Some(9.5),
        _ => None,
    }
}

/// References arrive as string arrays, object arrays or a lone object.
fn normalize_references(refs: Option<&Value>) -> Vec<Reference> {
    match refs {
        Some(Value::Array(items)) => items.iter().filter_map(reference_from).collect(),
        Some(value) if value.is_object() => match value.get("url").and_then(Value::as_str) {
            Some(url) => vec![Reference {
                title: titled(value, url),
                url: url.to_string(),
            }],
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn reference_from(value: &Value) -> Option<Reference> {
    if let Some(s) = value.as_str() {
        return Some(Reference {
            title: s.to_string(),
            url: s.to_string(),
        });
    }
    if let Some(url) = value.get("url").and_then(Value::as_str) {
        return Some(Reference {
            title: titled(value, url),
            url: url.to_string(),
        });
    }
    if let Some(link) = value.get("link").and_then(Value::as_str) {
        return Some(Reference {
            title: titled(value, link),
            url: link.to_string(),
        });
    }
    None
}

fn titled(value: &Value, fallback: &str) -> String {
    value
        .get("title")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn nvd_reference_from(value: &Value) -> Option<Reference> {
    if let Some(url) = value.get("url").and_then(Value::as_str) {
        let title = value
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(url);
        return Some(Reference {
            title: title.to_string(),
            url: url.to_string(),
        });
    }
    value.as_str().map(|s| Reference {
        title: s.to_string(),
        url: s.to_string(),
    })
}

/// Affected packages arrive as string arrays, object arrays probed for
/// `package`/`name`/`module`/`ecosystem`, or a lone object collecting every
/// present field. Order is preserved and duplicates are kept.
fn normalize_affects(affected: Option<&Value>) -> Vec<String> {
    const FIELDS: [&str; 4] = ["package", "name", "module", "ecosystem"];
    match affected {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                if let Some(s) = item.as_str() {
                    return Some(s.to_string());
                }
                FIELDS
                    .iter()
                    .find_map(|field| item.get(field).and_then(Value::as_str))
                    .map(str::to_string)
            })
            .collect(),
        Some(value) if value.is_object() => FIELDS
            .iter()
            .filter_map(|field| value.get(field).and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn find_cve_alias(aliases: Option<&Value>) -> Option<String> {
    aliases?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .find(|s| s.starts_with("CVE-"))
        .map(str::to_string)
}

fn id_from_path(path: &str, prefix: &str) -> String {
    let trimmed = path.strip_prefix(prefix).unwrap_or(path);
    strip_json_suffix(trimmed).to_string()
}

fn strip_json_suffix(name: &str) -> &str {
    if name.to_ascii_lowercase().ends_with(".json") {
        &name[..name.len() - 5]
    } else {
        name
    }
}
