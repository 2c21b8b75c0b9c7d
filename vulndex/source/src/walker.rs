use futures::future::BoxFuture;
use futures::FutureExt;

use crate::client::{ContentSource, Error};

/// Subdirectory fan-out bound for listings without direct files. The bound
/// trades completeness for remote-call cost: trees sharded into more than
/// this many subdirectories undercount silently.
pub const DIR_FAN_OUT: usize = 5;

/// Collect up to `limit` JSON file paths under `path`, in listing order.
///
/// Direct file entries win: when the listing contains any, the walk stops
/// there. Otherwise at most the first `fan_out` subdirectories are explored,
/// accumulating across them until `limit` is met, short-circuiting the rest.
pub fn list_json_files_under<'a>(
    source: &'a dyn ContentSource,
    path: &'a str,
    limit: usize,
    fan_out: usize,
) -> BoxFuture<'a, Result<Vec<String>, Error>> {
    async move {
        let entries = source.list(path).await?;

        let files: Vec<String> = entries
            .iter()
            .filter(|entry| entry.kind == "file" && entry.name.ends_with(".json"))
            .map(|entry| entry.path.clone())
            .collect();
        if !files.is_empty() {
            return Ok(files.into_iter().take(limit).collect());
        }

        let mut aggregated = Vec::new();
        for dir in entries.iter().filter(|entry| entry.kind == "dir").take(fan_out) {
            let sub = list_json_files_under(source, &dir.path, limit - aggregated.len(), fan_out).await?;
            aggregated.extend(sub);
            if aggregated.len() >= limit {
                break;
            }
        }
        Ok(aggregated)
    }
    .boxed()
}
