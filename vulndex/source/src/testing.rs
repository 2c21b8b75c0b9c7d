use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{ContentSource, DirEntry, Error};

/// In-memory content tree for walker and pagination tests.
pub(crate) struct FakeSource {
    dirs: HashMap<String, Vec<DirEntry>>,
    files: HashMap<String, Value>,
    listed: Mutex<Vec<String>>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self {
            dirs: HashMap::new(),
            files: HashMap::new(),
            listed: Mutex::new(Vec::new()),
        }
    }

    /// Register a directory listing: files first, then subdirectories, in
    /// the given order.
    pub(crate) fn dir(&mut self, path: &str, files: Vec<String>, subdirs: Vec<&str>) {
        let mut entries = Vec::new();
        for name in files {
            entries.push(DirEntry {
                kind: "file".into(),
                path: format!("{path}/{name}"),
                name,
            });
        }
        for name in subdirs {
            entries.push(DirEntry {
                kind: "dir".into(),
                name: name.into(),
                path: format!("{path}/{name}"),
            });
        }
        self.dirs.insert(path.to_string(), entries);
    }

    pub(crate) fn file(&mut self, path: &str, body: Value) {
        self.files.insert(path.to_string(), body);
    }

    /// Paths listed so far, in call order.
    pub(crate) fn listed(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn list(&self, path: &str) -> Result<Vec<DirEntry>, Error> {
        self.listed.lock().unwrap().push(path.to_string());
        Ok(self.dirs.get(path).cloned().unwrap_or_default())
    }

    async fn fetch_json(&self, path: &str) -> Result<Option<Value>, Error> {
        Ok(self.files.get(path).cloned())
    }
}
