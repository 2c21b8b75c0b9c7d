pub mod advisories;
pub mod cache;
pub mod client;
pub mod malicious;
pub mod normalize;
pub mod time;
pub mod walker;

pub use advisories::AdvisoryService;
pub use client::{ContentClient, ContentConfig, ContentSource, DirEntry, Error};
pub use malicious::MaliciousService;

#[cfg(test)]
pub(crate) mod testing;
