use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use tokio::sync::broadcast;
use url::Url;
use vulndex_source::cache::{MemoCache, DEFAULT_TTL};
use vulndex_source::{AdvisoryService, ContentClient, MaliciousService};
use vulndex_store::Store;

use crate::feed::{Feed, FEED_CAPACITY};
use crate::server::{AppState, SharedState};

/// State wired against a content API base URL, with the feed in demo mode.
pub(crate) fn state(store: Option<Store>, content_base: &str) -> SharedState {
    let cache = Arc::new(MemoCache::new(DEFAULT_TTL));
    let advisory = ContentClient::new(
        Url::parse(content_base).unwrap(),
        "acme/vuln-list",
        None,
        cache.clone(),
    )
    .unwrap();
    let malicious = ContentClient::new(
        Url::parse(content_base).unwrap(),
        "acme/malicious-packages",
        None,
        cache,
    )
    .unwrap();
    let (events, _) = broadcast::channel(FEED_CAPACITY);

    Arc::new(AppState {
        advisories: AdvisoryService::new(Arc::new(advisory)),
        malicious: MaliciousService::new(Arc::new(malicious)),
        store,
        feed: Feed::new(false),
        events,
    })
}

pub(crate) fn store(url: &str) -> Store {
    Store::new(Url::parse(url).unwrap(), "test-key".to_string())
}

pub(crate) fn app(
    state: SharedState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(crate::error::json_error_handler())
        .app_data(web::Data::from(state))
        .configure(crate::endpoints::configure())
}
