use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tokio::sync::broadcast;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use vulndex_model::VulnerabilityRow;
use vulndex_source::cache::MemoCache;
use vulndex_source::{AdvisoryService, MaliciousService};
use vulndex_store::Store;

use crate::endpoints;
use crate::error::json_error_handler;
use crate::feed::{self, Feed, FEED_CAPACITY};
use crate::Run;

pub struct Server {
    run: Run,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        endpoints::vulnerability::list,
        endpoints::vulnerability::add,
        endpoints::advisory::list,
        endpoints::advisory::get,
        endpoints::malicious::list,
        endpoints::malicious::get,
        endpoints::feed::feed,
    ),
    components(schemas(
        vulndex_model::Vulnerability,
        vulndex_model::Reference,
        vulndex_model::SourceKey,
        vulndex_model::StoredSource,
        vulndex_model::VulnerabilityRow,
        vulndex_model::NewVulnerabilityRow,
        vulndex_model::ErrorInformation,
        vulndex_model::malicious::MaliciousPackage,
        vulndex_model::malicious::DatabaseSpecific,
        vulndex_model::malicious::AffectedPackage,
        vulndex_model::malicious::PackageId,
        vulndex_model::malicious::PackageRange,
        vulndex_model::malicious::RangeEvent,
        vulndex_model::malicious::PackageReference,
        endpoints::vulnerability::VulnerabilityList,
        endpoints::vulnerability::VulnerabilityItem,
        endpoints::advisory::AdvisoryList,
        endpoints::malicious::MaliciousList,
        endpoints::feed::FeedSnapshot,
    )),
    tags(
        (name = "vulnerability", description = "Stored vulnerability rows"),
        (name = "advisory", description = "Normalized advisory reads"),
        (name = "malicious", description = "Malicious package records"),
        (name = "feed", description = "Live feed")
    )
)]
pub struct ApiDoc;

impl Server {
    pub fn new(run: Run) -> Self {
        Self { run }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let openapi = ApiDoc::openapi();
        let state = configure(&self.run)?;

        if let Some(store) = &state.store {
            match store.list_recent(FEED_CAPACITY).await {
                Ok(rows) => state.feed.bootstrap(rows),
                Err(e) => log::warn!("Unable to bootstrap the live feed: {e}"),
            }
        }
        tokio::task::spawn(feed::pump(state.clone(), state.events.subscribe()));

        HttpServer::new(move || {
            let cors = Cors::default()
                .send_wildcard()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(Logger::default())
                .wrap(cors)
                .app_data(json_error_handler())
                .app_data(web::Data::from(state.clone()))
                .configure(endpoints::configure())
                .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/openapi.json", openapi.clone()))
        })
        .bind((self.run.bind.clone(), self.run.port))?
        .run()
        .await?;
        Ok(())
    }
}

pub struct AppState {
    pub advisories: AdvisoryService,
    pub malicious: MaliciousService,
    /// Privileged store gateway; absent when unconfigured, in which case
    /// the vulnerability routes respond 503.
    pub store: Option<Store>,
    pub feed: Feed,
    pub events: broadcast::Sender<VulnerabilityRow>,
}

pub type SharedState = Arc<AppState>;

pub(crate) fn configure(run: &Run) -> anyhow::Result<SharedState> {
    let cache = Arc::new(MemoCache::new(Duration::from_secs(run.cache_ttl_seconds)));

    let advisories = AdvisoryService::new(Arc::new(run.content.advisory_client(cache.clone())?));
    let malicious = MaliciousService::new(Arc::new(run.content.malicious_client(cache)?));

    let store = run.store.server();
    if store.is_none() {
        log::warn!("Backing store is not configured; vulnerability routes will respond 503");
    }
    let realtime = run.store.browser().is_some();
    if !realtime {
        log::info!("No browser-tier store credentials; live feed runs in demo mode");
    }

    let (events, _) = broadcast::channel(FEED_CAPACITY);

    Ok(Arc::new(AppState {
        advisories,
        malicious,
        store,
        feed: Feed::new(realtime),
        events,
    }))
}
