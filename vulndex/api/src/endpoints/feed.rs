use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vulndex_model::VulnerabilityRow;

use crate::server::AppState;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct FeedSnapshot {
    pub items: Vec<VulnerabilityRow>,
    /// true when realtime credentials are missing and the feed only shows
    /// its bootstrap contents
    pub demo: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/feed",
    tag = "feed",
    responses(
        (status = OK, description = "Current live-feed snapshot, newest first", body = FeedSnapshot)
    )
)]
pub async fn feed(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(FeedSnapshot {
        items: state.feed.snapshot(),
        demo: !state.feed.realtime(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing;
    use actix_web::{http::StatusCode, test};
    use chrono::Utc;
    use vulndex_model::StoredSource;

    #[actix_web::test]
    async fn snapshot_reports_demo_mode_and_items() {
        let state = testing::state(None, "http://127.0.0.1:9");
        state.feed.apply_insert(VulnerabilityRow {
            id: "CVE-2023-1".into(),
            title: "x".into(),
            severity: 1.0,
            source: StoredSource::Manual,
            package_name: None,
            created_at: Utc::now(),
            published_at: None,
        });

        let app = test::init_service(testing::app(state)).await;
        let request = test::TestRequest::get().uri("/api/v1/feed").to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: FeedSnapshot = test::read_body_json(response).await;
        assert!(body.demo);
        assert_eq!(body.items.len(), 1);
        assert_eq!(body.items[0].id, "CVE-2023-1");
    }
}
