use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use vulndex_model::{ErrorInformation, SourceKey, Vulnerability};

use crate::error::Error;
use crate::server::AppState;

const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PageParams {
    /// Advisory subtree to page through, `ghsa` when absent
    pub source: Option<SourceKey>,
    /// 1-based page number
    pub page: Option<usize>,
    /// Page size, clamped to 1..=50
    pub per_page: Option<usize>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AdvisoryList {
    pub items: Vec<Vulnerability>,
}

#[utoipa::path(
    get,
    path = "/api/v1/advisories",
    tag = "advisory",
    params(PageParams),
    responses(
        (status = OK, description = "One page of normalized advisories, newest first; empty when the source is unreachable", body = AdvisoryList)
    )
)]
pub async fn list(state: web::Data<AppState>, params: web::Query<PageParams>) -> HttpResponse {
    let PageParams { source, page, per_page } = params.into_inner();
    let source = source.unwrap_or(SourceKey::Ghsa);

    let items = match state
        .advisories
        .fetch_page(source, page.unwrap_or(1), per_page.unwrap_or(DEFAULT_PAGE_SIZE))
        .await
    {
        Ok(items) => items,
        Err(e) => {
            log::warn!("Unable to list {source} advisories: {e}");
            Vec::new()
        }
    };

    HttpResponse::Ok().json(AdvisoryList { items })
}

#[utoipa::path(
    get,
    path = "/api/v1/advisories/{id}",
    tag = "advisory",
    params(("id" = String, Path, description = "Advisory identifier")),
    responses(
        (status = OK, description = "Advisory was found in one of the source subtrees", body = Vulnerability),
        (status = NOT_FOUND, description = "No source has this advisory", body = ErrorInformation)
    )
)]
pub async fn get(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse, Error> {
    match state.advisories.fetch_by_id(&id.into_inner()).await? {
        Some(vuln) => Ok(HttpResponse::Ok().json(vuln)),
        None => Err(Error::NotFound),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing;
    use actix_web::{http::StatusCode, test};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;

    #[actix_web::test]
    async fn listing_failures_degrade_to_an_empty_page() {
        let mut content = mockito::Server::new_async().await;
        let _failure = content
            .mock("GET", "/repos/acme/vuln-list/contents/ghsa")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let app = test::init_service(testing::app(testing::state(None, &content.url()))).await;
        let request = test::TestRequest::get().uri("/api/v1/advisories").to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: AdvisoryList = test::read_body_json(response).await;
        assert!(body.items.is_empty());
    }

    #[actix_web::test]
    async fn pages_are_normalized() -> Result<(), anyhow::Error> {
        let mut content = mockito::Server::new_async().await;
        let _listing = content
            .mock("GET", "/repos/acme/vuln-list/contents/osv")
            .with_status(200)
            .with_body(
                json!([{ "type": "file", "name": "OSV-1.json", "path": "osv/OSV-1.json" }]).to_string(),
            )
            .create_async()
            .await;
        let _body = content
            .mock("GET", "/repos/acme/vuln-list/contents/osv/OSV-1.json")
            .with_status(200)
            .with_body(
                json!({
                    "type": "file",
                    "content": STANDARD.encode(
                        json!({
                            "id": "OSV-1",
                            "summary": "Bad package",
                            "severity": [{ "score": { "baseSeverity": "HIGH" } }]
                        })
                        .to_string(),
                    )
                })
                .to_string(),
            )
            .create_async()
            .await;

        let app = test::init_service(testing::app(testing::state(None, &content.url()))).await;
        let request = test::TestRequest::get()
            .uri("/api/v1/advisories?source=osv")
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: AdvisoryList = test::read_body_json(response).await;
        assert_eq!(body.items.len(), 1);
        assert_eq!(body.items[0].id, "OSV-1");
        assert_eq!(body.items[0].severity, 7.5);
        Ok(())
    }

    #[actix_web::test]
    async fn unknown_ids_respond_404() {
        let mut content = mockito::Server::new_async().await;
        let mut misses = Vec::new();
        for path in [
            "ghsa/CVE-0-0.json",
            "nvd/CVE-0-0.json",
            "osv/CVE-0-0.json",
            "oval/debian/CVE-0-0.json",
        ] {
            misses.push(
                content
                    .mock(
                        "GET",
                        format!("/repos/acme/vuln-list/contents/{path}").as_str(),
                    )
                    .with_status(404)
                    .with_body(r#"{"message":"Not Found"}"#)
                    .create_async()
                    .await,
            );
        }

        let app = test::init_service(testing::app(testing::state(None, &content.url()))).await;
        let request = test::TestRequest::get()
            .uri("/api/v1/advisories/CVE-0-0")
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
