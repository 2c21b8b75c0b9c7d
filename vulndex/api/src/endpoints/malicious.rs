use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use vulndex_model::malicious::MaliciousPackage;
use vulndex_model::ErrorInformation;

use crate::error::Error;
use crate::server::AppState;

const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<usize>,
    /// Page size
    pub per_page: Option<usize>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MaliciousList {
    pub items: Vec<MaliciousPackage>,
}

#[utoipa::path(
    get,
    path = "/api/v1/malicious",
    tag = "malicious",
    params(PageParams),
    responses(
        (status = OK, description = "Latest malicious package records; empty when the source is unreachable", body = MaliciousList)
    )
)]
pub async fn list(state: web::Data<AppState>, params: web::Query<PageParams>) -> HttpResponse {
    let PageParams { page, per_page } = params.into_inner();
    let items = state
        .malicious
        .fetch_page(page.unwrap_or(1), per_page.unwrap_or(DEFAULT_PAGE_SIZE))
        .await;
    HttpResponse::Ok().json(MaliciousList { items })
}

#[utoipa::path(
    get,
    path = "/api/v1/malicious/{id}",
    tag = "malicious",
    params(("id" = String, Path, description = "OSV record identifier")),
    responses(
        (status = OK, description = "Record was found", body = MaliciousPackage),
        (status = NOT_FOUND, description = "No record matches this id", body = ErrorInformation)
    )
)]
pub async fn get(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse, Error> {
    match state.malicious.fetch_by_id(&id.into_inner()).await {
        Some(package) => Ok(HttpResponse::Ok().json(package)),
        None => Err(Error::NotFound),
    }
}
