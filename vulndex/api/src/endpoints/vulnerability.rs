use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use vulndex_model::{ErrorInformation, NewVulnerabilityRow, VulnerabilityRow};

use crate::error::Error;
use crate::server::AppState;

/// Hard ceiling on rows a single read may request.
pub const MAX_LIMIT: usize = 100;
const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListParams {
    /// Maximum number of rows to return, capped at 100
    pub limit: Option<usize>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct VulnerabilityList {
    pub items: Vec<VulnerabilityRow>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct VulnerabilityItem {
    pub item: VulnerabilityRow,
}

fn clamp_limit(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
}

#[utoipa::path(
    get,
    path = "/api/v1/vulnerabilities",
    tag = "vulnerability",
    params(ListParams),
    responses(
        (status = OK, description = "Stored rows, newest first", body = VulnerabilityList),
        (status = SERVICE_UNAVAILABLE, description = "Backing store is not configured", body = ErrorInformation),
        (status = INTERNAL_SERVER_ERROR, description = "Backing store query failed", body = ErrorInformation)
    )
)]
pub async fn list(state: web::Data<AppState>, params: web::Query<ListParams>) -> Result<HttpResponse, Error> {
    let store = state.store.as_ref().ok_or(Error::StoreUnconfigured)?;
    let items = store.list_recent(clamp_limit(params.limit)).await?;
    Ok(HttpResponse::Ok().json(VulnerabilityList { items }))
}

#[utoipa::path(
    post,
    path = "/api/v1/vulnerabilities",
    tag = "vulnerability",
    request_body = NewVulnerabilityRow,
    responses(
        (status = CREATED, description = "Row upserted", body = VulnerabilityItem),
        (status = BAD_REQUEST, description = "Payload failed validation", body = ErrorInformation),
        (status = SERVICE_UNAVAILABLE, description = "Backing store is not configured", body = ErrorInformation)
    )
)]
pub async fn add(state: web::Data<AppState>, row: web::Json<NewVulnerabilityRow>) -> Result<HttpResponse, Error> {
    let store = state.store.as_ref().ok_or(Error::StoreUnconfigured)?;
    let item = store.upsert(&row).await?;

    // fails only when nobody subscribes, which just means no feed to update
    let _ = state.events.send(item.clone());

    Ok(HttpResponse::Created().json(VulnerabilityItem { item }))
}
