use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use vulndex_model::ErrorInformation;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("backing store is not configured")]
    StoreUnconfigured,
    #[error("store error: {0}")]
    Store(#[from] vulndex_store::Error),
    #[error("advisory source error: {0}")]
    Source(#[from] vulndex_source::Error),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("not found")]
    NotFound,
}

impl actix_web::error::ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::StoreUnconfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Source(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut res = HttpResponse::build(self.status_code());
        res.insert_header(ContentType::json());
        match self {
            Self::StoreUnconfigured => res.json(ErrorInformation {
                error: format!("{}", self.status_code()),
                message: "Backing store is not configured".to_string(),
                details: self.to_string(),
            }),
            Self::Store(error) => res.json(ErrorInformation {
                error: format!("{}", self.status_code()),
                message: "Error response from the backing store".to_string(),
                details: error.to_string(),
            }),
            Self::Source(error) => res.json(ErrorInformation {
                error: format!("{}", self.status_code()),
                message: "Error response from the content source".to_string(),
                details: error.to_string(),
            }),
            Self::InvalidPayload(error) => res.json(ErrorInformation {
                error: format!("{}", self.status_code()),
                message: "Request payload failed validation".to_string(),
                details: error.clone(),
            }),
            Self::NotFound => res.json(ErrorInformation {
                error: format!("{}", self.status_code()),
                message: "No source has an advisory with this id".to_string(),
                details: String::new(),
            }),
        }
    }
}

/// Malformed JSON bodies become a 400 with the same error body shape as
/// every other failure.
pub(crate) fn json_error_handler() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| Error::InvalidPayload(err.to_string()).into())
}
