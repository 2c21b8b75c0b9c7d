use actix_web::web::{self, ServiceConfig};

pub mod advisory;
pub mod feed;
pub mod malicious;
pub mod vulnerability;

pub(crate) fn configure() -> impl FnOnce(&mut ServiceConfig) {
    |config: &mut ServiceConfig| {
        config.service(
            web::resource("/api/v1/vulnerabilities")
                .route(web::get().to(vulnerability::list))
                .route(web::post().to(vulnerability::add)),
        );
        config.service(web::resource("/api/v1/advisories").route(web::get().to(advisory::list)));
        config.service(web::resource("/api/v1/advisories/{id}").route(web::get().to(advisory::get)));
        config.service(web::resource("/api/v1/malicious").route(web::get().to(malicious::list)));
        config.service(web::resource("/api/v1/malicious/{id}").route(web::get().to(malicious::get)));
        config.service(web::resource("/api/v1/feed").route(web::get().to(feed::feed)));
    }
}
