use crate::{
    api::{attendance, face},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let burst = requests_per_min.max(1);
    let per_ms = (60_000 / burst as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(burst)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst size are both non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let attendance_limiter = build_limiter(config.rate_attendance_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("").route(web::get().to(attendance::list_attendance)),
                    )
                    // /attendance/{action}, every call hits the face API
                    .service(
                        web::resource("/{action}")
                            .wrap(attendance_limiter)
                            .route(web::post().to(attendance::record_attendance)),
                    ),
            )
            // /employee/{id}/face
            .service(
                web::resource("/employee/{id}/face").route(web::post().to(face::enroll_face)),
            )
            .service(
                web::scope("/face")
                    .service(web::resource("/rebuild").route(web::post().to(face::rebuild_index)))
                    .service(web::resource("/migrate").route(web::post().to(face::migrate_index))),
            ),
    );
}
