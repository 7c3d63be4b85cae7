use crate::{api::attendance, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let burst = requests_per_min.max(1);

    // per_ms and burst are non-zero
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(burst)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let check_limiter = Arc::new(build_limiter(config.rate_check_per_min));
    let report_limiter = Arc::new(build_limiter(config.rate_report_per_min));

    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/attendance")
                // /attendance/checks
                .service(
                    web::resource("/checks")
                        .wrap(check_limiter)
                        .route(web::post().to(attendance::record_check))
                        .route(web::get().to(attendance::list_checks)),
                )
                // /attendance/report/{user_id}
                .service(
                    web::resource("/report/{user_id}")
                        .wrap(report_limiter.clone())
                        .route(web::get().to(attendance::monthly_report)),
                )
                // /attendance/reconcile
                .service(
                    web::resource("/reconcile")
                        .wrap(report_limiter)
                        .route(web::post().to(attendance::reconcile_events)),
                ),
        ),
    );
}
