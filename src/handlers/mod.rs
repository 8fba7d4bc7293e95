/// HTTP handlers for Watch Service
///
/// These handlers expose the session, event, and analytics services via
/// JSON endpoints. All routes registered here expect the JWT middleware to
/// have populated the caller identity.
pub mod analytics;
pub mod events;
pub mod sessions;

pub use analytics::watch_summary;
pub use events::record_event;
pub use sessions::{cleanup_sessions, end_session, start_session, update_session};

use actix_web::web;

/// Configure routes for watch service
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/watch")
            .route("/sessions/start", web::post().to(sessions::start_session))
            .route("/sessions/update", web::post().to(sessions::update_session))
            .route("/sessions/end", web::post().to(sessions::end_session))
            .route(
                "/sessions/cleanup",
                web::post().to(sessions::cleanup_sessions),
            )
            .route("/events", web::post().to(events::record_event)),
    )
    .service(web::scope("/analytics").route("/watch", web::get().to(analytics::watch_summary)));
}
