/// Business logic layer for watch-service
pub mod access;
pub mod analytics;
pub mod events;
pub mod sessions;

pub use access::AccessChecker;
pub use analytics::AnalyticsService;
pub use events::EventRecorder;
pub use sessions::WatchSessionService;
