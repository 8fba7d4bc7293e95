/// Database access layer for watch-service
///
/// Repository functions are thin wrappers over sqlx queries against the
/// shared PostgreSQL store. Anything that must be atomic (the
/// single-active-session invariant, terminal closes) is a transaction or a
/// single conditional statement here, never a read followed by an
/// unconditional write.
pub mod access_repo;
pub mod event_repo;
pub mod session_repo;
