/// Security utilities: JWT validation and the login rate limiter.
pub mod jwt;
pub mod login_limiter;

pub use login_limiter::{AttemptDecision, LoginRateLimiter};
