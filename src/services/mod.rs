pub mod clock;
pub mod hashing;
pub mod jwt;
pub mod mailer;
pub mod metrics;
pub mod resend_policy;
pub mod tokens;
