pub mod database;
pub mod environment;
pub mod settings;

pub use database::{init_db, run_migrations, DbPool};
pub use environment::{parse_duration, Config, ConfigError};
pub use settings::{AuthSettings, ResendLimits, SessionSettings};
