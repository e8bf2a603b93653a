pub mod controller;
pub mod crud;
pub mod interface;
pub mod lifecycle;
pub mod memory;
pub mod model;
pub mod oauth;
pub mod password_reset;
pub mod routes;
pub mod schema;
pub mod session;
pub mod sweeper;
pub mod validation;

pub use interface::{AuthError, LoginResult, TokenPair, VerificationOutcome};
pub use lifecycle::{AccountLifecycle, Registration};
pub use oauth::{ExternalIdentity, GoogleIdTokenVerifier, IdentityVerifier, OAuthLinker};
pub use routes::auth_routes;
pub use session::SessionManager;
pub use sweeper::TokenSweeper;
