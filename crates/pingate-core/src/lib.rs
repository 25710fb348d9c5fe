pub mod auth;
pub mod config;
pub mod lifecycle;
pub mod state;

pub use auth::{AuthEvent, UnlockMethod};
pub use config::AppConfig;
pub use state::{AttemptState, AuthPolicyState, LockoutPhase, LockoutState};
