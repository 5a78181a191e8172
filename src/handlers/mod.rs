pub mod admin;
pub mod auth;
pub mod banned;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod feed;
pub mod public;
pub mod raffle;
pub mod relay;
pub mod submission;
pub mod webhook;

pub use admin::admin_config;
pub use auth::auth_config;
pub use public::public_config;
pub use relay::relay_config;
pub use webhook::webhook_config;
