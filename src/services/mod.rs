pub mod auth_service;
pub mod ban_service;
pub mod config_service;
pub mod dashboard_service;
pub mod eligibility;
pub mod export_service;
pub mod feed;
pub mod notification_service;
pub mod raffle_service;
pub mod submission_service;
pub mod validation_service;

#[cfg(test)]
pub(crate) mod test_db;

pub use auth_service::*;
pub use ban_service::*;
pub use config_service::*;
pub use dashboard_service::*;
pub use export_service::*;
pub use feed::{EventFeed, FeedEvent, RaffleEvent, SubmissionCache, SubmissionEvent};
pub use notification_service::*;
pub use raffle_service::*;
pub use submission_service::*;
pub use validation_service::*;
