pub mod auth;
pub mod banned;
pub mod common;
pub mod dashboard;
pub mod email;
pub mod page_config;
pub mod pagination;
pub mod raffle;
pub mod submission;
pub mod validated_player;

pub use auth::*;
pub use banned::*;
pub use common::*;
pub use dashboard::*;
pub use email::*;
pub use page_config::*;
pub use pagination::*;
pub use raffle::*;
pub use submission::*;
pub use validated_player::*;
