pub mod banned_entries;
pub mod page_configs;
pub mod raffle_wins;
pub mod submissions;
pub mod validated_players;

pub use banned_entries as banned_entry_entity;
pub use banned_entries::BanType;
pub use page_configs as page_config_entity;
pub use raffle_wins as raffle_win_entity;
pub use submissions as submission_entity;
pub use validated_players as validated_player_entity;
