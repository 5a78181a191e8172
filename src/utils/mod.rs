pub mod email;
pub mod jwt;
pub mod money;
pub mod password;

pub use email::*;
pub use jwt::*;
pub use money::parse_tip_amount;
pub use password::*;
