pub mod balance_service;
pub mod deposit_service;
pub mod fcm_token_service;
pub mod non_reward_day_service;
pub mod notification_service;
pub mod reward_rate_service;
pub mod user_service;
pub mod withdrawal_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use balance_service::*;
pub use deposit_service::*;
pub use fcm_token_service::*;
pub use non_reward_day_service::*;
pub use notification_service::*;
pub use reward_rate_service::*;
pub use user_service::*;
pub use withdrawal_service::*;
