pub mod balances;
pub mod deposits;
pub mod enums;
pub mod fcm_tokens;
pub mod non_reward_days;
pub mod notifications;
pub mod reward_rate_settings;
pub mod users;
pub mod withdrawals;

pub use enums::*;

pub use balances as balance_entity;
pub use deposits as deposit_entity;
pub use fcm_tokens as fcm_token_entity;
pub use non_reward_days as non_reward_day_entity;
pub use notifications as notification_entity;
pub use reward_rate_settings as reward_rate_setting_entity;
pub use users as user_entity;
pub use withdrawals as withdrawal_entity;
