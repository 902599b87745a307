pub mod aggregate;
pub mod balance;
pub mod common;
pub mod fcm_token;
pub mod notification;
pub mod pagination;
pub mod reward;
pub mod transaction;
pub mod user;

pub use aggregate::*;
pub use balance::*;
pub use common::*;
pub use fcm_token::*;
pub use notification::*;
pub use pagination::*;
pub use reward::*;
pub use transaction::*;
pub use user::*;
