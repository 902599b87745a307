pub mod code_generator;
pub mod password;

pub use code_generator::{generate_account_number, generate_customer_id};
pub use password::*;
