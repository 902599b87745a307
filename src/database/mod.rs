pub mod connection;
pub mod transaction;

pub use connection::*;
pub use transaction::*;
