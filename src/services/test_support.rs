//! Fixtures shared by the service tests.

use crate::config::SecurityConfig;
use crate::database::{DbPool, test_pool};
use crate::entities::user_entity as users;
use crate::models::CreateUserInput;
use crate::services::UserService;

pub async fn setup() -> DbPool {
    test_pool().await
}

/// Lowest bcrypt cost keeps the suite fast.
pub fn user_service(pool: &DbPool) -> UserService {
    UserService::new(pool.clone(), &SecurityConfig { bcrypt_cost: 4 })
}

pub async fn seed_user(pool: &DbPool, email: &str, phone: &str) -> users::Model {
    user_service(pool)
        .create(CreateUserInput::new(email, phone, "Password123"))
        .await
        .unwrap()
}
