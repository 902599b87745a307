use crate::config::SecurityConfig;
use crate::database::begin;
use crate::entities::{balance_entity as balances, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{
    generate_account_number, generate_customer_id, hash_password, verify_password,
};
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, FromQueryResult, IntoActiveModel, IsolationLevel, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

const MAX_CODE_ATTEMPTS: usize = 16;

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
    bcrypt_cost: u32,
    isolation: Option<IsolationLevel>,
}

impl UserService {
    pub fn new(pool: DatabaseConnection, security: &SecurityConfig) -> Self {
        Self {
            pool,
            bcrypt_cost: security.bcrypt_cost,
            isolation: None,
        }
    }

    pub fn with_isolation(mut self, isolation: Option<IsolationLevel>) -> Self {
        self.isolation = isolation;
        self
    }

    fn unique_condition(key: &UserUnique) -> Condition {
        let cond = Condition::all();
        match key {
            UserUnique::Id(id) => cond.add(users::Column::Id.eq(id.as_str())),
            UserUnique::CustomerId(v) => cond.add(users::Column::CustomerId.eq(v.as_str())),
            UserUnique::CustomerNumber(n) => cond.add(users::Column::CustomerNumber.eq(*n)),
            UserUnique::Email(v) => cond.add(users::Column::Email.eq(v.as_str())),
            UserUnique::AccountNumber(v) => cond.add(users::Column::AccountNumber.eq(v.as_str())),
            UserUnique::PhoneNumber(v) => cond.add(users::Column::PhoneNumber.eq(v.as_str())),
        }
    }

    fn filter_condition(filter: &UserFilter) -> Condition {
        let mut cond = Condition::all();
        if let Some(plan) = filter.plan {
            cond = cond.add(users::Column::Plan.eq(plan));
        }
        if let Some(v) = filter.is_active {
            cond = cond.add(users::Column::IsActive.eq(v));
        }
        if let Some(v) = filter.is_email_verified {
            cond = cond.add(users::Column::IsEmailVerified.eq(v));
        }
        if let Some(v) = filter.is_phone_verified {
            cond = cond.add(users::Column::IsPhoneVerified.eq(v));
        }
        if let Some(part) = &filter.email_contains {
            cond = cond.add(users::Column::Email.contains(part));
        }
        cond.add(filter.created.condition(users::Column::CreatedAt))
    }

    /// 创建用户；未提供的客户编号/账号自动生成
    ///
    /// Email, phone number and the other columns are stored exactly as given.
    /// A generated key that another writer took first triggers a retry.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<users::Model> {
        if let Some(n) = input.customer_number
            && n <= 0
        {
            return Err(AppError::ValidationError(
                "customerNumber must be positive".to_string(),
            ));
        }

        let password = hash_password(&input.password, self.bcrypt_cost)?;

        let mut attempt = 1;
        let user = loop {
            match self.insert_user(&input, &password).await {
                Ok(user) => break user,
                Err(AppError::DatabaseError(e))
                    if attempt < MAX_CODE_ATTEMPTS && generated_key_clash(&e, &input) =>
                {
                    log::warn!("User create lost a generated key race (attempt {attempt}): {e}");
                    attempt += 1;
                }
                Err(AppError::DatabaseError(e)) => return Err(AppError::from_write(e, "User")),
                Err(e) => return Err(e),
            }
        };

        log::info!(
            "User created: id={} customer_id={} customer_number={}",
            user.id,
            user.customer_id,
            user.customer_number
        );
        Ok(user)
    }

    /// One create attempt. Driver errors come back as `DatabaseError` so the
    /// caller can tell a lost key race from a real conflict.
    async fn insert_user(&self, input: &CreateUserInput, password: &str) -> AppResult<users::Model> {
        let txn = begin(&self.pool, self.isolation).await?;
        let customer_id = match &input.customer_id {
            Some(v) => v.clone(),
            None => Self::unique_customer_id(&txn).await?,
        };
        let customer_number = match input.customer_number {
            Some(n) => n,
            None => Self::next_customer_number(&txn).await?,
        };
        let account_number = match &input.account_number {
            Some(v) => v.clone(),
            None => Self::unique_account_number(&txn).await?,
        };

        let now = Utc::now();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            customer_id: Set(customer_id),
            customer_number: Set(customer_number),
            email: Set(input.email.clone()),
            account_number: Set(account_number),
            phone_number: Set(input.phone_number.clone()),
            password: Set(password.to_string()),
            plan: Set(input.plan.unwrap_or(crate::entities::PlanType::Plant)),
            is_active: Set(true),
            is_email_verified: Set(input.is_email_verified),
            is_phone_verified: Set(input.is_phone_verified),
            first_login: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;
        Ok(user)
    }

    pub async fn find_unique(&self, key: &UserUnique) -> AppResult<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(Self::unique_condition(key))
            .one(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get(&self, key: &UserUnique) -> AppResult<users::Model> {
        self.find_unique(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {key:?}")))
    }

    /// Email lookup that ignores letter case, for logins typed in any case.
    pub async fn find_by_email_ignore_case(&self, email: &str) -> AppResult<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(users::Column::Email))).eq(email.to_lowercase()))
            .order_by_asc(users::Column::CustomerNumber)
            .one(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_first(&self, filter: &UserFilter) -> AppResult<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by(users::Column::CreatedAt, filter.order.into())
            .order_by_asc(users::Column::CustomerNumber)
            .one(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_many(
        &self,
        filter: &UserFilter,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<users::Model>> {
        let paginator = users::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by(users::Column::CreatedAt, filter.order.into())
            .order_by_asc(users::Column::CustomerNumber)
            .paginate(&self.pool, params.get_page_size());
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(params.get_page() - 1).await?;
        Ok(PaginatedResponse::new(data, params, total))
    }

    pub async fn count(&self, filter: &UserFilter) -> AppResult<u64> {
        let n = users::Entity::find()
            .filter(Self::filter_condition(filter))
            .count(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn update(&self, key: &UserUnique, input: UpdateUserInput) -> AppResult<users::Model> {
        if input.is_empty() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let mut model = self.get(key).await?.into_active_model();
        if let Some(email) = input.email {
            model.email = Set(email);
        }
        if let Some(phone) = input.phone_number {
            model.phone_number = Set(phone);
        }
        if let Some(password) = &input.password {
            model.password = Set(hash_password(password, self.bcrypt_cost)?);
        }
        if let Some(plan) = input.plan {
            model.plan = Set(plan);
        }
        if let Some(v) = input.is_active {
            model.is_active = Set(v);
        }
        if let Some(v) = input.is_email_verified {
            model.is_email_verified = Set(v);
        }
        if let Some(v) = input.is_phone_verified {
            model.is_phone_verified = Set(v);
        }
        if let Some(v) = input.first_login {
            model.first_login = Set(v);
        }
        model.updated_at = Set(Utc::now());

        let user = model
            .update(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "User"))?;
        Ok(user)
    }

    /// Deletes the user; balances, transactions, notifications and tokens go
    /// with it (ON DELETE CASCADE).
    pub async fn delete(&self, key: &UserUnique) -> AppResult<users::Model> {
        let user = self.get(key).await?;
        users::Entity::delete_by_id(user.id.clone())
            .exec(&self.pool)
            .await?;
        log::info!("User deleted: id={}", user.id);
        Ok(user)
    }

    pub async fn delete_many(&self, filter: &UserFilter) -> AppResult<u64> {
        let res = users::Entity::delete_many()
            .filter(Self::filter_condition(filter))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected)
    }

    /// Checks a plain password against the stored hash. Unknown users yield
    /// `NotFound`.
    pub async fn verify_password(&self, key: &UserUnique, password: &str) -> AppResult<bool> {
        let user = self.get(key).await?;
        verify_password(password, &user.password)
    }

    pub async fn find_with_balances(&self, key: &UserUnique) -> AppResult<UserWithBalances> {
        let user = self.get(key).await?;
        let balances = user
            .find_related(balances::Entity)
            .order_by_asc(balances::Column::Plan)
            .all(&self.pool)
            .await?;
        Ok(UserWithBalances { user, balances })
    }

    async fn next_customer_number<C: ConnectionTrait>(db: &C) -> AppResult<i32> {
        #[derive(Debug, FromQueryResult)]
        struct MaxRow {
            max: Option<i32>,
        }
        let current = users::Entity::find()
            .select_only()
            .column_as(Expr::col(users::Column::CustomerNumber).max(), "max")
            .into_model::<MaxRow>()
            .one(db)
            .await?
            .and_then(|r| r.max)
            .unwrap_or(0);
        current
            .checked_add(1)
            .ok_or_else(|| AppError::InternalError("customerNumber exhausted".to_string()))
    }

    async fn unique_customer_id<C: ConnectionTrait>(db: &C) -> AppResult<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let candidate = generate_customer_id();
            let taken = users::Entity::find()
                .filter(users::Column::CustomerId.eq(candidate.as_str()))
                .count(db)
                .await?
                > 0;
            if !taken {
                return Ok(candidate);
            }
        }
        Err(AppError::InternalError(
            "could not generate a unique customerId".to_string(),
        ))
    }

    async fn unique_account_number<C: ConnectionTrait>(db: &C) -> AppResult<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let candidate = generate_account_number();
            let taken = users::Entity::find()
                .filter(users::Column::AccountNumber.eq(candidate.as_str()))
                .count(db)
                .await?
                > 0;
            if !taken {
                return Ok(candidate);
            }
        }
        Err(AppError::InternalError(
            "could not generate a unique accountNumber".to_string(),
        ))
    }
}

/// True when `err` is a unique violation on a key this insert generated
/// itself, so a fresh attempt can pick another value.
fn generated_key_clash(err: &DbErr, input: &CreateUserInput) -> bool {
    let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() else {
        return false;
    };
    (input.customer_number.is_none() && detail.contains("customerNumber"))
        || (input.customer_id.is_none() && detail.contains("customerId"))
        || (input.account_number.is_none() && detail.contains("accountNumber"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PlanType;
    use crate::services::test_support::{seed_user, setup, user_service};

    #[tokio::test]
    async fn test_create_and_read_back() {
        let pool = setup().await;
        let svc = user_service(&pool);

        let mut input = CreateUserInput::new("Alice@Example.com", "081234567890", "password");
        input.plan = Some(PlanType::Seed);
        input.is_email_verified = true;
        let created = svc.create(input).await.unwrap();

        assert_eq!(created.email, "Alice@Example.com");
        assert_eq!(created.phone_number, "081234567890");
        assert_eq!(created.plan, PlanType::Seed);
        assert_eq!(created.customer_number, 1);
        assert!(created.customer_id.starts_with("CUS"));
        assert_eq!(created.account_number.len(), 10);
        assert!(created.is_active);
        assert!(created.is_email_verified);
        assert!(!created.is_phone_verified);
        assert!(created.first_login);
        assert_ne!(created.password, "password");
        assert!(verify_password("password", &created.password).unwrap());

        let read = svc.get(&UserUnique::Id(created.id.clone())).await.unwrap();
        assert_eq!(read, created);

        for key in [
            UserUnique::CustomerId(created.customer_id.clone()),
            UserUnique::CustomerNumber(created.customer_number),
            UserUnique::Email("Alice@Example.com".to_string()),
            UserUnique::AccountNumber(created.account_number.clone()),
            UserUnique::PhoneNumber("081234567890".to_string()),
        ] {
            let found = svc.find_unique(&key).await.unwrap();
            assert_eq!(found.map(|u| u.id), Some(created.id.clone()), "{key:?}");
        }
        let other_case = svc
            .find_unique(&UserUnique::Email("alice@example.com".to_string()))
            .await
            .unwrap();
        assert!(other_case.is_none());
    }

    #[tokio::test]
    async fn test_find_by_email_ignore_case() {
        let pool = setup().await;
        let svc = user_service(&pool);
        let user = seed_user(&pool, "Bob.Smith@Example.com", "+10000000001").await;

        let found = svc
            .find_by_email_ignore_case("bob.smith@EXAMPLE.com")
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
        assert!(svc
            .find_by_email_ignore_case("nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_values_as_given() {
        let pool = setup().await;
        let svc = user_service(&pool);
        let user = seed_user(&pool, "u@example.com", "+10000000001").await;

        let updated = svc
            .update(
                &UserUnique::Id(user.id.clone()),
                UpdateUserInput {
                    email: Some(" Mixed@Case.Example ".to_string()),
                    phone_number: Some("0812-3456-7890".to_string()),
                    password: Some("short".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, " Mixed@Case.Example ");
        assert_eq!(updated.phone_number, "0812-3456-7890");
        assert!(
            svc.verify_password(&UserUnique::Id(user.id), "short")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_customer_numbers_are_sequential() {
        let pool = setup().await;
        let a = seed_user(&pool, "a@example.com", "+10000000001").await;
        let b = seed_user(&pool, "b@example.com", "+10000000002").await;
        assert_eq!(a.customer_number, 1);
        assert_eq!(b.customer_number, 2);
        assert_ne!(a.customer_id, b.customer_id);
        assert_ne!(a.account_number, b.account_number);
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let pool = setup().await;
        let svc = user_service(&pool);
        let first = seed_user(&pool, "dup@example.com", "+10000000001").await;

        let same_email = svc
            .create(CreateUserInput::new("dup@example.com", "+10000000002", "Password123"))
            .await;
        assert!(matches!(same_email, Err(AppError::Conflict(_))));

        let same_phone = svc
            .create(CreateUserInput::new("other@example.com", "+10000000001", "Password123"))
            .await;
        assert!(matches!(same_phone, Err(AppError::Conflict(_))));

        let mut same_customer = CreateUserInput::new("c@example.com", "+10000000003", "Password123");
        same_customer.customer_id = Some(first.customer_id.clone());
        assert!(matches!(svc.create(same_customer).await, Err(AppError::Conflict(_))));

        let mut same_number = CreateUserInput::new("d@example.com", "+10000000004", "Password123");
        same_number.customer_number = Some(first.customer_number);
        assert!(matches!(svc.create(same_number).await, Err(AppError::Conflict(_))));

        let mut same_account = CreateUserInput::new("e@example.com", "+10000000005", "Password123");
        same_account.account_number = Some(first.account_number.clone());
        assert!(matches!(svc.create(same_account).await, Err(AppError::Conflict(_))));

        assert_eq!(svc.count(&UserFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_customer_number_continues_after_a_manual_gap() {
        let pool = setup().await;
        let svc = user_service(&pool);

        let mut manual = CreateUserInput::new("m@example.com", "+10000000001", "Password123");
        manual.customer_number = Some(10);
        svc.create(manual).await.unwrap();

        let a = seed_user(&pool, "a@example.com", "+10000000002").await;
        let b = seed_user(&pool, "b@example.com", "+10000000003").await;
        assert_eq!(a.customer_number, 11);
        assert_eq!(b.customer_number, 12);
    }

    #[tokio::test]
    async fn test_generated_key_clash_only_for_generated_keys() {
        let pool = setup().await;
        let svc = user_service(&pool);
        let first = seed_user(&pool, "a@example.com", "+10000000001").await;

        let mut input = CreateUserInput::new("b@example.com", "+10000000002", "Password123");
        input.customer_number = Some(first.customer_number);
        let err = match svc.insert_user(&input, "hash").await {
            Err(AppError::DatabaseError(e)) => e,
            other => panic!("expected a driver error, got {other:?}"),
        };

        // supplied by the caller: a real conflict
        assert!(!generated_key_clash(&err, &input));
        // generated by the service: another writer won the race
        let mut generated = input.clone();
        generated.customer_number = None;
        assert!(generated_key_clash(&err, &generated));

        let mut same_email = input.clone();
        same_email.customer_number = None;
        same_email.email = first.email.clone();
        let err = match svc.insert_user(&same_email, "hash").await {
            Err(AppError::DatabaseError(e)) => e,
            other => panic!("expected a driver error, got {other:?}"),
        };
        assert!(!generated_key_clash(&err, &same_email));
        assert!(matches!(
            svc.create(same_email).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_create_under_configured_isolation() {
        let pool = setup().await;
        let svc = user_service(&pool).with_isolation(Some(IsolationLevel::Serializable));
        assert_eq!(svc.isolation, Some(IsolationLevel::Serializable));

        let user = svc
            .create(CreateUserInput::new("iso@example.com", "+10000000001", "Password123"))
            .await
            .unwrap();
        assert_eq!(user.customer_number, 1);
    }

    #[tokio::test]
    async fn test_update_and_verify_password() {
        let pool = setup().await;
        let svc = user_service(&pool);
        let user = seed_user(&pool, "u@example.com", "+10000000001").await;
        let key = UserUnique::Id(user.id.clone());

        assert!(svc.verify_password(&key, "Password123").await.unwrap());

        let updated = svc
            .update(
                &key,
                UpdateUserInput {
                    password: Some("Changed456A".to_string()),
                    plan: Some(PlanType::Tree),
                    first_login: Some(false),
                    is_phone_verified: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.plan, PlanType::Tree);
        assert!(!updated.first_login);
        assert!(updated.is_phone_verified);
        assert!(updated.updated_at >= user.updated_at);
        assert!(!svc.verify_password(&key, "Password123").await.unwrap());
        assert!(svc.verify_password(&key, "Changed456A").await.unwrap());

        let empty = svc.update(&key, UpdateUserInput::default()).await;
        assert!(matches!(empty, Err(AppError::ValidationError(_))));

        let missing = svc
            .update(
                &UserUnique::Id("missing".to_string()),
                UpdateUserInput {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_to_taken_email_conflicts() {
        let pool = setup().await;
        let svc = user_service(&pool);
        seed_user(&pool, "a@example.com", "+10000000001").await;
        let b = seed_user(&pool, "b@example.com", "+10000000002").await;
        let res = svc
            .update(
                &UserUnique::Id(b.id),
                UpdateUserInput {
                    email: Some("a@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(res, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_filters_pagination_and_delete_many() {
        let pool = setup().await;
        let svc = user_service(&pool);
        for i in 0..5 {
            let user = seed_user(&pool, &format!("u{i}@example.com"), &format!("+1000000000{i}")).await;
            if i % 2 == 0 {
                svc.update(
                    &UserUnique::Id(user.id),
                    UpdateUserInput {
                        is_active: Some(false),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            }
        }

        let inactive = UserFilter {
            is_active: Some(false),
            ..Default::default()
        };
        assert_eq!(svc.count(&inactive).await.unwrap(), 3);

        let page = svc
            .find_many(
                &UserFilter {
                    order: SortOrder::Asc,
                    ..Default::default()
                },
                &PaginationParams::new(Some(2), Some(2)),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.data.len(), 2);

        let by_email = svc
            .find_first(&UserFilter {
                email_contains: Some("u3@".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.email, "u3@example.com");

        assert_eq!(svc.delete_many(&inactive).await.unwrap(), 3);
        assert_eq!(svc.count(&UserFilter::default()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_balances() {
        let pool = setup().await;
        let svc = user_service(&pool);
        let user = seed_user(&pool, "gone@example.com", "+10000000001").await;
        crate::services::BalanceService::new(pool.clone())
            .create(CreateBalanceInput::new(&user.id, PlanType::Plant))
            .await
            .unwrap();

        let with = svc
            .find_with_balances(&UserUnique::Id(user.id.clone()))
            .await
            .unwrap();
        assert_eq!(with.balances.len(), 1);

        let deleted = svc.delete(&UserUnique::Id(user.id.clone())).await.unwrap();
        assert_eq!(deleted.id, user.id);
        assert_eq!(balances::Entity::find().count(&pool).await.unwrap(), 0);
        assert!(matches!(
            svc.delete(&UserUnique::Id(user.id)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
