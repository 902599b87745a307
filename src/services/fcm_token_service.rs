use crate::database::begin;
use crate::entities::fcm_token_entity as fcm_tokens;
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct FcmTokenService {
    pool: DatabaseConnection,
    isolation: Option<IsolationLevel>,
}

impl FcmTokenService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self {
            pool,
            isolation: None,
        }
    }

    /// Isolation level of the transactions this service opens.
    pub fn with_isolation(mut self, isolation: Option<IsolationLevel>) -> Self {
        self.isolation = isolation;
        self
    }

    fn unique_condition(key: &FcmTokenUnique) -> Condition {
        match key {
            FcmTokenUnique::Id(id) => Condition::all().add(fcm_tokens::Column::Id.eq(id.as_str())),
            FcmTokenUnique::Token(token) => {
                Condition::all().add(fcm_tokens::Column::Token.eq(token.as_str()))
            }
        }
    }

    fn filter_condition(filter: &FcmTokenFilter) -> Condition {
        let mut cond = Condition::all();
        if let Some(user_id) = &filter.user_id {
            cond = cond.add(fcm_tokens::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(platform) = &filter.platform {
            cond = cond.add(fcm_tokens::Column::Platform.eq(platform.as_str()));
        }
        cond
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        input: RegisterTokenInput,
    ) -> AppResult<fcm_tokens::Model> {
        fcm_tokens::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(input.user_id),
            token: Set(input.token),
            platform: Set(input.platform),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(|e| AppError::from_write(e, "FCMToken"))
    }

    /// 注册推送 token；token 已存在时返回 Conflict
    pub async fn create(&self, input: RegisterTokenInput) -> AppResult<fcm_tokens::Model> {
        let token = Self::insert(&self.pool, input).await?;
        log::info!(
            "FCM token registered: user_id={} platform={}",
            token.user_id,
            token.platform
        );
        Ok(token)
    }

    /// Registers the token for the caller. A token already known under
    /// another user (device changed hands) is moved to the caller.
    pub async fn upsert_token(&self, input: RegisterTokenInput) -> AppResult<fcm_tokens::Model> {
        let txn = begin(&self.pool, self.isolation).await?;
        let existing = fcm_tokens::Entity::find()
            .filter(fcm_tokens::Column::Token.eq(input.token.as_str()))
            .one(&txn)
            .await?;
        let token = match existing {
            Some(current) => {
                if current.user_id != input.user_id {
                    log::info!(
                        "FCM token moved from user {} to {}",
                        current.user_id,
                        input.user_id
                    );
                }
                let mut model = current.into_active_model();
                model.user_id = Set(input.user_id);
                model.platform = Set(input.platform);
                model
                    .update(&txn)
                    .await
                    .map_err(|e| AppError::from_write(e, "FCMToken"))?
            }
            None => Self::insert(&txn, input).await?,
        };
        txn.commit().await?;
        Ok(token)
    }

    pub async fn find_unique(&self, key: &FcmTokenUnique) -> AppResult<Option<fcm_tokens::Model>> {
        let token = fcm_tokens::Entity::find()
            .filter(Self::unique_condition(key))
            .one(&self.pool)
            .await?;
        Ok(token)
    }

    pub async fn get(&self, key: &FcmTokenUnique) -> AppResult<fcm_tokens::Model> {
        self.find_unique(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("FCM token not found: {key:?}")))
    }

    /// Token strings of every device of the user, newest first.
    pub async fn tokens_for_user(&self, user_id: &str) -> AppResult<Vec<String>> {
        let list = fcm_tokens::Entity::find()
            .filter(fcm_tokens::Column::UserId.eq(user_id))
            .order_by_desc(fcm_tokens::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(|t| t.token).collect())
    }

    pub async fn find_first(&self, filter: &FcmTokenFilter) -> AppResult<Option<fcm_tokens::Model>> {
        let token = fcm_tokens::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by_desc(fcm_tokens::Column::CreatedAt)
            .one(&self.pool)
            .await?;
        Ok(token)
    }

    pub async fn find_many(
        &self,
        filter: &FcmTokenFilter,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<fcm_tokens::Model>> {
        let paginator = fcm_tokens::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by_desc(fcm_tokens::Column::CreatedAt)
            .order_by_asc(fcm_tokens::Column::Id)
            .paginate(&self.pool, params.get_page_size());
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(params.get_page() - 1).await?;
        Ok(PaginatedResponse::new(data, params, total))
    }

    pub async fn count(&self, filter: &FcmTokenFilter) -> AppResult<u64> {
        let n = fcm_tokens::Entity::find()
            .filter(Self::filter_condition(filter))
            .count(&self.pool)
            .await?;
        Ok(n)
    }

    /// Only the platform can change; a token string is its identity.
    pub async fn update(&self, key: &FcmTokenUnique, platform: &str) -> AppResult<fcm_tokens::Model> {
        let mut model = self.get(key).await?.into_active_model();
        model.platform = Set(platform.to_string());
        let token = model.update(&self.pool).await?;
        Ok(token)
    }

    pub async fn delete(&self, key: &FcmTokenUnique) -> AppResult<fcm_tokens::Model> {
        let token = self.get(key).await?;
        fcm_tokens::Entity::delete_by_id(token.id.clone())
            .exec(&self.pool)
            .await?;
        Ok(token)
    }

    /// Removes every token of the user (logout from all devices).
    pub async fn delete_for_user(&self, user_id: &str) -> AppResult<u64> {
        let res = fcm_tokens::Entity::delete_many()
            .filter(fcm_tokens::Column::UserId.eq(user_id))
            .exec(&self.pool)
            .await?;
        log::info!("FCM tokens removed for user {}: {}", user_id, res.rows_affected);
        Ok(res.rows_affected)
    }
}
