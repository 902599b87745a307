use crate::entities::notification_entity as notifications;
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationService {
    pool: DatabaseConnection,
}

impl NotificationService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    fn filter_condition(filter: &NotificationFilter) -> Condition {
        let mut cond = Condition::all();
        if let Some(user_id) = &filter.user_id {
            cond = cond.add(notifications::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(is_read) = filter.is_read {
            cond = cond.add(notifications::Column::IsRead.eq(is_read));
        }
        if let Some(kind) = filter.kind {
            cond = cond.add(notifications::Column::Type.eq(kind));
        }
        cond
    }

    fn active_model(input: CreateNotificationInput) -> notifications::ActiveModel {
        notifications::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(input.user_id),
            title: Set(input.title),
            message: Set(input.message),
            r#type: Set(input.kind),
            channel: Set(input.channel.into()),
            sent_at: Set(input.sent_at.unwrap_or_else(Utc::now)),
            is_read: Set(false),
            metadata: Set(input.metadata),
        }
    }

    pub async fn create(&self, input: CreateNotificationInput) -> AppResult<notifications::Model> {
        let notification = Self::active_model(input)
            .insert(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "Notification"))?;
        log::info!(
            "Notification created: id={} user_id={} type={}",
            notification.id,
            notification.user_id,
            notification.r#type
        );
        Ok(notification)
    }

    /// 批量创建通知，返回写入条数
    pub async fn create_many(&self, inputs: Vec<CreateNotificationInput>) -> AppResult<u64> {
        if inputs.is_empty() {
            return Ok(0);
        }
        let models = inputs
            .into_iter()
            .map(Self::active_model)
            .collect::<Vec<_>>();
        let inserted = notifications::Entity::insert_many(models)
            .exec_without_returning(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "Notification"))?;
        log::info!("Notifications created: {}", inserted);
        Ok(inserted)
    }

    pub async fn find_unique(&self, id: &str) -> AppResult<Option<notifications::Model>> {
        let notification = notifications::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?;
        Ok(notification)
    }

    pub async fn get(&self, id: &str) -> AppResult<notifications::Model> {
        self.find_unique(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification not found: {id}")))
    }

    pub async fn find_first(
        &self,
        filter: &NotificationFilter,
    ) -> AppResult<Option<notifications::Model>> {
        let notification = notifications::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by(notifications::Column::SentAt, filter.order.into())
            .order_by_asc(notifications::Column::Id)
            .one(&self.pool)
            .await?;
        Ok(notification)
    }

    pub async fn find_many(
        &self,
        filter: &NotificationFilter,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<notifications::Model>> {
        let paginator = notifications::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by(notifications::Column::SentAt, filter.order.into())
            .order_by_asc(notifications::Column::Id)
            .paginate(&self.pool, params.get_page_size());
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(params.get_page() - 1).await?;
        Ok(PaginatedResponse::new(data, params, total))
    }

    pub async fn count(&self, filter: &NotificationFilter) -> AppResult<u64> {
        let n = notifications::Entity::find()
            .filter(Self::filter_condition(filter))
            .count(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.count(&NotificationFilter {
            user_id: Some(user_id.to_string()),
            is_read: Some(false),
            ..Default::default()
        })
        .await
    }

    pub async fn update(
        &self,
        id: &str,
        input: UpdateNotificationInput,
    ) -> AppResult<notifications::Model> {
        if input.title.is_none()
            && input.message.is_none()
            && input.is_read.is_none()
            && input.metadata.is_none()
        {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let mut model = self.get(id).await?.into_active_model();
        if let Some(title) = input.title {
            model.title = Set(title);
        }
        if let Some(message) = input.message {
            model.message = Set(message);
        }
        if let Some(is_read) = input.is_read {
            model.is_read = Set(is_read);
        }
        if let Some(metadata) = input.metadata {
            model.metadata = Set(metadata);
        }
        let notification = model.update(&self.pool).await?;
        Ok(notification)
    }

    pub async fn mark_read(&self, id: &str) -> AppResult<notifications::Model> {
        self.update(
            id,
            UpdateNotificationInput {
                is_read: Some(true),
                ..Default::default()
            },
        )
        .await
    }

    /// Marks every unread notification of the user as read; returns the
    /// number of rows changed.
    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        let res = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn delete(&self, id: &str) -> AppResult<notifications::Model> {
        let notification = self.get(id).await?;
        notifications::Entity::delete_by_id(notification.id.clone())
            .exec(&self.pool)
            .await?;
        Ok(notification)
    }

    pub async fn delete_many(&self, filter: &NotificationFilter) -> AppResult<u64> {
        let res = notifications::Entity::delete_many()
            .filter(Self::filter_condition(filter))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected)
    }
}
