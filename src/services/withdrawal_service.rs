use crate::entities::{TransactionStatus, withdrawal_entity as withdrawals};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

#[derive(Debug, FromQueryResult)]
pub(crate) struct AmountRow {
    pub count: i64,
    pub sum: Option<f64>,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl From<AmountRow> for AmountAggregate {
    fn from(r: AmountRow) -> Self {
        Self {
            count: r.count,
            sum: r.sum.unwrap_or(0.0),
            avg: r.avg,
            min: r.min,
            max: r.max,
        }
    }
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct StatusRow {
    pub status: TransactionStatus,
    pub count: i64,
    pub sum: Option<f64>,
}

impl From<StatusRow> for StatusGroup {
    fn from(r: StatusRow) -> Self {
        Self {
            status: r.status,
            count: r.count,
            sum: r.sum.unwrap_or(0.0),
        }
    }
}

#[derive(Clone)]
pub struct WithdrawalService {
    pool: DatabaseConnection,
}

impl WithdrawalService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    fn filter_condition(filter: &WithdrawalFilter) -> Condition {
        let mut cond = Condition::all();
        if let Some(user_id) = &filter.user_id {
            cond = cond.add(withdrawals::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(status) = filter.status {
            cond = cond.add(withdrawals::Column::Status.eq(status));
        }
        if let Some(kind) = filter.kind {
            cond = cond.add(withdrawals::Column::Type.eq(kind));
        }
        cond.add(filter.created.condition(withdrawals::Column::CreatedAt))
    }

    /// 创建提现记录，默认状态为 pending
    pub async fn create(&self, input: CreateWithdrawalInput) -> AppResult<withdrawals::Model> {
        validate_amount("amount", input.amount)?;
        validate_finite("balanceBefore", input.balance_before)?;

        let now = Utc::now();
        let withdrawal = withdrawals::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(input.user_id),
            amount: Set(input.amount),
            balance_before: Set(input.balance_before),
            r#type: Set(input.kind),
            status: Set(input.status.unwrap_or(TransactionStatus::Pending)),
            remarks: Set(input.remarks),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, "Withdrawal"))?;

        log::info!(
            "Withdrawal created: id={} user_id={} amount={} type={}",
            withdrawal.id,
            withdrawal.user_id,
            withdrawal.amount,
            withdrawal.r#type
        );
        Ok(withdrawal)
    }

    pub async fn find_unique(&self, id: &str) -> AppResult<Option<withdrawals::Model>> {
        let withdrawal = withdrawals::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?;
        Ok(withdrawal)
    }

    pub async fn get(&self, id: &str) -> AppResult<withdrawals::Model> {
        self.find_unique(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Withdrawal not found: {id}")))
    }

    pub async fn find_first(
        &self,
        filter: &WithdrawalFilter,
    ) -> AppResult<Option<withdrawals::Model>> {
        let withdrawal = withdrawals::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by(withdrawals::Column::CreatedAt, filter.order.into())
            .order_by_asc(withdrawals::Column::Id)
            .one(&self.pool)
            .await?;
        Ok(withdrawal)
    }

    pub async fn find_many(
        &self,
        filter: &WithdrawalFilter,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<withdrawals::Model>> {
        let paginator = withdrawals::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by(withdrawals::Column::CreatedAt, filter.order.into())
            .order_by_asc(withdrawals::Column::Id)
            .paginate(&self.pool, params.get_page_size());
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(params.get_page() - 1).await?;
        Ok(PaginatedResponse::new(data, params, total))
    }

    pub async fn count(&self, filter: &WithdrawalFilter) -> AppResult<u64> {
        let n = withdrawals::Entity::find()
            .filter(Self::filter_condition(filter))
            .count(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn update(
        &self,
        id: &str,
        input: UpdateTransactionInput,
    ) -> AppResult<withdrawals::Model> {
        if input.is_empty() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let mut model = self.get(id).await?.into_active_model();
        if let Some(status) = input.status {
            model.status = Set(status);
        }
        if let Some(remarks) = input.remarks {
            model.remarks = Set(remarks);
        }
        model.updated_at = Set(Utc::now());

        let withdrawal = model.update(&self.pool).await?;
        Ok(withdrawal)
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: TransactionStatus,
    ) -> AppResult<withdrawals::Model> {
        let withdrawal = self
            .update(id, UpdateTransactionInput::status(status))
            .await?;
        log::info!("Withdrawal {} status -> {}", withdrawal.id, status);
        Ok(withdrawal)
    }

    /// Sets `status` on every matching row and returns how many changed.
    pub async fn update_many_status(
        &self,
        filter: &WithdrawalFilter,
        status: TransactionStatus,
    ) -> AppResult<u64> {
        let res = withdrawals::Entity::update_many()
            .col_expr(
                withdrawals::Column::Status,
                withdrawals::Column::Status.save_as(Expr::val(status)),
            )
            .col_expr(withdrawals::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Self::filter_condition(filter))
            .exec(&self.pool)
            .await?;
        log::info!(
            "Withdrawals bulk status -> {}: {} rows",
            status,
            res.rows_affected
        );
        Ok(res.rows_affected)
    }

    pub async fn delete(&self, id: &str) -> AppResult<withdrawals::Model> {
        let withdrawal = self.get(id).await?;
        withdrawals::Entity::delete_by_id(withdrawal.id.clone())
            .exec(&self.pool)
            .await?;
        Ok(withdrawal)
    }

    pub async fn aggregate(&self, filter: &WithdrawalFilter) -> AppResult<AmountAggregate> {
        let amount = || Expr::col(withdrawals::Column::Amount);
        let row = withdrawals::Entity::find()
            .filter(Self::filter_condition(filter))
            .select_only()
            .column_as(Expr::col(withdrawals::Column::Id).count(), "count")
            .column_as(amount().sum(), "sum")
            .column_as(SimpleExpr::from(Func::avg(amount())), "avg")
            .column_as(amount().min(), "min")
            .column_as(amount().max(), "max")
            .into_model::<AmountRow>()
            .one(&self.pool)
            .await?;
        Ok(row.map(Into::into).unwrap_or_default())
    }

    pub async fn group_by_status(&self, filter: &WithdrawalFilter) -> AppResult<Vec<StatusGroup>> {
        let rows = withdrawals::Entity::find()
            .filter(Self::filter_condition(filter))
            .select_only()
            .column(withdrawals::Column::Status)
            .column_as(Expr::col(withdrawals::Column::Id).count(), "count")
            .column_as(Expr::col(withdrawals::Column::Amount).sum(), "sum")
            .group_by(withdrawals::Column::Status)
            .order_by_asc(withdrawals::Column::Status)
            .into_model::<StatusRow>()
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::WithdrawalType;
    use crate::services::test_support::{seed_user, setup};

    fn request(user_id: &str, amount: f64, kind: WithdrawalType) -> CreateWithdrawalInput {
        CreateWithdrawalInput {
            user_id: user_id.to_string(),
            amount,
            balance_before: 500.0,
            kind,
            status: None,
            remarks: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let pool = setup().await;
        let user = seed_user(&pool, "w@example.com", "+10000000001").await;
        let svc = WithdrawalService::new(pool.clone());

        let mut input = request(&user.id, 120.5, WithdrawalType::RewardOnly);
        input.remarks = Some("monthly".to_string());
        let created = svc.create(input).await.unwrap();
        assert_eq!(created.status, TransactionStatus::Pending);
        assert_eq!(created.r#type, WithdrawalType::RewardOnly);
        assert_eq!(created.balance_before, 500.0);

        let read = svc.get(&created.id).await.unwrap();
        assert_eq!(read, created);
        assert!(svc.find_unique("missing").await.unwrap().is_none());
        assert!(matches!(svc.get("missing").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_validation() {
        let pool = setup().await;
        let user = seed_user(&pool, "w@example.com", "+10000000001").await;
        let svc = WithdrawalService::new(pool.clone());

        let zero = svc.create(request(&user.id, 0.0, WithdrawalType::Full)).await;
        assert!(matches!(zero, Err(AppError::ValidationError(_))));

        let orphan = svc
            .create(request("no-such-user", 10.0, WithdrawalType::Full))
            .await;
        assert!(matches!(orphan, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_status_updates() {
        let pool = setup().await;
        let user = seed_user(&pool, "w@example.com", "+10000000001").await;
        let svc = WithdrawalService::new(pool.clone());
        let a = svc.create(request(&user.id, 10.0, WithdrawalType::Full)).await.unwrap();
        svc.create(request(&user.id, 20.0, WithdrawalType::Full)).await.unwrap();
        svc.create(request(&user.id, 30.0, WithdrawalType::RewardOnly))
            .await
            .unwrap();

        let done = svc
            .update_status(&a.id, TransactionStatus::Proceed)
            .await
            .unwrap();
        assert_eq!(done.status, TransactionStatus::Proceed);

        let failed = svc
            .update_many_status(
                &WithdrawalFilter {
                    status: Some(TransactionStatus::Pending),
                    kind: Some(WithdrawalType::Full),
                    ..Default::default()
                },
                TransactionStatus::Failed,
            )
            .await
            .unwrap();
        assert_eq!(failed, 1);

        let remarks = svc
            .update(
                &a.id,
                UpdateTransactionInput {
                    remarks: Some(Some("paid out".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(remarks.remarks.as_deref(), Some("paid out"));
        assert_eq!(remarks.status, TransactionStatus::Proceed);

        let cleared = svc
            .update(
                &a.id,
                UpdateTransactionInput {
                    remarks: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.remarks.is_none());

        assert!(matches!(
            svc.update(&a.id, UpdateTransactionInput::default()).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_aggregate_and_group_by_status() {
        let pool = setup().await;
        let user = seed_user(&pool, "w@example.com", "+10000000001").await;
        let svc = WithdrawalService::new(pool.clone());

        let empty = svc.aggregate(&WithdrawalFilter::default()).await.unwrap();
        assert_eq!(empty.count, 0);
        assert_eq!(empty.sum, 0.0);
        assert!(empty.avg.is_none());

        let a = svc.create(request(&user.id, 10.0, WithdrawalType::Full)).await.unwrap();
        svc.create(request(&user.id, 20.0, WithdrawalType::Full)).await.unwrap();
        svc.create(request(&user.id, 60.0, WithdrawalType::RewardOnly))
            .await
            .unwrap();
        svc.update_status(&a.id, TransactionStatus::Proceed)
            .await
            .unwrap();

        let all = svc.aggregate(&WithdrawalFilter::default()).await.unwrap();
        assert_eq!(all.count, 3);
        assert_eq!(all.sum, 90.0);
        assert_eq!(all.avg, Some(30.0));
        assert_eq!(all.min, Some(10.0));
        assert_eq!(all.max, Some(60.0));

        let full = svc
            .aggregate(&WithdrawalFilter {
                kind: Some(WithdrawalType::Full),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(full.count, 2);
        assert_eq!(full.sum, 30.0);

        let groups = svc
            .group_by_status(&WithdrawalFilter::default())
            .await
            .unwrap();
        assert_eq!(groups.len(), 2);
        let pending = groups
            .iter()
            .find(|g| g.status == TransactionStatus::Pending)
            .unwrap();
        assert_eq!(pending.count, 2);
        assert_eq!(pending.sum, 80.0);
    }

    #[tokio::test]
    async fn test_find_many_orders_and_pages() {
        let pool = setup().await;
        let user = seed_user(&pool, "w@example.com", "+10000000001").await;
        let svc = WithdrawalService::new(pool.clone());
        for amount in [1.0, 2.0, 3.0] {
            svc.create(request(&user.id, amount, WithdrawalType::Full))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let params = PaginationParams {
            page: Some(1),
            page_size: Some(2),
        };
        let newest = svc
            .find_many(&WithdrawalFilter::default(), &params)
            .await
            .unwrap();
        assert_eq!(newest.total, 3);
        assert_eq!(newest.total_pages, 2);
        assert_eq!(newest.data[0].amount, 3.0);

        let oldest = svc
            .find_first(&WithdrawalFilter {
                order: SortOrder::Asc,
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(oldest.amount, 1.0);

        let deleted = svc.delete(&oldest.id).await.unwrap();
        assert_eq!(deleted.id, oldest.id);
        assert_eq!(svc.count(&WithdrawalFilter::default()).await.unwrap(), 2);
    }
}
